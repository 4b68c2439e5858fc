//! A small repository of recipes kept in a section-tagged text file.
//!
//! ```no_run
//! use recipe_store::RecipeStore;
//!
//! # fn main() -> Result<(), recipe_store::StoreError> {
//! let mut store = RecipeStore::new("recipes.txt")?;
//! store.subscribe(|| {
//!     println!("recipes changed");
//!     Ok(())
//! });
//! store.load()?;
//! if !store.is_empty() {
//!     store.delete_at(0)?;
//!     store.save()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod store;

pub use config::StoreConfig;
pub use error::{ListenerError, StoreError};
pub use model::{Ingredient, Recipe};
pub use store::{ListenerId, RecipeStore, SortOrder, StoreOptions};
