use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::config::StoreConfig;
use crate::error::{ListenerError, StoreError};
use crate::format;
use crate::model::Recipe;

/// How recipe names are compared when a load sorts the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Plain `str` ordering
    #[default]
    Ordinal,
    /// Lowercased comparison, ties broken by plain ordering
    CaseInsensitive,
}

impl SortOrder {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            SortOrder::Ordinal => a.cmp(b),
            SortOrder::CaseInsensitive => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub sort_order: SortOrder,
    pub atomic_save: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sort_order: SortOrder::Ordinal,
            atomic_save: true,
        }
    }
}

/// Handle returned by [`RecipeStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut() -> Result<(), ListenerError>>;

/// An in-memory recipe collection bound to one file.
///
/// Reads hand out owned copies, so nothing a caller does to a returned
/// [`Recipe`] reaches the stored collection. Every successful `load`,
/// `save`, `add` and delete notifies subscribers before returning.
pub struct RecipeStore {
    path: PathBuf,
    options: StoreOptions,
    recipes: Vec<Recipe>,
    modified: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl RecipeStore {
    /// Create an empty store bound to `path` with default options.
    ///
    /// The path is made absolute against the current directory. Nothing is
    /// read until [`load`](Self::load) is called.
    ///
    /// # Errors
    /// Returns `StoreError::PathError` if the path is empty, does not end in a
    /// file name, or names an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_options(path, StoreOptions::default())
    }

    pub fn with_options(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = normalize_path(path.as_ref())?;
        debug!("Recipe store bound to {}", path.display());

        Ok(RecipeStore {
            path,
            options,
            recipes: Vec::new(),
            modified: false,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::with_options(&config.path, config.options())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// True when the collection has been changed since the last load or save
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Replace the collection with the recipes in the bound file, sorted by name.
    ///
    /// # Errors
    /// `StoreError::IoError` if the file cannot be read and `StoreError::FormatError`
    /// if its content breaks the grammar. On either error the previous
    /// collection and dirty flag are kept and no listener is called.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let file = File::open(&self.path)?;
        let mut recipes = format::parse(BufReader::new(file))?;

        let order = self.options.sort_order;
        recipes.sort_by(|a, b| order.compare(&a.name, &b.name));

        info!(
            "Loaded {} recipes from {}",
            recipes.len(),
            self.path.display()
        );
        self.recipes = recipes;
        self.modified = false;
        self.notify()
    }

    /// Write the collection, in its current order, over the bound file.
    pub fn save(&mut self) -> Result<(), StoreError> {
        if self.options.atomic_save {
            self.write_atomic()?;
        } else {
            let file = File::create(&self.path)?;
            format::write(BufWriter::new(file), &self.recipes)?;
        }

        info!(
            "Saved {} recipes to {}",
            self.recipes.len(),
            self.path.display()
        );
        self.modified = false;
        self.notify()
    }

    /// Write through a uniquely named temp file in the target's directory,
    /// then rename it over the target. The target's permissions carry over.
    fn write_atomic(&self) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        debug!("Writing recipes via {}", tmp.path().display());

        format::write(BufWriter::new(tmp.as_file_mut()), &self.recipes)?;

        match fs::metadata(&self.path) {
            Ok(metadata) => tmp.as_file().set_permissions(metadata.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tmp.as_file().sync_all()?;

        // On failure the temp file is removed when the returned handle drops
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Copies of every recipe, in store order
    pub fn get_all(&self) -> Vec<Recipe> {
        self.recipes.clone()
    }

    pub fn get_at(&self, index: usize) -> Result<Recipe, StoreError> {
        self.recipes
            .get(index)
            .cloned()
            .ok_or(StoreError::OutOfRange {
                index,
                len: self.recipes.len(),
            })
    }

    /// Append `recipe` to the end of the collection.
    ///
    /// The collection is not re-sorted until the next load.
    ///
    /// # Errors
    /// `StoreError::EncodeError` if the recipe could not be written to and
    /// read back from the file unchanged. The store is left as it was.
    pub fn add(&mut self, recipe: Recipe) -> Result<(), StoreError> {
        format::validate(&recipe)?;
        info!("Added recipe '{}'", recipe.name);
        self.recipes.push(recipe);
        self.modified = true;
        self.notify()
    }

    /// Remove the first stored recipe equal to `recipe`.
    ///
    /// # Errors
    /// `StoreError::NotFound` when no stored recipe is equal to it.
    pub fn delete(&mut self, recipe: &Recipe) -> Result<(), StoreError> {
        let index = self
            .recipes
            .iter()
            .position(|stored| stored == recipe)
            .ok_or_else(|| StoreError::NotFound(recipe.name.clone()))?;
        self.remove(index)
    }

    pub fn delete_at(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.recipes.len() {
            return Err(StoreError::OutOfRange {
                index,
                len: self.recipes.len(),
            });
        }
        self.remove(index)
    }

    fn remove(&mut self, index: usize) -> Result<(), StoreError> {
        let removed = self.recipes.remove(index);
        info!("Deleted recipe '{}'", removed.name);
        self.modified = true;
        self.notify()
    }

    /// Register `listener` to run after every successful load, save, add or delete.
    ///
    /// Listeners run in subscription order. The first one to return an
    /// error stops the rest, and the error is returned from the call that
    /// triggered them as `StoreError::NotifyError`.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut() -> Result<(), ListenerError> + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) -> Result<(), StoreError> {
        debug!("Notifying {} listeners", self.listeners.len());
        for (_, listener) in self.listeners.iter_mut() {
            listener().map_err(StoreError::NotifyError)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RecipeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("recipes", &self.recipes)
            .field("modified", &self.modified)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn normalize_path(path: &Path) -> Result<PathBuf, StoreError> {
    let invalid = |reason: String| StoreError::PathError {
        path: path.to_path_buf(),
        reason,
    };

    let absolute = std::path::absolute(path).map_err(|e| invalid(e.to_string()))?;
    if absolute.file_name().is_none() {
        return Err(invalid("path does not name a file".to_string()));
    }
    if absolute.is_dir() {
        return Err(invalid("path is a directory".to_string()));
    }
    Ok(absolute)
}
