use log::{debug, error};
use std::env;

use recipe_store::{RecipeStore, StoreConfig};

const USAGE: &str = "Usage: recipe-store <list | show <index> | delete <index>>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Get the command from command-line arguments
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).ok_or(USAGE)?;

    let config = StoreConfig::load()?;
    debug!("{:#?}", config);

    let mut store = RecipeStore::from_config(&config)?;
    store.load()?;

    match command.as_str() {
        "list" => {
            for (index, recipe) in store.get_all().iter().enumerate() {
                println!("{}: {}", index, recipe.name);
            }
        }
        "show" => {
            let recipe = store.get_at(parse_index(&args)?)?;
            println!("{}", serde_json::to_string_pretty(&recipe)?);
        }
        "delete" => {
            store.delete_at(parse_index(&args)?)?;
            store.save()?;
        }
        other => {
            error!("Unknown command '{}'", other);
            return Err(USAGE.into());
        }
    }

    Ok(())
}

fn parse_index(args: &[String]) -> Result<usize, Box<dyn std::error::Error>> {
    let index = args.get(2).ok_or(USAGE)?;
    Ok(index.parse()?)
}
