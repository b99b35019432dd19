//! Key listing CLI command

use std::path::PathBuf;

use super::{load_initialized_config, open_store, runtime};
use crate::cli::error::CliError;
use crate::database::Collection;
use crate::ingest::load_key_snapshot;

/// `keys` arguments
#[derive(Debug, Clone)]
pub struct KeysArgs {
    /// Workspace directory holding the config file
    pub workspace: PathBuf,
    /// Collection override
    pub collection: Option<String>,
    /// Print every key, not just the count
    pub list: bool,
}

/// Print the natural keys stored in a collection
pub fn handle_keys(args: &KeysArgs) -> Result<(), CliError> {
    let config = load_initialized_config(&args.workspace)?;
    let store = open_store(&config, &args.workspace)?;
    let collection = Collection::new(
        args.collection
            .clone()
            .unwrap_or_else(|| config.ingest.collection.clone()),
        config.ingest.key_field.as_str(),
    );

    let keys = runtime()?.block_on(load_key_snapshot(&store, &collection))?;

    if args.list {
        let mut sorted: Vec<&str> = keys.iter().collect();
        sorted.sort_unstable();
        for key in sorted {
            println!("{}", key);
        }
    } else {
        println!("{}: {} keys", collection.name, keys.len());
    }

    Ok(())
}
