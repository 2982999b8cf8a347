use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::session::{self, Location};

pub fn run(file: &Path, inline: bool) -> Result<()> {
    let config = Config::load_or_default();
    let content = super::read_document(file)?;
    let location = if inline {
        // Any fragment makes the link self-contained.
        Location::parse(&format!("{}/#inline", config.origin()))?
    } else {
        Location::at_origin(config.origin())
    };
    let store = config.store();
    let link = session::share_link(&content, &location, store.as_ref())
        .context("Failed to store the document; try --inline")?;
    println!("{link}");
    Ok(())
}
