use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::session::{Location, resolve_location};

pub fn run(url: &str, output: Option<&Path>, offline: bool) -> Result<()> {
    let config = Config::load_or_default();
    let location = Location::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    let store = config.store();
    let statics = Config::static_source(Some(location.origin()), offline);
    let content = resolve_location(&location, store.as_ref(), statics.as_ref());
    super::write_output(output, &content)
}
