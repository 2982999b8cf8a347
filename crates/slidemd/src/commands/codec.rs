use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::codec;

/// Print the share token for a file, or for stdin when no file is given.
pub fn encode(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => super::read_document(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };
    println!("{}", codec::encode(&text));
    Ok(())
}

pub fn decode(token: &str) -> Result<()> {
    let text = codec::try_decode(token.trim()).context("Invalid share token")?;
    super::write_output(None, &text)
}
