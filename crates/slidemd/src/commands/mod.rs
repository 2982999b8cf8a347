pub mod codec;
pub mod completion;
pub mod config;
pub mod open;
pub mod outline;
pub mod render;
pub mod share;

use anyhow::{Context, Result};
use std::path::Path;

pub(crate) fn read_document(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Write to `output`, or stdout when none is given.
pub(crate) fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.ends_with('\n') {
                writeln!(stdout)?;
            }
            Ok(())
        }
    }
}
