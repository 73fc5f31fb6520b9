use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Opens the `kind` file (e.g., "project" or "theme") at `path`, naming both
/// in the error.
pub fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).map_err(|e| anyhow!("Opening {} file `{}`: {}", kind, path.display(), e))
}

/// Opens the output destination: the file at `path` (created along with its
/// parent directory) or standard output when there is no path.
pub fn output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(io::stdout())),
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let file = File::create(path)
                .map_err(|e| anyhow!("Creating output file `{}`: {}", path.display(), e))?;
            Ok(Box::new(file))
        }
    }
}
