use std::{collections::BTreeMap, fs, path::Path};

use tracing::{debug, trace};
use walkdir::WalkDir;

use super::{DeployCmdError, Result};

/// Contract sources keyed by their path, as handed to the compiler.
pub type Sources = BTreeMap<String, String>;

/// Collect every file below `dir` whose name ends with `extension`.
pub fn collect_sources(dir: &Path, extension: &str) -> Result<Sources> {
    let mut sources = Sources::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| DeployCmdError::SourceScan {
            dir: dir.display().to_string(),
            source,
        })?;
        let matches = entry.file_name().to_str().is_some_and(|name| name.ends_with(extension));
        if !entry.file_type().is_file() || !matches {
            continue;
        }

        let path = entry.path();
        let content = fs::read_to_string(path)
            .map_err(|source| DeployCmdError::FileRead { file: path.display().to_string(), source })?;
        trace!(path = %path.display(), "Found contract source");
        sources.insert(path.display().to_string(), content);
    }

    debug!(count = sources.len(), dir = %dir.display(), "Collected contract sources");
    Ok(sources)
}
