//! Loading and saving of the deployment configuration and the state file.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use mega_deployer::{DeployConfig, StateSnapshot};
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{DeployCmdError, Result};

/// Load the deployment configuration from a JSON file
pub fn load_config(path: &Path) -> Result<DeployConfig> {
    let content = fs::read_to_string(path)
        .map_err(|source| DeployCmdError::FileRead { file: path.display().to_string(), source })?;
    let config: DeployConfig = parse_json(path, &content)?;
    debug!(contracts = config.len(), path = %path.display(), "Loaded deployment configuration");
    Ok(config)
}

/// Load the state left by the previous run. A missing file is an empty state.
pub fn load_state(path: &Path) -> Result<StateSnapshot> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let state: StateSnapshot = parse_json(path, &content)?;
            debug!(contracts = state.len(), path = %path.display(), "Loaded prior state");
            Ok(state)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No prior state, starting fresh");
            Ok(StateSnapshot::new())
        }
        Err(source) => {
            Err(DeployCmdError::FileRead { file: path.display().to_string(), source })
        }
    }
}

/// Write `state` to `path`, replacing the previous file only once the new one is complete
pub fn write_state(path: &Path, state: &StateSnapshot) -> Result<()> {
    let file_name = path.display().to_string();
    let json = serde_json::to_string_pretty(state)
        .map_err(|source| DeployCmdError::JsonSerialize { file: file_name.clone(), source })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_err = |source| DeployCmdError::FileWrite { file: file_name.clone(), source };
    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.write_all(b"\n").map_err(write_err)?;
    file.persist(path).map_err(|err| write_err(err.error))?;

    debug!(contracts = state.len(), path = %file_name, "State written");
    Ok(())
}

fn parse_json<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content)
        .map_err(|source| DeployCmdError::JsonParse { file: path.display().to_string(), source })
}
