//! JSON state file helpers — load/save small serde records.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a crash mid-write never leaves a truncated state file behind.

use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load a state record from `path`. A missing file yields the default value.
pub fn load_state<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .wrap_err_with(|| format!("failed to parse {}", path.display()))
}

/// Save a state record to `path`, creating parent directories as needed.
pub fn save_state<T: Serialize>(path: &Path, state: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .wrap_err_with(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
