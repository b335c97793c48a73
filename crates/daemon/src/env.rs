// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: INFRAD_STATE_DIR > XDG_STATE_HOME/infrad > ~/.local/state/infrad
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("INFRAD_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("infrad"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/infrad"))
}

/// Settings file override
pub fn config_path() -> Option<PathBuf> {
    std::env::var("INFRAD_CONFIG").ok().map(PathBuf::from)
}

/// Worker count override; ignored unless a positive integer
pub fn workers() -> Option<usize> {
    std::env::var("INFRAD_WORKERS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
