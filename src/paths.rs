use std::path::{Path, PathBuf};

use crate::{config, env::ActionEnv};

const ROOT_OVERRIDE_VAR: &str = "VHS_ACTION_ROOT";
const RUNNER_TEMP_VAR: &str = "RUNNER_TEMP";

/// Replaces a leading `~` (alone or followed by `/`) with `home`.
///
/// `~user` forms and `~` anywhere but the first position are left alone, as
/// is everything when no home directory is known.
pub fn expand_tilde(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    if path == "~" || path.starts_with("~/") {
        return format!("{}{}", home.to_string_lossy(), &path[1..]);
    }
    path.to_string()
}

/// Scratch directory the action downloads and installs tools into.
pub fn tool_root(env: &ActionEnv) -> PathBuf {
    if let Some(root) = env.var(ROOT_OVERRIDE_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(root);
    }
    let base = env
        .var(RUNNER_TEMP_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    base.join("vhs-action")
}

pub fn bin_dir(root: &Path) -> PathBuf {
    root.join("bin")
}

pub fn binary_dir(root: &Path, version: &str) -> PathBuf {
    root.join(config::BINARY_NAME).join(version)
}

pub fn executable_name(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}
