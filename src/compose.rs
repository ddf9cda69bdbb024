//! PATH and environment preparation for the installed binary.

use anyhow::Result;
use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    env::{ActionEnv, PATH_DELIMITER},
    paths,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    /// Binary directory first, then each existing extra path in input order.
    pub path_list: Vec<PathBuf>,
    /// Full environment for the child process.
    pub child_env: BTreeMap<OsString, OsString>,
}

pub fn compose(env: &mut ActionEnv, bin_dir: &Path, extra_paths: Option<&str>) -> Result<Composition> {
    let base_path = env.path().to_os_string();
    let mut path_list = vec![bin_dir.to_path_buf()];

    info!("Adding VHS to PATH");
    env.add_path(bin_dir)?;

    if let Some(csv) = extra_paths {
        for entry in split_extra_paths(csv) {
            let expanded = paths::expand_tilde(entry, env.home());
            let dir = PathBuf::from(&expanded);
            if dir.exists() {
                info!("Adding {expanded} to PATH");
                env.add_path(&dir)?;
                path_list.push(dir);
            } else {
                warn!("Path {expanded} does not exist, skipping");
            }
        }
    }

    // termenv ignores ANSI sequences when CI is set.
    env.export_variable("CI", "")?;
    env.export_variable("COLORTERM", "truecolor")?;

    let child_env = child_environment(env, &path_list, &base_path);
    Ok(Composition {
        path_list,
        child_env,
    })
}

/// Every comma-separated entry, trimmed. Blank entries are kept so they get
/// the same missing-path warning as any other entry.
fn split_extra_paths(csv: &str) -> impl Iterator<Item = &str> {
    csv.split(',').map(str::trim)
}

pub fn join_path_list(path_list: &[PathBuf]) -> OsString {
    let mut joined = OsString::new();
    for (i, dir) in path_list.iter().enumerate() {
        if i > 0 {
            joined.push(PATH_DELIMITER);
        }
        joined.push(dir);
    }
    joined
}

/// Clones `env` and overrides PATH, CI and COLORTERM. `base_path` is appended
/// after the entries of `path_list`.
pub fn child_environment(
    env: &ActionEnv,
    path_list: &[PathBuf],
    base_path: &OsStr,
) -> BTreeMap<OsString, OsString> {
    let mut vars = env.vars().clone();
    let mut path = join_path_list(path_list);
    if !base_path.is_empty() {
        path.push(PATH_DELIMITER);
        path.push(base_path);
    }
    vars.insert(env.path_key(), path);
    vars.insert(OsString::from("CI"), OsString::new());
    vars.insert(OsString::from("COLORTERM"), OsString::from("truecolor"));
    vars
}
