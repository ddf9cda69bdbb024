//! The mutable environment a single run operates on.
//!
//! `ActionEnv` starts as a snapshot of the process environment and owns every
//! change the run makes to it. Changes that must outlive the run (PATH
//! additions, exported variables) are also written through the runner's file
//! commands so later workflow steps see them. The real process environment is
//! never touched.

use anyhow::{bail, Context, Result};
use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::logging;

#[cfg(windows)]
pub const PATH_DELIMITER: &str = ";";
#[cfg(not(windows))]
pub const PATH_DELIMITER: &str = ":";

const PATH_VAR: &str = "PATH";
const PATH_FILE_VAR: &str = "GITHUB_PATH";
const ENV_FILE_VAR: &str = "GITHUB_ENV";

#[derive(Debug, Clone)]
pub struct ActionEnv {
    vars: BTreeMap<OsString, OsString>,
    home: Option<PathBuf>,
}

impl ActionEnv {
    /// Snapshot of the process environment, including values that are not
    /// valid UTF-8.
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os(), dirs::home_dir())
    }

    #[cfg(test)]
    pub fn new(vars: impl IntoIterator<Item = (String, String)>, home: Option<PathBuf>) -> Self {
        Self::from_os_vars(
            vars.into_iter().map(|(k, v)| (OsString::from(k), OsString::from(v))),
            home,
        )
    }

    pub fn from_os_vars(
        vars: impl IntoIterator<Item = (OsString, OsString)>,
        home: Option<PathBuf>,
    ) -> Self {
        Self {
            vars: vars.into_iter().collect(),
            home,
        }
    }

    /// Value of `name`, or `None` when it is unset or not valid UTF-8.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(OsStr::new(name)).and_then(|v| v.to_str())
    }

    pub fn vars(&self) -> &BTreeMap<OsString, OsString> {
        &self.vars
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Name of the PATH variable as it appears in this environment. Windows
    /// keys are case-insensitive and commonly spelled `Path`.
    pub fn path_key(&self) -> OsString {
        if cfg!(windows) {
            let existing = self
                .vars
                .keys()
                .find(|k| k.to_str().is_some_and(|k| k.eq_ignore_ascii_case(PATH_VAR)));
            if let Some(key) = existing {
                return key.clone();
            }
        }
        OsString::from(PATH_VAR)
    }

    pub fn path(&self) -> &OsStr {
        self.vars
            .get(&self.path_key())
            .map(OsString::as_os_str)
            .unwrap_or_else(|| OsStr::new(""))
    }

    /// Prepends `dir` to PATH for this run and for later workflow steps.
    pub fn add_path(&mut self, dir: &Path) -> Result<()> {
        let entry = dir.to_string_lossy();
        match self.file_command_path(PATH_FILE_VAR)? {
            Some(file) => append_to_file(&file, &format!("{entry}\n"))?,
            None => logging::issue("add-path", &[], &entry),
        }

        let key = self.path_key();
        let mut updated = dir.as_os_str().to_os_string();
        if let Some(current) = self.vars.get(&key).filter(|current| !current.is_empty()) {
            updated.push(PATH_DELIMITER);
            updated.push(current);
        }
        self.vars.insert(key, updated);
        Ok(())
    }

    /// Sets `name` for this run and exports it to later workflow steps.
    pub fn export_variable(&mut self, name: &str, value: &str) -> Result<()> {
        match self.file_command_path(ENV_FILE_VAR)? {
            Some(file) => append_to_file(&file, &key_value_message(name, value)?)?,
            None => logging::issue("set-env", &[("name", name)], value),
        }
        self.vars.insert(OsString::from(name), OsString::from(value));
        Ok(())
    }

    fn file_command_path(&self, var: &str) -> Result<Option<PathBuf>> {
        let Some(raw) = self.var(var).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let path = PathBuf::from(raw);
        if !path.exists() {
            bail!("Missing file at path: {}", path.display());
        }
        Ok(Some(path))
    }
}

fn key_value_message(name: &str, value: &str) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    if name.contains(&delimiter) {
        bail!("Unexpected input: name should not contain the delimiter {delimiter:?}");
    }
    if value.contains(&delimiter) {
        bail!("Unexpected input: value should not contain the delimiter {delimiter:?}");
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

fn append_to_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
