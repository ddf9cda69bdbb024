use crate::{config, env::ActionEnv};

/// Values the caller configured for this run. Empty inputs are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    pub version: Option<String>,
    pub path: Option<String>,
    pub working_directory: Option<String>,
    pub extra_paths: Option<String>,
}

impl Inputs {
    pub fn from_env(env: &ActionEnv) -> Self {
        Self {
            version: get_input(env, "version"),
            path: get_input(env, "path"),
            working_directory: get_input(env, "working-directory"),
            extra_paths: get_input(env, "extra-paths"),
        }
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(config::DEFAULT_VERSION)
    }
}

/// Reads `INPUT_<NAME>`; spaces in `name` become underscores and the name is
/// uppercased. Hyphens are kept, so `working-directory` maps to
/// `INPUT_WORKING-DIRECTORY`.
pub fn get_input(env: &ActionEnv, name: &str) -> Option<String> {
    let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
    env.var(&key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
