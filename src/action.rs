use anyhow::{Context, Result};
use std::{
    path::PathBuf,
    process::{Command, ExitStatus},
};
use tracing::info;

use crate::{
    compose, deps, env::ActionEnv, fonts, inputs::Inputs, installer, logging, paths, preflight,
    runner,
};

pub fn run(env: &mut ActionEnv) -> Result<()> {
    let root = paths::tool_root(env);
    let token = env.var("GITHUB_TOKEN").map(str::to_string);
    run_with_deps(
        env,
        |env| fonts::install(env, &root, runner::spawn_and_wait),
        |env| deps::install(env, &root, runner::spawn_and_wait),
        |version| installer::install(&root, version, token.as_deref(), runner::spawn_and_wait),
        runner::spawn_and_wait,
    )
}

/// The whole run with its collaborators injected: fonts, dependencies and the
/// binary installer are called in that order, then the environment is
/// composed and, when a tape was given, the installed binary is executed
/// through `exec`.
pub fn run_with_deps(
    env: &mut ActionEnv,
    install_fonts: impl FnOnce(&mut ActionEnv) -> Result<()>,
    install_deps: impl FnOnce(&mut ActionEnv) -> Result<()>,
    install_binary: impl FnOnce(&str) -> Result<PathBuf>,
    exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    let inputs = Inputs::from_env(env);
    let working_directory = inputs.working_directory.as_deref();

    if let Some(file) = inputs.path.as_deref() {
        preflight::validate(file, working_directory)?;
    }

    logging::group("Installing fonts", || install_fonts(env))?;
    logging::group("Installing dependencies", || install_deps(env))?;
    let bin = logging::group("Installing VHS", || install_binary(inputs.version()))?;

    let bin_dir = bin
        .parent()
        .with_context(|| format!("{} has no parent directory", bin.display()))?;
    let composition = compose::compose(env, bin_dir, inputs.extra_paths.as_deref())?;

    if let Some(file) = inputs.path.as_deref() {
        info!("Running VHS");
        let mut cmd =
            runner::build_command(&bin, file, working_directory, Some(&composition.child_env));
        runner::execute(&mut cmd, exec)?;
    }

    Ok(())
}
