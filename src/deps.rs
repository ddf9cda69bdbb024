//! Runtime dependencies of VHS: ffmpeg from the system package manager and
//! a pinned ttyd build where no package provides a recent enough one.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::Path,
    process::{Command, ExitStatus},
};
use tracing::info;

use crate::{config, download, env::ActionEnv, fs_ops, paths, runner};

const TTYD_REPO: &str = "tsl0922/ttyd";

pub fn install(
    env: &mut ActionEnv,
    root: &Path,
    mut exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    let os = std::env::consts::OS;
    for line in dependency_commands(os) {
        let mut cmd = parse_command_line(line)?;
        runner::execute(&mut cmd, &mut exec)?;
    }

    if let Some(asset) = ttyd_asset(os, std::env::consts::ARCH)? {
        let bin = paths::bin_dir(root);
        install_ttyd(&bin, &asset)?;
        env.add_path(&bin)?;
    }
    Ok(())
}

fn dependency_commands(os: &str) -> &'static [&'static str] {
    match os {
        "linux" => config::LINUX_DEPENDENCIES,
        "macos" => config::MACOS_DEPENDENCIES,
        "windows" => config::WINDOWS_DEPENDENCIES,
        _ => &[],
    }
}

pub fn parse_command_line(line: &str) -> Result<Command> {
    let mut parts = line.split_whitespace();
    let program = parts
        .next()
        .with_context(|| format!("empty dependency command {line:?}"))?;
    let mut cmd = Command::new(program);
    cmd.args(parts);
    Ok(cmd)
}

/// Release asset of the pinned ttyd for this platform; `None` where the
/// package manager already provides it.
pub fn ttyd_asset(os: &str, arch: &str) -> Result<Option<String>> {
    let asset = match (os, arch) {
        ("macos", _) => return Ok(None),
        ("linux", "x86_64") => "ttyd.x86_64",
        ("linux", "aarch64") => "ttyd.aarch64",
        ("linux", "arm") => "ttyd.armhf",
        ("linux", "x86") => "ttyd.i686",
        ("windows", _) => "ttyd.win32.exe",
        (os, arch) => bail!("no ttyd build for {os}/{arch}"),
    };
    Ok(Some(asset.to_string()))
}

fn install_ttyd(bin: &Path, asset: &str) -> Result<()> {
    fs::create_dir_all(bin).with_context(|| format!("create {}", bin.display()))?;
    let url = format!(
        "{}/{TTYD_REPO}/releases/download/{}/{asset}",
        config::DOWNLOAD_URL,
        config::TTYD_VERSION
    );
    info!("Installing ttyd {}", config::TTYD_VERSION);

    let tmp = tempfile::Builder::new()
        .prefix("ttyd-")
        .tempdir_in(bin)
        .context("create ttyd download dir")?;
    let downloaded = tmp.path().join(asset);
    download::download_file(&url, &downloaded)?;

    let dest = bin.join(paths::executable_name("ttyd"));
    fs_ops::copy_file_atomic(&downloaded, &dest)?;
    fs_ops::make_executable(&dest)
}
