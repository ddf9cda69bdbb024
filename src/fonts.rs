use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use tracing::info;

use crate::{archive, config, download, env::ActionEnv, runner};

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

pub fn install(
    env: &ActionEnv,
    root: &Path,
    mut exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    if config::FONT_URLS.is_empty() {
        return Ok(());
    }
    let os = std::env::consts::OS;
    let dest = fonts_dir(os, env)?;
    fs::create_dir_all(&dest).with_context(|| format!("create {}", dest.display()))?;
    fs::create_dir_all(root).with_context(|| format!("create {}", root.display()))?;

    let tmp = tempfile::Builder::new()
        .prefix("vhs-fonts-")
        .tempdir_in(root)
        .context("create font download dir")?;
    for (i, url) in config::FONT_URLS.iter().enumerate() {
        let archive_path = tmp.path().join(format!("font-{i}.zip"));
        download::download_file(url, &archive_path)?;
        let count = archive::extract_zip_matching(&archive_path, &dest, is_font_file)
            .with_context(|| format!("extract fonts from {url}"))?;
        info!("Installed {count} font files from {url}");
    }

    if os == "linux" {
        let mut cache = Command::new("fc-cache");
        cache.arg("-f");
        runner::execute(&mut cache, &mut exec)?;
    }
    Ok(())
}

/// Per-user font directory for `os`.
pub fn fonts_dir(os: &str, env: &ActionEnv) -> Result<PathBuf> {
    match os {
        "windows" => {
            let local = env
                .var("LOCALAPPDATA")
                .filter(|v| !v.is_empty())
                .context("LOCALAPPDATA not set")?;
            Ok(PathBuf::from(local)
                .join("Microsoft")
                .join("Windows")
                .join("Fonts"))
        }
        "linux" | "macos" => {
            let home = env.home().context("home directory not found")?;
            Ok(if os == "macos" {
                home.join("Library").join("Fonts")
            } else {
                home.join(".local").join("share").join("fonts")
            })
        }
        other => bail!("unsupported operating system: {other}"),
    }
}

pub fn is_font_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|f| ext.eq_ignore_ascii_case(f)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fonts_dir_per_platform() {
        let env = ActionEnv::new(
            [("LOCALAPPDATA".to_string(), r"C:\Users\runner\AppData\Local".to_string())],
            Some(PathBuf::from("/home/runner")),
        );
        assert_eq!(
            fonts_dir("linux", &env).unwrap(),
            PathBuf::from("/home/runner/.local/share/fonts")
        );
        assert_eq!(
            fonts_dir("macos", &env).unwrap(),
            PathBuf::from("/home/runner/Library/Fonts")
        );
        assert_eq!(
            fonts_dir("windows", &env).unwrap(),
            PathBuf::from(r"C:\Users\runner\AppData\Local")
                .join("Microsoft")
                .join("Windows")
                .join("Fonts")
        );
    }

    #[test]
    fn fonts_dir_needs_home() {
        let env = ActionEnv::new(Vec::new(), None);
        assert!(fonts_dir("linux", &env).is_err());
        assert!(fonts_dir("windows", &env).is_err());
    }

    #[test]
    fn font_files_by_extension() {
        assert!(is_font_file("JetBrainsMono-Regular.ttf"));
        assert!(is_font_file("Hack-Bold.OTF"));
        assert!(is_font_file("Collection.ttc"));
        assert!(!is_font_file("OFL.txt"));
        assert!(!is_font_file("ttf"));
    }
}
