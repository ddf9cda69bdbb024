use serde::Deserialize;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize)]
struct Config {
    binary_name: String,
    default_version: String,
    release_repo: String,
    api_url: String,
    download_url: String,
    ttyd_version: String,
    #[serde(default)]
    fonts: Vec<String>,
    #[serde(default)]
    dependencies: Dependencies,
}

#[derive(Debug, Default, Deserialize)]
struct Dependencies {
    #[serde(default)]
    linux: Vec<String>,
    #[serde(default)]
    macos: Vec<String>,
    #[serde(default)]
    windows: Vec<String>,
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let manifest_dir = PathBuf::from(manifest_dir);
    let config = load_config(&manifest_dir).unwrap_or_else(|err| {
        panic!("failed to load config.toml: {err}");
    });

    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
    if let Err(err) = write_config_rs(&PathBuf::from(out_dir), &config) {
        panic!("failed to write config: {err}");
    }
}

fn load_config(root: &Path) -> io::Result<Config> {
    let config_path = root.join("config.toml");
    println!("cargo:rerun-if-changed={}", config_path.display());
    let contents = fs::read_to_string(&config_path)?;
    let cfg: Config = toml::from_str(&contents)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    if cfg.binary_name.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "binary_name is empty",
        ));
    }
    Ok(cfg)
}

fn write_config_rs(out_dir: &Path, config: &Config) -> io::Result<()> {
    let out_path = out_dir.join("vhs_action_config.rs");
    let mut file = fs::File::create(&out_path)?;
    writeln!(file, "pub const BINARY_NAME: &str = {:?};", config.binary_name)?;
    writeln!(file, "pub const DEFAULT_VERSION: &str = {:?};", config.default_version)?;
    writeln!(file, "pub const RELEASE_REPO: &str = {:?};", config.release_repo)?;
    writeln!(file, "pub const API_URL: &str = {:?};", config.api_url)?;
    writeln!(file, "pub const DOWNLOAD_URL: &str = {:?};", config.download_url)?;
    writeln!(file, "pub const TTYD_VERSION: &str = {:?};", config.ttyd_version)?;
    writeln!(file, "pub const FONT_URLS: &[&str] = &{:?};", config.fonts)?;
    writeln!(
        file,
        "pub const LINUX_DEPENDENCIES: &[&str] = &{:?};",
        config.dependencies.linux
    )?;
    writeln!(
        file,
        "pub const MACOS_DEPENDENCIES: &[&str] = &{:?};",
        config.dependencies.macos
    )?;
    writeln!(
        file,
        "pub const WINDOWS_DEPENDENCIES: &[&str] = &{:?};",
        config.dependencies.windows
    )?;
    Ok(())
}
