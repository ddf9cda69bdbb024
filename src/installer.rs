//! Downloads a VHS release and places the executable under the tool root.

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use tracing::{debug, info, warn};

use crate::{archive, config, download, fs_ops, paths};

const CHECKSUMS_ASSET: &str = "checksums.txt";

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Returns the absolute path of the installed executable.
pub fn install(
    root: &Path,
    version: &str,
    token: Option<&str>,
    mut exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<PathBuf> {
    let version = resolve_version(version, token)?;
    let asset = asset_name(&version, std::env::consts::OS, std::env::consts::ARCH)?;
    let base = release_download_base(&version);
    info!("Installing {} {version}", config::BINARY_NAME);

    fs::create_dir_all(root).with_context(|| format!("create {}", root.display()))?;
    let tmp = tempfile::Builder::new()
        .prefix("vhs-download-")
        .tempdir_in(root)
        .context("create download dir")?;

    let archive_path = tmp.path().join(&asset);
    download::download_file(&format!("{base}/{asset}"), &archive_path)
        .with_context(|| format!("download {asset}"))?;
    verify_checksum(&base, &asset, &archive_path)?;

    let extracted = tmp.path().join("extracted");
    archive::extract(&archive_path, &extracted, &mut exec)?;

    let exe_name = paths::executable_name(config::BINARY_NAME);
    let found = archive::find_file(&extracted, &exe_name)?
        .with_context(|| format!("{exe_name} not found in {asset}"))?;

    let dest_dir = paths::binary_dir(root, &version);
    fs::create_dir_all(&dest_dir).with_context(|| format!("create {}", dest_dir.display()))?;
    let dest = dest_dir.join(&exe_name);
    fs_ops::copy_file_atomic(&found, &dest)?;
    fs_ops::make_executable(&dest)?;

    let dest = std::path::absolute(&dest)
        .with_context(|| format!("resolve {}", dest.display()))?;
    debug!("installed {}", dest.display());
    Ok(dest)
}

fn resolve_version(version: &str, token: Option<&str>) -> Result<String> {
    let requested = version.trim();
    if requested.is_empty() || requested.eq_ignore_ascii_case("latest") {
        let url = format!(
            "{}/repos/{}/releases/latest",
            config::API_URL,
            config::RELEASE_REPO
        );
        let release: Release = download::fetch_json(&url, token)?;
        return normalize_version(&release.tag_name);
    }
    normalize_version(requested)
}

pub fn normalize_version(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let parsed = Version::parse(bare).with_context(|| format!("invalid version {raw:?}"))?;
    Ok(parsed.to_string())
}

pub fn asset_name(version: &str, os: &str, arch: &str) -> Result<String> {
    let (os_label, ext) = match os {
        "linux" => ("Linux", "tar.gz"),
        "macos" => ("Darwin", "tar.gz"),
        "windows" => ("Windows", "zip"),
        other => bail!("unsupported operating system: {other}"),
    };
    let arch_label = match arch {
        "x86_64" => "x86_64",
        "aarch64" => "arm64",
        "x86" => "i386",
        other => bail!("unsupported architecture: {other}"),
    };
    Ok(format!(
        "{}_{version}_{os_label}_{arch_label}.{ext}",
        config::BINARY_NAME
    ))
}

pub fn release_download_base(version: &str) -> String {
    format!(
        "{}/{}/releases/download/v{version}",
        config::DOWNLOAD_URL,
        config::RELEASE_REPO
    )
}

fn verify_checksum(base: &str, asset: &str, archive_path: &Path) -> Result<()> {
    let listing = download::fetch_text(&format!("{base}/{CHECKSUMS_ASSET}"))?;
    let Some(expected) = checksum_for(&listing, asset) else {
        warn!("{asset} is not listed in {CHECKSUMS_ASSET}, skipping verification");
        return Ok(());
    };
    let actual = download::sha256_file(archive_path)?;
    if actual != expected {
        bail!("sha256 mismatch for {asset}: expected {expected}, got {actual}");
    }
    debug!("sha256 verified for {asset}");
    Ok(())
}

/// Looks up `asset` in a `<hex>  <name>` listing.
pub fn checksum_for(listing: &str, asset: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let hash = parts.next()?;
        let name = parts.next()?.trim_start_matches('*');
        (name == asset).then(|| download::normalize_hex(hash))
    })
}
