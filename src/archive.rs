use anyhow::{bail, Context, Result};
use std::{
    fs,
    io,
    path::{Component, Path, PathBuf},
    process::{Command, ExitStatus},
};

use crate::runner;

/// Unpacks a release archive into `dest`. Zip files are read in-process,
/// gzipped tarballs go through the system `tar`.
pub fn extract(
    archive: &Path,
    dest: &Path,
    exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    let name = archive.to_string_lossy().to_ascii_lowercase();
    if name.ends_with(".zip") {
        extract_zip(archive, dest)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive, dest, exec)
    } else {
        bail!("unsupported archive format: {}", archive.display())
    }
}

pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("read zip")?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_owned();
        let out_path = dest.join(checked_entry_path(&name)?);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("create {}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let mut out_file = fs::File::create(&out_path)
            .with_context(|| format!("create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("write {}", out_path.display()))?;
    }
    Ok(())
}

/// Extracts only the entries whose file name satisfies `keep`, dropping their
/// directory prefix. Returns how many files were written.
pub fn extract_zip_matching(
    archive: &Path,
    dest: &Path,
    keep: impl Fn(&str) -> bool,
) -> Result<usize> {
    let file = fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("read zip")?;
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_owned();
        let file_name = checked_entry_path(&name)?
            .file_name()
            .context("bad zip entry name")?
            .to_os_string();
        if !keep(&file_name.to_string_lossy()) {
            continue;
        }

        let out_path = dest.join(&file_name);
        let mut out_file = fs::File::create(&out_path)
            .with_context(|| format!("create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("write {}", out_path.display()))?;
        written += 1;
    }
    Ok(written)
}

fn extract_tar_gz(
    archive: &Path,
    dest: &Path,
    exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut tar = Command::new("tar");
    tar.arg("-xzf").arg(archive).arg("-C").arg(dest);
    runner::execute(&mut tar, exec).with_context(|| format!("extract {}", archive.display()))
}

fn checked_entry_path(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    if path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        bail!("invalid path in zip: {name}");
    }
    Ok(path)
}

/// Depth-first search for a file called `name` under `dir`.
pub fn find_file(dir: &Path, name: &str) -> Result<Option<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read_dir {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    entries.sort();

    for path in &entries {
        if path.is_file() && path.file_name().is_some_and(|f| f == name) {
            return Ok(Some(path.clone()));
        }
    }
    for path in entries.iter().filter(|p| p.is_dir()) {
        if let Some(found) = find_file(path, name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
