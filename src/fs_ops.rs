use anyhow::{Context, Result};
use std::{fs, io, path::Path};

/// Copies through a sibling temp file so `dest` is never observed half-written.
/// The temp file is removed whenever the copy does not land.
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<()> {
    let dir = dest
        .parent()
        .with_context(|| format!("{} has no parent directory", dest.display()))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".vhs-action-")
        .tempfile_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    let mut source = fs::File::open(src).with_context(|| format!("open {}", src.display()))?;
    io::copy(&mut source, staged.as_file_mut())
        .with_context(|| format!("copy {} -> {}", src.display(), staged.path().display()))?;
    staged
        .persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("move into place {}", dest.display()))?;
    Ok(())
}

#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
