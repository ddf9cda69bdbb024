use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// Reported but not fatal; execution will fail later instead.
    Missing(PathBuf),
    Readable(PathBuf),
}

pub fn resolve_target(file_path: &str, working_directory: Option<&str>) -> PathBuf {
    match working_directory.filter(|dir| !dir.is_empty()) {
        Some(dir) => Path::new(dir).join(file_path),
        None => PathBuf::from(file_path),
    }
}

pub fn validate(file_path: &str, working_directory: Option<&str>) -> Result<Preflight> {
    let resolved = resolve_target(file_path, working_directory);
    if !resolved.exists() {
        error!("File {} does not exist", resolved.display());
        return Ok(Preflight::Missing(resolved));
    }

    fs::metadata(&resolved).with_context(|| format!("stat {}", resolved.display()))?;
    fs::File::open(&resolved)
        .with_context(|| format!("{} is not readable", resolved.display()))?;
    debug!("{} is readable", resolved.display());
    Ok(Preflight::Readable(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::tests::capture;

    #[test]
    fn resolve_target_joins_working_directory() {
        assert_eq!(resolve_target("script.tape", None), PathBuf::from("script.tape"));
        assert_eq!(resolve_target("script.tape", Some("")), PathBuf::from("script.tape"));
        assert_eq!(
            resolve_target("script.tape", Some("docs")),
            Path::new("docs").join("script.tape")
        );
    }

    #[test]
    fn missing_file_is_reported_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let wd = tmp.path().to_string_lossy().to_string();
        let (outcome, log) = capture(|| validate("script.tape", Some(&wd)));
        let missing = tmp.path().join("script.tape");
        assert_eq!(outcome.unwrap(), Preflight::Missing(missing.clone()));
        assert_eq!(log, format!("::error::File {} does not exist\n", missing.display()));
    }

    #[test]
    fn readable_file_passes() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("demo.tape"), "Output demo.gif\n").unwrap();
        let wd = tmp.path().to_string_lossy().to_string();
        let outcome = validate("demo.tape", Some(&wd)).unwrap();
        assert_eq!(outcome, Preflight::Readable(tmp.path().join("demo.tape")));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let tape = tmp.path().join("locked.tape");
        fs::write(&tape, "Output demo.gif\n").unwrap();
        fs::set_permissions(&tape, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&tape).is_ok() {
            // Privileged users bypass mode bits.
            return;
        }

        let err = validate(&tape.to_string_lossy(), None).unwrap_err();
        assert!(err.to_string().contains("is not readable"));
    }
}
