use anyhow::{bail, Context, Result};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::Path,
    process::{Command, ExitStatus},
};
use tracing::{debug, info};

/// `<binary> <target>`, optionally in `working_directory` and with `env` as
/// the complete child environment.
pub fn build_command(
    binary: &Path,
    target: &str,
    working_directory: Option<&str>,
    env: Option<&BTreeMap<OsString, OsString>>,
) -> Command {
    let mut cmd = Command::new(binary);
    cmd.arg(target);
    if let Some(dir) = working_directory.filter(|d| !d.is_empty()) {
        info!("Using working directory: {dir}");
        cmd.current_dir(dir);
    }
    if let Some(vars) = env {
        cmd.env_clear().envs(vars);
    }
    cmd
}

/// Runs `cmd` through `exec`; a non-zero exit is an error.
pub fn execute(
    cmd: &mut Command,
    mut exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    info!("[command]{}", format_command(cmd));
    let status = exec(cmd)?;
    debug!("exit status: {:?}", status.code());
    if !status.success() {
        bail!(failure_message(cmd, status));
    }
    Ok(())
}

/// Executor that spawns the child with inherited stdio and waits for it.
pub fn spawn_and_wait(cmd: &mut Command) -> Result<ExitStatus> {
    cmd.status()
        .with_context(|| format!("spawn {}", cmd.get_program().to_string_lossy()))
}

fn failure_message(cmd: &Command, status: ExitStatus) -> String {
    let program = cmd.get_program().to_string_lossy();
    match status.code() {
        Some(code) => format!("The process '{program}' failed with exit code {code}"),
        None => format!("The process '{program}' was terminated by a signal"),
    }
}

pub fn format_command(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {args}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn build_command_passes_target_as_sole_argument() {
        let cmd = build_command(Path::new("/opt/vhs/vhs"), "demo.tape", None, None);
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, vec![OsStr::new("demo.tape")]);
        assert_eq!(cmd.get_current_dir(), None);
        assert_eq!(format_command(&cmd), "/opt/vhs/vhs demo.tape");
    }

    #[test]
    fn build_command_sets_cwd_and_env() {
        let mut vars = BTreeMap::new();
        vars.insert(OsString::from("COLORTERM"), OsString::from("truecolor"));
        let cmd = build_command(Path::new("vhs"), "demo.tape", Some("docs"), Some(&vars));
        assert_eq!(cmd.get_current_dir(), Some(Path::new("docs")));
        let envs: Vec<_> = cmd.get_envs().collect();
        assert_eq!(envs, vec![(OsStr::new("COLORTERM"), Some(OsStr::new("truecolor")))]);
    }

    #[test]
    fn empty_working_directory_is_ignored() {
        let cmd = build_command(Path::new("vhs"), "demo.tape", Some(""), None);
        assert_eq!(cmd.get_current_dir(), None);
    }

    #[cfg(unix)]
    #[test]
    fn execute_reports_non_zero_exit() {
        use std::os::unix::process::ExitStatusExt;

        let mut cmd = Command::new("vhs");
        cmd.arg("demo.tape");
        let err = execute(&mut cmd, |_| Ok(ExitStatus::from_raw(2 << 8))).unwrap_err();
        assert_eq!(err.to_string(), "The process 'vhs' failed with exit code 2");
    }

    #[cfg(unix)]
    #[test]
    fn spawn_and_wait_runs_real_process() {
        let mut ok = Command::new("sh");
        ok.arg("-c").arg("exit 0");
        execute(&mut ok, spawn_and_wait).unwrap();

        let mut failing = Command::new("sh");
        failing.arg("-c").arg("exit 7");
        let err = execute(&mut failing, spawn_and_wait).unwrap_err();
        assert!(err.to_string().contains("exit code 7"));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let mut cmd = Command::new("/definitely/not/a/binary");
        let err = execute(&mut cmd, spawn_and_wait).unwrap_err();
        assert!(err.to_string().contains("spawn /definitely/not/a/binary"));
    }
}
