// ─── Child Process Orchestration ───
// Runs the relaunched game with inherited stdio, waits for it, and hands
// its exit code to the terminator.

use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info};

use super::arguments::ArgumentVector;
use crate::core::error::{RelaunchError, RelaunchResult};

/// Ends the parent once the child has exited.
pub trait Terminator {
    fn terminate(&self, code: i32);
}

/// Exits the current process with the child's code.
pub struct ProcessExitTerminator;

impl Terminator for ProcessExitTerminator {
    fn terminate(&self, code: i32) {
        info!("Relaunched process exited with {}, terminating parent", code);
        std::process::exit(code);
    }
}

/// Spawn the child, block until it exits, then call `terminator` once with
/// its exit code. Spawn and wait failures return before the terminator runs.
pub fn launch(args: ArgumentVector, terminator: &dyn Terminator) -> RelaunchResult<i32> {
    let Some((program, rest)) = args.as_slice().split_first() else {
        return Err(RelaunchError::Launch("empty argument vector".into()));
    };

    for (i, arg) in args.as_slice().iter().enumerate() {
        debug!("  [{:>3}] {}", i, arg);
    }
    debug!("Command (copy/paste): {}", args.to_command_line());

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    info!("Relaunching with {}", program);
    let mut child = cmd
        .spawn()
        .map_err(|e| RelaunchError::Launch(format!("unable to start {program}: {e}")))?;

    let status = child
        .wait()
        .map_err(|e| RelaunchError::Launch(format!("unable to wait for child: {e}")))?;

    let code = exit_code(status);
    info!("Child process {} exited with {}", child.id(), code);
    terminator.terminate(code);
    Ok(code)
}

/// Signal deaths carry no exit code; report them the way shells do.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recording(RefCell<Vec<i32>>);

    impl Terminator for Recording {
        fn terminate(&self, code: i32) {
            self.0.borrow_mut().push(code);
        }
    }

    fn vector(args: &[&str]) -> ArgumentVector {
        ArgumentVector::from(args.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[cfg(unix)]
    #[test]
    fn child_exit_code_reaches_terminator() {
        let terminator = Recording::default();
        let code = launch(vector(&["/bin/sh", "-c", "exit 42"]), &terminator).unwrap();

        assert_eq!(code, 42);
        assert_eq!(*terminator.0.borrow(), vec![42]);
    }

    #[cfg(unix)]
    #[test]
    fn signal_death_maps_to_shell_convention() {
        let terminator = Recording::default();
        let code = launch(vector(&["/bin/sh", "-c", "kill -9 $$"]), &terminator).unwrap();

        assert_eq!(code, 128 + 9);
        assert_eq!(*terminator.0.borrow(), vec![137]);
    }

    #[test]
    fn spawn_failure_skips_terminator() {
        let terminator = Recording::default();
        let err = launch(
            vector(&["/definitely/not/a/java/binary", "-version"]),
            &terminator,
        )
        .unwrap_err();

        assert!(matches!(err, RelaunchError::Launch(_)));
        assert!(terminator.0.borrow().is_empty());
    }

    #[test]
    fn empty_vector_is_rejected() {
        let terminator = Recording::default();
        assert!(launch(vector(&[]), &terminator).is_err());
        assert!(terminator.0.borrow().is_empty());
    }
}
