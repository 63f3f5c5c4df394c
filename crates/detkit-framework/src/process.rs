//! Child process plumbing for the framework driver.

use std::ffi::OsStr;
use std::future::Future;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::error::FrameworkError;

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<String>,
}

/// Runs `program`, echoing each stdout line to the console as it arrives.
///
/// stderr is inherited so the framework's progress bars render in place.
pub async fn run_streaming<S: AsRef<OsStr>>(
    program: &OsStr,
    args: &[S],
) -> Result<ProcessOutput, FrameworkError> {
    let spawn_err = |source: std::io::Error| FrameworkError::Process {
        program: program.to_string_lossy().into_owned(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_err)?;
    debug!(program = %program.to_string_lossy(), pid = child.id(), "spawned framework process");

    let mut captured = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await.map_err(spawn_err)? {
            println!("{line}");
            captured.push(line);
        }
    }

    let status = child.wait().await.map_err(spawn_err)?;
    debug!(%status, lines = captured.len(), "framework process exited");
    Ok(ProcessOutput {
        status,
        stdout: captured,
    })
}

/// Drives `fut` to completion from synchronous code.
///
/// On a multi-threaded runtime the current worker is handed over with
/// `block_in_place`. Elsewhere a private current-thread runtime is used.
pub fn block_on<F>(fut: F) -> Result<F::Output, FrameworkError>
where
    F: Future + Send,
    F::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
        }
        // A current-thread runtime cannot be blocked from inside; run beside it.
        Ok(_) => std::thread::scope(|scope| {
            match scope.spawn(|| run_private(fut)).join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }),
        Err(_) => run_private(fut),
    }
}

fn run_private<F: Future>(fut: F) -> Result<F::Output, FrameworkError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(FrameworkError::Runtime)?;
    Ok(rt.block_on(fut))
}
