//! Shell command execution for dependency installation
//!
//! Two ways to run work for an asynchronous wizard step:
//! - [`launch`] spawns a shell and returns immediately (fire-and-forget)
//! - [`run_with_output`] runs to completion, streaming output lines

use anyhow::Result;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tokio::time::timeout;

/// Upper bound for a single install command
const COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Lines of output kept for error reports
const ERROR_TAIL_LINES: usize = 10;

/// Join several commands into one `sh -c` script that stops at the first failure
pub fn chain(commands: &[String]) -> String {
    commands.join(" && ")
}

fn shell(command: &str, cwd: &Path) -> TokioCommand {
    let mut cmd = TokioCommand::new("sh");
    cmd.arg("-c").arg(command).current_dir(cwd);
    cmd
}

/// Spawn a command without waiting for it.
///
/// Only spawn errors are reported; the exit status is never inspected.
pub fn launch(command: &str, cwd: &Path) -> std::io::Result<Child> {
    log::debug!("launching `{}` in {}", command, cwd.display());
    shell(command, cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

/// Run a command to completion, passing each output line to `on_line`.
///
/// A non-zero exit status becomes an error carrying the last lines of output.
pub async fn run_with_output<F>(command: &str, cwd: &Path, mut on_line: F) -> Result<()>
where
    F: FnMut(&str),
{
    log::debug!("running `{}` in {}", command, cwd.display());

    let mut child = shell(command, cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("Failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("Failed to capture stderr"))?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(ERROR_TAIL_LINES);

    let output_task = async {
        let (mut stdout_open, mut stderr_open) = (true, true);
        while stdout_open || stderr_open {
            let line = tokio::select! {
                line = stdout_reader.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => Some(line),
                    _ => { stdout_open = false; None }
                },
                line = stderr_reader.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => Some(line),
                    _ => { stderr_open = false; None }
                },
            };
            if let Some(line) = line {
                on_line(&line);
                if tail.len() == ERROR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    };

    if timeout(COMMAND_TIMEOUT, output_task).await.is_err() {
        let _ = child.kill().await;
        anyhow::bail!(
            "`{}` timed out after {} seconds",
            command,
            COMMAND_TIMEOUT.as_secs()
        );
    }

    match timeout(Duration::from_secs(5), child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => {
            let output = tail.into_iter().collect::<Vec<_>>().join("\n");
            anyhow::bail!(
                "`{}` exited with code {}{}",
                command,
                status.code().unwrap_or(-1),
                if output.is_empty() {
                    String::new()
                } else {
                    format!(":\n{}", output)
                }
            );
        }
        Ok(Err(e)) => anyhow::bail!("Failed to wait for `{}`: {}", command, e),
        Err(_) => {
            let _ = child.kill().await;
            anyhow::bail!("`{}` hung after closing its output", command);
        }
    }
}
