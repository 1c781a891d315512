//! Child process execution with a timeout and bounded output capture.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub timed_out: bool,
}

/// Run `cmd`, feeding `stdin`, and capture its output.
///
/// stdin is written on its own thread and stdout/stderr are drained on reader
/// threads while the child runs, so neither side can block on a full pipe and
/// the timeout always applies. Bytes beyond `output_limit_bytes` are drained but
/// discarded. On timeout the child is killed and `timed_out` is set.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: &[u8],
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    match supervise(&mut child, stdin.to_vec(), timeout, output_limit_bytes) {
        Ok(output) => Ok(output),
        Err(err) => {
            warn!(err = %err, "command failed, killing");
            // Best effort: the child may already have exited.
            let _ = child.kill();
            let _ = child.wait();
            Err(err)
        }
    }
}

fn supervise(
    child: &mut Child,
    input: Vec<u8>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let mut child_stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));
    // Dropping the handle at the end of the thread gives the child EOF.
    let stdin_handle = thread::spawn(move || child_stdin.write_all(&input));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    match stdin_handle.join() {
        Ok(Ok(())) => {}
        // A child that exits (or is killed) without reading all of stdin.
        Ok(Err(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("child closed stdin early");
        }
        Ok(Err(err)) => return Err(err).context("write stdin"),
        Err(_) => return Err(anyhow!("stdin writer thread panicked")),
    }

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, _) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 {
        warn!(stdout_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_from_stdin() {
        let output = run_command_with_timeout(
            Command::new("cat"),
            b"hello",
            Duration::from_secs(5),
            1024,
        )
        .expect("run cat");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello");
        assert!(!output.timed_out);
    }

    #[test]
    fn truncates_beyond_limit() {
        let output =
            run_command_with_timeout(Command::new("cat"), b"abcdef", Duration::from_secs(5), 4)
                .expect("run cat");
        assert_eq!(output.stdout, b"abcd");
        assert_eq!(output.stdout_truncated, 2);
    }

    #[test]
    fn large_input_through_echoing_child_returns() {
        let input = vec![b'a'; 1 << 20];
        let output =
            run_command_with_timeout(Command::new("cat"), &input, Duration::from_secs(10), 1024)
                .expect("run cat");
        assert!(output.status.success());
        assert!(!output.timed_out);
        assert_eq!(output.stdout.len(), 1024);
        assert_eq!(output.stdout_truncated, input.len() - 1024);
    }

    #[test]
    fn child_ignoring_stdin_is_not_an_error() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo done"]);
        let input = vec![b'x'; 1 << 20];
        let output = run_command_with_timeout(cmd, &input, Duration::from_secs(10), 1024)
            .expect("run sh");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"done\n");
    }

    #[test]
    fn kills_on_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let output = run_command_with_timeout(cmd, b"", Duration::from_millis(100), 1024)
            .expect("run sleep");
        assert!(output.timed_out);
        assert!(!output.status.success());
    }
}
