use std::borrow::Cow;
use std::collections::HashMap;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// One stdout line without its terminator. Invalid UTF-8 is replaced, not
/// treated as a failure.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

/// Run `line` through the platform shell, calling `on_line` for each stdout
/// line as it arrives. A non-zero exit status is an error carrying the last
/// stderr line.
pub async fn run<F>(line: &str, envs: &HashMap<String, String>, mut on_line: F) -> Result<CommandOutput>
where
    F: FnMut(&str),
{
    debug!(command = %line, "shell::run");
    let mut child = shell_command(line)
        .envs(envs)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn `{line}`"))?;

    let mut stderr_pipe = child.stderr.take().context("stderr not captured")?;
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let stdout_pipe = child.stdout.take().context("stdout not captured")?;
    let mut reader = BufReader::new(stdout_pipe);
    let mut raw = Vec::new();
    let mut stdout = String::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            break;
        }
        let text = decode_line(&raw);
        on_line(&text);
        stdout.push_str(&text);
        stdout.push('\n');
    }

    let status = child.wait().await?;
    let stderr = match stderr_task.await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => format!("<stderr unreadable: {e}>"),
        Err(e) => format!("<stderr reader failed: {e}>"),
    };
    debug!(command = %line, ?status, "shell::run: exited");

    if !status.success() {
        let detail = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no output");
        match status.code() {
            Some(code) => bail!("`{line}` exited with status {code}: {detail}"),
            None => bail!("`{line}` was terminated by a signal: {detail}"),
        }
    }

    Ok(CommandOutput { stdout, stderr })
}
