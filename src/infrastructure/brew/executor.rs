use super::command::{BrewCommand, parse_lines};
use super::error::BrewError;
use crate::domain::repositories::CommandRunner;
use crate::domain::services::{OutputSink, OutputStream};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

const READ_CHUNK_SIZE: usize = 1024;

/// Streams a subprocess' stdout and stderr to an [`OutputSink`] while it runs.
///
/// Three tasks run per command: one waits for the exit status, two drain the
/// pipes. `run` joins all three before returning, so every byte has been handed
/// to the sink by the time the caller sees the result.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    brew: BrewCommand,
}

impl CommandExecutor {
    pub fn new(brew: BrewCommand) -> Self {
        Self { brew }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self::new(BrewCommand::new(program))
    }
}

async fn forward<R>(mut reader: R, stream: OutputStream, sink: Arc<dyn OutputSink>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                sink.append(stream, &chunk);
                sink.scroll_to_end();
            }
            Err(e) => {
                tracing::warn!("Error reading {:?} pipe: {}", stream, e);
                sink.append(stream, &format!("\nError: {}\n", e));
                sink.scroll_to_end();
                break;
            }
        }
    }
}

#[async_trait]
impl CommandRunner for CommandExecutor {
    async fn run(&self, args: &[String], sink: Arc<dyn OutputSink>) -> Result<()> {
        let command = format!("{} {}", self.brew.program(), args.join(" "));
        tracing::info!("Executing: {}", command);

        let mut child = Command::new(self.brew.program())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BrewError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout pipe missing for {}", command))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr pipe missing for {}", command))?;

        let waiter = tokio::spawn(async move { child.wait().await });
        let stdout_task = tokio::spawn(forward(stdout, OutputStream::Stdout, Arc::clone(&sink)));
        let stderr_task = tokio::spawn(forward(stderr, OutputStream::Stderr, Arc::clone(&sink)));

        let (status, stdout_done, stderr_done) = tokio::join!(waiter, stdout_task, stderr_task);
        stdout_done?;
        stderr_done?;
        let status = status??;

        if status.success() {
            tracing::debug!("{} finished successfully", command);
            Ok(())
        } else {
            tracing::warn!("{} exited with {}", command, status);
            Err(BrewError::ExitStatus {
                command,
                status: status.to_string(),
            }
            .into())
        }
    }

    async fn is_tap_installed(&self, tap: &str) -> bool {
        match self.brew.execute_text(&BrewCommand::tap_list_args()).await {
            Ok(output) => parse_lines(&output).iter().any(|t| t == tap),
            Err(e) => {
                tracing::warn!("Could not list taps: {}", e);
                false
            }
        }
    }
}
