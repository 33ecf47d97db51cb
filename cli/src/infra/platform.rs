//! Infrastructure implementation of the platform process ports.
//!
//! The platform's stdout and stderr share one pipe, so lines arrive in the
//! order the platform emitted them. A blocking reader forwards each line
//! through a channel to a single writer task, which appends it to the
//! platform log and mirrors it to the console, flushing after each line.

use std::io::{BufRead, BufReader, Read};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::ports::{PlatformLaunch, PlatformLauncher, PlatformProcess};
use crate::infra::command_runner::ChildEnv;

/// Lines buffered between the output reader and the log writer.
const PUMP_CAPACITY: usize = 1024;

/// How long to keep draining output after the platform exits. Agents that
/// inherited the platform's pipes can hold them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Spawns the platform with tokio and tees its output.
pub struct TokioPlatformLauncher {
    env: ChildEnv,
    mirror_to_console: bool,
}

impl TokioPlatformLauncher {
    #[must_use]
    pub fn new(env: ChildEnv) -> Self {
        Self {
            env,
            mirror_to_console: true,
        }
    }

    /// Keep platform output out of the console (log file only).
    #[must_use]
    pub fn log_only(mut self) -> Self {
        self.mirror_to_console = false;
        self
    }
}

impl PlatformLauncher for TokioPlatformLauncher {
    type Process = PlatformChild;

    fn launch(&self, spec: &PlatformLaunch<'_>) -> Result<PlatformChild> {
        if let Some(parent) = spec.log_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let log = std::fs::File::create(spec.log_path)
            .with_context(|| format!("creating platform log {}", spec.log_path.display()))?;

        let (reader, writer) = std::io::pipe().context("creating platform output pipe")?;
        let stderr = writer.try_clone().context("cloning platform output pipe")?;

        // No kill_on_drop: the platform outlives an orchestrator that dies mid-run.
        let mut cmd = Command::new(spec.program);
        cmd.args(spec.args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr);
        self.env.apply(&mut cmd);

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", spec.program.display()))?;
        // The command holds the parent's copies of the write end; the reader
        // only sees EOF once they are closed.
        drop(cmd);
        tracing::info!(pid = ?child.id(), "platform process spawned");

        let (tx, rx) = mpsc::channel(PUMP_CAPACITY);
        tokio::task::spawn_blocking(move || forward_lines(reader, &tx));

        let console = self.mirror_to_console.then(tokio::io::stdout);
        let pump = tokio::spawn(write_lines(rx, tokio::fs::File::from_std(log), console));

        Ok(PlatformChild { child, pump })
    }
}

/// A running platform and the task writing its log.
#[derive(Debug)]
pub struct PlatformChild {
    child: Child,
    pump: JoinHandle<Result<u64>>,
}

impl PlatformProcess for PlatformChild {
    fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.child.try_wait().context("checking platform process")
    }

    async fn wait(mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await.context("waiting for platform")?;

        match tokio::time::timeout(DRAIN_GRACE, self.pump).await {
            Ok(joined) => {
                let lines = joined.context("platform output pump panicked")??;
                tracing::debug!(lines, "platform output drained");
            }
            Err(_) => tracing::warn!("platform output still open after exit; log may be incomplete"),
        }
        Ok(status)
    }
}

/// Read `reader` line by line into the channel until EOF. Runs on a
/// blocking thread.
fn forward_lines<R: Read>(reader: R, tx: &mpsc::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "reading platform output failed");
                break;
            }
        }
    }
}

/// Sole writer of the platform log. Returns the number of lines written.
async fn write_lines<W, C>(mut rx: mpsc::Receiver<String>, mut log: W, mut console: Option<C>) -> Result<u64>
where
    W: AsyncWrite + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut count = 0;
    while let Some(mut line) = rx.recv().await {
        if !line.ends_with('\n') {
            line.push('\n');
        }
        log.write_all(line.as_bytes()).await.context("writing platform log")?;
        log.flush().await.context("flushing platform log")?;

        if let Some(out) = console.as_mut() {
            // A closed console must not stop the log.
            if out.write_all(line.as_bytes()).await.is_err() || out.flush().await.is_err() {
                console = None;
            }
        }
        count += 1;
    }
    Ok(count)
}
