//! Shared plumbing for ports backed by an external program.
//!
//! The payload goes in on stdin, the answer comes back on stdout. A non-zero
//! exit status is a port failure carrying the tail of stderr. With a time
//! limit set, a program still running at the limit is killed and reaped.

#![allow(missing_docs)]

use std::io::{Read, Write as _};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// External program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub time_limit: Option<Duration>,
}

/// Longest stderr excerpt carried into an error message, in characters.
const STDERR_TAIL_CHARS: usize = 400;

/// How often a time-limited run checks whether the child has exited.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl ExternalCommand {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            envs: Vec::new(),
            time_limit: None,
        }
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Kill the program if it is still running after `limit`.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Run the program with `input` on stdin and return stdout as UTF-8.
    ///
    /// Errors are plain strings; each port wraps them in its own error kind.
    pub fn run(&self, input: &[u8]) -> Result<String, String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| format!("failed to start {}: {err}", self.program))?;

        // Stdin is fed and both output pipes are drained on their own threads
        // so a child blocked on a full pipe cannot deadlock against us.
        let writer = child.stdin.take().map(|mut stdin| {
            let payload = input.to_vec();
            thread::spawn(move || stdin.write_all(&payload))
        });
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait(&mut child)?;
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // The program may legitimately exit without reading everything.
                Ok(Err(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(err)) => return Err(format!("failed to write to {}: {err}", self.program)),
                Err(_) => return Err(format!("stdin writer for {} panicked", self.program)),
            }
        }

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let trimmed = stderr.trim();
            let tail_start = trimmed
                .char_indices()
                .rev()
                .nth(STDERR_TAIL_CHARS - 1)
                .map_or(0, |(idx, _)| idx);
            return Err(format!(
                "{} exited with {status}: {}",
                self.program,
                &trimmed[tail_start..]
            ));
        }

        String::from_utf8(stdout)
            .map_err(|err| format!("{} wrote non-UTF-8 output: {err}", self.program))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, String> {
        let wait_err = |err: std::io::Error| format!("failed to wait for {}: {err}", self.program);
        let Some(limit) = self.time_limit else {
            return child.wait().map_err(wait_err);
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // Already-exited races surface as an error from kill; reap regardless.
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(program = %self.program, ?limit, "killed external port program");
                return Err(format!(
                    "{} was killed after running longer than {}s",
                    self.program,
                    limit.as_secs_f64()
                ));
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error ends the capture; whatever arrived is still reported.
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
