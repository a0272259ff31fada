//! Go Text Protocol (GTP) client for an external engine process.
//!
//! The engine runs as a child process. Commands go to its stdin one line at a
//! time; replies arrive on stdout, where a line containing `=` acknowledges a
//! command and a line starting with `?` rejects it. Search progress arrives
//! unsolicited on stderr and feeds the live [`AnalysisSnapshot`] and the
//! candidate list.
//!
//! Both output streams are drained by [`StreamReader`] threads; this client
//! only polls their queues at a fixed interval, so no call here ever blocks on
//! the engine beyond its own timeout.
//!
//! ## Example
//!
//! ```ignore
//! use leelay::config::EngineConfig;
//! use leelay::gtp::ProtocolClient;
//! let mut client = ProtocolClient::new(EngineConfig::new("./leelaz"));
//! client.start()?;
//! let reply = client.command("name")?;
//! client.stop();
//! ```

use std::collections::VecDeque;
use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisSnapshot, Candidate, extract_candidates, parse_analysis_line};
use crate::board::{Color, Point};
use crate::config::EngineConfig;
use crate::constants::{ACK_TOKEN, EXIT_COMMAND, REJECT_TOKEN, SEARCH_LOG_LINES, SHUTDOWN_GRACE};
use crate::position::Move;
use crate::reader::StreamReader;

/// Failures talking to the engine.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("engine is not running")]
    NotRunning,
    #[error("failed to launch engine: {0}")]
    Spawn(#[source] io::Error),
    #[error("failed to write to engine: {0}")]
    Write(#[source] io::Error),
    #[error("engine connection lost; restart required")]
    Disconnected,
    #[error("no reply to '{command}' after {waited:?}")]
    Timeout { command: String, waited: Duration },
    #[error("engine rejected '{command}': {reply}")]
    Rejected { command: String, reply: String },
    #[error("unexpected reply: {0}")]
    BadReply(String),
}

/// A running engine process and its two stream readers.
struct EngineSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: StreamReader,
    stderr: StreamReader,
}

/// Live evaluation built from the engine's stderr.
#[derive(Debug, Default)]
struct LiveAnalysis {
    snapshot: AnalysisSnapshot,
    /// Stderr lines since the latest move search started.
    search_lines: VecDeque<String>,
}

impl LiveAnalysis {
    fn observe(&mut self, line: String) {
        if let Some(snapshot) = parse_analysis_line(&line) {
            self.snapshot = snapshot;
        }
        if self.search_lines.len() == SEARCH_LOG_LINES {
            self.search_lines.pop_front();
        }
        self.search_lines.push_back(line);
    }
}

/// Client side of a GTP session with a child engine process.
///
/// Lifecycle is `start` → active → `stop`. A failed write marks the session
/// broken; every later command fails with [`ProtocolError::Disconnected`]
/// until `start` is called again.
pub struct ProtocolClient {
    config: EngineConfig,
    session: Option<EngineSession>,
    broken: bool,
    live: LiveAnalysis,
}

impl ProtocolClient {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            session: None,
            broken: false,
            live: LiveAnalysis::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some() && !self.broken
    }

    /// Launch the configured engine and send the session setup commands.
    pub fn start(&mut self) -> Result<(), ProtocolError> {
        let mut command = Command::new(&self.config.executable);
        command.args(self.config.args());
        info!(
            executable = %self.config.executable.display(),
            args = ?self.config.args(),
            "starting engine"
        );
        self.launch(command)?;

        // The first reply waits for the engine to load its network.
        let mut timeout = self.config.startup_timeout;
        for cmd in self.config.setup_commands() {
            self.send_command(&cmd, 1, true, timeout)?;
            timeout = self.config.command_timeout;
        }
        Ok(())
    }

    /// Spawn `command` as the engine with piped stdio and start both readers.
    ///
    /// Any previous session is stopped first. No setup commands are sent.
    pub fn launch(&mut self, mut command: Command) -> Result<(), ProtocolError> {
        self.stop();
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ProtocolError::Spawn)?;

        let missing =
            |what: &str| ProtocolError::Spawn(io::Error::other(format!("{what} not captured")));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let out = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let err = child.stderr.take().ok_or_else(|| missing("stderr"))?;
        let stdout = StreamReader::spawn("stdout", out).map_err(ProtocolError::Spawn)?;
        let stderr = StreamReader::spawn("stderr", err).map_err(ProtocolError::Spawn)?;

        debug!(pid = child.id(), "engine launched");
        self.session = Some(EngineSession {
            child,
            stdin: Some(stdin),
            stdout,
            stderr,
        });
        self.broken = false;
        self.live = LiveAnalysis::default();
        Ok(())
    }

    /// Send a command with the default timeout and wait for one acknowledgment.
    pub fn command(&mut self, cmd: &str) -> Result<String, ProtocolError> {
        let timeout = self.config.command_timeout;
        self.send_command(cmd, 1, true, timeout)
    }

    /// Send `cmd` and poll stdout until `expected_acks` lines containing `=`
    /// have been seen or `timeout` passes.
    ///
    /// Returns the last acknowledging line. With `drain`, output still queued
    /// after the final acknowledgment is discarded. A crashed engine is not
    /// detected separately; it shows up as a timeout.
    pub fn send_command(
        &mut self,
        cmd: &str,
        expected_acks: usize,
        drain: bool,
        timeout: Duration,
    ) -> Result<String, ProtocolError> {
        self.write_line(cmd)?;
        debug!(command = cmd, expected_acks, "command sent");

        let poll = self.config.poll_interval;
        let started = Instant::now();
        let mut acks = 0;
        loop {
            thread::sleep(poll);
            let session = self.session.as_mut().ok_or(ProtocolError::NotRunning)?;
            for line in session.stderr.read_all_lines() {
                self.live.observe(line);
            }
            while let Some(line) = session.stdout.readline() {
                if line.starts_with(REJECT_TOKEN) {
                    warn!(command = cmd, reply = %line, "command rejected");
                    return Err(ProtocolError::Rejected {
                        command: cmd.to_string(),
                        reply: line,
                    });
                }
                if !line.contains(ACK_TOKEN) {
                    continue;
                }
                acks += 1;
                if acks >= expected_acks {
                    if drain {
                        session.stdout.read_all_lines();
                    }
                    debug!(command = cmd, reply = %line, "acknowledged");
                    return Ok(line);
                }
            }
            let waited = started.elapsed();
            if waited >= timeout {
                warn!(command = cmd, ?waited, acks, "command timed out");
                return Err(ProtocolError::Timeout {
                    command: cmd.to_string(),
                    waited,
                });
            }
        }
    }

    /// Ask the engine to pick a move for `color`, waiting up to twice
    /// `time_limit` for the reply.
    ///
    /// Stderr lines seen while waiting are kept for [`Self::candidates`].
    pub fn generate_move(&mut self, color: Color, time_limit: Duration) -> Result<Move, ProtocolError> {
        let cmd = format!("genmove {}", color.gtp_name());
        // Output still queued from an earlier search must not count for this one.
        self.refresh();
        self.live.search_lines.clear();
        self.write_line(&cmd)?;
        debug!(command = %cmd, "move requested");

        let poll = self.config.poll_interval;
        let limit = time_limit * 2;
        let started = Instant::now();
        loop {
            thread::sleep(poll);
            let session = self.session.as_mut().ok_or(ProtocolError::NotRunning)?;
            for line in session.stderr.read_all_lines() {
                self.live.observe(line);
            }
            while let Some(line) = session.stdout.readline() {
                if line.starts_with(REJECT_TOKEN) {
                    return Err(ProtocolError::Rejected {
                        command: cmd,
                        reply: line,
                    });
                }
                if line.contains(ACK_TOKEN) {
                    for late in session.stderr.read_all_lines() {
                        self.live.observe(late);
                    }
                    let mv = parse_move_reply(&line)?;
                    info!(color = %color, mv = %mv, "engine move");
                    return Ok(mv);
                }
            }
            let waited = started.elapsed();
            if waited >= limit {
                warn!(command = %cmd, ?waited, "move generation timed out");
                return Err(ProtocolError::Timeout {
                    command: cmd,
                    waited,
                });
            }
        }
    }

    /// Ranked candidates from the latest move search, strongest first.
    pub fn candidates(&self) -> Vec<Candidate> {
        let lines: Vec<&str> = self.live.search_lines.iter().map(String::as_str).collect();
        extract_candidates(&lines)
    }

    /// Points of the ranked candidates, for highlighting on the board.
    pub fn recommendations(&self) -> Vec<Point> {
        self.candidates().iter().filter_map(|c| c.mv.point()).collect()
    }

    /// The latest live evaluation.
    pub fn analysis(&self) -> AnalysisSnapshot {
        self.live.snapshot
    }

    /// Fold any queued stderr output into the live evaluation without sending anything.
    pub fn refresh(&mut self) {
        if let Some(session) = self.session.as_mut() {
            for line in session.stderr.read_all_lines() {
                self.live.observe(line);
            }
        }
    }

    /// Shut the engine down. Safe to call repeatedly.
    ///
    /// Readers are signalled to stop, `exit` is written on a best-effort
    /// basis, and the process is killed if it is still alive after a short
    /// grace period.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        info!("stopping engine");
        session.stdout.stop();
        session.stderr.stop();

        if let Some(mut stdin) = session.stdin.take() {
            if let Err(e) = writeln!(stdin, "{EXIT_COMMAND}").and_then(|()| stdin.flush()) {
                debug!(error = %e, "exit command not delivered");
            }
        }

        thread::sleep(SHUTDOWN_GRACE);
        match session.child.try_wait() {
            Ok(Some(status)) => debug!(%status, "engine exited"),
            _ => {
                if let Err(e) = session.child.kill() {
                    debug!(error = %e, "kill failed");
                }
                if let Err(e) = session.child.wait() {
                    debug!(error = %e, "wait failed");
                }
            }
        }

        session.stdout.join(SHUTDOWN_GRACE);
        session.stderr.join(SHUTDOWN_GRACE);
        self.broken = false;
    }

    fn write_line(&mut self, text: &str) -> Result<(), ProtocolError> {
        if self.broken {
            return Err(ProtocolError::Disconnected);
        }
        let session = self.session.as_mut().ok_or(ProtocolError::NotRunning)?;
        let stdin = session.stdin.as_mut().ok_or(ProtocolError::NotRunning)?;
        if let Err(e) = writeln!(stdin, "{text}").and_then(|()| stdin.flush()) {
            warn!(command = text, error = %e, "engine write failed");
            self.broken = true;
            return Err(ProtocolError::Write(e));
        }
        Ok(())
    }
}

impl Drop for ProtocolClient {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parse the vertex from a `genmove` reply such as `= D4` or `=7 resign`.
fn parse_move_reply(line: &str) -> Result<Move, ProtocolError> {
    let (_, rest) = line
        .split_once(ACK_TOKEN)
        .ok_or_else(|| ProtocolError::BadReply(line.to_string()))?;
    rest.split_whitespace()
        .last()
        .and_then(|tok| tok.parse().ok())
        .ok_or_else(|| ProtocolError::BadReply(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_reply() {
        assert_eq!(
            parse_move_reply("= D4").unwrap(),
            Move::Play(Point::new(15, 3))
        );
        assert_eq!(parse_move_reply("=12 Q16").unwrap(), Move::Play(Point::new(3, 15)));
        assert_eq!(parse_move_reply("= pass").unwrap(), Move::Pass);
        assert_eq!(parse_move_reply("= resign").unwrap(), Move::Resign);
    }

    #[test]
    fn test_parse_move_reply_rejects_garbage() {
        assert!(matches!(parse_move_reply("= "), Err(ProtocolError::BadReply(_))));
        assert!(matches!(parse_move_reply("= Z99"), Err(ProtocolError::BadReply(_))));
    }

    #[test]
    fn test_commands_fail_before_start() {
        let mut client = ProtocolClient::new(EngineConfig::new("leelaz"));
        assert!(!client.is_running());
        assert!(matches!(client.command("name"), Err(ProtocolError::NotRunning)));
        assert!(matches!(
            client.generate_move(Color::Black, Duration::from_millis(10)),
            Err(ProtocolError::NotRunning)
        ));
        // Stopping a client that never started is a no-op.
        client.stop();
        client.stop();
    }

    #[test]
    fn test_live_analysis_keeps_latest_snapshot() {
        let mut live = LiveAnalysis::default();
        live.observe("info move D4 visits 10 winrate 60".to_string());
        live.observe("D4 -> 10 (W: 60.00%)".to_string());
        live.observe("info move Q16 visits 30 winrate 40".to_string());
        assert_eq!(live.snapshot.playouts, 30);
        assert!((live.snapshot.winrate - 0.4).abs() < 1e-9);
        assert_eq!(live.search_lines.len(), 3);
    }

    #[test]
    fn test_live_analysis_bounds_search_log() {
        let mut live = LiveAnalysis::default();
        for i in 0..SEARCH_LOG_LINES + 10 {
            live.observe(format!("line {i}"));
        }
        assert_eq!(live.search_lines.len(), SEARCH_LOG_LINES);
        assert_eq!(live.search_lines.front().map(String::as_str), Some("line 10"));
    }
}
