//! Resolved engine settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{COMMAND_TIMEOUT, KOMI, POLL_INTERVAL, STARTUP_TIMEOUT, TIME_PER_MOVE};

/// Everything needed to launch and drive an engine process.
///
/// Values are already resolved; nothing here reads files or the environment.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub executable: PathBuf,
    /// Network weights file, passed with `-w`.
    pub weights: Option<PathBuf>,
    /// Search threads, passed with `-t`. Zero leaves the engine default.
    pub threads: usize,
    /// GPU device ids, each passed with `--gpu`.
    pub gpus: Vec<u32>,
    /// Extra arguments appended verbatim.
    pub extra_args: Vec<String>,
    pub komi: f32,
    /// Thinking time per generated move.
    pub time_per_move: Duration,
    /// Timeout for the first command, while the engine loads.
    pub startup_timeout: Duration,
    pub command_timeout: Duration,
    pub poll_interval: Duration,
}

impl EngineConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            weights: None,
            threads: 0,
            gpus: Vec::new(),
            extra_args: Vec::new(),
            komi: KOMI,
            time_per_move: TIME_PER_MOVE,
            startup_timeout: STARTUP_TIMEOUT,
            command_timeout: COMMAND_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Command-line arguments for the engine process.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["--gtp".to_string()];
        if self.threads > 0 {
            args.push("-t".into());
            args.push(self.threads.to_string());
        }
        for gpu in &self.gpus {
            args.push("--gpu".into());
            args.push(gpu.to_string());
        }
        if let Some(w) = &self.weights {
            args.push("-w".into());
            args.push(w.display().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Commands sent once after launch.
    pub fn setup_commands(&self) -> Vec<String> {
        vec![
            format!("komi {:.1}", self.komi),
            format!("time_settings 0 {} 1", self.time_per_move.as_secs().max(1)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let cfg = EngineConfig::new("leelaz");
        assert_eq!(cfg.args(), vec!["--gtp"]);
    }

    #[test]
    fn test_full_args() {
        let mut cfg = EngineConfig::new("/opt/leelaz");
        cfg.threads = 4;
        cfg.gpus = vec![0, 1];
        cfg.weights = Some(PathBuf::from("network.gz"));
        cfg.extra_args = vec!["--noponder".into()];
        assert_eq!(
            cfg.args(),
            vec![
                "--gtp", "-t", "4", "--gpu", "0", "--gpu", "1", "-w", "network.gz", "--noponder"
            ]
        );
    }

    #[test]
    fn test_setup_commands() {
        let mut cfg = EngineConfig::new("leelaz");
        cfg.komi = 6.5;
        cfg.time_per_move = Duration::from_secs(10);
        assert_eq!(cfg.setup_commands(), vec!["komi 6.5", "time_settings 0 10 1"]);
    }
}
