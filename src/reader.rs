//! Background line readers for the engine's output streams.
//!
//! Each reader owns one stream and a thread that reads it line by line into a
//! FIFO queue. The consumer side only ever polls: [`StreamReader::readline`]
//! and [`StreamReader::read_all_lines`] never block.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::constants::READ_ERROR_BACKOFF;

/// Reads one stream on a background thread into a queue of lines.
pub struct StreamReader {
    name: &'static str,
    queue: Receiver<String>,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StreamReader {
    /// Start reading `stream` on a new thread.
    ///
    /// `name` only labels log output.
    pub fn spawn<R>(name: &'static str, stream: R) -> std::io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        let handle = thread::Builder::new()
            .name(format!("{name}-reader"))
            .spawn(move || read_loop(name, BufReader::new(stream), tx, flag))?;
        debug!(stream = name, "reader started");
        Ok(Self {
            name,
            queue: rx,
            stopped,
            handle: Some(handle),
        })
    }

    /// Next queued line, or `None` if nothing is queued right now.
    pub fn readline(&self) -> Option<String> {
        match self.queue.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain every line currently queued.
    pub fn read_all_lines(&self) -> Vec<String> {
        self.queue.try_iter().collect()
    }

    /// Ask the reader thread to stop after its current read.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// True once the reader thread has exited, either stopped or at end of stream.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the reader and wait up to `grace` for its thread to exit.
    ///
    /// A thread still blocked in a read when the grace period runs out is
    /// detached. Returns true if the thread was joined.
    pub fn join(&mut self, grace: Duration) -> bool {
        self.stop();
        let Some(handle) = self.handle.take() else {
            return true;
        };
        let deadline = Instant::now() + grace;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        if handle.is_finished() {
            if handle.join().is_err() {
                warn!(stream = self.name, "reader thread panicked");
            }
            true
        } else {
            debug!(stream = self.name, "reader still blocked in read, detaching");
            false
        }
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop<R: BufRead>(
    name: &'static str,
    mut stream: R,
    queue: Sender<String>,
    stopped: Arc<AtomicBool>,
) {
    let mut buf = Vec::new();
    while !stopped.load(Ordering::Relaxed) {
        buf.clear();
        match stream.read_until(b'\n', &mut buf) {
            Ok(0) => {
                debug!(stream = name, "end of stream");
                break;
            }
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    continue;
                }
                if queue.send(line.to_string()).is_err() {
                    // Consumer dropped.
                    break;
                }
            }
            Err(e) => {
                warn!(stream = name, error = %e, "read error");
                thread::sleep(READ_ERROR_BACKOFF);
            }
        }
    }
    debug!(stream = name, "reader exiting");
}
