//! Constants for board geometry, coordinate text and engine protocol timing.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
pub const N: usize = 19;

/// Total number of points on the board.
pub const BOARD_POINTS: usize = N * N;

/// Column letters used in coordinate text. 'I' is skipped to avoid confusion with 'J'.
pub const COL_NAMES: &[u8; N] = b"ABCDEFGHJKLMNOPQRST";

/// Star points (row, col) drawn as `+` on empty cells.
pub const STAR_POINTS: [(usize, usize); 9] = [
    (3, 3),
    (3, 9),
    (3, 15),
    (9, 3),
    (9, 9),
    (9, 15),
    (15, 3),
    (15, 9),
    (15, 15),
];

// =============================================================================
// Reserved Move Tokens
// =============================================================================

pub const PASS_TOKEN: &str = "pass";
pub const RESIGN_TOKEN: &str = "resign";

// =============================================================================
// Engine Protocol
// =============================================================================

/// Marker the engine prints on a successful reply.
pub const ACK_TOKEN: char = '=';

/// Marker the engine prints when it rejects a command.
pub const REJECT_TOKEN: char = '?';

/// Command written to the engine at shutdown.
pub const EXIT_COMMAND: &str = "exit";

/// Maximum number of ranked candidates extracted from a search.
pub const MAX_CANDIDATES: usize = 3;

/// Interval between queue polls while waiting for a reply.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default time to wait for a command acknowledgment.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(20);

/// Default time to wait for the first command after launch (network loading).
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between the exit command and terminating the process.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Back-off after a failed read before the reader tries again.
pub const READ_ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// Default komi.
pub const KOMI: f32 = 7.5;

/// Default per-move thinking time.
pub const TIME_PER_MOVE: Duration = Duration::from_secs(5);

/// Advisory lines kept from the latest search for candidate extraction.
pub const SEARCH_LOG_LINES: usize = 512;
