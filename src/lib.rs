//! Leelay: play Go against an external GTP engine.
//!
//! The crate keeps its own board in sync with an engine process, so moves can
//! be played, undone and generated while the engine's live evaluation is read
//! alongside.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and protocol timing
//! - [`board`] - Board state, groups and capture resolution
//! - [`history`] - Board snapshots for undo
//! - [`position`] - Moves, coordinate text and the color to move
//! - [`reader`] - Non-blocking line readers over process output
//! - [`analysis`] - Parsing of engine search reports
//! - [`config`] - Resolved engine settings
//! - [`gtp`] - GTP client managing the engine process
//! - [`game`] - Controller sequencing local play and the engine
//!
//! ## Example
//!
//! ```
//! use leelay::game::Game;
//! use leelay::gtp::ProtocolClient;
//!
//! // A game without an engine attached
//! let mut game: Game<ProtocolClient> = Game::new(None);
//! game.play_move("D4".parse().unwrap()).unwrap();
//! assert_eq!(game.status(), "white's turn");
//! game.undo().unwrap();
//! assert!(game.board().is_clear());
//! ```

pub mod analysis;
pub mod board;
pub mod config;
pub mod constants;
pub mod game;
pub mod gtp;
pub mod history;
pub mod position;
pub mod reader;
