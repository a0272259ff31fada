//! Game controller.
//!
//! Owns the [`Position`] and, optionally, an engine. Every user-visible
//! operation mutates the local position first and then mirrors the move to the
//! engine so both sides agree on the game. Moves the engine generated itself
//! are not sent back to it.

use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Board, Color, MoveError, Point};
use crate::gtp::ProtocolError;
use crate::position::{Move, Position};

/// What the controller needs from a move-generation engine.
pub trait Engine {
    /// Tell the engine `color` played `mv`.
    fn play(&mut self, color: Color, mv: Move) -> Result<(), ProtocolError>;
    /// Take back the engine's latest move.
    fn undo(&mut self) -> Result<(), ProtocolError>;
    /// Reset the engine to an empty board.
    fn clear_board(&mut self) -> Result<(), ProtocolError>;
    /// Ask the engine for a move for `color`. The engine plays it on its own board.
    fn genmove(&mut self, color: Color) -> Result<Move, ProtocolError>;
}

impl Engine for crate::gtp::ProtocolClient {
    fn play(&mut self, color: Color, mv: Move) -> Result<(), ProtocolError> {
        self.command(&format!("play {} {mv}", color.gtp_name()))
            .map(drop)
    }

    fn undo(&mut self) -> Result<(), ProtocolError> {
        self.command("undo").map(drop)
    }

    fn clear_board(&mut self) -> Result<(), ProtocolError> {
        self.command("clear_board").map(drop)
    }

    fn genmove(&mut self, color: Color) -> Result<Move, ProtocolError> {
        let time_limit = self.config().time_per_move;
        self.generate_move(color, time_limit)
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("no engine attached")]
    NoEngine,
}

/// A move applied while replaying a game record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub color: Color,
    pub mv: Move,
    /// Simple-ko point created by the move, if any.
    pub ko: Option<Point>,
}

/// Sequences play, undo, pass, engine moves and record replay.
pub struct Game<E = crate::gtp::ProtocolClient> {
    position: Position,
    engine: Option<E>,
}

impl<E: Engine> Game<E> {
    /// A new game. Without an engine every operation except
    /// [`Game::generate_move`] still works locally.
    pub fn new(engine: Option<E>) -> Self {
        Self {
            position: Position::new(),
            engine,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn board(&self) -> &Board {
        &self.position.board
    }

    pub fn next_player(&self) -> Color {
        self.position.next
    }

    /// Status line for the UI, e.g. "black's turn".
    pub fn status(&self) -> String {
        format!("{}'s turn", self.position.next)
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    /// Detach the engine, leaving the game to continue locally.
    pub fn take_engine(&mut self) -> Option<E> {
        self.engine.take()
    }

    /// Play a stone for the side to move and mirror it to the engine.
    ///
    /// An occupied point fails with no change anywhere. If the engine then
    /// fails, the local move stands and the error is returned.
    pub fn play_move(&mut self, pt: Point) -> Result<Option<Point>, GameError> {
        let color = self.position.next;
        let ko = self.position.play(pt)?;
        debug!(color = %color, point = %pt, "move played");
        if let Some(engine) = self.engine.as_mut() {
            engine.play(color, Move::Play(pt))?;
        }
        Ok(ko)
    }

    /// Pass for the side to move.
    pub fn pass(&mut self) -> Result<(), GameError> {
        let color = self.position.next;
        self.position.pass();
        if let Some(engine) = self.engine.as_mut() {
            engine.play(color, Move::Pass)?;
        }
        Ok(())
    }

    /// Take back the latest move. Returns `None`, touching nothing, at the
    /// initial position.
    pub fn undo(&mut self) -> Result<Option<Move>, GameError> {
        let Some(mv) = self.position.undo() else {
            return Ok(None);
        };
        debug!(mv = %mv, "move undone");
        if let Some(engine) = self.engine.as_mut() {
            engine.undo()?;
        }
        Ok(Some(mv))
    }

    /// Let the engine choose and play a move for the side to move.
    ///
    /// A resignation leaves the position untouched.
    pub fn generate_move(&mut self) -> Result<Move, GameError> {
        let color = self.position.next;
        let engine = self.engine.as_mut().ok_or(GameError::NoEngine)?;
        let mv = engine.genmove(color)?;
        match mv {
            Move::Play(pt) => {
                self.position.play(pt)?;
            }
            Move::Pass => self.position.pass(),
            Move::Resign => info!(color = %color, "engine resigned"),
        }
        Ok(mv)
    }

    /// Replace the game with the moves of a record.
    ///
    /// The position and engine are reset now; the moves are applied one by one
    /// as the returned iterator is advanced, so the UI can show each in turn.
    pub fn load_record<I>(&mut self, record: I) -> Result<Replay<'_, E, I::IntoIter>, GameError>
    where
        I: IntoIterator<Item = (Color, Move)>,
    {
        self.position.reset();
        if let Some(engine) = self.engine.as_mut() {
            engine.clear_board()?;
        }
        info!("loading game record");
        Ok(Replay {
            game: self,
            moves: record.into_iter(),
        })
    }

    fn apply_recorded(&mut self, color: Color, mv: Move) -> Result<Applied, GameError> {
        let ko = match mv {
            Move::Play(pt) => self.position.play_as(pt, color)?,
            Move::Pass => {
                self.position.pass_as(color);
                None
            }
            Move::Resign => None,
        };
        if mv != Move::Resign {
            if let Some(engine) = self.engine.as_mut() {
                engine.play(color, mv)?;
            }
        }
        Ok(Applied { color, mv, ko })
    }
}

/// Iterator applying a game record move by move. See [`Game::load_record`].
pub struct Replay<'a, E, I> {
    game: &'a mut Game<E>,
    moves: I,
}

impl<E, I> Iterator for Replay<'_, E, I>
where
    E: Engine,
    I: Iterator<Item = (Color, Move)>,
{
    type Item = Result<Applied, GameError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (color, mv) = self.moves.next()?;
        Some(self.game.apply_recorded(color, mv))
    }
}
