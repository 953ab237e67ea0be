//! Simulation core of a grid chase game: maze generation, pathfinding,
//! agent policies and a tick-driven session.
//!
//! The core never deals with pixels or input devices. A frontend feeds it
//! elapsed time through [`Clock::advance`] and player moves through
//! [`GameState::on_key_move`], and reads positions back for drawing.

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod maze;
pub mod pathfinding;

pub use agent::{Agent, Aggression};
pub use clock::{Clock, TickKind};
pub use config::Config;
pub use error::{GameError, Result};
pub use game::{Event, GameState, Layout, LossReason, Outcome};
pub use grid::{Dir, Grid, Pos, Tile};
