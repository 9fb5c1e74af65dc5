pub mod ai;
pub mod board;
pub mod chain;
pub mod config;
pub mod error;
pub mod game;
pub mod layout;
pub mod types;
pub mod worker;

pub use ai::{Heuristic, MinimaxConfig, Opponent, SearchResult, Strategy};
pub use board::Board;
pub use chain::MoveChain;
pub use config::EngineConfig;
pub use error::{ComputeError, ConfigError, LoadError, MoveError};
pub use game::{Engine, GameStatus, MachineEvent, TurnReport};
pub use types::{Coordinate, Outcome, Side};
