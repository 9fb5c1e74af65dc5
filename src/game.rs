use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::ai::{Opponent, SearchResult};
use crate::board::Board;
use crate::chain::MoveChain;
use crate::config::EngineConfig;
use crate::error::{ComputeError, LoadError, MoveError};
use crate::layout;
use crate::types::{Coordinate, Outcome, Side};
use crate::worker::{CancelToken, MoveWorker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    GameOver { winner: Option<Side> },
}

/// What happened on one machine attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    Moved { side: Side, at: Coordinate },
    /// No legal move, the turn passes.
    Skipped { side: Side },
    TimedOut { side: Side, limit: Duration },
    Failed { side: Side, error: ComputeError },
}

impl MachineEvent {
    fn advanced(&self) -> bool {
        matches!(self, MachineEvent::Moved { .. })
    }
}

/// Result of a human placement and the machine replies it triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub human: Coordinate,
    pub machine: Vec<MachineEvent>,
    pub status: GameStatus,
}

/// Game orchestrator: owns the move chain and drives machine replies.
///
/// Machine moves are computed on a single background worker under
/// `time_limit`. Only this struct ever advances the chain head, and only
/// after a computation has returned.
pub struct Engine {
    chain: MoveChain,
    opponent: Opponent,
    time_limit: Duration,
    worker: MoveWorker,
    announced: OnceCell<Outcome>,
}

impl Engine {
    /// Engine starting from the standard opening.
    pub fn new(opponent: Opponent, time_limit: Duration) -> Self {
        Self::with_board(Board::new(), opponent, time_limit)
    }

    pub fn with_board(board: Board, opponent: Opponent, time_limit: Duration) -> Self {
        Self {
            chain: MoveChain::new(board),
            opponent,
            time_limit,
            worker: MoveWorker::new(),
            announced: OnceCell::new(),
        }
    }

    /// Builds an engine from configuration, loading the layout if one is set.
    pub fn from_config(config: &EngineConfig) -> Result<Self, LoadError> {
        let board = layout::load_or_default(config.layout.as_deref())?;
        Ok(Self::with_board(board, config.opponent, config.time_limit()))
    }

    pub fn board(&self) -> Board {
        self.chain.board()
    }

    pub fn history(&self) -> &MoveChain {
        &self.chain
    }

    pub fn opponent(&self) -> Opponent {
        self.opponent
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn legal_moves(&self, side: Side) -> Vec<Coordinate> {
        self.board().legal_moves(side)
    }

    /// Applies a human move, then lets the machine reply for the other side.
    ///
    /// While `side` is left without legal moves the machine keeps playing,
    /// unless the game ends or a machine attempt fails to advance the board.
    pub fn place_by_human(&mut self, at: Coordinate, side: Side) -> Result<TurnReport, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }

        let board = self.board();
        if !board.is_occupiable(at) {
            return Err(MoveError::OutOfBounds(at));
        }
        let next = board.apply_move(at, side)?;
        self.chain.push(next, side, at);
        info!(%side, %at, "human move");

        let mut report = TurnReport {
            human: at,
            machine: Vec::new(),
            status: GameStatus::InProgress,
        };
        if self.is_over() {
            report.status = self.status();
            return Ok(report);
        }

        let machine = side.opposite();
        let mut event = self.machine_move(machine);
        report.machine.push(event.clone());

        while !self.is_over() && event.advanced() && self.board().legal_mask(side) == 0 {
            info!(%side, "skipped, no legal move");
            event = self.machine_move(machine);
            report.machine.push(event.clone());
        }

        report.status = self.status();
        Ok(report)
    }

    /// Computes and applies one machine move for `side` under the time limit.
    ///
    /// The board is left untouched unless the computation returns a move in
    /// time.
    pub fn machine_move(&mut self, side: Side) -> MachineEvent {
        let opponent = self.opponent;
        let limit = self.time_limit;
        self.machine_move_with(side, move |board, side, token| {
            opponent
                .choose(board, side, token)
                .map_err(|_| ComputeError::TimedOut(limit))
        })
    }

    fn machine_move_with<F>(&mut self, side: Side, choose: F) -> MachineEvent
    where
        F: FnOnce(&Board, Side, &CancelToken) -> Result<SearchResult, ComputeError>
            + Send
            + 'static,
    {
        let board = self.board();
        if board.legal_mask(side) == 0 {
            info!(%side, "skipped, no legal move");
            return MachineEvent::Skipped { side };
        }

        let result = self
            .worker
            .run(self.time_limit, move |token| choose(&board, side, token));

        match result {
            Ok(SearchResult::Move { at, board: next }) => {
                if board.apply_move(at, side) != Ok(next) {
                    let error = ComputeError::Failed(format!("machine selected an illegal move {at}"));
                    warn!(%side, %error, "machine move rejected");
                    return MachineEvent::Failed { side, error };
                }
                self.chain.push(next, side, at);
                info!(%side, %at, "machine move");
                MachineEvent::Moved { side, at }
            }
            Ok(SearchResult::NoLegalMove) => {
                info!(%side, "skipped, no legal move");
                MachineEvent::Skipped { side }
            }
            // raised either by the worker's wait or by the search noticing its deadline
            Err(ComputeError::TimedOut(limit)) => {
                warn!(%side, ?limit, "strategy exceeded time limit");
                MachineEvent::TimedOut { side, limit }
            }
            Err(error) => {
                warn!(%side, %error, "machine move failed");
                MachineEvent::Failed { side, error }
            }
        }
    }

    /// Whether neither side can move. The winner is logged the first time
    /// this is observed.
    pub fn is_over(&self) -> bool {
        match self.board().outcome() {
            Some(outcome) => {
                self.announced.get_or_init(|| {
                    info!(%outcome, "game over");
                    outcome
                });
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> GameStatus {
        match self.board().outcome() {
            Some(outcome) => GameStatus::GameOver {
                winner: outcome.winner(),
            },
            None => GameStatus::InProgress,
        }
    }

    pub fn render(&self) -> String {
        layout::render(&self.board(), "")
    }

    pub fn render_history(&self) -> String {
        self.chain.render()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    use super::*;
    use crate::ai::{Heuristic, MinimaxConfig};

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    // Black's only move is (0,3); white answers (0,4), leaving black
    // stuck, so white plays (7,2) as well and wins.
    const FORCED_PASS: &str = "
        W B W . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        W B . . . . . .
    ";

    fn greedy() -> Opponent {
        Opponent::Heuristic {
            strategy: Heuristic::Greedy,
        }
    }

    fn slow_search() -> Opponent {
        Opponent::Minimax(MinimaxConfig {
            depth: 30,
            strategy: Heuristic::Mobility,
            pruning: false,
        })
    }

    #[test]
    fn initial_state_is_in_progress() {
        let engine = Engine::new(greedy(), Duration::from_secs(5));

        assert_eq!(engine.status(), GameStatus::InProgress);
        assert!(!engine.is_over());
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.legal_moves(Side::Black).len(), 4);
    }

    #[test]
    fn human_move_then_one_machine_reply() {
        let mut engine = Engine::new(greedy(), Duration::from_secs(5));

        let report = engine.place_by_human(Coordinate::new(2, 3), Side::Black).unwrap();

        assert_eq!(
            report.machine,
            vec![MachineEvent::Moved {
                side: Side::White,
                at: Coordinate::new(2, 2)
            }]
        );
        assert_eq!(report.status, GameStatus::InProgress);
        assert_eq!(engine.history().len(), 3);
        assert_eq!(engine.board().count(), (3, 3));
    }

    #[test]
    fn illegal_player_move_returns_error() {
        let mut engine = Engine::new(greedy(), Duration::from_secs(5));

        assert_eq!(
            engine.place_by_human(Coordinate::new(0, 0), Side::Black),
            Err(MoveError::Illegal {
                at: Coordinate::new(0, 0),
                side: Side::Black
            })
        );
        assert_eq!(
            engine.place_by_human(Coordinate::new(8, 3), Side::Black),
            Err(MoveError::OutOfBounds(Coordinate::new(8, 3)))
        );
        assert_eq!(engine.board(), Board::new());
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn machine_keeps_moving_while_human_is_stuck() {
        let board = layout::parse(FORCED_PASS).unwrap();
        let mut engine = Engine::with_board(board, greedy(), Duration::from_secs(5));

        let report = engine.place_by_human(Coordinate::new(0, 3), Side::Black).unwrap();

        assert_eq!(
            report.machine,
            vec![
                MachineEvent::Moved {
                    side: Side::White,
                    at: Coordinate::new(0, 4)
                },
                MachineEvent::Moved {
                    side: Side::White,
                    at: Coordinate::new(7, 2)
                },
            ]
        );
        assert_eq!(
            report.status,
            GameStatus::GameOver {
                winner: Some(Side::White)
            }
        );
        assert_eq!(engine.history().len(), 4);
        assert_eq!(engine.board().count(), (0, 8));
    }

    #[test]
    fn machine_without_moves_is_skipped() {
        let board = layout::parse(FORCED_PASS)
            .unwrap()
            .apply_move(Coordinate::new(0, 3), Side::Black)
            .unwrap()
            .apply_move(Coordinate::new(0, 4), Side::White)
            .unwrap();
        let mut engine = Engine::with_board(board, greedy(), Duration::from_secs(5));

        assert_eq!(
            engine.machine_move(Side::Black),
            MachineEvent::Skipped { side: Side::Black }
        );
        assert_eq!(engine.board(), board);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn timed_out_search_leaves_board_unchanged() {
        let limit = Duration::from_millis(1);
        let mut engine = Engine::new(slow_search(), limit);

        let report = engine.place_by_human(Coordinate::new(2, 3), Side::Black).unwrap();
        let after_human = Board::new()
            .apply_move(Coordinate::new(2, 3), Side::Black)
            .unwrap();

        assert_eq!(
            report.machine,
            vec![MachineEvent::TimedOut {
                side: Side::White,
                limit
            }]
        );
        assert_eq!(engine.board(), after_human);
        assert_eq!(engine.history().len(), 2);

        // retrying behaves the same way
        assert_eq!(
            engine.machine_move(Side::White),
            MachineEvent::TimedOut {
                side: Side::White,
                limit
            }
        );
        assert_eq!(engine.board(), after_human);
    }

    #[test]
    fn every_timeout_is_logged_as_a_warning() {
        let limit = Duration::from_millis(1);
        let mut engine = Engine::new(slow_search(), limit);
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        let events: Vec<MachineEvent> = tracing::subscriber::with_default(subscriber, || {
            (0..3).map(|_| engine.machine_move(Side::Black)).collect()
        });

        assert!(
            events
                .iter()
                .all(|event| *event == MachineEvent::TimedOut { side: Side::Black, limit })
        );
        assert_eq!(warnings.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn panicking_computation_is_reported_as_failed() {
        let mut engine = Engine::new(greedy(), Duration::from_secs(5));

        let event = engine.machine_move_with(Side::Black, |_, _, _| panic!("evaluation exploded"));

        assert_eq!(
            event,
            MachineEvent::Failed {
                side: Side::Black,
                error: ComputeError::Failed("evaluation exploded".into())
            }
        );
        assert_eq!(engine.board(), Board::new());
        assert_eq!(engine.history().len(), 1);

        // the worker is still usable afterwards
        assert!(engine.machine_move(Side::Black).advanced());
    }

    #[test]
    fn illegal_machine_choice_is_rejected() {
        let mut engine = Engine::new(greedy(), Duration::from_secs(5));

        let event = engine.machine_move_with(Side::Black, |board, _, _| {
            Ok(SearchResult::Move {
                at: Coordinate::new(0, 0),
                board: *board,
            })
        });

        assert!(matches!(
            event,
            MachineEvent::Failed {
                side: Side::Black,
                error: ComputeError::Failed(_)
            }
        ));
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.history().head().board, Board::new());
    }

    #[test]
    fn finished_game_rejects_moves() {
        let board = layout::parse(FORCED_PASS).unwrap();
        let mut engine = Engine::with_board(board, greedy(), Duration::from_secs(5));
        engine.place_by_human(Coordinate::new(0, 3), Side::Black).unwrap();

        assert!(engine.is_over());
        assert_eq!(engine.announced.get(), Some(&Outcome::Win(Side::White)));
        assert_eq!(
            engine.place_by_human(Coordinate::new(1, 1), Side::Black),
            Err(MoveError::GameOver)
        );
    }

    #[test]
    fn render_history_walks_back_to_the_root() {
        let mut engine = Engine::new(greedy(), Duration::from_secs(5));
        engine.place_by_human(Coordinate::new(2, 3), Side::Black).unwrap();

        let text = engine.render_history();

        assert_eq!(text.lines().count(), 24);
        assert!(text.starts_with(&engine.render()));
        assert!(text.ends_with(&layout::render(&Board::new(), "    ")));
    }

    #[test]
    fn from_config_uses_standard_opening_without_layout() {
        let engine = Engine::from_config(&EngineConfig::default()).unwrap();

        assert_eq!(engine.board(), Board::new());
        assert_eq!(engine.time_limit(), Duration::from_secs(5));
        assert_eq!(engine.opponent(), Opponent::default());
    }
}
