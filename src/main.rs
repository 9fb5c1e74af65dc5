use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reversi_engine::{
    Coordinate, Engine, EngineConfig, GameStatus, Heuristic, MachineEvent, MinimaxConfig,
    Opponent, Side,
};

/// Play Reversi against a machine opponent with a per-move time limit.
#[derive(Debug, Parser)]
#[command(name = "reversi-engine", version)]
struct Args {
    /// TOML configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting layout file (8 rows of `.`, `B`, `W`).
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Seconds the machine may spend on each move.
    #[arg(long)]
    time_limit: Option<f64>,

    /// Evaluation used by the machine.
    #[arg(long, value_enum)]
    strategy: Option<Heuristic>,

    /// Minimax search depth. Selects tree search.
    #[arg(long, conflicts_with = "heuristic_only")]
    depth: Option<u8>,

    /// Disable alpha-beta pruning in the tree search.
    #[arg(long)]
    no_pruning: bool,

    /// Pick the best immediate move instead of searching.
    #[arg(long)]
    heuristic_only: bool,

    /// Side played by you: black or white.
    #[arg(long)]
    human: Option<Side>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    let mut engine = Engine::from_config(&config).context("cannot set up the board")?;
    play(&mut engine, config.human)
}

fn apply_overrides(config: &mut EngineConfig, args: &Args) {
    if let Some(layout) = &args.layout {
        config.layout = Some(layout.clone());
    }
    if let Some(secs) = args.time_limit {
        config.time_limit_secs = secs;
    }
    if let Some(human) = args.human {
        config.human = human;
    }

    let strategy = args.strategy.unwrap_or(match config.opponent {
        Opponent::Heuristic { strategy } => strategy,
        Opponent::Minimax(minimax) => minimax.strategy,
    });

    config.opponent = if args.heuristic_only {
        Opponent::Heuristic { strategy }
    } else {
        match (config.opponent, args.depth) {
            (Opponent::Minimax(minimax), depth) => Opponent::Minimax(MinimaxConfig {
                depth: depth.unwrap_or(minimax.depth),
                strategy,
                pruning: minimax.pruning && !args.no_pruning,
            }),
            (Opponent::Heuristic { .. }, Some(depth)) => Opponent::Minimax(MinimaxConfig {
                depth,
                strategy,
                pruning: !args.no_pruning,
            }),
            (Opponent::Heuristic { .. }, None) => Opponent::Heuristic { strategy },
        }
    };
}

fn play(engine: &mut Engine, human: Side) -> anyhow::Result<()> {
    let machine = human.opposite();
    if human == Side::White {
        print_event(&engine.machine_move(machine));
    }
    print_board(engine);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if engine.is_over() {
            print_status(engine.status());
            break;
        }

        if engine.legal_moves(human).is_empty() {
            println!("{human} has no legal move, passing");
            let event = engine.machine_move(machine);
            print_event(&event);
            if matches!(event, MachineEvent::Moved { .. }) {
                print_board(engine);
                continue;
            }
        }

        print!("{human} to move (row col | moves | history | json | retry | quit): ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match line.trim() {
            "" => {}
            "quit" | "q" => break,
            "moves" => {
                let moves: Vec<String> = engine
                    .legal_moves(human)
                    .iter()
                    .map(|c| format!("{} {}", c.row, c.col))
                    .collect();
                println!("{}", moves.join(", "));
            }
            "history" => print!("{}", engine.render_history()),
            "json" => println!("{}", engine.history().to_json()?),
            "retry" => {
                print_event(&engine.machine_move(machine));
                print_board(engine);
            }
            input => match input.parse::<Coordinate>() {
                Ok(at) => match engine.place_by_human(at, human) {
                    Ok(report) => {
                        report.machine.iter().for_each(print_event);
                        print_board(engine);
                    }
                    Err(e) => eprintln!("{e}"),
                },
                Err(e) => eprintln!("{e}"),
            },
        }
    }

    Ok(())
}

fn print_board(engine: &Engine) {
    println!("  0 1 2 3 4 5 6 7");
    for (row, line) in engine.render().lines().enumerate() {
        println!("{row} {line}");
    }
    let (black, white) = engine.board().count();
    println!("black {black}  white {white}");
}

fn print_event(event: &MachineEvent) {
    match event {
        MachineEvent::Moved { side, at } => println!("{side} plays {} {}", at.row, at.col),
        MachineEvent::Skipped { side } => println!("{side} has no legal move, skipped"),
        MachineEvent::TimedOut { side, limit } => {
            println!("{side} exceeded the {limit:?} time limit, turn forfeited")
        }
        MachineEvent::Failed { side, error } => println!("{side} could not move: {error}"),
    }
}

fn print_status(status: GameStatus) {
    match status {
        GameStatus::GameOver {
            winner: Some(side),
        } => println!("game over, {side} wins"),
        GameStatus::GameOver { winner: None } => println!("game over, draw"),
        GameStatus::InProgress => {}
    }
}
