//! reversi-arena: pit Reversi agents against each other.
//!
//! - `reversi-arena battle --black search --white random --games 200`
//! - `reversi-arena demo` plays one game and prints the final board

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use reversi_arena::ai::evaluation::WeightTable;
use reversi_arena::ai::{
    Agent, EvaluationBoardAgent, NTupleAgent, NTupleEvaluator, NeuralAgent, RandomAgent,
    SearchAgent,
};
use reversi_arena::rules::count_stones;
use reversi_arena::tournament::{self, BattleConfig};
use reversi_arena::{Game, GameConfig, Side};

#[derive(Parser)]
#[command(name = "reversi-arena")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play many games between two agents and report the tally
    Battle {
        #[arg(long, default_value_t = 100)]
        games: usize,
        #[arg(long, value_enum)]
        black: AgentKind,
        #[arg(long, value_enum)]
        white: AgentKind,
        /// Weight blob for the black agent
        #[arg(long)]
        black_weights: Option<PathBuf>,
        /// Weight blob for the white agent
        #[arg(long)]
        white_weights: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play a single search-vs-random game and print the final board
    Demo {
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AgentKind {
    Random,
    /// Fixed positional weight table
    Board,
    Ntuple,
    Neural,
    /// Alpha-beta over the positional table
    Search,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Battle {
            games,
            black,
            white,
            black_weights,
            white_weights,
            seed,
        } => run_battle(
            BattleConfig { games, seed },
            build_agent(black, black_weights.as_deref(), seed)?,
            build_agent(white, white_weights.as_deref(), seed.map(|s| s ^ 1))?,
        ),
        Command::Demo { seed } => run_demo(seed),
    }
}

fn build_agent(kind: AgentKind, weights: Option<&Path>, seed: Option<u64>) -> Result<Box<dyn Agent>> {
    let seed = seed.unwrap_or_else(|| fastrand::u64(..));
    let agent: Box<dyn Agent> = match kind {
        AgentKind::Random => Box::new(RandomAgent::with_seed(seed)),
        AgentKind::Board => {
            let mut agent = EvaluationBoardAgent::with_seed(WeightTable::default(), seed);
            if let Some(path) = weights {
                agent
                    .load_weights(path)
                    .with_context(|| format!("loading evaluation board from {}", path.display()))?;
            }
            Box::new(agent)
        }
        AgentKind::Ntuple => {
            let mut agent = NTupleAgent::with_seed(NTupleEvaluator::zeroed(), seed);
            if let Some(path) = weights {
                agent
                    .load_weights(path)
                    .with_context(|| format!("loading n-tuple weights from {}", path.display()))?;
            }
            Box::new(agent)
        }
        AgentKind::Neural => {
            let mut agent = NeuralAgent::random(seed);
            if let Some(path) = weights {
                agent
                    .load_weights(path)
                    .with_context(|| format!("loading neural net from {}", path.display()))?;
            }
            Box::new(agent)
        }
        AgentKind::Search => {
            let table = match weights {
                Some(path) => {
                    let mut board = EvaluationBoardAgent::default();
                    board
                        .load_weights(path)
                        .with_context(|| format!("loading search table from {}", path.display()))?;
                    *board.table()
                }
                None => WeightTable::default(),
            };
            Box::new(SearchAgent::new(table))
        }
    };
    Ok(agent)
}

fn run_battle(config: BattleConfig, black: Box<dyn Agent>, white: Box<dyn Agent>) -> Result<()> {
    let summary = tournament::battle(&config, black.as_ref(), white.as_ref());

    println!("{} (black) vs {} (white)", black.name(), white.name());
    println!("  games:      {}", summary.games);
    println!("  black wins: {}", summary.black_wins);
    println!("  white wins: {}", summary.white_wins);
    println!("  draws:      {}", summary.draws);
    if summary.aborted + summary.errors > 0 {
        println!("  aborted:    {}", summary.aborted);
        println!("  errors:     {}", summary.errors);
    }
    Ok(())
}

fn run_demo(seed: Option<u64>) -> Result<()> {
    let black = SearchAgent::new(WeightTable::default()).with_depth(3);
    let white = RandomAgent::with_seed(seed.unwrap_or_else(|| fastrand::u64(..)));
    let mut game = Game::with_config(Box::new(black), Box::new(white), GameConfig { seed })?;

    let outcome = game.run()?;
    let board = game.board();
    println!("{board}");
    println!(
        "black {} - white {}: {:?}",
        count_stones(Side::Black, board),
        count_stones(Side::White, board),
        outcome
    );
    Ok(())
}
