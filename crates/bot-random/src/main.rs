//! Random self-play driver.
//!
//! Plays random legal moves from a starting position until the game ends,
//! growing a search tree around the current position after every move and
//! re-rooting it as the game advances. Pool accounting is checked when the
//! tree is torn down.

use anyhow::Context;
use chess_core::{FenParser, MoveRequest};
use chess_engine::{Game, Tree, TreeArena, TreeConfig};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Random self-play with game-tree bookkeeping.
#[derive(Parser)]
#[command(name = "bot-random")]
#[command(about = "Plays a random game and exercises the pooled game tree")]
struct Args {
    /// Starting position in FEN
    #[arg(long, default_value = FenParser::STARTPOS)]
    fen: String,

    /// Stop after this many plies even if the game is not over
    #[arg(long, default_value = "200")]
    max_plies: usize,

    /// Seed for move selection; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Tree sizing in TOML; defaults are used if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides max_depth from the config
    #[arg(long)]
    depth: Option<u8>,
}

fn load_config(args: &Args) -> anyhow::Result<TreeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            TreeConfig::from_toml_str(&content)?
        }
        None => TreeConfig::default(),
    };
    if let Some(depth) = args.depth {
        config.max_depth = depth;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    tracing::info!("Seed: {}", seed);
    tracing::info!("Tree depth: {}", config.max_depth);

    let mut game = Game::from_fen(&args.fen)?;
    let mut arena = TreeArena::from_config(&config);
    let mut tree = if game.is_over() {
        None
    } else {
        Some(Tree::new(&mut arena, game.board(), config.max_depth)?)
    };

    while !game.is_over() && game.ply_count() < args.max_plies {
        if let Some(tree) = &tree {
            let mut nodes = 0usize;
            tree.postorder(&mut arena, |_, _, _| nodes += 1)?;
            tracing::debug!(
                ply = game.ply_count(),
                nodes,
                nodes_free = arena.nodes().free(),
                edges_free = arena.edges().free(),
                "tree traversed"
            );
        }

        let Some(mv) = game.random_move(&mut rng) else {
            break;
        };
        let status = game.make_move(mv)?;
        tracing::info!("{:>3}. {} {}", game.ply_count(), mv, status);

        if status.is_over() {
            break;
        }
        let advanced = match tree.as_mut() {
            Some(current) => current.advance(&mut arena, &MoveRequest::from(&mv)),
            None => Ok(()),
        };
        if let Err(e) = advanced {
            // The played move was cut off by an exhausted edge pool.
            tracing::warn!("Rebuilding tree: {}", e);
            if let Some(old) = tree.take() {
                old.destroy(&mut arena)?;
            }
            tree = Some(Tree::new(&mut arena, game.board(), config.max_depth)?);
        }
    }

    if let Some(tree) = tree {
        let stats = tree.destroy(&mut arena)?;
        tracing::info!(
            "Tree released {} nodes and {} edges",
            stats.nodes_released,
            stats.edges_released
        );
    }

    println!("{}", game.to_fen());
    println!("{}", game.status());
    Ok(())
}
