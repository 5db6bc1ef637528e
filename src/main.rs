//! mtg-rules - command line front end for the rules engine
//!
//! Parse and check mana costs, list the legal actions in a saved match, or
//! replay a recorded event stream and report where the match stands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mtg_rules_engine::{
    core::{Color, ManaCost, ManaPool, PlayerId},
    game::{
        events::load_events, mana_payment, LogFormat, MatchSnapshot, RulesConfig, RulesEngine,
        VerbosityLevel,
    },
    loader::CardDatabase,
};
use std::path::{Path, PathBuf};

/// Verbosity level for engine output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable lines
    Text,
    /// Pretty-printed JSON
    Json,
}

impl Format {
    /// Engine log lines on stderr follow the output format
    fn log_format(self) -> LogFormat {
        match self {
            Format::Text => LogFormat::Text,
            Format::Json => LogFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "mtg-rules")]
#[command(about = "MTG rules engine - legality and priority tracking", long_about = None)]
struct Cli {
    /// Rules configuration file (JSON); missing fields use defaults
    #[arg(long, global = true, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Verbosity level for engine output (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, short = 'v', global = true, default_value = "minimal")]
    verbosity: VerbosityArg,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a cost expression and check it against a mana pool
    Cost {
        /// Cost expression, e.g. "{2}{W}{U/P}"
        expr: String,

        /// Pool contents as color letters, e.g. "WWCC"
        #[arg(long, default_value = "")]
        pool: String,

        /// Life available for Phyrexian and life payments
        #[arg(long, default_value_t = 20)]
        life: i32,

        /// Energy available
        #[arg(long, default_value_t = 0)]
        energy: u32,
    },

    /// List the legal actions in a saved match
    Actions {
        /// Snapshot file written by `replay --snapshot-out`
        #[arg(value_name = "SNAPSHOT_FILE")]
        snapshot: PathBuf,

        /// Seat index of the player to list actions for (default: priority player)
        #[arg(long)]
        player: Option<u32>,
    },

    /// Apply a JSON-lines event stream and report the resulting state
    Replay {
        /// Event stream, one JSON event per line
        #[arg(value_name = "EVENTS_FILE")]
        events: PathBuf,

        /// Card metadata files used to fill in event cards
        #[arg(long = "cards", value_name = "CARDS_FILE")]
        cards: Vec<PathBuf>,

        /// Write the final match state to this snapshot file
        #[arg(long, value_name = "SNAPSHOT_FILE")]
        snapshot_out: Option<PathBuf>,

        /// Seat index of the player to report actions for (default: priority player)
        #[arg(long)]
        player: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("reading rules config {}", path.display()))?,
        None => RulesConfig::default(),
    };
    config.verbosity = cli.verbosity.into();

    match cli.command {
        Commands::Cost {
            expr,
            pool,
            life,
            energy,
        } => run_cost(&expr, &pool, life, energy, cli.format),
        Commands::Actions { snapshot, player } => {
            run_actions(&snapshot, player, config.verbosity, cli.format)
        }
        Commands::Replay {
            events,
            cards,
            snapshot_out,
            player,
        } => run_replay(&events, &cards, snapshot_out, player, config, cli.format).await,
    }
}

fn parse_pool(letters: &str) -> Result<ManaPool> {
    let mut pool = ManaPool::new();
    for c in letters.chars().filter(|c| !c.is_whitespace()) {
        let color = Color::from_symbol(c)
            .with_context(|| format!("'{c}' is not a mana symbol (expected W, U, B, R, G or C)"))?;
        pool.add_color(color);
    }
    Ok(pool)
}

fn run_cost(expr: &str, pool: &str, life: i32, energy: u32, format: Format) -> Result<()> {
    let cost = ManaCost::parse(expr).with_context(|| format!("parsing cost {expr:?}"))?;
    let pool = parse_pool(pool)?;
    let plan = mana_payment::simulate(&cost, &pool, life, energy);

    match format {
        Format::Json => {
            let report = serde_json::json!({
                "cost": cost.to_string(),
                "total": cost.total(),
                "payable": plan.is_ok(),
                "plan": plan.as_ref().ok(),
                "reason": plan.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            println!("cost:    {cost}");
            println!("total:   {}", cost.total());
            match plan {
                Ok(plan) => {
                    println!("payable: yes");
                    println!(
                        "pays:    {} (life {}, energy {})",
                        plan.debited, plan.life_paid, plan.energy_paid
                    );
                    println!("left:    {}", plan.remaining);
                }
                Err(e) => println!("payable: no ({e})"),
            }
        }
    }
    Ok(())
}

/// Seat index to player id, falling back to whoever holds priority
fn pick_player(engine: &RulesEngine, seat: Option<u32>) -> Result<PlayerId> {
    let state = engine.state();
    match seat {
        Some(seat) => state
            .players
            .get(seat as usize)
            .map(|p| p.id)
            .with_context(|| format!("no player in seat {seat}")),
        None => Ok(state
            .turn
            .priority_player
            .unwrap_or_else(|| state.active_player())),
    }
}

fn report(engine: &mut RulesEngine, player: PlayerId, format: Format) -> Result<()> {
    let actions = engine.get_legal_actions(player, true);
    let summary = engine.legality_summary(player)?;
    let boards = engine
        .state()
        .players
        .iter()
        .map(|p| engine.board_summary(p.id))
        .collect::<mtg_rules_engine::Result<Vec<_>>>()?;

    match format {
        Format::Json => {
            let report = serde_json::json!({
                "priority": engine.priority_info(),
                "actions": actions,
                "summary": summary,
                "boards": boards,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            let info = engine.priority_info();
            println!(
                "Turn {}, {} ({:?}); active player {}, priority {}",
                info.turn_number,
                info.step,
                info.phase,
                info.active_player,
                info.priority_player
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            for board in &boards {
                println!(
                    "  {} (P{}): life {}, hand {}, {} creatures, {} lands{}",
                    board.name,
                    board.player,
                    board.life,
                    board.hand_size,
                    board.creature_count,
                    board.land_count,
                    if board.lethal { ", facing lethal" } else { "" }
                );
            }
            println!("Legal actions for player {player} ({}):", actions.len());
            for (i, action) in actions.iter().enumerate() {
                println!("  {:>3}: {action}", i + 1);
            }
        }
    }
    Ok(())
}

fn run_actions(
    path: &Path,
    seat: Option<u32>,
    verbosity: VerbosityLevel,
    format: Format,
) -> Result<()> {
    let snapshot = MatchSnapshot::load_from_file(path)
        .with_context(|| format!("loading snapshot {}", path.display()))?;
    let mut engine = RulesEngine::from_snapshot(snapshot)
        .with_verbosity(verbosity)
        .with_log_format(format.log_format());
    let player = pick_player(&engine, seat)?;
    report(&mut engine, player, format)
}

async fn run_replay(
    events_path: &Path,
    card_files: &[PathBuf],
    snapshot_out: Option<PathBuf>,
    seat: Option<u32>,
    config: RulesConfig,
    format: Format,
) -> Result<()> {
    let events = load_events(events_path)
        .with_context(|| format!("reading events {}", events_path.display()))?;

    let db = if card_files.is_empty() {
        None
    } else {
        let (db, elapsed) = CardDatabase::load_many(card_files)
            .await
            .context("loading card metadata")?;
        if config.verbosity >= VerbosityLevel::Normal {
            eprintln!("Loaded {} cards in {elapsed:?}", db.len());
        }
        Some(db)
    };

    let mut engine =
        RulesEngine::two_player("Player", "Opponent", config).with_log_format(format.log_format());
    for (i, event) in events.iter().enumerate() {
        let applied = match &db {
            Some(db) => engine.apply_event_with(event, db),
            None => engine.apply_event(event),
        };
        applied.with_context(|| format!("applying event {} ({})", i + 1, event.name()))?;
    }

    if let Some(path) = snapshot_out {
        engine
            .snapshot()
            .save_to_file(&path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
    }

    let player = pick_player(&engine, seat)?;
    report(&mut engine, player, format)
}
