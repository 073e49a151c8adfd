#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line host for Uptime Defence.
//!
//! Runs levels to completion without rendering, validates level files and
//! converts levels to and from single-line share codes.

mod share_code;
mod store;

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uptime_defence_core::{level::Level, CellCoord, Event, TowerKind};
use uptime_defence_session::{
    LevelStore, ScoreSubmitter, Session, SessionConfig, SessionSnapshot,
};
use uptime_defence_system_builder::{Builder, BuilderInput};
use uptime_defence_world::query;

use crate::store::{DirectoryLevelStore, ScoreLog};

#[derive(Debug, Parser)]
#[command(name = "uptime-defence", version, about = "Headless Uptime Defence host")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a level headlessly and prints a JSON summary.
    Run(RunArgs),
    /// Checks that a level file describes a playable level.
    Validate {
        /// Level JSON file.
        file: PathBuf,
    },
    /// Prints the share code of a level.
    Share {
        /// Level JSON file; the built-in tutorial when omitted.
        file: Option<PathBuf>,
    },
    /// Decodes a share code back into level JSON.
    Unshare {
        /// Share code produced by `share`.
        code: String,
        /// Writes the level to this file instead of standard output.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manages a directory of stored levels.
    #[command(subcommand)]
    Levels(LevelsCommand),
}

#[derive(Debug, Subcommand)]
enum LevelsCommand {
    /// Lists the identifiers of stored levels.
    List {
        /// Level directory.
        #[arg(long)]
        store: PathBuf,
    },
    /// Validates a level file and stores it under the given identifier.
    Import {
        /// Level JSON file.
        file: PathBuf,
        /// Identifier to store the level under.
        #[arg(long)]
        id: u32,
        /// Level directory.
        #[arg(long)]
        store: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Level JSON file; the built-in tutorial when omitted.
    #[arg(long, conflicts_with = "level_id")]
    level: Option<PathBuf>,
    /// Identifier of a level in `--store`.
    #[arg(long, requires = "store")]
    level_id: Option<u32>,
    /// Level directory used with `--level-id`.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Session configuration in TOML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tower placed before the first wave, as `kind@column,row`.
    #[arg(long = "tower")]
    towers: Vec<TowerPlacement>,
    /// Cell whose tower is upgraded once after placement, as `column,row`.
    #[arg(long = "upgrade", value_parser = parse_cell)]
    upgrades: Vec<CellCoord>,
    /// Simulated seconds after which the run stops.
    #[arg(long, default_value_t = 600)]
    seconds: u64,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
    /// Player identifier used when recording the score.
    #[arg(long, requires = "scores")]
    player: Option<String>,
    /// Display name used when recording the score.
    #[arg(long, default_value = "anonymous")]
    name: String,
    /// JSON-lines file the final score is appended to.
    #[arg(long, requires = "player")]
    scores: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TowerPlacement {
    kind: TowerKind,
    cell: CellCoord,
}

impl FromStr for TowerPlacement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, cell) = value
            .split_once('@')
            .ok_or_else(|| format!("expected kind@column,row, got '{value}'"))?;
        let kind = TowerKind::from_name(kind.trim())
            .ok_or_else(|| format!("unknown tower kind '{kind}'"))?;
        Ok(Self {
            kind,
            cell: parse_cell(cell)?,
        })
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected column,row, got '{value}'"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column '{column}'"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row '{row}'"))?;
    Ok(CellCoord::new(column, row))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    level: String,
    elapsed_ms: u128,
    towers: usize,
    kills: usize,
    escapes: usize,
    #[serde(flatten)]
    session: SessionSnapshot,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => run(&args),
        CliCommand::Validate { file } => {
            let level = read_level(&file)?;
            level
                .validate()
                .with_context(|| format!("{} is not a playable level", file.display()))?;
            println!(
                "{}: {}x{} grid, {} path(s), {} wave(s)",
                file.display(),
                level.grid_width,
                level.grid_height,
                level.paths.len(),
                level.waves.len()
            );
            Ok(())
        }
        CliCommand::Share { file } => {
            let level = match file {
                Some(file) => read_level(&file)?,
                None => Level::tutorial(),
            };
            level.validate().context("refusing to share an invalid level")?;
            println!("{}", share_code::encode(&level)?);
            Ok(())
        }
        CliCommand::Unshare { code, out } => {
            let level = share_code::decode(&code).context("failed to decode share code")?;
            level.validate().context("share code carries an invalid level")?;
            let json = serde_json::to_string_pretty(&level)?;
            match out {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
            Ok(())
        }
        CliCommand::Levels(LevelsCommand::List { store }) => {
            let store = DirectoryLevelStore::open(&store)
                .with_context(|| format!("failed to open level store {}", store.display()))?;
            for id in store.list()? {
                let level = store.load(id)?;
                println!("{id}\t{}", level.name);
            }
            Ok(())
        }
        CliCommand::Levels(LevelsCommand::Import { file, id, store }) => {
            let mut level = read_level(&file)?;
            level.id = id;
            let mut store = DirectoryLevelStore::open(&store)
                .with_context(|| format!("failed to open level store {}", store.display()))?;
            store.save(&level)?;
            info!(id, "level imported");
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn read_level(path: &Path) -> Result<Level> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse level file {}", path.display()))
}

fn read_config(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn load_level(args: &RunArgs) -> Result<Level> {
    if let Some(path) = &args.level {
        return read_level(path);
    }
    match (args.level_id, &args.store) {
        (Some(id), Some(root)) => {
            let store = DirectoryLevelStore::open(root)
                .with_context(|| format!("failed to open level store {}", root.display()))?;
            Ok(store.load(id)?)
        }
        (None, _) => Ok(Level::tutorial()),
        (Some(_), None) => bail!("--level-id requires --store"),
    }
}

/// Feeds each requested placement, then each upgrade, through the builder
/// as a single confirmed input and applies the commands it emits.
fn build(
    session: &mut Session,
    towers: &[TowerPlacement],
    upgrades: &[CellCoord],
    events: &mut Vec<Event>,
) {
    let mut builder = Builder::new();
    let requests = towers
        .iter()
        .map(|placement| (Some(placement.kind), placement.cell))
        .chain(upgrades.iter().map(|cell| (None, *cell)));

    for (kind, cell) in requests {
        let preview = kind.map(|kind| session.preview_placement(kind, cell));
        if let Some(preview) = preview.filter(|preview| !preview.is_valid()) {
            match preview.blocked_by {
                Some(reason) => {
                    warn!(kind = preview.kind.name(), %cell, %reason, "tower skipped");
                }
                None => {
                    warn!(
                        kind = preview.kind.name(),
                        %cell,
                        cost = preview.cost,
                        "tower skipped: insufficient funds"
                    );
                }
            }
            continue;
        }

        let input = BuilderInput {
            confirm_action: kind.is_some(),
            upgrade_action: kind.is_none(),
            cursor_cell: Some(cell),
            ..BuilderInput::default()
        };
        let mut commands = Vec::new();
        builder.handle(
            events,
            preview,
            input,
            |cell| query::tower_at(session.world(), cell),
            &mut commands,
        );
        if commands.is_empty() {
            warn!(%cell, "no tower to upgrade");
        }
        for command in commands {
            if let Err(rejection) = session.apply(command, events) {
                debug!(%cell, %rejection, "build request dropped");
            }
        }
    }
}

fn run(args: &RunArgs) -> Result<()> {
    if args.step_ms == 0 {
        bail!("--step-ms must be positive");
    }
    let level = load_level(args)?;
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => SessionConfig::default(),
    };
    let manual_waves = config.auto_waves.is_none();
    let mut session = Session::new(level, config).context("level failed validation")?;

    let mut events = Vec::new();
    build(&mut session, &args.towers, &args.upgrades, &mut events);

    let step = Duration::from_millis(args.step_ms);
    let limit = Duration::from_secs(args.seconds);
    let mut now = Duration::ZERO;
    while now < limit && !session.ledger().is_terminal() {
        if manual_waves && !session.scheduler().is_active() {
            match session.start_next_wave(&mut events) {
                Ok(wave) => debug!(wave, "wave started"),
                Err(rejection) => debug!(%rejection, "next wave not started"),
            }
        }
        now += step;
        events.extend(session.tick(now, step));
    }

    let mut kills = 0;
    let mut escapes = 0;
    for event in &events {
        match event {
            Event::EnemyKilled { .. } => kills += 1,
            Event::EnemyEscaped { .. } => escapes += 1,
            _ => {}
        }
        debug!(?event);
    }

    let summary = RunSummary {
        level: session.level().name.clone(),
        elapsed_ms: session.now().as_millis(),
        towers: query::tower_view(session.world()).iter().count(),
        kills,
        escapes,
        session: session.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let (Some(player), Some(path)) = (&args.player, &args.scores) {
        match session.submission(player, &args.name) {
            Some(submission) => {
                ScoreLog::new(path).submit(&submission)?;
                info!(score = submission.score, "score recorded");
            }
            None => warn!("session did not finish; score not recorded"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tower_placements() {
        assert_eq!(
            "kafka@3,4".parse::<TowerPlacement>(),
            Ok(TowerPlacement {
                kind: TowerKind::Kafka,
                cell: CellCoord::new(3, 4),
            })
        );
        assert!("kafka".parse::<TowerPlacement>().is_err());
        assert!("apache@1,1".parse::<TowerPlacement>().is_err());
        assert!("nginx@1;1".parse::<TowerPlacement>().is_err());
    }

    #[test]
    fn parses_upgrade_cells() {
        assert_eq!(parse_cell(" 3, 4"), Ok(CellCoord::new(3, 4)));
        assert!(parse_cell("3;4").is_err());
        assert!(parse_cell("-1,4").is_err());
    }

    #[test]
    fn builds_towers_through_the_builder() {
        let mut session =
            Session::new(Level::tutorial(), SessionConfig::default()).expect("tutorial is valid");
        let towers = [
            "nginx@3,4".parse::<TowerPlacement>().expect("placement"),
            "redis@8,5".parse::<TowerPlacement>().expect("placement"),
        ];
        let upgrades = [CellCoord::new(3, 4), CellCoord::new(0, 0)];
        let mut events = Vec::new();

        build(&mut session, &towers, &upgrades, &mut events);

        let view = query::tower_view(session.world());
        let built: Vec<_> = view
            .iter()
            .map(|tower| (tower.kind, tower.cell, tower.stats.level))
            .collect();
        assert_eq!(built, vec![(TowerKind::Nginx, CellCoord::new(3, 4), 2)]);
        assert_eq!(session.ledger().money(), 250);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TowerUpgraded { .. })));
    }

    #[test]
    fn command_line_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn config_reads_from_toml() {
        let config: SessionConfig = toml::from_str(
            "max_tick_ms = 50\n[auto_waves]\nstart_delay_ms = 2000\n",
        )
        .expect("parses");

        assert_eq!(config.max_tick(), Duration::from_millis(50));
        let auto = config.auto_waves.expect("auto waves");
        assert_eq!(auto.start_delay(), Duration::from_secs(2));
        assert_eq!(auto.interval(), Duration::from_secs(3));
    }
}
