//! sapper CLI: play generated fields with the deducing agent.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use sapper::agent::Agent;
use sapper::cell::Cell;
use sapper::config::SapperConfig;
use sapper::field::Minefield;
use sapper::game::{Game, GameReport, Outcome};
use sapper::select::RandomSelector;

#[derive(Parser)]
#[command(name = "sapper", version, about = "Knowledge-base hazard deduction on a grid")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Grid height (overrides the config file).
    #[arg(long, global = true)]
    height: Option<usize>,

    /// Grid width (overrides the config file).
    #[arg(long, global = true)]
    width: Option<usize>,

    /// Number of hazards (overrides the config file).
    #[arg(long, global = true)]
    hazards: Option<usize>,

    /// RNG seed for field generation and move selection.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Closure iteration cap.
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single generated field.
    Play {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Print the hazard layout after the game.
        #[arg(long)]
        show_field: bool,
    },

    /// Play many seeded fields and summarize the results.
    Batch {
        /// Number of games (overrides the config file).
        #[arg(long)]
        games: Option<usize>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Feed recorded observations to a fresh agent and print what it deduces.
    Deduce {
        /// JSON file: [{"row": 0, "col": 1, "count": 2}, ...]
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Deserialize)]
struct Observation {
    row: usize,
    col: usize,
    count: usize,
}

#[derive(Default, Serialize)]
struct BatchSummary {
    games: usize,
    won: usize,
    lost: usize,
    stalled: usize,
    guesses: usize,
    closure_iterations: usize,
}

impl BatchSummary {
    fn record(&mut self, report: &GameReport) {
        self.games += 1;
        match report.outcome {
            Outcome::Won => self.won += 1,
            Outcome::Lost { .. } => self.lost += 1,
            Outcome::Stalled => self.stalled += 1,
        }
        self.guesses += report.guesses;
        self.closure_iterations += report.closure_iterations;
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let seed = config.seed.unwrap_or_else(rand::random);

    match cli.command {
        Commands::Play { json, show_field } => {
            let (report, field) = play_one(&config, seed)?;
            if json {
                let out = serde_json::to_string_pretty(&report).into_diagnostic()?;
                println!("{out}");
            } else {
                println!(
                    "{}x{} grid, {} hazards, seed {seed}",
                    config.grid.height, config.grid.width, config.grid.hazards
                );
                println!("  outcome:    {}", describe(&report.outcome));
                println!("  moves:      {}", report.moves);
                println!("  guesses:    {}", report.guesses);
                println!("  known safe: {}", report.known_safe);
                println!("  hazards:    {}", report.known_hazards);
            }
            if show_field {
                println!("{field}");
            }
        }

        Commands::Batch { games, json } => {
            let games = games.unwrap_or(config.games);
            let mut summary = BatchSummary::default();
            for i in 0..games {
                let (report, _) = play_one(&config, seed.wrapping_add(i as u64))?;
                summary.record(&report);
            }
            if json {
                let out = serde_json::to_string_pretty(&summary).into_diagnostic()?;
                println!("{out}");
            } else {
                let rate = if summary.games == 0 {
                    0.0
                } else {
                    100.0 * summary.won as f64 / summary.games as f64
                };
                println!("{} games from seed {seed}", summary.games);
                println!("  won:     {} ({rate:.1}%)", summary.won);
                println!("  lost:    {}", summary.lost);
                println!("  stalled: {}", summary.stalled);
                println!("  guesses: {}", summary.guesses);
            }
        }

        Commands::Deduce { file } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            let observations: Vec<Observation> =
                serde_json::from_str(&content).into_diagnostic()?;

            let mut agent = Agent::with_config(config.grid()?, config.closure.clone());
            for obs in &observations {
                agent.observe(Cell::new(obs.row, obs.col), obs.count)?;
            }

            println!("Observed {} cells from {}", observations.len(), file.display());
            println!("Known safe ({}):", agent.known_safe().len());
            for cell in agent.known_safe() {
                println!("  {cell}");
            }
            println!("Known hazards ({}):", agent.known_hazards().len());
            for cell in agent.known_hazards() {
                println!("  {cell}");
            }
            let open: Vec<_> = agent.sentences().collect();
            if !open.is_empty() {
                println!("Open sentences ({}):", open.len());
                for (id, sentence) in open {
                    println!("  {id}: {sentence}");
                }
            }
        }
    }

    Ok(())
}

/// Load the config file, then apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<SapperConfig> {
    let mut config = match &cli.config {
        Some(path) => SapperConfig::load(path)?,
        None => SapperConfig::default(),
    };
    if let Some(height) = cli.height {
        config.grid.height = height;
    }
    if let Some(width) = cli.width {
        config.grid.width = width;
    }
    if let Some(hazards) = cli.hazards {
        config.grid.hazards = hazards;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.max_iterations.is_some() {
        config.closure.max_iterations = cli.max_iterations;
    }
    config.validate()?;
    Ok(config)
}

fn play_one(config: &SapperConfig, seed: u64) -> Result<(GameReport, Minefield)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let field = Minefield::random(config.grid()?, config.grid.hazards, &mut rng)?;
    let mut selector = RandomSelector::new(rng);
    let mut game = Game::with_config(field, config.closure.clone());
    let report = game.play(&mut selector)?;
    Ok((report, game.field().clone()))
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Won => "won".to_string(),
        Outcome::Lost { at } => format!("lost at {at}"),
        Outcome::Stalled => "stalled".to_string(),
    }
}
