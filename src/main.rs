use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use gap_core::{GapConfig, OutputFormat};
use gap_history::activity::ActivityLog;
use gap_history::identity::IdentityMap;
use gap_history::mining::{mine_repositories, MiningOptions};
use gap_model::forecast::{forecast_all, ForecastOptions};

mod render;

#[derive(Parser)]
#[command(
    name = "gap",
    version,
    about = "Git Activity Predictor",
    long_about = "Predict when contributors are likely to be active again.\n\n\
                   Mines git history, measures the gaps between each contributor's active days,\n\
                   and fits a survival model over the most recent gaps to forecast their next activity.\n\n\
                   Examples:\n  \
                     gap predict                       Forecast contributors of the current repository\n  \
                     gap predict ../a ../b --obs 10    Merge two repositories, use 10 gaps per author\n  \
                     gap predict --probs 0.5 0.8       Choose the probabilities to forecast\n  \
                     gap --format timeline predict     Chart past activity and forecasts\n  \
                     gap init                          Create a .gap.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .gap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Aligned table (default)\n  \
                         csv       Comma-separated values with a header row\n  \
                         json      Object keyed by author, with a list of predictions\n  \
                         markdown  GitHub-flavored Markdown table\n  \
                         timeline  Terminal chart of the last and next 28 days"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Forecast the next activity of each contributor
    #[command(long_about = "Forecast the next activity of each contributor.\n\n\
        For every author with enough observations, the gaps between their most recent\n\
        active days are fitted with a Kaplan-Meier survival curve. Each requested\n\
        probability p yields the date by which the author is active again with\n\
        probability p, counted from their last activity.\n\n\
        Examples:\n  gap predict\n  gap predict --date 2024-06-01 --limit 60\n  gap predict --mapping authors.csv --branches main")]
    Predict {
        /// Paths to one or more git repositories
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,

        /// Date used for predictions, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Number of observations (gaps) to consider (default: 20)
        #[arg(long)]
        obs: Option<usize>,

        /// Probabilities to output, in [0, 1] (default: 0.5 0.7 0.9)
        #[arg(long, value_name = "PROB", num_args = 1..)]
        probs: Vec<f64>,

        /// Only report contributors active during the last N days (default: 30)
        #[arg(long)]
        limit: Option<u32>,

        /// CSV file merging names into identities
        #[arg(
            long,
            long_help = "CSV file merging author names into identities.\n\n\
                Each line holds two values: the name to be merged, and the corresponding\n\
                identity. Use IGNORE as identity to ignore specific names."
        )]
        mapping: Option<PathBuf>,

        /// Git branches to analyse (default: all)
        #[arg(long, value_name = "BRANCH", num_args = 1..)]
        branches: Vec<String>,
    },
    /// Create a default .gap.toml configuration file
    #[command(long_about = "Create a default .gap.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .gap.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mgap\x1b[0m v{version} — Git Activity Predictor\n");

        println!("Quick start:");
        println!("  \x1b[36mgap predict\x1b[0m                   Forecast contributors of this repository");
        println!("  \x1b[36mgap init\x1b[0m                      Create a .gap.toml config file\n");
    } else {
        println!("gap v{version} — Git Activity Predictor\n");

        println!("Quick start:");
        println!("  gap predict                   Forecast contributors of this repository");
        println!("  gap init                      Create a .gap.toml config file\n");
    }

    println!("Run 'gap <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gap=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

const DEFAULT_CONFIG: &str = r#"# gap configuration
# See: https://github.com/AlexandreDecan/gap

[model]
# Number of most recent gaps between active days used per contributor
# window_size = 20
# Probabilities to forecast, in [0, 1]
# probabilities = [0.5, 0.7, 0.9]

[history]
# Branches to analyse (empty = all refs)
# branches = ["main"]
# CSV file merging names into identities (use IGNORE to drop a name)
# mapping = "authors.csv"

[report]
# Only report contributors active during the last N days
# active_within_days = 30
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => GapConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".gap.toml");
            if default_path.exists() {
                GapConfig::from_file(default_path)?
            } else {
                GapConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    tracing::debug!(format = %cli.format, "starting");

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Predict {
            ref paths,
            date,
            obs,
            ref probs,
            limit,
            ref mapping,
            ref branches,
        }) => {
            if let Some(obs) = obs {
                config.model.window_size = obs;
            }
            if !probs.is_empty() {
                config.model.probabilities.clone_from(probs);
            }
            if let Some(limit) = limit {
                config.report.active_within_days = limit;
            }
            if mapping.is_some() {
                config.history.mapping.clone_from(mapping);
            }
            if !branches.is_empty() {
                config.history.branches.clone_from(branches);
            }
            config.validate()?;

            for path in paths {
                if git2::Repository::open(path).is_err() {
                    miette::bail!(miette::miette!(
                        help = "Run gap from inside a git repository, or pass the repository path",
                        "Unable to access repository: {}",
                        path.display()
                    ));
                }
            }

            let identities = match &config.history.mapping {
                Some(path) => IdentityMap::from_file(path)?,
                None => IdentityMap::default(),
            };

            let options = MiningOptions {
                branches: config.history.branches.clone(),
            };
            let progress = spinner("Mining git history...");
            let mined = mine_repositories(paths, &options);
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            let commits = mined?;
            tracing::info!(commits = commits.len(), "history mined");

            let activity = ActivityLog::from_commits(&commits, &identities);

            let as_of = date.unwrap_or_else(|| Local::now().date_naive());
            let forecast_options = ForecastOptions::from_config(&config, as_of);
            let forecasts = forecast_all(activity.iter(), &forecast_options)?;

            if forecasts.is_empty() {
                println!(
                    "No author has {} observations and was active at least once during the last {} days",
                    forecast_options.window_size, forecast_options.active_within_days
                );
                return Ok(());
            }

            let output = render::render(&forecasts, &forecast_options, cli.format, use_color)?;
            print!("{output}");
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".gap.toml");
            if path.exists() {
                miette::bail!(".gap.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .gap.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gap", &mut std::io::stdout());
        }
    }

    Ok(())
}
