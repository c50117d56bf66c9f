//! CLI interface for inquest.
//!
//! Each subcommand is non-interactive: arguments in, output on stdout.
//!
//! - `inquest render` builds an investigation report from a JSON snapshot.
//! - `inquest tabs` lists the navigation tabs of an accident.
//!
//! Configuration comes from `~/.inquest/config.toml` unless `--config` is given.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;

use inquest::model::EntityId;
use inquest::template::{RecordingEngine, TextTemplate};
use inquest::{Config, Permissions, Snapshot, TabLabels, accident_tabs, generate};

use format::describe_document;

/// inquest: accident investigation reports.
#[derive(Debug, Parser)]
#[command(name = "inquest", after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Config file to use instead of `~/.inquest/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output language, overriding the configured one.
    #[arg(long, global = true, value_enum)]
    language: Option<LanguageArg>,

    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r"Examples:
  inquest render --snapshot records.json --investigation 1 --template report.txt
  inquest render --snapshot records.json --investigation 1 --now 1700000000
  inquest tabs 42 --language en-us";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the report of one investigation.
    ///
    /// Without `--template` the placeholder and segment bindings are printed
    /// as JSON instead of a rendered document.
    Render {
        /// JSON snapshot holding every record the build reads.
        #[arg(long)]
        snapshot: PathBuf,

        /// Investigation id.
        #[arg(long)]
        investigation: EntityId,

        /// Handlebars text template: `{{key}}` placeholders, `{{#each tag}}` regions.
        #[arg(long)]
        template: Option<PathBuf>,

        /// Write the document to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Reference time as Unix seconds. Defaults to the current time.
        #[arg(long)]
        now: Option<i64>,
    },

    /// Print the navigation tabs of an accident as JSON.
    Tabs {
        /// Accident id.
        accident: EntityId,

        /// Act as a user without read permission on accidents.
        #[arg(long)]
        no_read: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LanguageArg {
    FrFr,
    EnUs,
}

impl LanguageArg {
    fn code(self) -> &'static str {
        match self {
            Self::FrFr => "fr_FR",
            Self::EnUs => "en_US",
        }
    }
}

/// Run the CLI. Returns a displayable error on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(language) = cli.language {
        config.language = language.code().to_string();
    }

    match cli.command {
        Command::Render {
            snapshot,
            investigation,
            template,
            out,
            now,
        } => cmd_render(
            &config,
            &snapshot,
            investigation,
            template.as_deref(),
            out.as_deref(),
            now,
        ),
        Command::Tabs { accident, no_read } => cmd_tabs(&config, accident, !no_read),
    }
}

fn cmd_render(
    config: &Config,
    snapshot: &Path,
    investigation: EntityId,
    template: Option<&Path>,
    out: Option<&Path>,
    now: Option<i64>,
) -> Result<(), String> {
    let locale = config.locale()?;
    let store = Snapshot::load(snapshot)
        .map_err(|e| format!("failed to load {}: {e}", snapshot.display()))?;
    let now = match now {
        Some(seconds) => {
            Timestamp::from_second(seconds).map_err(|e| format!("invalid --now: {e}"))?
        }
        None => Timestamp::now(),
    };

    let document = match template {
        Some(path) => {
            let mut engine = TextTemplate::load(path)
                .map_err(|e| format!("failed to load template {}: {e}", path.display()))?;
            generate(&store, &mut engine, config, &locale, now, investigation)
        }
        None => {
            let mut engine = RecordingEngine::permissive();
            generate(&store, &mut engine, config, &locale, now, investigation)
        }
    }
    .map_err(|e| e.to_string())?;

    match out {
        Some(path) => {
            fs::write(path, &document.content)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("{} → {}", describe_document(&document), path.display());
        }
        None => {
            println!("{}", document.content);
        }
    }

    Ok(())
}

fn cmd_tabs(config: &Config, accident: EntityId, accident_read: bool) -> Result<(), String> {
    let labels = TabLabels::for_locale(&config.locale()?);
    let tabs = accident_tabs(
        accident,
        &Permissions { accident_read },
        &labels,
        &config.base_url,
        &config.tabs.extra,
    );

    let json = serde_json::to_string_pretty(&tabs)
        .map_err(|e| format!("failed to serialize tabs: {e}"))?;
    println!("{json}");

    Ok(())
}
