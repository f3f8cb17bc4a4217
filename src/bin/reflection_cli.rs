use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use reflection::host::{load_settings, HostServices, MemoryStore, SystemClock};
use reflection::host::{DefaultFieldFormatter, FormatterRegistry};
use reflection::expression::FunctionRegistry;
use reflection::recompile::{RecompileOptions, SectionStatus};
use reflection::{EventBus, RecompileDriver, ReflectionError, ReflectionHandler};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the settings file
    #[arg(short, long)]
    config: Option<String>,

    /// Increase output verbosity (repeat for more, -vvv shows progress bars)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompile the reflection fields of existing entries
    Recompile {
        /// Comma-separated section handles (defaults to all sections)
        sections: Option<String>,
    },
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run(cli: &Cli) -> Result<(), ReflectionError> {
    let settings = load_settings(cli.config.as_deref())?;
    let store = Arc::new(MemoryStore::from_fixture_file(&settings.data_path)?);

    let host = Arc::new(HostServices {
        clock: Arc::new(SystemClock),
        site: settings.site.clone(),
        environment: settings.environment,
        sections: store.clone(),
        entries: store.clone(),
        configs: store,
        field_formatter: Arc::new(DefaultFieldFormatter),
        value_formatters: FormatterRegistry::new(),
        functions: FunctionRegistry::new(),
        entry_handle: settings.entry_handle.clone(),
        stylesheet_dir: settings.stylesheet_dir.clone(),
    });

    let mut bus = EventBus::new();
    bus.register(Box::new(ReflectionHandler::new(host.clone())));
    let driver = RecompileDriver::new(host, Some(Arc::new(bus)));

    match &cli.command {
        Commands::Recompile { sections } => {
            let report = driver.run(&RecompileOptions {
                sections: sections.clone(),
                verbosity: cli.verbose,
            })?;

            for outcome in &report.outcomes {
                match &outcome.status {
                    SectionStatus::Recompiled { entries } => println!(
                        "{} {} ({} entr{})",
                        "recompiled".green(),
                        outcome.name,
                        entries,
                        if *entries == 1 { "y" } else { "ies" }
                    ),
                    SectionStatus::SkippedNoReflectionFields => println!(
                        "{} {} (no reflection fields)",
                        "skipped".yellow(),
                        outcome.name
                    ),
                    SectionStatus::SkippedNoEntries => {
                        println!("{} {} (no entries)", "skipped".yellow(), outcome.name)
                    }
                }
            }
            println!(
                "{} {} entr{} recompiled",
                "done:".bold(),
                report.entries_recompiled,
                if report.entries_recompiled == 1 {
                    "y"
                } else {
                    "ies"
                }
            );
            Ok(())
        }
    }
}


fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_default_env()
        .filter_level(level_for(cli.verbose))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
