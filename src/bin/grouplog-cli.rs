use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use grouplog::topology::{Topology, TopologyReport};
use grouplog::{CascadingConfigurator, Configurator, FallbackConfigurator, LoggingSystem};

#[derive(Parser)]
#[command(name = "grouplog-cli")]
#[command(about = "Inspect and validate grouplog configuration cascades", long_about = None)]
struct Cli {
    /// Configuration documents, base first; the fallback topology if none
    #[arg(short, long = "config", global = true)]
    configs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the cascade and print every diagnostic
    Check,
    /// Print the resolved group tree
    Tree {
        /// Emit JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },
    /// Print the effective level and sink of one group
    Resolve {
        group: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let configurator: Box<dyn Configurator> = if cli.configs.is_empty() {
        Box::new(FallbackConfigurator::new())
    } else {
        Box::new(CascadingConfigurator::from_paths(&cli.configs)?)
    };

    let system = LoggingSystem::new();
    let result = system.configure(configurator.as_ref());
    let topology = match system.topology() {
        Some(topology) if !result.has_error => topology,
        _ => {
            eprintln!("{}", result.message);
            return Ok(ExitCode::FAILURE);
        }
    };

    match cli.command {
        Commands::Check => {
            println!("{}", result.message);
        }
        Commands::Tree { json } => {
            let report = topology.report();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_tree(&report);
            }
        }
        Commands::Resolve { group } => {
            return Ok(resolve(&topology, &group));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_tree(report: &TopologyReport) {
    println!("sinks:");
    for sink in &report.sinks {
        println!("  {} ({})", sink.name, sink.kind);
    }
    println!("groups:");
    for group in &report.groups {
        let explicit = |set: bool| if set { "" } else { " (inherited)" };
        println!(
            "  {}{}  level={}{}  sink={}{}",
            "  ".repeat(group.depth),
            group.name,
            group.effective_level.config_name(),
            explicit(group.level.is_some()),
            group.effective_sink,
            explicit(group.sink.is_some()),
        );
    }
}

fn resolve(topology: &Topology, group: &str) -> ExitCode {
    match (topology.effective_level(group), topology.effective_sink(group)) {
        (Some(level), Some(sink)) => {
            println!("group: {}", group);
            println!("level: {}", level.config_name());
            println!("sink:  {}", sink);
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("error: unknown group '{}'", group);
            ExitCode::FAILURE
        }
    }
}
