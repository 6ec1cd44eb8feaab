//! Binary entry point for santra.
//!
//! This binary provides the CLI and the HTTP server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use santra::config::SantraConfig;
use santra::graph::{RenderContext, SimulationConfig};
use santra::llm::OpenAiClient;
use santra::observability::{self, LoggingConfig};
use santra::{FilesystemIdeaStore, IdeaService};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Source recorded on ideas captured from the command line.
const CLI_SOURCE: &str = "cli";

/// Santra - capture ideas, refine them with an LLM, browse them as a graph.
#[derive(Parser)]
#[command(name = "santra")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send an idea to a running server.
    Submit {
        /// The idea text.
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,

        /// Server base URL.
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Refine and save an idea without a server.
    Capture {
        /// The idea text.
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,
    },

    /// List captured ideas, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the stored markdown of one idea.
    Show {
        /// Idea identifier.
        id: String,
    },

    /// Render the connection graph as SVG.
    Graph {
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Idea to highlight.
        #[arg(long)]
        highlight: Option<String>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match SantraConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: SantraConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve { port } => cmd_serve(config, port),
        Commands::Submit { idea, server } => cmd_submit(&config, &idea.join(" "), server),
        Commands::Capture { idea } => cmd_capture(&config, &idea.join(" ")),
        Commands::List { json } => cmd_list(&config, json),
        Commands::Show { id } => cmd_show(&config, &id),
        Commands::Graph { output, highlight } => cmd_graph(&config, output, highlight),
    }
}

/// Builds the idea service over the configured data directory.
fn build_service(config: &SantraConfig) -> IdeaService {
    IdeaService::new(
        Arc::new(FilesystemIdeaStore::new(&config.data_dir)),
        Arc::new(OpenAiClient::from_config(&config.llm)),
    )
}

/// Serve command.
fn cmd_serve(config: SantraConfig, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match port {
        Some(port) => config.with_port(port),
        None => config,
    };
    let service = build_service(&config);
    santra::server::run(&config, service)?;
    Ok(())
}

/// Submit command.
fn cmd_submit(
    config: &SantraConfig,
    idea: &str,
    server: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = server.unwrap_or_else(|| config.server_url.clone());
    let url = format!("{}/process-idea", base.trim_end_matches('/'));
    let preview: String = idea.chars().take(50).collect();
    tracing::info!(server = %base, preview = %preview, "Sending idea to server");

    let response = reqwest::blocking::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "idea": idea }))
        .send()?;

    let status = response.status();
    let body: serde_json::Value = response.json().unwrap_or(serde_json::Value::Null);
    if !status.is_success() {
        let reason = body
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));
        return Err(format!("HTTP {}: {reason}", status.as_u16()).into());
    }

    println!("Processed result:");
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Capture command.
fn cmd_capture(config: &SantraConfig, idea: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config);
    let outcome = service.process(idea, CLI_SOURCE)?;

    for idea in &outcome.saved {
        println!("Idea captured:");
        println!("  ID: {}", idea.id);
        println!("  Title: {}", idea.title);
        if !idea.tags.is_empty() {
            println!("  Tags: {}", idea.tags.join(", "));
        }
        if !idea.connections.is_empty() {
            println!("  Connections: {}", idea.connections.join(", "));
        }
    }
    if outcome.failed > 0 {
        eprintln!("Warning: {} idea(s) could not be saved", outcome.failed);
    }
    Ok(())
}

/// List command.
fn cmd_list(config: &SantraConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ideas = build_service(config).list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ideas)?);
        return Ok(());
    }

    if ideas.is_empty() {
        println!("No ideas captured yet.");
        return Ok(());
    }
    for idea in &ideas {
        println!(
            "{}  {}  {}",
            idea.created.format("%Y-%m-%d %H:%M"),
            idea.id,
            idea.title
        );
        if !idea.tags.is_empty() {
            println!("    tags: {}", idea.tags.join(", "));
        }
    }
    Ok(())
}

/// Show command.
fn cmd_show(config: &SantraConfig, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let markdown = build_service(config).raw(id)?;
    print!("{markdown}");
    Ok(())
}

/// Graph command.
fn cmd_graph(
    config: &SantraConfig,
    output: Option<PathBuf>,
    highlight: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = build_service(config).graph()?;
    let canvas = SimulationConfig::with_canvas(config.graph.width, config.graph.height);
    let mut ctx = RenderContext::settled(graph, canvas);
    if let Some(id) = highlight.as_deref() {
        if !ctx.highlight(id) {
            eprintln!("Warning: no idea with id {id} in the graph");
        }
    }

    let info = ctx.network_info();
    let svg = ctx.to_svg();
    match output {
        Some(path) => {
            std::fs::write(&path, svg)?;
            println!("Wrote {} ({info})", path.display());
        },
        None => print!("{svg}"),
    }
    Ok(())
}
