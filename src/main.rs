use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use url::Url;

use sift::api;
use sift::client::{ConcurrentClient, ResearchClient};
use sift::config::CONFIG;
use sift::renderer::{RendererKind, SummaryRenderer};
use sift::session::{PageSurface, ResearchDesk, TerminalSurface};
use sift::view;

#[derive(Parser, Debug)]
#[command(
    name = "sift",
    version,
    about = "Ask a research service and render its answer as HTML"
)]
struct Cli {
    /// Base URL of the research service (defaults to SIFT_API_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Summary renderer (defaults to SIFT_RENDERER)
    #[arg(long, value_enum, global = true)]
    renderer: Option<RendererKind>,

    /// Request timeout in seconds, 0 disables it (defaults to SIFT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one query and print the rendered fragments
    Ask {
        #[arg(required = true)]
        query: Vec<String>,

        /// Write a complete HTML page here instead of printing fragments
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Read queries line by line; each line is one submission
    Repl,
    /// Render a Markdown summary from a file, or stdin, without querying
    Render { file: Option<PathBuf> },
    /// Serve the query form and rendered results over HTTP
    Serve {
        /// Address to listen on (defaults to SIFT_BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let renderer_kind =
        RendererKind::resolve(cli.renderer, &CONFIG.renderer).map_err(anyhow::Error::msg)?;
    let renderer: Arc<dyn SummaryRenderer> = Arc::from(renderer_kind.build());

    match &cli.command {
        Command::Render { file } => {
            let raw = match file {
                Some(path) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut raw = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut raw)
                        .await
                        .context("Failed to read stdin")?;
                    raw
                }
            };
            println!("{}", renderer.render(&raw));
        }
        Command::Ask { query, output } => {
            let desk = ResearchDesk::new(Arc::new(build_client(&cli)?), renderer);
            let query = query.join(" ");
            let succeeded = match output {
                Some(path) => {
                    let surface = PageSurface::new(query.trim());
                    let outcome = desk.search(&query, &surface).await;
                    tokio::fs::write(path, view::page(&surface.snapshot()))
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if let Err(e) = &outcome {
                        eprintln!("error: {e}");
                    }
                    outcome.is_ok()
                }
                None => desk.search(&query, &TerminalSurface).await.is_ok(),
            };
            if !succeeded {
                std::process::exit(1);
            }
        }
        Command::Repl => {
            let desk = ResearchDesk::new(Arc::new(build_client(&cli)?), renderer);
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                eprint!("query> ");
                std::io::stderr().flush().ok();
                let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
                    break;
                };
                if matches!(line.trim(), "quit" | "exit") {
                    break;
                }
                // outcome is already on the terminal
                let _ = desk.search(&line, &TerminalSurface).await;
            }
        }
        Command::Serve { bind } => {
            // every visitor submits on their own page
            let client = ConcurrentClient::new(build_client(&cli)?);
            let desk = Arc::new(ResearchDesk::new(Arc::new(client), renderer));
            let bind = bind.clone().unwrap_or_else(|| CONFIG.bind_addr.clone());
            api::serve(desk, &bind).await?;
        }
    }

    Ok(())
}

fn build_client(cli: &Cli) -> anyhow::Result<ResearchClient> {
    let base = cli.endpoint.clone().unwrap_or_else(|| CONFIG.api_url.clone());
    let base = Url::parse(&base).with_context(|| format!("Invalid research service URL: {base}"))?;
    let timeout = match cli.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => CONFIG.timeout,
    };

    let client = ResearchClient::new(&base, timeout)?;
    tracing::debug!("research endpoint: {}", client.endpoint());
    Ok(client)
}
