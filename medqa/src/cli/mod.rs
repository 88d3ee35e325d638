use std::path::PathBuf;

use clap::{Parser, Subcommand};
use medqa::domain::Metadata;
use medqa::{Config, LiveMedQa, MedQaError, Result};

mod ask;
mod health;
mod ingest;
mod search;

#[derive(Parser)]
#[command(name = "medqa")]
#[command(about = "Question answering over a medical document corpus")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, global = true, help = "Config file to use instead of the global/project files")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Skip loading documents from the data directory")]
    pub skip_bootstrap: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Answer a question from the indexed documents")]
    Ask {
        #[arg(help = "Question to answer")]
        question: String,

        #[arg(long, help = "Omit source passages from the answer")]
        no_sources: bool,

        #[arg(long, default_value = "3", help = "Maximum source passages (1-10)")]
        max_sources: usize,
    },

    #[command(about = "Find passages similar to a question")]
    Search {
        #[arg(help = "Search query")]
        question: String,

        #[arg(long, default_value = "4", help = "Maximum results to return (1-10)")]
        limit: usize,

        #[arg(long, help = "Drop results scoring below this threshold")]
        threshold: Option<f32>,
    },

    #[command(about = "Index a text or markdown file")]
    Ingest {
        #[arg(help = "File to ingest")]
        path: PathBuf,
    },

    #[command(about = "Index raw text")]
    IngestText {
        #[arg(help = "Text to ingest")]
        text: String,

        #[arg(long = "meta", value_parser = parse_key_val, help = "Metadata entry as key=value")]
        metadata: Vec<(String, String)>,
    },

    #[command(about = "Show service health")]
    Health,

    #[command(about = "Show vector index statistics")]
    Stats,
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.skip_bootstrap {
        config.ingest.skip_document_processing = true;
    }
    medqa::logging::init(&config.app);
    tracing::info!("Starting {} v{}", config.app.name, config.app.version);

    let app = LiveMedQa::from_config(config)?;
    let startup = app.start().await?;
    tracing::debug!("Startup bootstrap: {}", startup.bootstrap);

    match cli.command {
        Commands::Ask {
            question,
            no_sources,
            max_sources,
        } => ask::run(&app, &question, !no_sources, max_sources, cli.json).await,
        Commands::Search {
            question,
            limit,
            threshold,
        } => search::run(&app, &question, limit, threshold, cli.json).await,
        Commands::Ingest { path } => ingest::run_file(&app, &path, cli.json).await,
        Commands::IngestText { text, metadata } => {
            let metadata: Metadata = metadata
                .into_iter()
                .map(|(k, v)| (k, v.into()))
                .collect();
            ingest::run_text(&app, &text, metadata, cli.json).await
        }
        Commands::Health => health::run(&app, cli.json).await,
        Commands::Stats => health::run_stats(&app, cli.json).await,
    }
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).map_err(MedQaError::from)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("source=cardiology notes").unwrap(),
            ("source".to_string(), "cardiology notes".to_string())
        );
        assert!(parse_key_val("no-separator").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from(["medqa", "--json", "search", "stroke", "--limit", "5"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Search { limit: 5, threshold: None, .. }));
    }

    #[test]
    fn test_cli_search_limit_defaults_to_four() {
        let cli = Cli::try_parse_from(["medqa", "search", "stroke"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { limit: 4, .. }));
    }
}
