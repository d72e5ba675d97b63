use std::path::PathBuf;
use std::sync::Arc;

use docchat::cli::{Cli, Commands, ConfigAction};
use docchat::config::Config;
use docchat::error::{DocchatError, Result};
use docchat::index::FastEmbedProvider;
use docchat::retrieval::HybridRetriever;
use docchat::store::{ChunkRecord, ChunkStore};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            corpus,
            limit,
            json,
        } => cmd_search(cli.config, &query, &corpus, limit, json),
        Commands::Config { action } => cmd_config(cli.config, action),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "docchat=debug" } else { "docchat=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn config_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    cli_path
        .or_else(Config::default_path)
        .ok_or_else(|| DocchatError::Config("Cannot determine config directory".to_string()))
}

fn load_config(cli_path: Option<PathBuf>) -> Result<Config> {
    let path = config_path(cli_path)?;
    if path.exists() {
        Config::load(&path)
    } else {
        tracing::debug!("No config file at {:?}, using defaults", path);
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn load_corpus(path: &PathBuf) -> Result<ChunkStore> {
    let content = std::fs::read_to_string(path).map_err(|e| DocchatError::Io {
        source: e,
        context: format!("Failed to read corpus file: {:?}", path),
    })?;
    let records: Vec<ChunkRecord> =
        serde_json::from_str(&content).map_err(|e| DocchatError::Json {
            source: e,
            context: format!("Failed to parse corpus file: {:?}", path),
        })?;
    Ok(ChunkStore::from_records(records))
}

fn cmd_search(
    config_path: Option<PathBuf>,
    query: &str,
    corpus: &PathBuf,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(limit) = limit {
        config.retrieval.fused_top_k = limit;
    }

    let store = Arc::new(load_corpus(corpus)?);
    tracing::info!("Loaded {} chunks from {:?}", store.len(), corpus);

    let embedder = Arc::new(
        FastEmbedProvider::new(&config.embedding.model)
            .map_err(|e| DocchatError::Config(format!("Embedding provider: {}", e)))?,
    );

    let retriever = HybridRetriever::build(
        store,
        embedder,
        config.retrieval.clone(),
        &config.index,
        config.embedding.batch_size,
    )
    .map_err(|e| DocchatError::Config(format!("Failed to build retriever: {}", e)))?;

    if !retriever.has_lexical_channel() {
        tracing::warn!("Lexical channel unavailable, results are vector-only");
    }

    let results = retriever.retrieve(query);

    if json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|f| {
                serde_json::json!({
                    "page": f.chunk.page_number,
                    "score": f.score,
                    "text": f.chunk.text,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
    } else if results.is_empty() {
        println!("No results.");
    } else {
        for (i, fused) in results.iter().enumerate() {
            println!(
                "{:>2}. [Page {}] (score {:.5})\n    {}",
                i + 1,
                fused.chunk.page_number,
                fused.score,
                fused.chunk.text
            );
        }
    }

    Ok(())
}

fn cmd_config(cli_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    let path = config_path(cli_path)?;

    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(DocchatError::Config(format!(
                    "Config file already exists at {:?} (use --force to overwrite)",
                    path
                )));
            }
            let config = Config::default();
            config.save(&path)?;
            println!("Wrote default configuration to {:?}", path);
        }
        ConfigAction::Show => {
            let config = load_config(Some(path))?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
