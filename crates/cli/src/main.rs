mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use ragline_core::{config::load_dotenv, Config, Metadata, RaglineError};
use ragline_llm::{embedder_from_config, GenerateOptions, LlmProvider, OllamaProvider};
use ragline_pipeline::IngestionPipeline;
use ragline_store::{ChromaStore, MemoryStore, VectorStore};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let mut config = Config::from_env();
    if let Some(collection) = args.collection {
        config.store.collection_name = collection;
    }

    let store = build_store(&config).context("failed to open vector store")?;

    match args.command {
        Command::Ingest { path } => {
            let embedder = embedder_from_config(&config.embedding)
                .context("failed to create embedding backend")?;
            let pipeline = IngestionPipeline::new(&config, embedder, store);

            if path.is_dir() {
                let report = pipeline.ingest_directory(&path).await?;
                println!(
                    "{} documents: {} stored, {} skipped, {} failed",
                    report.total(),
                    report.succeeded,
                    report.skipped,
                    report.failed
                );
                if report.failed > 0 {
                    bail!("{} document(s) failed", report.failed);
                }
            } else {
                let outcome = pipeline.ingest_file(&path).await?;
                info!(path = %outcome.relative_path, chunks = outcome.chunks, "ingested");
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        }

        Command::Search {
            query,
            limit,
            filters,
            json,
        } => {
            let embedder = embedder_from_config(&config.embedding)
                .context("failed to create embedding backend")?;
            let pipeline = IngestionPipeline::new(&config, embedder, store);

            let filter: Option<Metadata> = if filters.is_empty() {
                None
            } else {
                Some(filters.into_iter().map(|(k, v)| (k, v.into())).collect())
            };

            let hits = pipeline.search(&query, limit, filter.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("no results");
            } else {
                for (rank, hit) in hits.iter().enumerate() {
                    let source = hit
                        .metadata
                        .get("relative_path")
                        .and_then(|v| v.as_str())
                        .unwrap_or("<unknown>");
                    println!(
                        "{}. [{:.4}] {}\n   {}",
                        rank + 1,
                        hit.distance,
                        source,
                        hit.content.replace('\n', "\n   ")
                    );
                }
            }
        }

        Command::Ask { question, context } => {
            let embedder = embedder_from_config(&config.embedding)
                .context("failed to create embedding backend")?;
            let pipeline = IngestionPipeline::new(&config, embedder, store);

            let hits = pipeline.search(&question, context, None).await?;
            if hits.is_empty() {
                bail!("no stored documents to answer from");
            }

            let provider = OllamaProvider::new(
                config.llm.base_url.clone(),
                config.llm.model.clone(),
            );
            let options = GenerateOptions {
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            };

            let mut prompt = String::from(
                "Answer the question using only the context below. \
                 If the context is insufficient, say so.\n\n",
            );
            for (i, hit) in hits.iter().enumerate() {
                prompt.push_str(&format!("[{}] {}\n\n", i + 1, hit.content));
            }
            prompt.push_str(&format!("Question: {question}\nAnswer:"));

            info!(context_chunks = hits.len(), model = %config.llm.model, "generating answer");
            let answer = provider.generate(&prompt, &options).await?;
            println!("{}", answer.trim());
        }

        Command::Collections => {
            let names = store.list_collections().await?;
            if names.is_empty() {
                println!("no collections");
            }
            for name in names {
                println!("{name}");
            }
        }

        Command::DeleteCollection { name } => {
            store.delete_collection(&name).await?;
            println!("deleted collection '{name}'");
        }
    }

    Ok(())
}

fn build_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::open(
            config.store.persist_directory.clone(),
        )?)),
        "chroma" => Ok(Arc::new(ChromaStore::new(config.store.url.clone()))),
        other => Err(RaglineError::Config(format!("unknown store backend: {other}")).into()),
    }
}
