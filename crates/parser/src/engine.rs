//! File parse orchestrator.
//!
//! Resolves an input (path, raw buffer, or literal text) to content, selects
//! a classifier through the registry, parses, and optionally enriches the
//! result. Directory mode discovers files by extension and parses them
//! concurrently; a file nobody claims fails on its own without aborting the
//! rest of the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use walkdir::WalkDir;

use crate::cache::{FileCache, GameDataCache};
use crate::config::EngineConfig;
use crate::enrich::enrich_result;
use crate::model::ParsedLog;
use crate::provider::GameDataProvider;
use crate::registry::ClassifierRegistry;

#[derive(Debug, Error)]
pub enum ParseError {
    /// No classifier claimed the input. Reported per file so batch callers
    /// can continue past it.
    #[error("no parser found for {0}")]
    NoParserFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One unit of parse input.
pub enum ParseInput {
    /// Literal text. A string naming an existing file is read from disk
    /// instead.
    Text(String),
    Bytes(Vec<u8>),
    Path(PathBuf),
}

pub struct LogEngine {
    registry: ClassifierRegistry,
    provider: Option<Arc<dyn GameDataProvider>>,
    cache: Option<Arc<dyn GameDataCache>>,
    config: EngineConfig,
}

impl LogEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache: Option<Arc<dyn GameDataCache>> = config.cache_path.as_ref().map(|path| {
            Arc::new(FileCache::new(
                path.clone(),
                config.cache_ttl_secs.map(Duration::from_secs),
            )) as Arc<dyn GameDataCache>
        });
        Self {
            registry: ClassifierRegistry::default_set(),
            provider: None,
            cache,
            config,
        }
    }

    pub fn with_registry(mut self, registry: ClassifierRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn GameDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn GameDataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Parse one input. The only hard failure is an input no classifier
    /// claims; everything past detection degrades instead of failing.
    pub async fn parse(&self, input: ParseInput) -> Result<ParsedLog, ParseError> {
        let (file_path, content) = self.resolve_input(input).await?;
        let display_name = file_path
            .clone()
            .unwrap_or_else(|| "provided content".to_string());
        let base_name = file_path
            .as_deref()
            .map(base_name)
            .unwrap_or("content.log");

        let classifier = self
            .registry
            .detect(base_name, &content)
            .ok_or_else(|| ParseError::NoParserFound(display_name.clone()))?;

        tracing::debug!(
            input = %display_name,
            log_type = classifier.log_type().as_str(),
            "classifier selected"
        );
        let mut result = classifier.parse(&content, file_path.as_deref());

        if self.config.enrich_game_data {
            if let Some(provider) = &self.provider {
                enrich_result(&mut result, provider.as_ref(), self.cache.as_deref()).await;
            }
        }
        Ok(result)
    }

    pub async fn parse_file(&self, path: impl Into<PathBuf>) -> Result<ParsedLog, ParseError> {
        self.parse(ParseInput::Path(path.into())).await
    }

    /// Parse many files concurrently, one result per input in input order.
    pub async fn parse_files(
        &self,
        paths: &[PathBuf],
    ) -> Vec<Result<ParsedLog, ParseError>> {
        join_all(paths.iter().map(|p| self.parse_file(p.clone()))).await
    }

    /// Discover `*.{log_extension}` files under `dir` recursively and parse
    /// them concurrently. Results come back in discovery order.
    pub async fn parse_directory(
        &self,
        dir: impl AsRef<Path>,
    ) -> Vec<Result<ParsedLog, ParseError>> {
        let extension = self.config.log_extension.as_str();
        let files: Vec<PathBuf> = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .map(|entry| entry.into_path())
            .collect();

        tracing::info!(count = files.len(), "parsing discovered log files");
        self.parse_files(&files).await
    }

    async fn resolve_input(
        &self,
        input: ParseInput,
    ) -> Result<(Option<String>, String), ParseError> {
        match input {
            ParseInput::Text(text) => {
                if tokio::fs::try_exists(&text).await.unwrap_or(false) {
                    let content = tokio::fs::read_to_string(&text).await?;
                    Ok((Some(text), content))
                } else {
                    Ok((None, text))
                }
            }
            ParseInput::Bytes(bytes) => Ok((None, String::from_utf8_lossy(&bytes).into_owned())),
            ParseInput::Path(path) => {
                let content = tokio::fs::read_to_string(&path).await?;
                Ok((Some(path.display().to_string()), content))
            }
        }
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
