mod cli;
mod config;
mod logging;
mod render;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use applies_core::{build_insights, extract_count, BadgeState, UiQuery, UiResponse};
use applies_engine::{EngineConfig, EngineHandle, PageSnapshot, RonFileStore};
use applies_logging::{applies_info, applies_warn, ExecContext};
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::logging::LogDestination;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (app_config, config_problem) = match config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    let destination = cli.log.map(LogDestination::from).unwrap_or(app_config.log);
    let mut levels = app_config.levels;
    for context in &cli.verbose {
        levels.raise(ExecContext::from(*context));
    }
    logging::initialize(destination, levels);
    if let Some(err) = config_problem {
        applies_warn!(ctx = ExecContext::Ui; "ignoring config {:?}: {:#}", cli.config, err);
    }

    match cli.command {
        Commands::Inspect {
            page_url,
            cookie,
            locale,
            html,
        } => {
            let mut engine_config = app_config.engine;
            if let Some(page_url) = page_url {
                engine_config.page_url = page_url;
            }
            if cookie.is_some() {
                engine_config.cookie = cookie;
            }
            if locale.is_some() {
                engine_config.locale = locale;
            }
            let html = match html {
                Some(path) => Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?,
                ),
                None => None,
            };

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("starting async runtime")?;
            runtime.block_on(inspect(engine_config, html, cli.json))
        }
        Commands::Extract { file } => extract(file, cli.json),
        Commands::Cache { dir } => {
            let dir = dir
                .or(app_config.engine.cache_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            list_cache(dir, cli.json)
        }
        Commands::Badge { url } => {
            println!("{}", render::render_badge(BadgeState::for_tab_url(&url)));
            Ok(())
        }
    }
}

async fn inspect(config: EngineConfig, html: Option<String>, json: bool) -> anyhow::Result<()> {
    let page_url = config.page_url.clone();
    let engine = EngineHandle::start(config)?;
    if let Some(html) = html {
        engine.navigate(PageSnapshot::new(page_url).with_html(html));
    }

    let response = engine.query(UiQuery::GetJobDetails).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    match &response {
        UiResponse::Success {
            data, subject_id, ..
        } => {
            applies_info!(ctx = ExecContext::Ui; "job details received for {}", subject_id);
            if !json {
                print!("{}", render::render_insights(&build_insights(data), subject_id));
            }
            Ok(())
        }
        UiResponse::Failure { .. } => bail!(render::render_failure(&response)),
    }
}

fn extract(file: PathBuf, json: bool) -> anyhow::Result<()> {
    let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let body: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))?;
    let result = extract_count(&body);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render::render_extraction(&result));
    }
    Ok(())
}

fn list_cache(dir: PathBuf, json: bool) -> anyhow::Result<()> {
    let store = RonFileStore::new(dir);
    let entries: Vec<_> = store
        .load()
        .with_context(|| format!("reading {}", store.path().display()))?
        .into_iter()
        .collect();
    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(key, entry)| Ok((key.clone(), serde_json::to_value(entry)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        print!("{}", render::render_cache(&entries));
    }
    Ok(())
}
