//! `ragadmin models` command implementation

use crate::api::{ModelInput, ModelStatus, ModelType, RunStatus, TestType};
use crate::cache::QueryKey;
use crate::commands::{confirm, success, warning, watch_until_interrupted, Context};
use crate::error::Result;
use crate::poll::Poller;
use crate::progress::{create_wait_spinner, with_spinner};
use crate::render;
use crate::workflow::models::{input_from_model, latency_trend, BENCHMARKS_POLL_INTERVAL};
use crate::workflow::ModelRegistry;
use crate::OutputFormat;
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::watch;

fn registry(ctx: &Context) -> ModelRegistry {
    ModelRegistry::new(Arc::clone(&ctx.api), ctx.cache.clone())
}

pub async fn list(ctx: &Context, format: OutputFormat) -> Result<()> {
    let models = with_spinner("Loading models", registry(ctx).list()).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&models)?),
        OutputFormat::Table if models.is_empty() => println!("No models registered."),
        OutputFormat::Table => println!("{}", render::models_table(&models)),
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let model = with_spinner("Loading model", registry(ctx).get(id)).await?;
    println!("{}", render::model_detail_table(&model));
    Ok(())
}

pub async fn register(
    ctx: &Context,
    name: String,
    model_type: ModelType,
    factory: String,
    api_base: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let input = ModelInput {
        name: Some(name),
        model_type: Some(model_type),
        factory: Some(factory),
        api_base,
        api_key,
        status: None,
    };
    let ack = registry(ctx).register(&input).await?;
    let id = ack.id_string().unwrap_or_default();
    success(format!("Registered model {} {}", input.name.unwrap_or_default().cyan(), id.dimmed()));
    Ok(())
}

/// Fields left unset keep the model's current values
pub struct ModelChanges {
    pub name: Option<String>,
    pub model_type: Option<ModelType>,
    pub factory: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub status: Option<ModelStatus>,
}

pub async fn update(ctx: &Context, id: &str, changes: ModelChanges) -> Result<()> {
    let models = registry(ctx);
    let current = models.get(id).await?;

    let mut input = input_from_model(&current);
    if changes.name.is_some() {
        input.name = changes.name;
    }
    if changes.model_type.is_some() {
        input.model_type = changes.model_type;
    }
    if changes.factory.is_some() {
        input.factory = changes.factory;
    }
    if changes.api_base.is_some() {
        input.api_base = changes.api_base;
    }
    input.api_key = changes.api_key;
    if changes.status.is_some() {
        input.status = changes.status;
    }

    models.update(id, &input).await?;
    success(format!("Updated model {}", id.cyan()));
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    let Some(confirmed) = confirm(&format!("Delete model {}?", id), yes)? else {
        return Ok(());
    };
    registry(ctx).delete(id, confirmed).await?;
    success(format!("Deleted model {}", id.cyan()));
    Ok(())
}

pub async fn run_benchmark(
    ctx: &Context,
    id: &str,
    test_type: TestType,
    wait: bool,
    max_polls: u32,
) -> Result<()> {
    let models = registry(ctx);
    let run = models.run_benchmark(id, test_type).await?;
    let run_id = run.id_string();
    success(format!("Started {} benchmark {} for {}", test_type, run_id.cyan(), id));

    if !wait {
        println!("Check progress with: ragadmin models benchmark list --model {}", id);
        return Ok(());
    }

    let pb = create_wait_spinner(&format!("Waiting for benchmark {}", run_id));
    let finished = models
        .wait_for_benchmark(id, &run_id, BENCHMARKS_POLL_INTERVAL, max_polls)
        .await;
    pb.finish_and_clear();
    let finished = finished?;

    match finished.status {
        RunStatus::Failed => warning(format!(
            "Benchmark {} failed: {}",
            run_id,
            finished.error.as_deref().unwrap_or("no error message")
        )),
        _ => success(format!(
            "Benchmark {} completed: {}",
            run_id,
            render::benchmark_summary(&finished)
        )),
    }
    Ok(())
}

pub async fn list_benchmarks(
    ctx: &Context,
    model: Option<String>,
    format: OutputFormat,
    watch_mode: bool,
) -> Result<()> {
    if watch_mode {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let api = Arc::clone(&ctx.api);
        let filter = model.clone();
        let key = QueryKey::Benchmarks(model.clone());
        let (states, handle) = Poller::new(key, BENCHMARKS_POLL_INTERVAL, ctx.cache.clone()).spawn(
            move || {
                let api = Arc::clone(&api);
                let filter = filter.clone();
                async move { api.list_benchmarks(filter.as_deref()).await }
            },
            shutdown_rx,
        );
        return watch_until_interrupted(states, handle, shutdown_tx, |runs| {
            print_benchmarks(runs, format)
        })
        .await;
    }

    let runs = with_spinner("Loading benchmarks", registry(ctx).benchmarks(model.as_deref())).await?;
    print_benchmarks(&runs, format)
}

fn print_benchmarks(runs: &[crate::api::BenchmarkRun], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(runs)?),
        OutputFormat::Table => {
            if runs.is_empty() {
                println!("No benchmark runs yet.");
                return Ok(());
            }
            println!("{}", render::benchmarks_table(runs));

            let trend = latency_trend(runs);
            if trend.len() > 1 {
                println!("{}", "Latency trend:".cyan());
                for (timestamp, ms) in trend {
                    println!("  {}  {:.2}ms", timestamp, ms);
                }
            }
        },
    }
    Ok(())
}

pub async fn compare(ctx: &Context, ids: &[String]) -> Result<()> {
    let comparison = with_spinner("Comparing models", registry(ctx).compare(ids)).await?;
    if comparison.models.is_empty() {
        warning("None of the given models were found");
        return Ok(());
    }
    println!("{}", render::comparison_table(&comparison));
    Ok(())
}
