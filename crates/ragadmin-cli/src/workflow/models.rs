//! Model registry workflow
//!
//! CRUD over model definitions, fire-and-forget benchmark runs with polling,
//! and cross-model comparison.

use crate::api::{
    AdminApi, BenchmarkRun, Model, ModelComparison, ModelInput, MutationAck, RunStatus, TestType,
};
use crate::cache::{QueryCache, QueryKey};
use crate::error::{CliError, Result};
use crate::workflow::dialog::MutationGuard;
use ragadmin_common::validation;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Refetch interval for benchmark listings
pub const BENCHMARKS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of polls before `wait_for_benchmark` gives up
pub const DEFAULT_MAX_POLLS: u32 = 60;

/// Model registry operations over an [`AdminApi`]
#[derive(Clone)]
pub struct ModelRegistry {
    api: Arc<dyn AdminApi>,
    cache: QueryCache,
    guard: MutationGuard,
}

impl ModelRegistry {
    pub fn new(api: Arc<dyn AdminApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            guard: MutationGuard::new(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Model>> {
        self.cache
            .fetch_with(QueryKey::Models, || self.api.list_models())
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Model> {
        self.cache
            .fetch_with(QueryKey::ModelDetail(id.to_string()), || self.api.get_model(id))
            .await
    }

    pub async fn register(&self, input: &ModelInput) -> Result<MutationAck> {
        validate_input(input)?;
        let name = input.name.clone().unwrap_or_default();
        let ack = self
            .guard
            .run(format!("register:{}", name), self.api.register_model(input))
            .await?;
        info!(name = %name, "Registered model");
        self.cache.invalidate(QueryKey::Models).await;
        Ok(ack)
    }

    pub async fn update(&self, id: &str, input: &ModelInput) -> Result<MutationAck> {
        validate_input(input)?;
        let ack = self
            .guard
            .run(format!("update:{}", id), self.api.update_model(id, input))
            .await?;
        info!(id = %id, "Updated model");
        self.cache.invalidate(QueryKey::Models).await;
        Ok(ack)
    }

    pub async fn delete(&self, id: &str, confirmed: bool) -> Result<MutationAck> {
        if !confirmed {
            return Err(CliError::ConfirmationRequired(format!("Deleting model {}", id)));
        }
        let ack = self
            .guard
            .run(format!("delete:{}", id), self.api.delete_model(id))
            .await?;
        info!(id = %id, "Deleted model");
        self.cache.invalidate(QueryKey::Models).await;
        self.cache.invalidate(QueryKey::ModelVersions(id.to_string())).await;
        self.cache.invalidate(QueryKey::Benchmarks(Some(id.to_string()))).await;
        Ok(ack)
    }

    /// Start a benchmark and return immediately with the created run
    pub async fn run_benchmark(&self, id: &str, test_type: TestType) -> Result<BenchmarkRun> {
        if test_type == TestType::Other {
            return Err(CliError::validation(
                "test_type",
                "Choose one of latency, quality, throughput",
            ));
        }
        let run = self
            .guard
            .run(format!("benchmark:{}", id), self.api.run_benchmark(id, test_type))
            .await?;
        info!(model = %id, test_type = %test_type, run = %run.id_string(), "Started benchmark");
        self.cache.invalidate(QueryKey::Benchmarks(Some(id.to_string()))).await;
        self.cache.invalidate(QueryKey::Benchmarks(None)).await;
        Ok(run)
    }

    pub async fn benchmarks(&self, model_id: Option<&str>) -> Result<Vec<BenchmarkRun>> {
        let key = QueryKey::Benchmarks(model_id.map(str::to_string));
        self.cache
            .fetch_with(key, || self.api.list_benchmarks(model_id))
            .await
    }

    /// Poll the benchmark listing until `run_id` reaches a terminal state
    pub async fn wait_for_benchmark(
        &self,
        model_id: &str,
        run_id: &str,
        interval: Duration,
        max_polls: u32,
    ) -> Result<BenchmarkRun> {
        let key = QueryKey::Benchmarks(Some(model_id.to_string()));
        let mut ticker = tokio::time::interval(interval);

        for poll in 1..=max_polls {
            ticker.tick().await;
            let runs = self
                .cache
                .refetch(key.clone(), || self.api.list_benchmarks(Some(model_id)))
                .await?;

            match runs.into_iter().find(|r| r.id_string() == run_id) {
                Some(run) if run.status.is_terminal() => {
                    info!(run = %run_id, status = run.status.as_str(), polls = poll, "Benchmark finished");
                    return Ok(run);
                },
                Some(run) => {
                    debug!(run = %run_id, status = run.status.as_str(), poll, "Benchmark still running");
                },
                None => debug!(run = %run_id, poll, "Benchmark not listed yet"),
            }
        }

        Err(CliError::Timeout(format!(
            "benchmark {} did not finish after {} polls",
            run_id, max_polls
        )))
    }

    pub async fn compare(&self, ids: &[String]) -> Result<ModelComparison> {
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !unique.iter().any(|u| u == id) {
                unique.push(id.to_string());
            }
        }
        if unique.is_empty() {
            return Err(CliError::validation(
                "model_ids",
                "Select at least one model to compare",
            ));
        }
        self.api.compare_models(&unique).await
    }
}

/// (timestamp, average latency in ms) for completed latency runs, oldest first
pub fn latency_trend(runs: &[BenchmarkRun]) -> Vec<(String, f64)> {
    let mut points: Vec<(String, f64)> = runs
        .iter()
        .filter(|r| r.test_type == TestType::Latency && r.status == RunStatus::Completed)
        .filter_map(|r| Some((r.timestamp.clone(), r.result_f64("avg_latency_ms")?)))
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0));
    points
}

fn validate_input(input: &ModelInput) -> Result<()> {
    validation::require("name", input.name.as_deref().unwrap_or_default())?;
    if input.model_type.is_none() {
        return Err(CliError::validation("model_type", "Please select model type"));
    }
    validation::require("factory", input.factory.as_deref().unwrap_or_default())?;
    Ok(())
}

/// Start an edit form from the current definition
pub fn input_from_model(model: &Model) -> ModelInput {
    ModelInput {
        name: Some(model.name.clone()),
        model_type: Some(model.model_type),
        factory: Some(model.factory.clone()),
        api_base: model.api_base.clone(),
        api_key: None,
        status: Some(model.status),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::{ModelType, ModelVersion};
    use crate::workflow::testing::FakeApi;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn registry(api: &Arc<FakeApi>) -> ModelRegistry {
        ModelRegistry::new(api.clone(), QueryCache::default())
    }

    fn run(id: u32, test_type: TestType, status: RunStatus, results: serde_json::Value, ts: &str) -> BenchmarkRun {
        BenchmarkRun {
            id: json!(id),
            model_id: "m1".into(),
            model_name: "llama3".into(),
            test_type,
            status,
            results: Some(results),
            error: None,
            timestamp: ts.into(),
        }
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let api = Arc::new(FakeApi::new());
        let models = registry(&api);

        let input = ModelInput {
            name: Some("gpt-4o".into()),
            factory: Some("OpenAI".into()),
            ..Default::default()
        };
        let err = models.register(&input).await.unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_register_invalidates_listing() {
        let api = Arc::new(FakeApi::new());
        let models = registry(&api);
        assert!(models.list().await.unwrap().is_empty());

        let input = ModelInput {
            name: Some("bge".into()),
            model_type: Some(ModelType::Embedding),
            factory: Some("HuggingFace".into()),
            ..Default::default()
        };
        let ack = models.register(&input).await.unwrap();
        assert_eq!(ack.status, "registered");
        assert_eq!(models.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_invalidates_versions_and_benchmarks() {
        let api = Arc::new(FakeApi::new());
        api.add_model("m1", "llama3");
        let cache = QueryCache::default();
        let models = ModelRegistry::new(api.clone(), cache.clone());

        let versions_key = QueryKey::ModelVersions("m1".into());
        let runs_key = QueryKey::Benchmarks(Some("m1".into()));
        let other_key = QueryKey::ModelVersions("m2".into());
        cache.set(versions_key.clone(), &Vec::<ModelVersion>::new()).await.unwrap();
        cache.set(runs_key.clone(), &Vec::<BenchmarkRun>::new()).await.unwrap();
        cache.set(other_key.clone(), &Vec::<ModelVersion>::new()).await.unwrap();

        models.delete("m1", true).await.unwrap();

        assert!(cache.get::<Vec<ModelVersion>>(&versions_key).await.unwrap().is_none());
        assert!(cache.get::<Vec<BenchmarkRun>>(&runs_key).await.unwrap().is_none());
        assert!(cache.get::<Vec<ModelVersion>>(&other_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_invalidates_detail() {
        let api = Arc::new(FakeApi::new());
        api.add_model("m1", "llama3");
        let models = registry(&api);

        let before = models.get("m1").await.unwrap();
        let mut input = input_from_model(&before);
        input.name = Some("llama3.1".into());
        models.update("m1", &input).await.unwrap();

        assert_eq!(models.get("m1").await.unwrap().name, "llama3.1");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let api = Arc::new(FakeApi::new());
        api.add_model("m1", "llama3");
        let models = registry(&api);

        assert!(matches!(
            models.delete("m1", false).await,
            Err(CliError::ConfirmationRequired(_))
        ));
        models.delete("m1", true).await.unwrap();
        assert!(models.list().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_benchmark_polls_until_completed() {
        let api = Arc::new(FakeApi::new());
        api.add_model("m1", "llama3");
        api.complete_after.store(3, Ordering::SeqCst);
        let models = registry(&api);

        let started = models.run_benchmark("m1", TestType::Latency).await.unwrap();
        assert_eq!(started.status, RunStatus::Running);

        let done = models
            .wait_for_benchmark("m1", &started.id_string(), BENCHMARKS_POLL_INTERVAL, 10)
            .await
            .unwrap();
        assert_eq!(done.status, RunStatus::Completed);
        assert!(done.result_f64("avg_latency_ms").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_benchmark_times_out() {
        let api = Arc::new(FakeApi::new());
        api.add_model("m1", "llama3");
        api.complete_after.store(100, Ordering::SeqCst);
        let models = registry(&api);

        let started = models.run_benchmark("m1", TestType::Quality).await.unwrap();
        let err = models
            .wait_for_benchmark("m1", &started.id_string(), Duration::from_millis(10), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_run_benchmark_invalidates_cached_runs() {
        let api = Arc::new(FakeApi::new());
        api.add_model("m1", "llama3");
        let models = registry(&api);

        assert!(models.benchmarks(None).await.unwrap().is_empty());
        models.run_benchmark("m1", TestType::Throughput).await.unwrap();
        assert_eq!(models.benchmarks(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_compare_rejects_empty_selection() {
        let api = Arc::new(FakeApi::new());
        let models = registry(&api);

        let err = models.compare(&[" ".to_string()]).await.unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(api.calls(), 0);
    }

    #[test]
    fn test_latency_trend_keeps_completed_latency_runs() {
        let runs = vec![
            run(3, TestType::Latency, RunStatus::Completed, json!({"avg_latency_ms": 30.0}), "2024-05-03"),
            run(2, TestType::Quality, RunStatus::Completed, json!({"overall_score": 0.9}), "2024-05-02"),
            run(1, TestType::Latency, RunStatus::Completed, json!({"avg_latency_ms": 10.0}), "2024-05-01"),
            run(4, TestType::Latency, RunStatus::Running, json!({}), "2024-05-04"),
        ];
        let trend = latency_trend(&runs);
        assert_eq!(
            trend,
            vec![("2024-05-01".to_string(), 10.0), ("2024-05-03".to_string(), 30.0)]
        );
    }
}
