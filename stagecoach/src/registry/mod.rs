//! Concurrency-safe in-memory pipeline store.

use crate::core::{Pipeline, PipelineConfig, PipelineId};
use crate::errors::{EngineError, ValidationError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Concurrency-safe store mapping pipeline identifiers to configurations.
///
/// Pipelines are stored behind `Arc`, so a triggered run keeps its own
/// snapshot of the stage list: `replace` and `delete` swap or drop the
/// stored entry without touching snapshots already handed out, and readers
/// never observe a partially written configuration.
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    pipelines: DashMap<PipelineId, Arc<Pipeline>>,
}

impl PipelineRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a new pipeline, returning its fresh identifier.
    ///
    /// Validation happens before any storage mutation; a rejected
    /// configuration leaves the registry unchanged.
    pub fn create(&self, config: PipelineConfig) -> Result<PipelineId, ValidationError> {
        config.validate()?;
        let id = PipelineId::generate();
        self.pipelines.insert(id, Arc::new(Pipeline { id, config }));
        debug!(pipeline_id = %id, "pipeline created");
        Ok(id)
    }

    /// Returns a read-only snapshot of the pipeline.
    pub fn get(&self, id: PipelineId) -> Result<Arc<Pipeline>, EngineError> {
        self.pipelines
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::NotFound { id })
    }

    /// Validates `config` and atomically swaps it in for `id`.
    ///
    /// A run already in flight keeps executing against its previous
    /// snapshot.
    pub fn replace(&self, id: PipelineId, config: PipelineConfig) -> Result<(), EngineError> {
        config.validate()?;
        match self.pipelines.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(Arc::new(Pipeline { id, config }));
                debug!(pipeline_id = %id, "pipeline replaced");
                Ok(())
            }
            Entry::Vacant(_) => Err(EngineError::NotFound { id }),
        }
    }

    /// Removes the pipeline.
    ///
    /// Cancelling any in-flight run is the caller's responsibility (see
    /// [`PipelineEngine::delete_pipeline`](crate::engine::PipelineEngine::delete_pipeline)),
    /// keeping the registry's lock discipline independent of the run
    /// tracker's.
    pub fn delete(&self, id: PipelineId) -> Result<(), EngineError> {
        if self.pipelines.remove(&id).is_some() {
            debug!(pipeline_id = %id, "pipeline deleted");
            Ok(())
        } else {
            Err(EngineError::NotFound { id })
        }
    }

    /// Returns whether a pipeline is registered under `id`.
    #[must_use]
    pub fn exists(&self, id: PipelineId) -> bool {
        self.pipelines.contains_key(&id)
    }

    /// Returns the number of registered pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns true if no pipelines are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stage;
    use pretty_assertions::assert_eq;

    fn stage(name: &str) -> Stage {
        Stage::Build {
            name: name.to_string(),
            dockerfile: "FROM alpine:latest".to_string(),
            image_repository: "registry.example.com/app".to_string(),
            tag: "latest".to_string(),
        }
    }

    fn config(name: &str, stages: Vec<Stage>) -> PipelineConfig {
        PipelineConfig {
            name: name.to_string(),
            git_repository: "https://github.com/example/repo".to_string(),
            parallel: false,
            stages,
        }
    }

    #[test]
    fn test_create_and_get() {
        let registry = PipelineRegistry::new();
        let id = registry.create(config("ci", vec![stage("build")])).unwrap();

        let pipeline = registry.get(id).unwrap();
        assert_eq!(pipeline.id, id);
        assert_eq!(pipeline.config.name, "ci");
        assert!(registry.exists(id));
    }

    #[test]
    fn test_create_rejects_duplicate_stage_names() {
        let registry = PipelineRegistry::new();
        let result = registry.create(config("ci", vec![stage("build"), stage("build")]));

        assert_eq!(
            result,
            Err(ValidationError::DuplicateStageName {
                name: "build".to_string()
            })
        );
        // Rejected before any mutation
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_unknown_id() {
        let registry = PipelineRegistry::new();
        let id = PipelineId::generate();
        assert_eq!(registry.get(id), Err(EngineError::NotFound { id }));
    }

    #[test]
    fn test_replace_swaps_config() {
        let registry = PipelineRegistry::new();
        let id = registry.create(config("ci", vec![stage("build")])).unwrap();

        registry
            .replace(id, config("ci-v2", vec![stage("build"), stage("push")]))
            .unwrap();

        let pipeline = registry.get(id).unwrap();
        assert_eq!(pipeline.config.name, "ci-v2");
        assert_eq!(pipeline.config.stages.len(), 2);
    }

    #[test]
    fn test_replace_validates_before_swapping() {
        let registry = PipelineRegistry::new();
        let id = registry.create(config("ci", vec![stage("build")])).unwrap();

        let result = registry.replace(id, config("bad", vec![stage("x"), stage("x")]));
        assert!(matches!(result, Err(EngineError::Validation(_))));

        // Old config still in place
        assert_eq!(registry.get(id).unwrap().config.name, "ci");
    }

    #[test]
    fn test_replace_unknown_id() {
        let registry = PipelineRegistry::new();
        let id = PipelineId::generate();
        assert_eq!(
            registry.replace(id, config("ci", vec![])),
            Err(EngineError::NotFound { id })
        );
    }

    #[test]
    fn test_delete_then_get_not_found() {
        let registry = PipelineRegistry::new();
        let id = registry.create(config("ci", vec![stage("build")])).unwrap();

        registry.delete(id).unwrap();
        assert_eq!(registry.get(id), Err(EngineError::NotFound { id }));
        assert_eq!(registry.delete(id), Err(EngineError::NotFound { id }));
    }

    #[test]
    fn test_replace_leaves_existing_snapshot_untouched() {
        let registry = PipelineRegistry::new();
        let id = registry.create(config("ci", vec![stage("build")])).unwrap();

        let snapshot = registry.get(id).unwrap();
        registry.replace(id, config("ci-v2", vec![])).unwrap();

        assert_eq!(snapshot.config.name, "ci");
        assert_eq!(registry.get(id).unwrap().config.name, "ci-v2");
    }

    #[test]
    fn test_concurrent_creates_yield_distinct_ids() {
        let registry = Arc::new(PipelineRegistry::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry
                    .create(config(&format!("pipeline-{i}"), vec![stage("build")]))
                    .unwrap()
            }));
        }

        let ids: Vec<PipelineId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 16);
        for (i, id) in ids.iter().enumerate() {
            assert!(ids.iter().filter(|other| *other == id).count() == 1);
            assert_eq!(
                registry.get(*id).unwrap().config.name,
                format!("pipeline-{i}")
            );
        }
    }
}
