use std::sync::Arc;

use shapeflow_core::registry::JobRegistry;
use shapeflow_pipeline::{HillClimbOptimizer, ShapeOptimizer};

use crate::config::ServerConfig;
use crate::ws::ProgressHub;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; every field is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The single source of truth for job state.
    pub registry: Arc<JobRegistry>,
    /// Fan-out of progress frames to connected observers.
    pub hub: Arc<ProgressHub>,
    /// The shape-fitting capability driven by the run engine.
    pub optimizer: Arc<dyn ShapeOptimizer>,
}

impl AppState {
    /// State with the default hill-climbing optimizer.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_optimizer(config, Arc::new(HillClimbOptimizer::new()))
    }

    /// State with an injected optimizer; tests substitute stubs here.
    pub fn with_optimizer(config: ServerConfig, optimizer: Arc<dyn ShapeOptimizer>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(JobRegistry::new()),
            hub: Arc::new(ProgressHub::new()),
            optimizer,
        }
    }
}
