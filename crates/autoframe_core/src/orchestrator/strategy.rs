//! The capability every execution path implements.

use async_trait::async_trait;

use super::context::RunContext;
use super::errors::StrategyError;
use super::plan::BatchPlan;
use crate::models::BatchResult;

/// One way of turning a [`BatchPlan`] into rendered outputs.
///
/// Returned results carry per-file outputs, `processed_count` and any
/// per-file errors; the orchestrator adds selection warnings and decides
/// the terminal phase.
#[async_trait]
pub trait RenderStrategy: Send + Sync {
    /// Short identifier used in logs and results.
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &RunContext, plan: &BatchPlan) -> Result<BatchResult, StrategyError>;
}
