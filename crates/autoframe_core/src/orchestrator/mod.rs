//! Batch orchestration.
//!
//! A submission moves through a fixed set of phases:
//!
//! ```text
//! Idle → Validating → NamingResolution → Dispatching → Running → Finalizing
//!                                                         │
//!                                      ┌──────────────────┼──────────────────┐
//!                                  Completed       PartiallyFailed         Failed
//! ```
//!
//! Validation and naming are the same for every tier. At `Dispatching` the
//! [`BatchOrchestrator`] hands a [`BatchPlan`] to its [`RenderStrategy`]:
//! [`LocalStrategy`] for in-process rendering, [`RemoteJobStrategy`] for the
//! render service, with [`LegacyStrategy`] taking over when the service's
//! job queue is unavailable.
//!
//! # Example
//!
//! ```ignore
//! use autoframe_core::config::ConfigManager;
//! use autoframe_core::orchestrator::{BatchOrchestrator, BatchRequest};
//!
//! let orchestrator = BatchOrchestrator::from_settings(config.settings())?;
//! let result = orchestrator.submit(BatchRequest {
//!     files,
//!     ratios: vec!["square".into()],
//!     style: RenderStyle::Fill,
//!     naming: session.snapshot(),
//! }).await?;
//! println!("{}", result.summary());
//! ```

mod batch;
mod context;
mod errors;
mod plan;
mod state;
pub mod strategies;
mod strategy;
mod usage;

pub use batch::{BatchOrchestrator, BatchRequest, HostLogCallback};
pub use context::RunContext;
pub use errors::{BatchError, StrategyError, SubmitResult};
pub use plan::{BatchPlan, PlannedFile, PlannedTarget, OUTPUT_EXTENSION};
pub use state::{BatchPhase, PhaseTracker};
pub use strategies::{LegacyStrategy, LocalStrategy, RemoteJobStrategy};
pub use strategy::RenderStrategy;
pub use usage::UsageCounter;
