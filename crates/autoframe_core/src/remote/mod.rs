//! Render service client.
//!
//! Wraps the remote job lifecycle:
//!
//! ```text
//! request_upload_slot ──503──▶ upload_direct
//!        │                          │
//!   upload_bytes                    │
//!        └──────────┬───────────────┘
//!              create_job ──503 ASYNC_UNAVAILABLE──▶ process_legacy (per file)
//!                   │
//!        RewardGate::request_unlock
//!                   │
//!               start_job
//!                   │
//!            poll_job_status ──▶ done | failed
//! ```

mod client;
mod errors;
mod reward;
mod types;

pub use client::{LegacyProcessRequest, RemoteJobClient, UploadProgress, ASYNC_UNAVAILABLE_CODE};
pub use errors::{RemoteError, RemoteResult};
pub use reward::{NoRewardGate, RewardGate, RewardOutcome, RewardRequest, StaticTokenGate};
pub use types::{
    CreateJobRequest, DirectUpload, FileRecord, Job, LegacyProgress, ProcessResponse,
    ProcessedFile, RemoteFileResult, RemoteOutput, StoredFile, UploadSlot, UploadSpec, UsageStats,
};
