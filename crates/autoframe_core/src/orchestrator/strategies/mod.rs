//! Render strategies.
//!
//! ```text
//! local       sequential in-process transcoding, fatal on first failure
//! remote-job  one server job for the whole batch, fatal on job failure
//! legacy      one /process request per file, failures collected per file
//! ```

mod legacy;
mod local;
mod remote_job;

pub use legacy::LegacyStrategy;
pub use local::LocalStrategy;
pub use remote_job::{RemoteJobStrategy, RENDER_BAND, REWARD_PERCENT, UPLOAD_BAND};
