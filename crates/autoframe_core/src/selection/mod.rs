//! Selection admission: extension, size, count, duration, ratio and daily limits.

mod errors;
mod probe;
mod validator;

pub use errors::{SelectionError, SelectionResult};
pub use probe::{parse_duration, DurationProbe, FfprobeProbe};
pub use validator::{SelectionReview, SelectionValidator};
