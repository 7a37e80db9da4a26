pub mod constants;
pub mod conversion;
pub mod digest;
pub mod digest_errors;
pub mod jitter;
pub mod observations;
pub mod observers;
pub mod orbit_class;
pub mod params;
pub mod pipeline;
pub mod population;
pub mod ranging;
mod ref_system;
pub mod score;
pub mod time;

pub use digest::Digest;
pub use digest_errors::DigestError;
pub use observations::{Observation, Tracklet};
pub use params::DigestParams;
pub use score::{ClassScore, ScoreResult};
