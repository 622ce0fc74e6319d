pub mod detection;

pub use detection::{DetectionRecord, Region};
