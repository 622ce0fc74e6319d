pub mod clahe;
pub mod color;
pub mod filter;
pub mod frame;
pub mod stats;

pub use clahe::ClaheEqualizer;
pub use frame::Frame;
pub use stats::PlaneStats;
