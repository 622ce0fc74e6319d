pub mod buffer_pool;
pub mod detect;
pub mod preprocess;

pub use buffer_pool::BufferPool;
pub use detect::DetectStage;
pub use preprocess::PreprocessStage;
