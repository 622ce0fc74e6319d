pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod provider;
pub mod types;

pub use gemini::GeminiProvider;
pub use generator::{ImageSource, NarrativeGenerator};
pub use prompt::Language;
pub use provider::{ProviderError, VisionProvider};
pub use types::{ErrorCategory, NarrativeFailure, NarrativeResult};
