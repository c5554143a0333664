pub mod normalizer;
pub mod extraction;
pub mod chunker;

pub use normalizer::{normalize, SanitizedText};
pub use extraction::extract;
pub use chunker::chunk_text;
