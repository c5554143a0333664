pub mod interface;
pub mod job;
pub mod catalog;
pub mod engine;
pub mod google;
pub mod espeak;
pub mod factory;

pub use interface::SynthesisBackend;
pub use job::{JobStatus, SynthesisJob, VoiceConfig};
pub use catalog::VoiceCatalog;
pub use engine::SynthesisEngine;
pub use factory::TTSFactory;
