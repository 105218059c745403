//! Inference adapters.
//!
//! Each pipeline talks to its model through one narrow trait, so the backing
//! model (hosted API, local server, test double) is picked by configuration
//! rather than by editing the pipeline.

mod judge;
mod video;

pub use judge::{JudgeBackend, LlmMatch, TextGenerator};
pub use video::{ChatVisionModel, VideoLanguageModel, VideoQa};
