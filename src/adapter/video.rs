//! Video question answering over episode frames.

use crate::error::Result;
use crate::frames::{load_frames, to_data_url};
use crate::llm::{ContentPart, LlmClient, Message, Prompts};
use image::RgbImage;
use std::path::PathBuf;

/// A model that answers a question about an ordered set of RGB frames.
pub trait VideoLanguageModel {
    /// Return the model's raw output.
    async fn generate(&self, frames: &[RgbImage], question: &str) -> Result<String>;
}

/// Vision chat model behind an OpenAI-compatible API.
///
/// Frames go between the instruction prefix and the `User Query:` suffix of
/// the prompt, as image parts of a single user message.
pub struct ChatVisionModel {
    client: LlmClient,
}

impl ChatVisionModel {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    fn build_message(frames: &[RgbImage], question: &str) -> Result<Message> {
        let (prefix, suffix) = Prompts::video_qa_parts(question);

        let mut parts = Vec::with_capacity(frames.len() + 2);
        if !prefix.is_empty() {
            parts.push(ContentPart::text(prefix));
        }
        for frame in frames {
            parts.push(ContentPart::image(to_data_url(frame)?));
        }
        parts.push(ContentPart::text(suffix));

        Ok(Message::user_parts(parts))
    }
}

impl VideoLanguageModel for ChatVisionModel {
    async fn generate(&self, frames: &[RgbImage], question: &str) -> Result<String> {
        let message = Self::build_message(frames, question)?;
        self.client.chat(&[message]).await
    }
}

/// Loads and rescales frames, then asks the model.
pub struct VideoQa<M> {
    model: M,
    image_size: u32,
}

impl<M: VideoLanguageModel> VideoQa<M> {
    pub fn new(model: M, image_size: u32) -> Self {
        Self { model, image_size }
    }

    /// Raw model output for `question` over the frames at `frame_paths`.
    ///
    /// Any frame that fails to decode fails the whole call.
    pub async fn ask(&self, frame_paths: &[PathBuf], question: &str) -> Result<String> {
        let frames = load_frames(frame_paths, self.image_size)?;
        self.model.generate(&frames, question).await
    }
}
