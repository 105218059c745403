//! LLM-Match: a language model grades a prediction against the ground truth
//! on a 1-5 scale.

use crate::config::{Config, JudgeBackendKind};
use crate::error::Result;
use crate::extract::parse_score;
use crate::llm::{CompletionClient, LlmClient, Message, Prompts};
use tracing::{debug, error};

/// Anything that continues a text prompt.
pub trait TextGenerator {
    async fn generate(&self, prompt: &str, max_new_tokens: u32, temperature: f32)
    -> Result<String>;
}

impl TextGenerator for LlmClient {
    async fn generate(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        self.chat_with(&[Message::user(prompt)], max_new_tokens, temperature)
            .await
    }
}

impl TextGenerator for CompletionClient {
    async fn generate(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        CompletionClient::generate(self, prompt, max_new_tokens, temperature).await
    }
}

/// The judge model selected by configuration.
pub enum JudgeBackend {
    Api(LlmClient),
    Local(CompletionClient),
}

impl JudgeBackend {
    pub fn from_config(config: &Config) -> Self {
        match config.judge.backend {
            JudgeBackendKind::Api => JudgeBackend::Api(LlmClient::new(config.judge_llm_config())),
            JudgeBackendKind::Local => JudgeBackend::Local(CompletionClient::new(
                config.judge.local_api_base.clone(),
                config.judge.model.clone(),
            )),
        }
    }
}

impl TextGenerator for JudgeBackend {
    async fn generate(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        match self {
            JudgeBackend::Api(client) => {
                TextGenerator::generate(client, prompt, max_new_tokens, temperature).await
            }
            JudgeBackend::Local(client) => client.generate(prompt, max_new_tokens, temperature).await,
        }
    }
}

/// Scores predictions with a judge model.
pub struct LlmMatch<G> {
    generator: G,
    max_tokens: u32,
    temperature: f32,
}

impl<G: TextGenerator> LlmMatch<G> {
    pub fn new(generator: G, max_tokens: u32, temperature: f32) -> Self {
        Self {
            generator,
            max_tokens,
            temperature,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Mark `prediction` against `answer`.
    ///
    /// A missing prediction scores 0 without consulting the judge. Judge
    /// output without a readable mark is an error, never a default score.
    pub async fn score(
        &self,
        question: &str,
        answer: &str,
        prediction: Option<&str>,
        extra_answers: Option<&[String]>,
    ) -> Result<u32> {
        let Some(prediction) = prediction else {
            return Ok(0);
        };

        let prompt = Prompts::llm_match(question, answer, prediction, extra_answers);
        let output = self
            .generator
            .generate(&prompt, self.max_tokens, self.temperature)
            .await
            .inspect_err(|e| error!(error = %e, "judge call failed"))?;
        debug!(output = %output, "judge output");

        parse_score(output.trim_end()).inspect_err(|e| error!(error = %e, "unreadable judge mark"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use std::cell::RefCell;

    /// Replies with a fixed string and remembers the prompts it saw.
    struct Scripted {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str, max_new_tokens: u32, _: f32) -> Result<String> {
            assert_eq!(max_new_tokens, 32);
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_missing_prediction_skips_judge() {
        let judge = LlmMatch::new(Scripted::new("5"), 32, 0.2);
        let score = judge
            .score("What color is the rug?", "tan", None, None)
            .await
            .unwrap();
        assert_eq!(score, 0);
        assert!(judge.generator.prompts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_score_from_mark() {
        let judge = LlmMatch::new(Scripted::new("Your mark: 4\nclose enough"), 32, 0.2);
        let score = judge
            .score("What color is the rug?", "tan with pink and blue", Some("brown with pink and blue"), None)
            .await
            .unwrap();
        assert_eq!(score, 4);

        let prompts = judge.generator.prompts.borrow();
        assert!(prompts[0].contains("Response: brown with pink and blue"));
        assert!(!prompts[0].contains("Extra Answers"));
    }

    #[tokio::test]
    async fn test_extra_answers_switch_prompt() {
        let judge = LlmMatch::new(Scripted::new("5\n"), 32, 0.2);
        let extra = vec!["beige".to_string()];
        let score = judge
            .score("Q?", "tan", Some("beige"), Some(&extra))
            .await
            .unwrap();
        assert_eq!(score, 5);
        assert!(judge.generator.prompts.borrow()[0].contains("Extra Answers: ['beige']"));
    }

    #[test]
    fn test_unreadable_mark_is_error() {
        let judge = LlmMatch::new(Scripted::new("I think it is fine"), 32, 0.2);
        let err = tokio_test::block_on(judge.score("Q?", "tan", Some("brown"), None)).unwrap_err();
        assert!(matches!(err, EvalError::ScoreParse(_)));
    }

    #[test]
    fn test_backend_from_config() {
        let mut config = Config::with_llm("https://api.example.com", "key", "gpt-4o");
        assert!(matches!(JudgeBackend::from_config(&config), JudgeBackend::Api(_)));

        config.judge.backend = JudgeBackendKind::Local;
        assert!(matches!(JudgeBackend::from_config(&config), JudgeBackend::Local(_)));
    }
}
