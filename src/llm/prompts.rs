//! Prompts for answer generation and LLM-Match scoring.

/// Collection of prompt templates. Placeholders are `{name}` and are filled
/// in a single pass, so inserted text is never substituted again.
pub struct Prompts;

/// Separator between the instruction prefix and the per-question suffix of
/// [`Prompts::video_qa`]. Frames are inserted between the two halves.
pub const USER_QUERY_MARKER: &str = "User Query:";

impl Prompts {
    /// Prompt for answering a question from a sequence of episode frames.
    pub fn video_qa() -> &'static str {
        r#"You are an intelligent question answering agent. I will ask you questions about an indoor space and you must provide an answer.

You will be shown a set of images that have been collected from a single location.

Given a user query, you must output `text` to answer to the question asked by the user.

User Query: {question}
A: "#
    }

    /// Split [`Prompts::video_qa`] into the text before the frames and the
    /// question text after them.
    pub fn video_qa_parts(question: &str) -> (String, String) {
        let template = Self::video_qa();
        match template.split_once(USER_QUERY_MARKER) {
            Some((prefix, suffix)) => (
                prefix.trim_end().to_string(),
                format!(
                    "{}{}",
                    USER_QUERY_MARKER,
                    fill(suffix, &[("question", question)])
                ),
            ),
            None => (String::new(), fill(template, &[("question", question)])),
        }
    }

    /// LLM-Match scoring prompt.
    pub fn mmbench() -> &'static str {
        r#"You are an AI assistant who will help me to evaluate the response given the question and the correct answer.
To mark a response, you should output a single integer between 1 and 5 (including 1, 5).
5 means that the response perfectly matches the answer.
1 means that the response is completely different from the answer.

Example 1:
Question: Is it overcast?
Answer: no
Response: yes
Your mark: 1

Example 2:
Question: Who is standing at the table?
Answer: woman
Response: Jessica
Your mark: 3

Example 3:
Question: Are there drapes to the right of the bed?
Answer: yes
Response: yes
Your mark: 5

Your Turn:
Question: {question}
Answer: {answer}
Response: {prediction}
Your mark: "#
    }

    /// LLM-Match scoring prompt for questions with several acceptable answers.
    pub fn mmbench_extra() -> &'static str {
        r#"You are an AI assistant who will help me to evaluate the response given the question, the correct answer, and extra answers that are also correct.
To mark a response, you should output a single integer between 1 and 5 (including 1, 5).
5 means that the response perfectly matches the answer or any of the extra answers.
1 means that the response is completely different from the answer and all of the extra answers.

Example 1:
Question: Is it overcast?
Answer: no
Extra Answers: ['doesn't look like it', 'no', 'it's sunny']
Response: yes
Your mark: 1

Example 2:
Question: Who is standing at the table?
Answer: woman
Extra Answers: ['a woman', 'a lady', 'woman']
Response: Jessica
Your mark: 3

Example 3:
Question: Are there drapes to the right of the bed?
Answer: yes
Extra Answers: ['yes, there are drapes', 'yeah', 'the drapes are to the right of the king bed']
Response: yes
Your mark: 5

Your Turn:
Question: {question}
Answer: {answer}
Extra Answers: {extra_answers}
Response: {prediction}
Your mark: "#
    }

    /// Fill the scoring prompt, choosing the extra-answers variant when
    /// extra answers are given.
    pub fn llm_match(
        question: &str,
        answer: &str,
        prediction: &str,
        extra_answers: Option<&[String]>,
    ) -> String {
        let template = match extra_answers {
            Some(_) => Self::mmbench_extra(),
            None => Self::mmbench(),
        };
        let extra = extra_answers
            .map(|answers| {
                let quoted: Vec<String> = answers.iter().map(|a| quote(a)).collect();
                format!("[{}]", quoted.join(", "))
            })
            .unwrap_or_default();

        fill(
            template,
            &[
                ("question", question),
                ("answer", answer),
                ("extra_answers", &extra),
                ("prediction", prediction),
            ],
        )
    }
}

/// Replace each known `{name}` in `template` with its value. Unknown names
/// and unmatched braces are kept as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let value = tail.find('}').and_then(|end| {
            let name = &tail[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end + 1))
        });

        match value {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Quote a string the way a Python list literal prints it: single quotes
/// unless the text has an apostrophe and no double quote.
fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_not_empty() {
        assert!(!Prompts::video_qa().is_empty());
        assert!(!Prompts::mmbench().is_empty());
        assert!(!Prompts::mmbench_extra().is_empty());
    }

    #[test]
    fn test_video_qa_parts() {
        let (prefix, suffix) = Prompts::video_qa_parts("What color is the rug?");
        assert!(prefix.starts_with("You are an intelligent"));
        assert!(!prefix.contains(USER_QUERY_MARKER));
        assert!(suffix.starts_with("User Query: What color is the rug?"));
        assert!(suffix.trim_end().ends_with("A:"));
    }

    #[test]
    fn test_llm_match_without_extra() {
        let prompt = Prompts::llm_match("Q?", "tan", "brown", None);
        assert!(prompt.contains("Question: Q?\nAnswer: tan\nResponse: brown\nYour mark:"));
        assert!(!prompt.contains("{"));
    }

    #[test]
    fn test_llm_match_with_extra() {
        let extra = vec!["beige".to_string(), "light brown".to_string()];
        let prompt = Prompts::llm_match("Q?", "tan", "brown", Some(&extra));
        assert!(prompt.contains("Extra Answers: ['beige', 'light brown']\nResponse: brown"));
    }

    #[test]
    fn test_llm_match_does_not_refill_inserted_text() {
        let prompt = Prompts::llm_match("Is {prediction} here?", "{answer}", "brown", None);
        assert!(prompt.contains("Question: Is {prediction} here?\nAnswer: {answer}\nResponse: brown"));
    }

    #[test]
    fn test_extra_answers_quote_like_a_list_literal() {
        let extra = vec![
            "it's sunny".to_string(),
            "plain".to_string(),
            r#"both ' and ""#.to_string(),
        ];
        let prompt = Prompts::llm_match("Q?", "tan", "brown", Some(&extra));
        assert!(prompt.contains(r#"Extra Answers: ["it's sunny", 'plain', 'both \' and "']"#));
    }

    #[test]
    fn test_fill_keeps_unknown_braces() {
        assert_eq!(fill("{a} {b} {", &[("a", "x")]), "x {b} {");
    }
}
