//! Extraction of answers and marks from free-form model output.
//!
//! Both extractors look for a fixed marker, take the text up to the next
//! newline (or the end of the output), drop the marker and trim.

use crate::error::{EvalError, Result};

/// Marker preceding the answer in generated text.
pub const ANSWER_MARKER: &str = "A:";

/// Marker preceding the judge's mark.
pub const SCORE_MARKER: &str = "Your mark:";

/// Slice from `marker` to the first newline after it, with the marker removed.
fn slice_after_marker(output: &str, marker: &str) -> Option<String> {
    let start = output.find(marker)?;
    let tail = &output[start..];
    let line = match tail.find('\n') {
        Some(end) => &tail[..end],
        None => tail,
    };
    Some(line.replace(marker, "").trim().to_string())
}

/// Extract the answer from generated text.
///
/// Without a marker the whole output (trimmed) is the answer.
pub fn parse_answer(output: &str) -> String {
    slice_after_marker(output, ANSWER_MARKER)
        .unwrap_or_else(|| output.replace(ANSWER_MARKER, "").trim().to_string())
}

/// Extract an integer mark from judge output.
///
/// A purely numeric output is the mark itself. Otherwise the text after
/// `Your mark:` must parse as an integer.
pub fn parse_score(output: &str) -> Result<u32> {
    if !output.is_empty() && output.bytes().all(|b| b.is_ascii_digit()) {
        return output
            .parse()
            .map_err(|_| EvalError::ScoreParse(output.to_string()));
    }

    let mark = slice_after_marker(output, SCORE_MARKER)
        .ok_or_else(|| EvalError::ScoreParse(output.to_string()))?;
    mark.parse()
        .map_err(|_| EvalError::ScoreParse(output.to_string()))
}
