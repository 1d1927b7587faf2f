//! Recovery of JSON payloads from free-form model output.
//!
//! [`clean`] strips a ```` ```json ```` fence when present; the `decode_*`
//! functions then validate the payload against the stored shapes.

use feedback_store::{ReviewComment, ReviewSummary};
use thiserror::Error;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is not valid JSON for the expected shape: {0}")]
    Json(#[from] serde_json::Error),

    #[error("comment has lineNumber 0")]
    ZeroLineNumber,

    #[error("summary text is empty")]
    EmptySummary,

    #[error("quality {0} is outside 0..=10")]
    QualityOutOfRange(f64),
}

/// Returns the inner content of the first ```` ```json ```` fenced block, or
/// the whole input, trimmed either way.
pub fn clean(raw: &str) -> String {
    if let Some(start) = raw.find(FENCE_OPEN) {
        let body = &raw[start + FENCE_OPEN.len()..];
        if let Some(end) = body.find(FENCE_CLOSE) {
            return body[..end].trim().to_string();
        }
    }
    raw.trim().to_string()
}

/// Decodes a review comment array. Comments with blank text are dropped.
pub fn decode_comments(cleaned: &str) -> Result<Vec<ReviewComment>, DecodeError> {
    let comments: Vec<ReviewComment> = serde_json::from_str(cleaned)?;
    if comments.iter().any(|c| c.line_number == 0) {
        return Err(DecodeError::ZeroLineNumber);
    }
    Ok(comments
        .into_iter()
        .filter(|c| !c.comment.trim().is_empty())
        .collect())
}

pub fn decode_summary(cleaned: &str) -> Result<ReviewSummary, DecodeError> {
    let summary: ReviewSummary = serde_json::from_str(cleaned)?;
    if summary.summary.trim().is_empty() {
        return Err(DecodeError::EmptySummary);
    }
    if !summary.quality.is_finite() || !(0.0..=10.0).contains(&summary.quality) {
        return Err(DecodeError::QualityOutOfRange(summary.quality));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_store::LineKind;

    #[test]
    fn strips_json_fence() {
        assert_eq!(clean("```json\n[1,2]\n```"), "[1,2]");
        assert_eq!(
            clean("Here you go:\n```json\n  {\"a\": 1}  \n```\nThanks!"),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn clean_is_idempotent() {
        assert_eq!(clean("[1,2]"), "[1,2]");
        assert_eq!(clean("  [1,2]\n"), "[1,2]");
        let once = clean("```json\n[1,2]\n```");
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn unterminated_or_untagged_fence_is_left_alone() {
        assert_eq!(clean("```json\n[1,2]"), "```json\n[1,2]");
        assert_eq!(clean("```\n[1,2]\n```"), "```\n[1,2]\n```");
    }

    #[test]
    fn decodes_comments_and_drops_blank_ones() {
        let raw = r#"[
            {"type": "insert", "comment": "Handle the error", "lineNumber": 4},
            {"type": "normal", "comment": "   ", "lineNumber": 5}
        ]"#;
        let out = decode_comments(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, LineKind::Insert);
        assert_eq!(out[0].line_number, 4);
    }

    #[test]
    fn rejects_malformed_comments() {
        assert!(decode_comments("not json").is_err());
        assert!(decode_comments(r#"{"type": "insert"}"#).is_err());
        assert!(decode_comments(r#"[{"type": "added", "comment": "x", "lineNumber": 1}]"#).is_err());
        assert!(decode_comments(r#"[{"type": "insert", "comment": "x", "lineNumber": -1}]"#).is_err());
        assert!(matches!(
            decode_comments(r#"[{"type": "insert", "comment": "x", "lineNumber": 0}]"#),
            Err(DecodeError::ZeroLineNumber)
        ));
    }

    #[test]
    fn decodes_summary_with_range_check() {
        let ok = decode_summary(
            r#"{"summary": "Tidy change", "quality": 7.5,
                "recommended_resources": [{"title": "t", "link": "https://l"}]}"#,
        )
        .unwrap();
        assert_eq!(ok.quality, 7.5);
        assert_eq!(ok.recommended_resources.len(), 1);

        assert!(matches!(
            decode_summary(r#"{"summary": "x", "quality": 11}"#),
            Err(DecodeError::QualityOutOfRange(_))
        ));
        assert!(matches!(
            decode_summary(r#"{"summary": " ", "quality": 5}"#),
            Err(DecodeError::EmptySummary)
        ));
        assert!(decode_summary(r#"{"quality": 5}"#).is_err());
    }
}
