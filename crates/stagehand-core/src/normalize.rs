//! Normalization of raw generator output.
//!
//! The model is instructed to emit the bare file body, but it occasionally
//! wraps it in a markdown code fence anyway. `strip_code_fence` removes one
//! leading fence line (with optional language tag) and one trailing fence,
//! then trims surrounding whitespace. Normalizing already-normalized text is
//! a no-op.

pub fn strip_code_fence(text: &str) -> String {
    let mut body = text.trim();
    if body.starts_with("```") {
        // Drop the whole fence line, including any language tag.
        body = match body.find('\n') {
            Some(i) => &body[i + 1..],
            None => &body[3..],
        };
    }
    if body.ends_with("```") {
        body = &body[..body.len() - 3];
    }
    body.trim().to_string()
}
