//! Change generation: context assembly around the external text service.
//!
//! The service itself sits behind the [`TextCompletion`] trait so the
//! workflow can be exercised in tests without network access. This module
//! owns everything around the call: bounding the context, the edit-in-place
//! instructions, and normalizing whatever comes back.

use crate::error::Result;
use crate::normalize::strip_code_fence;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// A single artifact body is truncated beyond this many characters when
/// building generation context, to keep the service's input bounded.
pub const MAX_CONTEXT_CHARS: usize = 15_000;

const TRUNCATION_MARKER: &str = "\n<!-- ... truncated ... -->";

const SYSTEM_PROMPT: &str = "\
You are the developer of an existing static website. You modify it in place.

RULES:
1. You receive the CURRENT site files as context. READ THEM CAREFULLY before making changes.
2. Only modify what the user asks for. Do NOT regenerate the entire site from scratch.
3. Preserve all existing structure, styling, content, and functionality unless told otherwise.
4. Output ONLY the complete file content. No markdown fences, no explanations, no commentary.
5. If editing a specific section, output the FULL file with that section changed (not just a snippet).
6. If asked to create a NEW file (e.g., a new page), output the complete file.

IMPORTANT: Think of yourself as editing an existing codebase, not generating from scratch.";

/// The external text-generation capability: one stateless call,
/// system instructions plus a user message in, text out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Generate the full new body for `target` from the user's prompt, with the
/// current artifacts as context. Output is normalized (fences stripped,
/// whitespace trimmed). Failures of the external call propagate untouched;
/// no retry happens here.
pub async fn generate(
    completion: &dyn TextCompletion,
    prompt: &str,
    target: &str,
    context_artifacts: &BTreeMap<String, String>,
    style_notes: Option<&str>,
) -> Result<String> {
    let site_context = build_context(context_artifacts);
    let user_message = format!(
        "Here are the CURRENT site files:\n\n{site_context}\n\n---\n\n\
         TARGET FILE TO MODIFY: {target}\n\n\
         USER REQUEST: {prompt}\n\n\
         Output the complete updated {target} file. Only change what was requested. \
         Preserve everything else."
    );

    let system = match style_notes {
        Some(notes) => format!("{SYSTEM_PROMPT}\n\nSTYLE NOTES: {notes}"),
        None => SYSTEM_PROMPT.to_string(),
    };

    debug!(target, context_files = context_artifacts.len(), "requesting generation");
    let raw = completion.complete(&system, &user_message).await?;
    Ok(strip_code_fence(&raw))
}

/// Format artifacts as a labeled context block, truncating oversized bodies.
fn build_context(artifacts: &BTreeMap<String, String>) -> String {
    if artifacts.is_empty() {
        return "No existing site files found.".to_string();
    }
    let mut parts = Vec::with_capacity(artifacts.len());
    for (path, body) in artifacts {
        let body = if body.chars().count() > MAX_CONTEXT_CHARS {
            let truncated: String = body.chars().take(MAX_CONTEXT_CHARS).collect();
            format!("{truncated}{TRUNCATION_MARKER}")
        } else {
            body.clone()
        };
        parts.push(format!("=== {path} ===\n{body}"));
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StagehandError;
    use std::sync::Mutex;

    struct ScriptedCompletion {
        reply: String,
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TextCompletion for ScriptedCompletion {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn scripted(reply: &str) -> ScriptedCompletion {
        ScriptedCompletion {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn passes_context_and_target_to_the_service() {
        let completion = scripted("<html>new</html>");
        let mut artifacts = BTreeMap::new();
        artifacts.insert("index.html".to_string(), "<html>old</html>".to_string());

        let body = generate(&completion, "change the title", "index.html", &artifacts, None)
            .await
            .unwrap();
        assert_eq!(body, "<html>new</html>");

        let seen = completion.seen.lock().unwrap();
        let (system, user) = &seen[0];
        assert!(system.contains("Output ONLY the complete file content"));
        assert!(user.contains("=== index.html ===\n<html>old</html>"));
        assert!(user.contains("TARGET FILE TO MODIFY: index.html"));
        assert!(user.contains("USER REQUEST: change the title"));
    }

    #[tokio::test]
    async fn output_fences_are_stripped() {
        let completion = scripted("```html\n<p>hi</p>\n```");
        let body = generate(&completion, "p", "index.html", &BTreeMap::new(), None)
            .await
            .unwrap();
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn oversized_context_is_truncated_with_marker() {
        let completion = scripted("ok");
        let mut artifacts = BTreeMap::new();
        artifacts.insert("big.html".to_string(), "x".repeat(MAX_CONTEXT_CHARS + 500));

        generate(&completion, "p", "big.html", &artifacts, None)
            .await
            .unwrap();

        let seen = completion.seen.lock().unwrap();
        let user = &seen[0].1;
        assert!(user.contains("<!-- ... truncated ... -->"));
        assert!(!user.contains(&"x".repeat(MAX_CONTEXT_CHARS + 1)));
    }

    #[tokio::test]
    async fn style_notes_are_appended_to_instructions() {
        let completion = scripted("ok");
        generate(&completion, "p", "index.html", &BTreeMap::new(), Some("dark theme, orange accents"))
            .await
            .unwrap();
        let seen = completion.seen.lock().unwrap();
        assert!(seen[0].0.contains("STYLE NOTES: dark theme, orange accents"));
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        struct Failing;
        #[async_trait]
        impl TextCompletion for Failing {
            async fn complete(&self, _: &str, _: &str) -> Result<String> {
                Err(StagehandError::Generation("quota exceeded".into()))
            }
        }
        let err = generate(&Failing, "p", "index.html", &BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StagehandError::Generation(_)));
    }
}
