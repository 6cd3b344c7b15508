//! Command dispatch: turns parsed commands into workflow calls and
//! user-visible replies.
//!
//! Every workflow failure is converted to a chat message here; nothing
//! propagates past this layer. Authorization against the allow-list happens
//! before the workflow is touched at all.

use crate::command::{self, Command};
use stagehand_core::{
    ConfirmOutcome, DiffEntry, StageOutcome, StageRequest, Stagehand, StagehandError, StatusReport,
};
use tracing::{error, warn};

const HELP_TEXT: &str = "🔥 *Stagehand*

*Commands:*
/edit `<prompt>` — Edit the default page (reads current site first)
/editfile `<filename>` `<prompt>` — Edit a specific file
/newfile `<filename>` `<prompt>` — Create a new file
/status — Show current site files & recent deploys
/diff — Show what's staged vs production
/preview — Show the full staged content
/deploy — Push the staged change to the remote
/cancel — Discard the staged change
/help — Show this message

*Quick edit (no command):*
Just send a message and it will edit the default page

→ After staging, reply *yes* to deploy or *no* to cancel";

pub struct Handler {
    stagehand: Stagehand,
    default_target: String,
    allowed_users: Vec<i64>,
}

impl Handler {
    pub fn new(stagehand: Stagehand, default_target: String, allowed_users: Vec<i64>) -> Self {
        Self {
            stagehand,
            default_target,
            allowed_users,
        }
    }

    /// Process one inbound message and return the replies to send, in order.
    /// Unauthorized senders and empty messages produce no reply.
    pub async fn handle(&mut self, chat_id: i64, user_id: Option<i64>, text: &str) -> Vec<String> {
        if !self.authorized(user_id) {
            warn!(chat_id, ?user_id, "ignoring message from unauthorized sender");
            return Vec::new();
        }

        let Some(command) = command::parse(text) else {
            return Vec::new();
        };

        // Strict single-flight: while pending, only commands that resolve or
        // inspect the pending change get through.
        if self.stagehand.is_pending(chat_id) && !allowed_while_pending(&command) {
            return vec![
                "⏳ You have a pending deploy. Reply *yes* / *no* first, or /cancel".to_string(),
            ];
        }

        match command {
            Command::Help => vec![HELP_TEXT.to_string()],
            Command::Usage(hint) => vec![hint.to_string()],
            Command::Status => self.status(chat_id),
            Command::Diff => self.diff(),
            Command::Preview => self.preview(chat_id),
            Command::Deploy | Command::Confirm(true) => self.confirm(chat_id),
            Command::Cancel | Command::Confirm(false) => self.cancel(chat_id),
            Command::Edit { file, prompt } => {
                let file = file.unwrap_or_else(|| self.default_target.clone());
                self.stage(chat_id, file, prompt, false).await
            }
            Command::NewFile { file, prompt } => self.stage(chat_id, file, prompt, true).await,
            Command::Prompt(prompt) => {
                let file = self.default_target.clone();
                self.stage(chat_id, file, prompt, false).await
            }
        }
    }

    fn authorized(&self, user_id: Option<i64>) -> bool {
        if self.allowed_users.is_empty() {
            return true;
        }
        user_id.is_some_and(|id| self.allowed_users.contains(&id))
    }

    async fn stage(&mut self, chat_id: i64, file: String, prompt: String, is_new: bool) -> Vec<String> {
        let request = StageRequest { file, prompt, is_new };
        match self.stagehand.stage(chat_id, request).await {
            Ok(StageOutcome::Staged { file, size, preview }) => vec![format!(
                "✅ *Staged to dev/{file}*\n📏 Size: {size} chars\n\n```\n{preview}\n```\n\n\
                 → Reply *yes* to deploy or *no* to cancel\n→ Or use /preview to see more"
            )],
            Ok(StageOutcome::AlreadyDeployed { .. }) => {
                vec!["⚠️ This exact content was already deployed. No changes needed.".to_string()]
            }
            Err(StagehandError::TargetNotFound { file, available }) => vec![format!(
                "⚠️ `{file}` not found in production.\nAvailable files: `{}`\n\n\
                 Use `/newfile {file} <prompt>` to create it.",
                available.join(", ")
            )],
            Err(e) => failure_reply(e),
        }
    }

    fn confirm(&mut self, chat_id: i64) -> Vec<String> {
        match self.stagehand.confirm(chat_id) {
            Ok(ConfirmOutcome::Pushed { file }) => {
                vec![format!("✅ Deployed *{file}* — pushed to the remote.")]
            }
            Ok(ConfirmOutcome::NothingToPush { .. }) => {
                vec!["⚠️ No changes to push.".to_string()]
            }
            Err(StagehandError::NothingPending) => {
                vec!["Nothing staged to deploy.".to_string()]
            }
            Err(e) => failure_reply(e),
        }
    }

    fn cancel(&mut self, chat_id: i64) -> Vec<String> {
        match self.stagehand.cancel(chat_id) {
            Ok(file) => vec![format!("🗑️ Cancelled. Staged `{file}` removed.")],
            Err(StagehandError::NothingPending) => vec!["Nothing to cancel.".to_string()],
            Err(e) => failure_reply(e),
        }
    }

    fn preview(&self, chat_id: i64) -> Vec<String> {
        match self.stagehand.preview(chat_id) {
            Ok(chunks) => chunks
                .into_iter()
                .map(|chunk| format!("```\n{chunk}\n```"))
                .collect(),
            Err(StagehandError::NothingPending) => {
                vec!["Nothing pending. Use /edit first.".to_string()]
            }
            Err(e) => failure_reply(e),
        }
    }

    fn status(&self, chat_id: i64) -> Vec<String> {
        match self.stagehand.status(chat_id) {
            Ok(report) => vec![format_status(&report)],
            Err(e) => failure_reply(e),
        }
    }

    fn diff(&self) -> Vec<String> {
        match self.stagehand.diff() {
            Ok(entries) if entries.is_empty() => {
                vec!["No files staged in dev.".to_string()]
            }
            Ok(entries) => vec![format_diff(&entries)],
            Err(e) => failure_reply(e),
        }
    }
}

/// Commands admissible while a change awaits yes/no: the ones that resolve
/// it (deploy/confirm/cancel) or inspect it (preview/status). Everything
/// else, staging requests included, is deflected until the change is
/// resolved.
fn allowed_while_pending(command: &Command) -> bool {
    matches!(
        command,
        Command::Deploy
            | Command::Cancel
            | Command::Confirm(_)
            | Command::Preview
            | Command::Status
    )
}

fn failure_reply(e: StagehandError) -> Vec<String> {
    error!(error = %e, "request failed");
    let reply = match &e {
        StagehandError::Generation(detail) => format!("❌ Generation error: {detail}"),
        StagehandError::Publish(detail) => format!("❌ Git error: {detail}"),
        _ => format!("❌ Error: {e}"),
    };
    vec![reply]
}

fn format_status(report: &StatusReport) -> String {
    let mut msg = String::from("📁 *Production files:*\n");
    for f in &report.published {
        msg.push_str(&format!("  • `{}` ({} chars)\n", f.file, f.chars));
    }
    if report.staged.is_empty() {
        msg.push_str("\n📁 *Staged in dev:* (empty)\n");
    } else {
        msg.push_str("\n📁 *Staged in dev:*\n");
        for f in &report.staged {
            msg.push_str(&format!("  • `{}` ({} chars)\n", f.file, f.chars));
        }
    }
    if let Some(pending) = &report.pending {
        msg.push_str(&format!("\n⏳ *Pending:* `{pending}` awaiting yes/no\n"));
    }
    if !report.recent.is_empty() {
        msg.push_str("\n📋 *Recent deploys:*\n");
        for entry in &report.recent {
            msg.push_str(&format!(
                "  • `{}` — {}\n    _{}_\n",
                entry.file,
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.prompt
            ));
        }
    }
    msg
}

fn format_diff(entries: &[DiffEntry]) -> String {
    let mut msg = String::from("📊 *Diff: dev vs production*\n\n");
    for entry in entries {
        match entry {
            DiffEntry::Identical { file } => {
                msg.push_str(&format!("• `{file}` — identical ✓\n"));
            }
            DiffEntry::Modified {
                file,
                published_chars,
                staged_chars,
            } => {
                msg.push_str(&format!(
                    "• `{file}` — *modified* (prod: {published_chars} → dev: {staged_chars} chars)\n"
                ));
            }
            DiffEntry::New { file, staged_chars } => {
                msg.push_str(&format!("• `{file}` — *new file* ({staged_chars} chars)\n"));
            }
        }
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stagehand_core::{PublishOutcome, Publisher, Result, StagehandConfig, TextCompletion};
    use tempfile::TempDir;

    struct FixedCompletion(String);

    #[async_trait]
    impl TextCompletion for FixedCompletion {
        async fn complete(&self, _: &str, _: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct NoopPublisher;

    impl Publisher for NoopPublisher {
        fn publish(&self, _: &str) -> Result<PublishOutcome> {
            Ok(PublishOutcome::Pushed)
        }
    }

    fn handler(dir: &TempDir, reply: &str, allowed: Vec<i64>) -> Handler {
        let config = StagehandConfig::new(dir.path());
        std::fs::create_dir_all(config.published_root()).unwrap();
        std::fs::write(config.published_root().join("index.html"), "<html>live</html>").unwrap();
        let stagehand = Stagehand::new(
            &config,
            Box::new(FixedCompletion(reply.to_string())),
            Box::new(NoopPublisher),
        );
        Handler::new(stagehand, "index.html".to_string(), allowed)
    }

    #[tokio::test]
    async fn unauthorized_sender_gets_no_reply() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![1, 2]);
        assert!(h.handle(9, Some(3), "/status").await.is_empty());
        assert!(h.handle(9, None, "/status").await.is_empty());
    }

    #[tokio::test]
    async fn allowed_sender_passes_authorization() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![1, 2]);
        let replies = h.handle(9, Some(2), "/help").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("*Commands:*"));
    }

    #[tokio::test]
    async fn empty_allow_list_admits_everyone() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        assert!(!h.handle(9, Some(12345), "/help").await.is_empty());
    }

    #[tokio::test]
    async fn plain_text_stages_the_default_target() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        let replies = h.handle(9, Some(1), "change the headline").await;
        assert!(replies[0].contains("Staged to dev/index.html"));
        assert!(replies[0].contains("Reply *yes* to deploy"));
    }

    #[tokio::test]
    async fn staging_then_yes_deploys() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        h.handle(9, Some(1), "/edit change the headline").await;
        let replies = h.handle(9, Some(1), "yes").await;
        assert!(replies[0].contains("Deployed *index.html*"));
    }

    #[tokio::test]
    async fn staging_then_no_cancels() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        h.handle(9, Some(1), "/edit change the headline").await;
        let replies = h.handle(9, Some(1), "no").await;
        assert!(replies[0].contains("Cancelled"));
        assert!(!dir.path().join("public_html/dev/index.html").exists());
    }

    #[tokio::test]
    async fn new_request_while_pending_is_deflected() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        h.handle(9, Some(1), "/edit change the headline").await;
        let replies = h.handle(9, Some(1), "now change the footer").await;
        assert!(replies[0].contains("pending deploy"));
    }

    #[tokio::test]
    async fn status_and_preview_allowed_while_pending() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        h.handle(9, Some(1), "/edit change the headline").await;

        let status = h.handle(9, Some(1), "/status").await;
        assert!(status[0].contains("Pending"));

        let preview = h.handle(9, Some(1), "/preview").await;
        assert!(preview[0].contains("<html>new</html>"));
    }

    #[tokio::test]
    async fn diff_and_help_deflected_while_pending() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        h.handle(9, Some(1), "/edit change the headline").await;

        let diff = h.handle(9, Some(1), "/diff").await;
        assert!(diff[0].contains("pending deploy"));
        let help = h.handle(9, Some(1), "/help").await;
        assert!(help[0].contains("pending deploy"));
    }

    #[tokio::test]
    async fn deploy_without_pending_reports_nothing_staged() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        let replies = h.handle(9, Some(1), "/deploy").await;
        assert_eq!(replies, vec!["Nothing staged to deploy.".to_string()]);
    }

    #[tokio::test]
    async fn missing_target_reply_suggests_newfile() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>about</html>", vec![]);
        let replies = h.handle(9, Some(1), "/editfile about.html add a bio").await;
        assert!(replies[0].contains("`about.html` not found"));
        assert!(replies[0].contains("/newfile about.html"));
    }

    #[tokio::test]
    async fn pending_is_isolated_per_chat() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, "<html>new</html>", vec![]);
        h.handle(9, Some(1), "/edit change the headline").await;
        // A different chat is still idle and can stage its own change.
        let replies = h.handle(10, Some(1), "/edit other change").await;
        assert!(replies[0].contains("Staged"));
    }
}
