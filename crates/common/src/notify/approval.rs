//! Approval notification fan-out
//!
//! Resolves the recipient set for a submission owner (guardian contacts plus
//! all admins) and dispatches the approval-request message over both
//! channels. Nothing is persisted here; idempotence is not guaranteed — the
//! caller triggers this only on the relevant transition events.

use crate::config::NotificationConfig;
use crate::db::models::User;
use crate::db::Repository;
use crate::errors::Result;
use crate::metrics;
use crate::notify::Notifier;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed subject line for approval-request emails
pub const APPROVAL_EMAIL_SUBJECT: &str = "Wish List Approval Required";

/// Recipient set derived per notification event; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSet {
    /// Guardian emails plus all admin emails. Not deduplicated.
    pub emails: Vec<String>,
    /// Guardian phones plus the operator fallback number, deduplicated.
    pub phones: Vec<String>,
}

impl RecipientSet {
    /// Build the recipient set for a submission owner
    pub fn build(user: &User, admin_emails: Vec<String>, fallback_phone: &str) -> Self {
        let mut emails = Vec::new();
        if let Some(email) = non_blank(&user.parent_email1) {
            emails.push(email.to_string());
        }
        if let Some(email) = non_blank(&user.parent_email2) {
            emails.push(email.to_string());
        }
        emails.extend(admin_emails);

        let mut phones = Vec::new();
        for candidate in [
            non_blank(&user.parent_phone1),
            non_blank(&user.parent_phone2),
            Some(fallback_phone),
        ]
        .into_iter()
        .flatten()
        {
            if !phones.iter().any(|p| p == candidate) {
                phones.push(candidate.to_string());
            }
        }

        Self { emails, phones }
    }
}

/// Treat empty and whitespace-only values as absent
fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
}

/// Render the approval-request email body
fn render_approval_email(user_name: Option<&str>, approval_link: &str) -> String {
    let lead = match user_name {
        Some(name) => format!("{} has a wish list ready for approval.", name),
        None => "A wish list is ready for approval.".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Wish List Approval</title>
</head>
<body>
  <div class="email-container">
    <div class="header">Wish List Approval Required</div>
    <div class="content">
      <p>Hello,</p>
      <p>{lead}</p>
      <p>Please visit the link below to review the submission:</p>
      <p><a href="{approval_link}">Review Submission</a></p>
      <p>If the link above doesn't work, you can copy and paste it into your browser:</p>
      <p>{approval_link}</p>
    </div>
    <div class="footer">
      <p>Thank you,</p>
      <p>The Wishbox Team</p>
    </div>
  </div>
</body>
</html>"#
    )
}

/// Render the approval-request SMS text
fn render_approval_sms(user_name: Option<&str>) -> String {
    match user_name {
        Some(name) => format!(
            "Wish list approval required: {} has a wish list ready for review.",
            name
        ),
        None => "Wish list approval required: a wish list is ready for review.".to_string(),
    }
}

/// Dispatch the approval notification to a resolved recipient set
///
/// Email is a single multi-recipient send. SMS messages go out concurrently,
/// one per recipient; every send is attempted and the first transport error
/// is surfaced after the batch completes. Empty recipient lists are skipped
/// silently.
async fn dispatch(
    notifier: &dyn Notifier,
    recipients: &RecipientSet,
    user_name: Option<&str>,
    approval_link: &str,
) -> Result<()> {
    if !recipients.emails.is_empty() {
        let body = render_approval_email(user_name, approval_link);
        let sent = notifier
            .send_email(&recipients.emails, APPROVAL_EMAIL_SUBJECT, &body)
            .await;
        metrics::record_notification("email", recipients.emails.len(), sent.is_ok());
        sent?;
    }

    if !recipients.phones.is_empty() {
        let message = render_approval_sms(user_name);
        let sends = recipients
            .phones
            .iter()
            .map(|phone| notifier.send_sms(phone, &message));
        let results = join_all(sends).await;

        let failures = results.iter().filter(|r| r.is_err()).count();
        metrics::record_notification(
            "sms",
            recipients.phones.len() - failures,
            failures == 0,
        );
        for result in results {
            result?;
        }
    }

    Ok(())
}

/// Approval notification fan-out over the configured transport
pub struct ApprovalNotifier {
    repo: Repository,
    notifier: Arc<dyn Notifier>,
    config: NotificationConfig,
}

impl ApprovalNotifier {
    /// Create a new approval notifier
    pub fn new(repo: Repository, notifier: Arc<dyn Notifier>, config: NotificationConfig) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    /// Notify the submission owner's guardians and all admins that a wish
    /// list needs approval. A missing user is a no-op, not an error.
    pub async fn notify_approval_needed(&self, user_id: i32) -> Result<()> {
        let Some(user) = self.repo.find_user(user_id).await? else {
            debug!(user_id, "Skipping approval notification for unknown user");
            return Ok(());
        };

        let admin_emails = self.repo.admin_emails().await?;
        let recipients = RecipientSet::build(
            &user,
            admin_emails,
            &self.config.operator_fallback_phone,
        );

        let approval_link = format!("{}{}", self.config.base_approval_url, user_id);
        let user_name = Some(user.name.as_str()).filter(|n| !n.trim().is_empty());

        info!(
            user_id,
            email_recipients = recipients.emails.len(),
            phone_recipients = recipients.phones.len(),
            "Sending approval notifications"
        );

        dispatch(self.notifier.as_ref(), &recipients, user_name, &approval_link).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    fn test_user() -> User {
        let now = Utc::now().into();
        User {
            id: 42,
            username: "kiddo".into(),
            name: "Sam".into(),
            is_admin: false,
            email: "kiddo@example.com".into(),
            parent_email1: Some("mom@example.com".into()),
            parent_email2: Some("dad@example.com".into()),
            parent_phone1: Some("555-1".into()),
            parent_phone2: Some("555-1".into()),
            created_date: now,
            last_modified_date: now,
        }
    }

    #[test]
    fn test_email_recipients_not_deduplicated() {
        let user = test_user();
        let admins = vec!["admin@example.com".into(), "mom@example.com".into()];

        let recipients = RecipientSet::build(&user, admins, "+15555550100");

        // Two guardians plus two admins, duplicates preserved
        assert_eq!(recipients.emails.len(), 4);
        assert_eq!(
            recipients.emails,
            vec![
                "mom@example.com",
                "dad@example.com",
                "admin@example.com",
                "mom@example.com"
            ]
        );
    }

    #[test]
    fn test_phone_recipients_deduplicated_with_fallback() {
        let user = test_user();

        let recipients = RecipientSet::build(&user, vec![], "+15555550100");

        // "555-1" twice collapses to one entry, plus the fallback
        assert_eq!(recipients.phones, vec!["555-1", "+15555550100"]);
    }

    #[test]
    fn test_blank_guardian_contacts_skipped() {
        let mut user = test_user();
        user.parent_email1 = Some("   ".into());
        user.parent_email2 = None;
        user.parent_phone1 = None;
        user.parent_phone2 = Some(String::new());

        let recipients = RecipientSet::build(&user, vec!["admin@example.com".into()], "+1555");

        assert_eq!(recipients.emails, vec!["admin@example.com"]);
        assert_eq!(recipients.phones, vec!["+1555"]);
    }

    #[test]
    fn test_render_email_names_user() {
        let body = render_approval_email(Some("Sam"), "https://x/approvals/42");
        assert!(body.contains("Sam has a wish list ready for approval."));
        assert!(body.contains("https://x/approvals/42"));

        let generic = render_approval_email(None, "https://x/approvals/42");
        assert!(generic.contains("A wish list is ready for approval."));
    }

    #[derive(Default)]
    struct MockNotifier {
        emails: Mutex<Vec<(Vec<String>, String)>>,
        sms: Mutex<Vec<String>>,
        fail_sms_to: Option<String>,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send_email(&self, to: &[String], subject: &str, _html_body: &str) -> Result<()> {
            self.emails
                .lock()
                .unwrap()
                .push((to.to_vec(), subject.to_string()));
            Ok(())
        }

        async fn send_sms(&self, to: &str, _message: &str) -> Result<()> {
            self.sms.lock().unwrap().push(to.to_string());
            if self.fail_sms_to.as_deref() == Some(to) {
                return Err(AppError::Notification {
                    message: format!("SMS to {} failed", to),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_sends_both_channels() {
        let notifier = MockNotifier::default();
        let recipients = RecipientSet {
            emails: vec!["mom@example.com".into(), "admin@example.com".into()],
            phones: vec!["555-1".into(), "555-2".into()],
        };

        dispatch(&notifier, &recipients, Some("Sam"), "https://x/approvals/42")
            .await
            .unwrap();

        let emails = notifier.emails.lock().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].0.len(), 2);
        assert_eq!(emails[0].1, APPROVAL_EMAIL_SUBJECT);

        let sms = notifier.sms.lock().unwrap();
        assert_eq!(sms.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_attempts_all_sms_despite_failure() {
        let notifier = MockNotifier {
            fail_sms_to: Some("555-1".into()),
            ..Default::default()
        };
        let recipients = RecipientSet {
            emails: vec![],
            phones: vec!["555-1".into(), "555-2".into(), "555-3".into()],
        };

        let result = dispatch(&notifier, &recipients, None, "https://x/approvals/1").await;

        // The failing send surfaces, but every recipient was attempted
        assert!(result.is_err());
        assert_eq!(notifier.sms.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_skips_empty_recipient_lists() {
        let notifier = MockNotifier::default();
        let recipients = RecipientSet {
            emails: vec![],
            phones: vec![],
        };

        dispatch(&notifier, &recipients, None, "https://x/approvals/1")
            .await
            .unwrap();

        assert!(notifier.emails.lock().unwrap().is_empty());
        assert!(notifier.sms.lock().unwrap().is_empty());
    }
}
