use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::EmailSettings;

/// Errors that can occur when sending email
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Email API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl EmailError {
    /// Error details for API callers; the provider's JSON error body when it sent one
    pub fn details(&self) -> serde_json::Value {
        match self {
            EmailError::ApiError { message, .. } => serde_json::from_str(message)
                .unwrap_or_else(|_| serde_json::Value::String(message.clone())),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

/// The details that go into an invitation email
#[derive(Debug, Clone)]
pub struct Invitation<'a> {
    pub invitee_name: &'a str,
    pub invitee_email: &'a str,
    pub inviter_name: &'a str,
    pub household_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// What happened to an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    /// Accepted by the provider under this id
    Sent { id: String },
    /// No provider configured; written to the log instead
    Logged,
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailReply {
    id: String,
}

/// Escape text for interpolation into HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Transactional email client for a Resend-compatible HTTP API
///
/// Without an API key every email is logged instead of sent, so local setups
/// work without provider credentials.
pub struct EmailClient {
    api_base: String,
    api_key: Option<String>,
    from: String,
    site_url: String,
    client: Client,
}

impl EmailClient {
    pub fn new(
        api_base: String,
        api_key: Option<String>,
        from: String,
        site_url: String,
    ) -> Result<Self, EmailError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            api_base,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            from,
            site_url,
            client,
        })
    }

    pub fn from_settings(settings: &EmailSettings) -> Result<Self, EmailError> {
        Self::new(
            settings.api_base.clone(),
            settings.api_key.clone(),
            settings.from.clone(),
            settings.site_url.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn signup_url(&self, email: &str) -> String {
        format!(
            "{}/auth/signup?email={}",
            self.site_url.trim_end_matches('/'),
            urlencoding::encode(email)
        )
    }

    pub fn render_invitation(&self, invitation: &Invitation<'_>) -> RenderedEmail {
        let subject = format!(
            "You're invited to join {} on HouseRater",
            invitation.household_name
        );
        let signup_url = self.signup_url(invitation.invitee_email);

        let invitee = escape_html(invitation.invitee_name);
        let inviter = escape_html(invitation.inviter_name);
        let household = escape_html(invitation.household_name);
        let email = escape_html(invitation.invitee_email);
        let link = escape_html(&signup_url);

        let html = format!(
            r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; color: #1f2937; line-height: 1.5;">
    <h1 style="color: #2563eb;">You're invited to HouseRater</h1>
    <p>Hi {invitee},</p>
    <p><strong>{inviter}</strong> has invited you to join the <strong>{household}</strong> household on HouseRater.</p>
    <p>HouseRater helps your household rate the houses you visit against the things that matter most to each of you.</p>
    <p>
      <a href="{link}" style="display: inline-block; padding: 12px 24px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px;">Join {household}</a>
    </p>
    <p>Sign up with this email address (<strong>{email}</strong>) and you'll be added to the household automatically.</p>
    <p style="color: #6b7280; font-size: 12px;">If you weren't expecting this invitation, you can ignore this email.</p>
  </body>
</html>"#
        );

        let text = format!(
            "Hi {},\n\n\
             {} has invited you to join the {} household on HouseRater.\n\n\
             Sign up here: {}\n\n\
             Use this email address ({}) when you sign up and you'll be added to the household automatically.\n\n\
             If you weren't expecting this invitation, you can ignore this email.\n",
            invitation.invitee_name,
            invitation.inviter_name,
            invitation.household_name,
            signup_url,
            invitation.invitee_email
        );

        RenderedEmail { subject, html, text }
    }

    pub async fn send_invitation(&self, invitation: &Invitation<'_>) -> Result<EmailOutcome, EmailError> {
        let email = self.render_invitation(invitation);
        self.send(invitation.invitee_email, &email).await
    }

    /// Send through the provider, or log when none is configured
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<EmailOutcome, EmailError> {
        let Some(api_key) = &self.api_key else {
            tracing::info!(
                to = to,
                subject = %email.subject,
                "Email provider not configured, logging email instead:\n{}",
                email.text
            );
            return Ok(EmailOutcome::Logged);
        };

        let url = format!("{}/emails", self.api_base.trim_end_matches('/'));
        let body = SendEmailBody {
            from: &self.from,
            to: [to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("Email API rejected message to {}: {} {}", to, status, message);
            return Err(EmailError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let reply: SendEmailReply = response
            .json()
            .await
            .map_err(|e| EmailError::InvalidResponse(e.to_string()))?;

        tracing::info!("Sent email {} to {}", reply.id, to);
        Ok(EmailOutcome::Sent { id: reply.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Invitation<'static> {
        Invitation {
            invitee_name: "Sam",
            invitee_email: "sam+house@example.com",
            inviter_name: "Alex <script>",
            household_name: "The Smiths",
        }
    }

    fn client(api_base: &str, api_key: Option<&str>) -> EmailClient {
        EmailClient::new(
            api_base.to_string(),
            api_key.map(str::to_string),
            "HouseRater <test@example.com>".to_string(),
            "https://houserater.test/".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_invitation() {
        let email = client("http://unused", None).render_invitation(&invitation());

        assert_eq!(email.subject, "You're invited to join The Smiths on HouseRater");
        assert!(email.html.contains("Alex &lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert!(email.text.contains("https://houserater.test/auth/signup?email=sam%2Bhouse%40example.com"));
    }

    #[test]
    fn test_blank_api_key_means_unconfigured() {
        assert!(!client("http://unused", Some("  ")).is_configured());
        assert!(client("http://unused", Some("re_123")).is_configured());
    }

    #[test]
    fn test_logs_without_api_key() {
        let outcome = tokio_test::block_on(client("http://unused", None).send_invitation(&invitation())).unwrap();
        assert_eq!(outcome, EmailOutcome::Logged);
    }

    #[tokio::test]
    async fn test_sends_through_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer re_test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "to": ["sam+house@example.com"],
                "subject": "You're invited to join The Smiths on HouseRater"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"email_123"}"#)
            .create_async()
            .await;

        let outcome = client(&server.url(), Some("re_test"))
            .send_invitation(&invitation())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(outcome, EmailOutcome::Sent { id: "email_123".to_string() });
    }

    #[tokio::test]
    async fn test_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/emails")
            .with_status(422)
            .with_body(r#"{"message":"Invalid `to` field"}"#)
            .create_async()
            .await;

        let err = client(&server.url(), Some("re_test"))
            .send_invitation(&invitation())
            .await
            .unwrap_err();

        assert!(matches!(err, EmailError::ApiError { status: 422, .. }));
        assert_eq!(err.details(), serde_json::json!({ "message": "Invalid `to` field" }));
    }

    #[test]
    fn test_plain_text_error_details() {
        let err = EmailError::ApiError {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(err.details(), serde_json::json!("Bad Gateway"));

        let err = EmailError::InvalidResponse("missing id".to_string());
        assert_eq!(err.details(), serde_json::json!("Invalid response format: missing id"));
    }
}
