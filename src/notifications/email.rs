//! SMTP delivery of generated credentials.
//!
//! Uses the `[email]` section of the main config file. When SMTP is not
//! configured the notifier reports itself disabled and callers decide what to
//! do instead.

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{CredentialNotifier, CredentialReason};
use crate::config::EmailConfig;

/// Sends credential emails through an SMTP relay
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send an email with HTML and plain text versions
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<()> {
        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from_address
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from: Mailbox = format!("{} <{}>", self.config.from_name, from_address).parse()?;
        let to: Mailbox = to_email.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        let mailer = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl CredentialNotifier for SmtpNotifier {
    fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    async fn send_temporary_password(
        &self,
        to_email: &str,
        full_name: &str,
        temporary_password: &str,
        reason: CredentialReason,
    ) -> Result<()> {
        if !self.is_enabled() {
            anyhow::bail!("Email delivery is not configured");
        }

        let subject = match reason {
            CredentialReason::PasswordReset => "Your FarmerJoin password was reset",
            CredentialReason::AccountCreated => "Your FarmerJoin account is ready",
        };
        let text_body = render_credential_text(full_name, to_email, temporary_password, reason);
        let html_body = render_credential_html(full_name, to_email, temporary_password, reason);

        self.send_email(to_email, subject, &html_body, &text_body)
            .await
    }
}

fn intro(reason: CredentialReason) -> &'static str {
    match reason {
        CredentialReason::PasswordReset => {
            "A password reset was requested for your FarmerJoin account."
        }
        CredentialReason::AccountCreated => {
            "An administrator created a FarmerJoin account for you."
        }
    }
}

fn render_credential_text(
    full_name: &str,
    email: &str,
    temporary_password: &str,
    reason: CredentialReason,
) -> String {
    format!(
        "Hi {full_name},\n\n\
         {intro}\n\n\
         Email: {email}\n\
         Temporary password: {temporary_password}\n\n\
         Log in with this password and change it right away.\n\
         If you did not expect this email, contact the FarmerJoin team.\n",
        intro = intro(reason),
    )
}

fn render_credential_html(
    full_name: &str,
    email: &str,
    temporary_password: &str,
    reason: CredentialReason,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>FarmerJoin</title>
</head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #f5f5f5; margin: 0; padding: 40px 20px;">
    <div style="max-width: 560px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden;">
        <div style="background: #16a34a; color: #ffffff; padding: 24px; text-align: center;">
            <h1 style="margin: 0; font-size: 22px;">FarmerJoin</h1>
        </div>
        <div style="padding: 24px; color: #374151; line-height: 1.6;">
            <p>Hi {full_name},</p>
            <p>{intro}</p>
            <p>Email: <strong>{email}</strong><br>
               Temporary password: <code style="background: #f3f4f6; padding: 2px 6px;">{temporary_password}</code></p>
            <p>Log in with this password and change it right away.</p>
            <p style="color: #6b7280; font-size: 13px;">If you did not expect this email, contact the FarmerJoin team.</p>
        </div>
    </div>
</body>
</html>"#,
        full_name = escape_html(full_name),
        intro = intro(reason),
        email = escape_html(email),
        temporary_password = escape_html(temporary_password),
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
