// src/services/notifier.rs

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};

use crate::{
    config::{Config, SmtpConfig},
    error::AppError,
    models::{certificate::Certificate, user::User},
    utils::html::escape_text,
};

/// Sends the issuance notice once a certificate has been paid for.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn certificate_issued(&self, user: &User, certificate: &Certificate) -> Result<(), AppError>;
}

/// Content of the issuance email.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl IssuanceEmail {
    pub fn compose(
        issuer_name: &str,
        user: &User,
        certificate: &Certificate,
        verify_url: &str,
        download_url: &str,
    ) -> Self {
        let issued = certificate.issued_at.format("%d %B %Y").to_string();
        let subject = format!("Issuance of Certificate – {}", issuer_name);

        let text = format!(
            "To,\n{name}\n\n\
             This is to inform you that upon successful completion of the prescribed assessment\n\
             and confirmation of payment, your Certificate has been duly issued by the\n\
             {issuer}.\n\n\
             Certificate Code : {code}\n\
             Result           : {grade} ({pct:.2}%)\n\
             Date of Issue    : {issued}\n\n\
             Verification Link:\n{verify_url}\n\n\
             Download Link:\n{download_url}\n\n\
             This is a system-generated email.\n",
            name = user.display_name(),
            issuer = issuer_name,
            code = certificate.certificate_code,
            grade = certificate.grade,
            pct = certificate.percentage,
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Certificate Issued</title></head>
<body style="font-family:Arial, Helvetica, sans-serif;">
  <h2>{issuer}</h2>
  <p><strong>Certificate Issuance Notification</strong></p>
  <p>To,<br><strong>{name}</strong></p>
  <p>Your certificate has been successfully issued after confirmation of payment.</p>
  <table cellpadding="6">
    <tr><td><strong>Certificate Code</strong></td><td>{code}</td></tr>
    <tr><td><strong>Result</strong></td><td>{grade} ({pct:.2}%)</td></tr>
    <tr><td><strong>Date of Issue</strong></td><td>{issued}</td></tr>
  </table>
  <p><a href="{verify_url}">Verify Certificate</a><br><a href="{download_url}">Download Certificate</a></p>
  <p>This is an automated system email. Please do not reply.</p>
</body>
</html>
"#,
            issuer = escape_text(issuer_name),
            name = escape_text(user.display_name()),
            code = escape_text(&certificate.certificate_code),
            grade = escape_text(&certificate.grade),
            pct = certificate.percentage,
        );

        Self {
            subject,
            text,
            html,
        }
    }
}

/// Delivers issuance emails over SMTP.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    config: Config,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, config: Config) -> Result<Self, AppError> {
        let from: Mailbox = format!("{} <{}>", smtp.from_name, smtp.from_email)
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("Invalid from address: {}", e)))?;

        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)
            .map_err(|e| AppError::InternalServerError(format!("Invalid SMTP server: {}", e)))?
            .port(smtp.port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from,
            config,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn certificate_issued(&self, user: &User, certificate: &Certificate) -> Result<(), AppError> {
        let email = user.email.as_deref().ok_or_else(|| {
            AppError::Downstream(format!(
                "No email address on file for certificate {}",
                certificate.certificate_code
            ))
        })?;

        let to: Mailbox = format!("{} <{}>", user.display_name(), email)
            .parse()
            .map_err(|e| AppError::Downstream(format!("Invalid recipient address: {}", e)))?;

        let content = IssuanceEmail::compose(
            &self.config.issuer_name,
            user,
            certificate,
            &self.config.verification_url(&certificate.certificate_code),
            &self.config.download_url(&certificate.certificate_code),
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(content.subject)
            .multipart(MultiPart::alternative_plain_html(content.text, content.html))
            .map_err(|e| AppError::Downstream(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| AppError::Downstream(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            "Issuance email sent for certificate {}",
            certificate.certificate_code
        );
        Ok(())
    }
}

/// Stand-in used when no SMTP server is configured. Logs the notice instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn certificate_issued(&self, user: &User, certificate: &Certificate) -> Result<(), AppError> {
        tracing::info!(
            "SMTP not configured; would notify user {} ({:?}) about certificate {}",
            user.id,
            user.email,
            certificate.certificate_code
        );
        Ok(())
    }
}
