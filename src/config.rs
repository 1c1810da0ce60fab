// src/config.rs

use std::env;

use dotenvy::dotenv;
use url::Url;

/// Razorpay credentials used for order creation and webhook verification.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    pub api_base: String,
}

/// Outgoing mail server. Only present when `SMTP_SERVER` is set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub port: u16,

    /// Public origin used to build verification and download links.
    pub public_base_url: Url,

    /// Organisation name printed on certificates and emails.
    pub issuer_name: String,

    /// Leading segment of every certificate code, e.g. `IPS-2025-000001`.
    pub certificate_prefix: String,

    pub currency: String,

    /// Allowed browser origins. Empty means any origin.
    pub cors_origins: Vec<String>,

    pub razorpay: RazorpayConfig,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port));
        let public_base_url = Url::parse(&public_base_url).expect("PUBLIC_BASE_URL must be a valid URL");

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let razorpay = RazorpayConfig {
            key_id: env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID must be set"),
            key_secret: env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET must be set"),
            webhook_secret: env::var("RAZORPAY_WEBHOOK_SECRET")
                .expect("RAZORPAY_WEBHOOK_SECRET must be set"),
            api_base: env::var("RAZORPAY_API_BASE")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
        };

        let smtp = env::var("SMTP_SERVER").ok().map(|server| {
            let username = env::var("SMTP_USERNAME").unwrap_or_default();
            SmtpConfig {
                server,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                from_email: env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| username.clone()),
                username,
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_name: env::var("SMTP_FROM_NAME")
                    .unwrap_or_else(|_| "Certificate Desk".to_string()),
            }
        });

        Self {
            database_url,
            rust_log,
            port,
            public_base_url,
            issuer_name: env::var("ISSUER_NAME")
                .unwrap_or_else(|_| "Indian Photographic Society".to_string()),
            certificate_prefix: env::var("CERTIFICATE_PREFIX").unwrap_or_else(|_| "IPS".to_string()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            cors_origins,
            razorpay,
            smtp,
        }
    }

    /// Public verification link for a certificate code.
    pub fn verification_url(&self, certificate_code: &str) -> String {
        self.public_link(&format!("verify/{}", certificate_code))
    }

    /// Public download link for a certificate code.
    pub fn download_url(&self, certificate_code: &str) -> String {
        self.public_link(&format!("certificate/{}/download", certificate_code))
    }

    fn public_link(&self, path: &str) -> String {
        // `join` replaces the last segment unless the base ends with '/'
        let mut base = self.public_base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", base, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base(base: &str) -> Config {
        Config {
            database_url: None,
            rust_log: "error".to_string(),
            port: 0,
            public_base_url: Url::parse(base).unwrap(),
            issuer_name: "Test Society".to_string(),
            certificate_prefix: "IPS".to_string(),
            currency: "INR".to_string(),
            cors_origins: vec![],
            razorpay: RazorpayConfig {
                key_id: "key".to_string(),
                key_secret: "secret".to_string(),
                webhook_secret: "whsec".to_string(),
                api_base: "http://localhost".to_string(),
            },
            smtp: None,
        }
    }

    #[test]
    fn test_links_without_trailing_slash() {
        let config = config_with_base("https://certs.example.org");
        assert_eq!(
            config.verification_url("IPS-2025-000001"),
            "https://certs.example.org/verify/IPS-2025-000001"
        );
    }

    #[test]
    fn test_links_keep_base_path() {
        let config = config_with_base("https://example.org/portal");
        assert_eq!(
            config.download_url("IPS-2025-000007"),
            "https://example.org/portal/certificate/IPS-2025-000007/download"
        );
    }
}
