use super::{Email, Mailer, MailerError, MailerResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transactional email provider client
///
/// Posts JSON to `{base_url}/emails` with a bearer API key. Attachments are
/// sent base64-encoded.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content_type: &'a str,
    content: String,
}

impl<'a> EmailPayload<'a> {
    fn from_email(email: &'a Email) -> Self {
        Self {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentPayload {
                    filename: &a.filename,
                    content_type: &a.content_type,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        }
    }
}

impl HttpMailer {
    pub fn new(base_url: &str, api_key: &str) -> MailerResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| MailerError::Invalid(format!("invalid API key header: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, email: &Email) -> MailerResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmailPayload::from_email(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to = %email.to, status = status.as_u16(), "Email accepted by provider");
        Ok(())
    }
}
