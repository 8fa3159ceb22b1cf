/// Outbound email delivery client
///
/// The API never renders email bodies. It posts a template name plus a
/// structured JSON context to a configured delivery endpoint, which owns
/// rendering and sending. Delivery is fire-and-forget: failures are logged
/// and never fail the request that queued the email.
///
/// With no endpoint configured (local development), sends are logged at
/// debug level and dropped.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::MailerConfig;

/// Delivery request body
#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    to: &'a str,
    from: &'a str,
    template: &'a str,
    context: &'a JsonValue,
}

/// Outbound mail client
///
/// Cheap to clone; the underlying reqwest client shares its connection pool.
#[derive(Debug, Clone)]
pub struct Mailer {
    http: reqwest::Client,
    endpoint: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            from: config.from.clone(),
        }
    }

    /// Queues one email for delivery
    ///
    /// Spawns the send so the calling handler never waits on the delivery
    /// service. Errors are logged with the template name, not the context,
    /// to keep reset tokens and personal data out of logs.
    pub fn send(&self, to: &str, template: &str, context: JsonValue) {
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!(template, "mail delivery disabled, dropping email");
            return;
        };

        let http = self.http.clone();
        let from = self.from.clone();
        let to = to.to_string();
        let template = template.to_string();

        tokio::spawn(async move {
            let body = MailRequest {
                to: &to,
                from: &from,
                template: &template,
                context: &context,
            };

            match http.post(&endpoint).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(template, "email queued for delivery");
                }
                Ok(response) => {
                    tracing::warn!(
                        template,
                        status = %response.status(),
                        "mail delivery service rejected email"
                    );
                }
                Err(e) => {
                    tracing::warn!(template, error = %e, "failed to reach mail delivery service");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_disabled_mailer_drops_silently() {
        let mailer = Mailer::new(&MailerConfig {
            endpoint: None,
            from: "noreply@forgeboard.dev".to_string(),
        });

        // Must not panic or spawn
        mailer.send("user@example.com", "password_reset", json!({ "token": "x" }));
    }

    #[test]
    fn test_request_shape() {
        let context = json!({ "name": "Ada" });
        let body = MailRequest {
            to: "ada@example.com",
            from: "noreply@forgeboard.dev",
            template: "welcome",
            context: &context,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["to"], "ada@example.com");
        assert_eq!(value["template"], "welcome");
        assert_eq!(value["context"]["name"], "Ada");
    }
}
