//! Outbound completion notifications.
//!
//! Fired after a successful completion so downstream systems (CRM,
//! rewards ledger) hear about it. Delivery is fire-and-forget: a dead
//! endpoint never delays or fails the respondent's completion.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::promo::IssuedPromo;
use crate::session::model::Session;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);
const SECRET_HEADER: &str = "x-webhook-secret";

pub struct CompletionWebhook {
    url: String,
    secret: Option<SecretString>,
    client: reqwest::Client,
}

impl CompletionWebhook {
    pub fn new(url: impl Into<String>, secret: Option<SecretString>) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            secret,
            client: reqwest::Client::builder()
                .timeout(WEBHOOK_TIMEOUT)
                .build()
                .unwrap_or_default(),
        })
    }

    fn payload(session: &Session, promo: &IssuedPromo) -> serde_json::Value {
        let event = if promo.is_retake {
            "survey.retake_completed"
        } else {
            "survey.completed"
        };
        serde_json::json!({
            "event": event,
            "sessionId": session.session_id,
            "archetype": session.archetype_result,
            "name": session.name,
            "email": session.email,
            "promoCode": promo.code,
            "points": promo.points,
            "completedAt": session.completed_at,
        })
    }

    /// Queue the notification without waiting for delivery.
    pub fn notify(self: &Arc<Self>, session: &Session, promo: &IssuedPromo) {
        let payload = Self::payload(session, promo);
        let hook = Arc::clone(self);
        tokio::spawn(async move {
            match hook.post(&payload).await {
                Ok(()) => debug!(url = %hook.url, "Completion webhook delivered"),
                Err(e) => warn!(url = %hook.url, error = %e, "Completion webhook failed"),
            }
        });
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<(), reqwest::Error> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(secret) = &self.secret {
            request = request.header(SECRET_HEADER, secret.expose_secret());
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}
