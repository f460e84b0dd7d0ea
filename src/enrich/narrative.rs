//! Personalized narrative generation.
//!
//! The OpenAI generator asks for a strict JSON document and parses it into
//! `AiSummary`. Generation failures never surface to the respondent: the
//! pipeline substitutes `fallback_summary`, which is assembled from the
//! archetype's own copy.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::answers::SurveyAnswers;
use crate::catalog::{Archetype, questions};
use crate::error::EnrichError;
use crate::session::model::{AiSummary, Session};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a warm, encouraging career coach for aspiring \
entrepreneurs. You write short, specific, second-person summaries. Respond with a \
JSON object containing exactly these keys: \"headline\" (string, under 12 words), \
\"summary\" (string, 2-3 sentences), \"strengths\" (array of 3 short strings), \
\"nextSteps\" (array of 3 short actionable strings), \"encouragement\" (string, \
one sentence). No markdown, no extra keys.";

/// Produces the respondent-facing narrative for a completed session.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(
        &self,
        session: &Session,
        archetype: &Archetype,
    ) -> Result<AiSummary, EnrichError>;
}

/// Render the respondent's answers as human-readable lines for the prompt.
fn humanize_answers(answers: &SurveyAnswers) -> String {
    let mut lines = Vec::new();
    for question in questions() {
        let Some(value) = answers.get(question.id) else {
            continue;
        };
        let rendered = match value {
            crate::answers::AnswerValue::Single(v) => {
                question.label_for(v).unwrap_or(v.as_str()).to_string()
            }
            crate::answers::AnswerValue::Multi(vs) => vs
                .iter()
                .map(|v| question.label_for(v).unwrap_or(v.as_str()))
                .collect::<Vec<_>>()
                .join(", "),
        };
        if !rendered.is_empty() {
            lines.push(format!("- {}: {rendered}", question.prompt));
        }
        if let Some(other) = answers.other_for(question.id) {
            if !other.trim().is_empty() {
                lines.push(format!("  (in their own words: {other})"));
            }
        }
    }
    lines.join("\n")
}

// ── OpenAI-backed generator ─────────────────────────────────────────

pub struct OpenAiNarrative {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiNarrative {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
        }
    }

    fn user_prompt(session: &Session, archetype: &Archetype) -> String {
        let name = session.name.as_deref().unwrap_or("This respondent");
        format!(
            "{name} just completed an entrepreneurship readiness survey and was \
             classified as \"{}\".\n\nTheir answers:\n{}\n\nWrite their personalized \
             results summary.",
            archetype.name,
            humanize_answers(&session.answers),
        )
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrative {
    async fn generate(
        &self,
        session: &Session,
        archetype: &Archetype,
    ) -> Result<AiSummary, EnrichError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::user_prompt(session, archetype) },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7,
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EnrichError::RequestFailed(format!(
                "narrative provider returned {status}: {detail}"
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| EnrichError::InvalidResponse("empty choices".to_string()))?;

        debug!(model = %self.model, "Narrative generated");
        serde_json::from_str(content)
            .map_err(|e| EnrichError::InvalidResponse(format!("summary JSON: {e}")))
    }
}

// ── Deterministic fallback ──────────────────────────────────────────

/// Summary assembled from the archetype's static copy, used when no
/// generator is configured or generation fails.
pub fn fallback_summary(archetype: &Archetype, name: Option<&str>) -> AiSummary {
    let greeting = match name {
        Some(n) if !n.trim().is_empty() => format!("{}, you", n.trim()),
        _ => "You".to_string(),
    };
    AiSummary {
        headline: archetype.headline.to_string(),
        summary: format!(
            "{greeting} came through as {}. {}",
            archetype.name,
            archetype.body.first().copied().unwrap_or_default(),
        ),
        strengths: archetype.bullets.iter().map(|b| b.to_string()).collect(),
        next_steps: vec![
            "Review your archetype breakdown".to_string(),
            "Claim your completion reward".to_string(),
            archetype.cta.to_string(),
        ],
        encouragement: archetype.solution.to_string(),
    }
}
