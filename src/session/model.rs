//! The session aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::SurveyAnswers;

/// Structured personalized narrative produced by enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    pub headline: String,
    pub summary: String,
    pub strengths: Vec<String>,
    pub next_steps: Vec<String>,
    pub encouragement: String,
}

/// One respondent's durable survey record.
///
/// Invariants enforced here rather than at call sites:
/// - `archetype_result` and `promo_code` are write-once,
/// - `is_completed` only moves false → true,
/// - enrichment outputs are set-once and cacheable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub current_step: usize,
    pub answers: SurveyAnswers,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<AiSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A brand-new session with the given token.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Record answers and position. No-op once completed (answers are
    /// frozen with the classified result).
    pub fn record_progress(&mut self, answers: SurveyAnswers, step: usize) {
        if self.is_completed {
            return;
        }
        self.answers = answers;
        self.current_step = step;
    }

    pub fn record_user_info(&mut self, name: impl Into<String>, email: Option<String>) {
        self.name = Some(name.into());
        if email.is_some() {
            self.email = email;
        }
    }

    /// Mark the session completed with its archetype.
    ///
    /// `archetype_result` is write-once: a second call with a different
    /// archetype leaves the original in place. The promo code may arrive
    /// later than completion (offline completion has none) but is also
    /// write-once.
    pub fn complete(&mut self, archetype_id: &str, promo_code: Option<String>) {
        if self.archetype_result.is_none() {
            self.archetype_result = Some(archetype_id.to_string());
        }
        if self.promo_code.is_none() {
            self.promo_code = promo_code;
        }
        if !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(Utc::now());
        }
    }

    /// Attach enrichment outputs. Set-once: cached values are never
    /// overwritten by a later (re-)generation.
    pub fn apply_enrichment(&mut self, summary: Option<AiSummary>, certificate_url: Option<String>) {
        if self.ai_summary.is_none() {
            self.ai_summary = summary;
        }
        if self.certificate_url.is_none() {
            self.certificate_url = certificate_url;
        }
    }

    /// Whether both enrichment outputs are already cached.
    pub fn is_enriched(&self) -> bool {
        self.ai_summary.is_some() && self.certificate_url.is_some()
    }
}
