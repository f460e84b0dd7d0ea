//! Respondent answers — a monotonically growing map keyed by question id.
//!
//! Values are either a single option value or an ordered list of values
//! (multi-choice). Auxiliary free-text lives under derived sidecar keys:
//! `<question_id>_email` and `<question_id>_other`. Branch skips never
//! delete previously stored keys, including sidecars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Question;

/// One answer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Single-choice, dropdown, email-conditional selection, or sidecar text.
    Single(String),
    /// Multi-choice selections in the order they were picked.
    Multi(Vec<String>),
}

impl AnswerValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            Self::Multi(v) => Some(v),
            Self::Single(_) => None,
        }
    }
}

/// All answers for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyAnswers {
    values: BTreeMap<String, AnswerValue>,
}

/// Sidecar key for a conditional email answer.
pub fn email_key(question_id: &str) -> String {
    format!("{question_id}_email")
}

/// Sidecar key for a free-text "other" answer.
pub fn other_key(question_id: &str) -> String {
    format!("{question_id}_other")
}

impl SurveyAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    /// Single-value answer for a question (or sidecar key), if any.
    pub fn single(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(AnswerValue::as_single)
    }

    /// Multi-value answer for a question, if any.
    pub fn multi(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).and_then(AnswerValue::as_multi)
    }

    /// Set (or replace) a single-choice answer.
    pub fn set_single(&mut self, question_id: &str, value: impl Into<String>) {
        self.values
            .insert(question_id.to_string(), AnswerValue::Single(value.into()));
    }

    /// Toggle a multi-choice selection.
    ///
    /// Selecting an already-selected value removes it; selecting a new value
    /// appends it unless the question's cap is reached, in which case the
    /// toggle is a no-op (not an error).
    pub fn toggle_multi(&mut self, question: &Question, value: &str) {
        let cap = question.max_selections.unwrap_or(usize::MAX);
        let entry = self
            .values
            .entry(question.id.to_string())
            .or_insert_with(|| AnswerValue::Multi(Vec::new()));

        // A single value under a multi question id would be malformed input;
        // normalize it into a list rather than panic.
        if let AnswerValue::Single(s) = entry {
            *entry = AnswerValue::Multi(vec![std::mem::take(s)]);
        }

        if let AnswerValue::Multi(selected) = entry {
            if let Some(pos) = selected.iter().position(|v| v == value) {
                selected.remove(pos);
            } else if selected.len() < cap {
                selected.push(value.to_string());
            }
        }
    }

    /// Store the conditional email sidecar for a question.
    pub fn set_email(&mut self, question_id: &str, email: impl Into<String>) {
        self.values
            .insert(email_key(question_id), AnswerValue::Single(email.into()));
    }

    /// Store the free-text "other" sidecar for a question.
    pub fn set_other(&mut self, question_id: &str, text: impl Into<String>) {
        self.values
            .insert(other_key(question_id), AnswerValue::Single(text.into()));
    }

    /// The stored email sidecar for a question, if any.
    pub fn email_for(&self, question_id: &str) -> Option<&str> {
        self.single(&email_key(question_id))
    }

    /// The stored "other" sidecar for a question, if any.
    pub fn other_for(&self, question_id: &str) -> Option<&str> {
        self.single(&other_key(question_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::question_by_id;

    #[test]
    fn single_replaces_previous_value() {
        let mut answers = SurveyAnswers::new();
        answers.set_single("motivation", "purpose_impact");
        answers.set_single("motivation", "wealth_scaling");
        assert_eq!(answers.single("motivation"), Some("wealth_scaling"));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn multi_toggle_respects_cap() {
        let q = question_by_id("support_types").unwrap();
        let mut answers = SurveyAnswers::new();
        answers.toggle_multi(q, "step_by_step_roadmap");
        answers.toggle_multi(q, "coaching_mentorship");
        answers.toggle_multi(q, "funding_access");
        // Cap is 3 — a fourth selection is a no-op.
        answers.toggle_multi(q, "community_peers");
        assert_eq!(
            answers.multi("support_types").unwrap(),
            &[
                "step_by_step_roadmap".to_string(),
                "coaching_mentorship".to_string(),
                "funding_access".to_string()
            ]
        );
    }

    #[test]
    fn multi_toggle_removes_existing() {
        let q = question_by_id("support_types").unwrap();
        let mut answers = SurveyAnswers::new();
        answers.toggle_multi(q, "funding_access");
        answers.toggle_multi(q, "community_peers");
        answers.toggle_multi(q, "funding_access");
        assert_eq!(
            answers.multi("support_types").unwrap(),
            &["community_peers".to_string()]
        );
        // Removal frees a cap slot again.
        answers.toggle_multi(q, "tools_templates");
        assert_eq!(answers.multi("support_types").unwrap().len(), 2);
    }

    #[test]
    fn sidecars_use_derived_keys() {
        let mut answers = SurveyAnswers::new();
        answers.set_single("early_access", "yes_apply");
        answers.set_email("early_access", "a@example.com");
        answers.set_other("employment_status", "between gigs");
        assert_eq!(answers.email_for("early_access"), Some("a@example.com"));
        assert_eq!(answers.single("early_access_email"), Some("a@example.com"));
        assert_eq!(answers.other_for("employment_status"), Some("between gigs"));
    }

    #[test]
    fn changing_answer_keeps_stale_sidecar() {
        // Branching never retroactively deletes sidecar values.
        let mut answers = SurveyAnswers::new();
        answers.set_single("early_access", "yes_apply");
        answers.set_email("early_access", "a@example.com");
        answers.set_single("early_access", "not_now");
        assert_eq!(answers.email_for("early_access"), Some("a@example.com"));
    }

    #[test]
    fn json_shape_matches_wire_format() {
        let mut answers = SurveyAnswers::new();
        answers.set_single("motivation", "purpose_impact");
        let q = question_by_id("support_types").unwrap();
        answers.toggle_multi(q, "funding_access");

        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json["motivation"], "purpose_impact");
        assert_eq!(json["support_types"][0], "funding_access");

        let parsed: SurveyAnswers = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, answers);
    }
}
