//! Question flow controller — a small state machine over the catalog.
//!
//! Owns the current step index and the in-progress answers. Navigation
//! never performs IO: every successful move returns the new position and
//! the caller forwards a persist-progress request to the session manager
//! fire-and-forget, so navigation can neither block on persistence nor
//! fail because of it.

use std::sync::OnceLock;

use regex::Regex;

use crate::answers::SurveyAnswers;
use crate::catalog::{Question, QuestionKind, question_index, questions};
use crate::error::FlowError;

/// Presentation hint for step transitions. Not a correctness concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Outcome of a successful `advance()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to a new question index.
    Moved { step: usize },
    /// The last question was answered — the survey is complete.
    Completed,
}

// The one conditional branch in the catalog: respondents who are not
// pursuing a business skip the urgency/motivation/barrier block and go
// straight to the income goal question.
const BRANCH_ORIGIN: &str = "considering_business";
const BRANCH_TRIGGER: &str = "not_pursuing";
const BRANCH_TARGET: &str = "income_goal";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Validate an email address format.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// The flow state machine.
#[derive(Debug, Clone)]
pub struct FlowController {
    current_step: usize,
    answers: SurveyAnswers,
    direction: Direction,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowController {
    /// Start a fresh flow at the first question.
    pub fn new() -> Self {
        Self {
            current_step: 0,
            answers: SurveyAnswers::new(),
            direction: Direction::Forward,
        }
    }

    /// Resume a flow from persisted answers and step.
    ///
    /// An out-of-range step (catalog shrank, corrupted cache) clamps to the
    /// last question rather than failing.
    pub fn resume(answers: SurveyAnswers, step: usize) -> Self {
        let last = questions().len().saturating_sub(1);
        Self {
            current_step: step.min(last),
            answers,
            direction: Direction::Forward,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn current_question(&self) -> &'static Question {
        &questions()[self.current_step]
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == questions().len() - 1
    }

    pub fn answers(&self) -> &SurveyAnswers {
        &self.answers
    }

    /// Take the answers out of the controller (e.g. for classification).
    pub fn into_answers(self) -> SurveyAnswers {
        self.answers
    }

    // ── Answer entry ────────────────────────────────────────────────

    /// Record a selection for the current question.
    ///
    /// Multi-choice selections toggle and respect the question's cap;
    /// everything else replaces the stored value.
    pub fn select(&mut self, value: &str) {
        let question = self.current_question();
        match question.kind {
            QuestionKind::Multi => self.answers.toggle_multi(question, value),
            _ => self.answers.set_single(question.id, value),
        }
    }

    /// Record the email sidecar for the current (email-conditional) question.
    pub fn enter_email(&mut self, email: &str) {
        let id = self.current_question().id;
        self.answers.set_email(id, email.trim());
    }

    /// Record the free-text "other" sidecar for the current question.
    pub fn enter_other(&mut self, text: &str) {
        let id = self.current_question().id;
        self.answers.set_other(id, text.trim());
    }

    // ── Sufficiency ─────────────────────────────────────────────────

    /// Whether the current question has enough of an answer to advance.
    pub fn has_sufficient_answer(&self) -> bool {
        let question = self.current_question();
        match question.kind {
            QuestionKind::Multi => self
                .answers
                .multi(question.id)
                .is_some_and(|v| !v.is_empty()),
            QuestionKind::EmailConditional => match self.answers.single(question.id) {
                Some(choice) if question.email_required_options.contains(&choice) => self
                    .answers
                    .email_for(question.id)
                    .is_some_and(|e| !e.trim().is_empty()),
                Some(_) => true,
                None => false,
            },
            QuestionKind::Single | QuestionKind::Dropdown => {
                match self.answers.single(question.id) {
                    Some(choice) if question.other_option == Some(choice) => self
                        .answers
                        .other_for(question.id)
                        .is_some_and(|t| !t.trim().is_empty()),
                    Some(_) => true,
                    None => false,
                }
            }
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Advance to the next step, applying the branch override.
    ///
    /// Fails (leaving the position unchanged) if the current answer is
    /// insufficient or a required email is malformed. Answering the last
    /// question yields `Advance::Completed` instead of a new index.
    pub fn advance(&mut self) -> Result<Advance, FlowError> {
        let question = self.current_question();

        if !self.has_sufficient_answer() {
            return Err(FlowError::InsufficientAnswer(question.id.to_string()));
        }

        if question.kind == QuestionKind::EmailConditional {
            if let Some(choice) = self.answers.single(question.id) {
                if question.email_required_options.contains(&choice) {
                    let email = self.answers.email_for(question.id).unwrap_or_default();
                    if !is_valid_email(email) {
                        return Err(FlowError::InvalidEmail {
                            question: question.id.to_string(),
                            message: "please enter a valid email address".to_string(),
                        });
                    }
                }
            }
        }

        if self.is_last_step() {
            return Ok(Advance::Completed);
        }

        self.current_step = self.next_step();
        self.direction = Direction::Forward;
        Ok(Advance::Moved {
            step: self.current_step,
        })
    }

    /// Step back, undoing the branch override when it applies.
    pub fn retreat(&mut self) -> Result<usize, FlowError> {
        if self.current_step == 0 {
            return Err(FlowError::AtStart);
        }
        self.current_step = self.prev_step();
        self.direction = Direction::Backward;
        Ok(self.current_step)
    }

    fn next_step(&self) -> usize {
        let question = self.current_question();
        if question.id == BRANCH_ORIGIN && self.answers.single(BRANCH_ORIGIN) == Some(BRANCH_TRIGGER)
        {
            if let Some(target) = question_index(BRANCH_TARGET) {
                return target;
            }
        }
        self.current_step + 1
    }

    fn prev_step(&self) -> usize {
        let target = question_index(BRANCH_TARGET);
        if Some(self.current_step) == target
            && self.answers.single(BRANCH_ORIGIN) == Some(BRANCH_TRIGGER)
        {
            if let Some(origin) = question_index(BRANCH_ORIGIN) {
                return origin;
            }
        }
        self.current_step - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::questions;

    fn flow_at(question_id: &str) -> FlowController {
        let step = question_index(question_id).unwrap();
        FlowController::resume(SurveyAnswers::new(), step)
    }

    #[test]
    fn advance_without_answer_is_rejected() {
        let mut flow = FlowController::new();
        let before = flow.current_step();
        let err = flow.advance().unwrap_err();
        assert!(matches!(err, FlowError::InsufficientAnswer(_)));
        assert_eq!(flow.current_step(), before, "position must not change");
    }

    #[test]
    fn advance_moves_forward_on_answer() {
        let mut flow = FlowController::new();
        flow.select("employed_full_time");
        assert_eq!(flow.advance().unwrap(), Advance::Moved { step: 1 });
        assert_eq!(flow.direction(), Direction::Forward);
    }

    #[test]
    fn other_option_requires_free_text() {
        let mut flow = FlowController::new();
        flow.select("other");
        assert!(!flow.has_sufficient_answer());
        flow.enter_other("  ");
        assert!(!flow.has_sufficient_answer());
        flow.enter_other("career sabbatical");
        assert!(flow.has_sufficient_answer());
        assert!(flow.advance().is_ok());
    }

    #[test]
    fn branch_override_jumps_to_income_goal() {
        let mut flow = flow_at("considering_business");
        flow.select("not_pursuing");
        let target = question_index("income_goal").unwrap();
        assert_eq!(flow.advance().unwrap(), Advance::Moved { step: target });
        assert_eq!(flow.current_question().id, "income_goal");
    }

    #[test]
    fn retreat_from_branch_target_returns_to_origin() {
        let mut flow = flow_at("considering_business");
        flow.select("not_pursuing");
        flow.advance().unwrap();

        // Back from income_goal must land on considering_business, not on
        // the question immediately preceding income_goal in catalog order.
        let origin = question_index("considering_business").unwrap();
        assert_eq!(flow.retreat().unwrap(), origin);
        assert_eq!(flow.current_question().id, "considering_business");
        assert_eq!(flow.direction(), Direction::Backward);
    }

    #[test]
    fn retreat_from_income_goal_without_branch_is_simple_decrement() {
        let mut flow = flow_at("income_goal");
        // considering_business was answered differently — no branch undo.
        flow.answers.set_single("considering_business", "actively_exploring");
        let step = flow.current_step();
        assert_eq!(flow.retreat().unwrap(), step - 1);
    }

    #[test]
    fn branch_skip_preserves_skipped_answers() {
        let mut flow = flow_at("income_urgency");
        flow.select("asap");
        flow.advance().unwrap();

        // Rewind and take the branch; the stale urgency answer survives.
        let mut branched = FlowController::resume(
            flow.answers().clone(),
            question_index("considering_business").unwrap(),
        );
        branched.select("not_pursuing");
        branched.advance().unwrap();
        assert_eq!(branched.answers().single("income_urgency"), Some("asap"));
    }

    #[test]
    fn retreat_at_start_is_rejected() {
        let mut flow = FlowController::new();
        assert_eq!(flow.retreat().unwrap_err(), FlowError::AtStart);
    }

    #[test]
    fn multi_question_needs_nonempty_selection() {
        let mut flow = flow_at("support_types");
        assert!(!flow.has_sufficient_answer());
        flow.select("funding_access");
        assert!(flow.has_sufficient_answer());
        // Toggling it back off makes the answer insufficient again.
        flow.select("funding_access");
        assert!(!flow.has_sufficient_answer());
    }

    #[test]
    fn email_conditional_gates_on_valid_email() {
        let mut flow = flow_at("early_access");
        flow.select("yes_apply");
        assert!(!flow.has_sufficient_answer());

        flow.enter_email("not-an-email");
        // Present but malformed: sufficient to enable the button, rejected
        // with a validation error on advance.
        assert!(flow.has_sufficient_answer());
        let err = flow.advance().unwrap_err();
        assert!(matches!(err, FlowError::InvalidEmail { .. }));

        flow.enter_email("respondent@example.com");
        assert!(flow.advance().is_ok());
    }

    #[test]
    fn email_not_required_for_opt_out_options() {
        let mut flow = flow_at("early_access");
        flow.select("not_now");
        assert!(flow.has_sufficient_answer());
        assert!(flow.advance().is_ok());
    }

    #[test]
    fn last_question_advance_completes() {
        let last = questions().len() - 1;
        let mut flow = FlowController::resume(SurveyAnswers::new(), last);
        flow.select(questions()[last].options[0].value);
        assert_eq!(flow.advance().unwrap(), Advance::Completed);
        // Position stays on the last question; completion is an event, not
        // a new index.
        assert_eq!(flow.current_step(), last);
    }

    #[test]
    fn resume_clamps_out_of_range_step() {
        let flow = FlowController::resume(SurveyAnswers::new(), 9999);
        assert_eq!(flow.current_step(), questions().len() - 1);
    }
}
