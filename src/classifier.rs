//! Archetype classifier — an ordered rule table over survey answers.
//!
//! Rules are evaluated top-to-bottom and the first match wins. They are not
//! mutually exclusive by construction, so the order below is part of the
//! contract: a stronger signal (already operating a business) outranks
//! everything that follows it.

use crate::answers::SurveyAnswers;
use crate::catalog::archetypes::ids;
use crate::catalog::{Archetype, archetype_by_id};

/// One classification rule.
struct Rule {
    archetype: &'static str,
    matches: fn(&Signals) -> bool,
}

/// The answer fields the classifier reads, pulled out once.
struct Signals<'a> {
    employment: Option<&'a str>,
    interest: Option<&'a str>,
    urgency: Option<&'a str>,
    motivation: Option<&'a str>,
}

impl<'a> Signals<'a> {
    fn from_answers(answers: &'a SurveyAnswers) -> Self {
        Self {
            employment: answers.single("employment_status"),
            interest: answers.single("considering_business"),
            urgency: answers.single("income_urgency"),
            motivation: answers.single("motivation"),
        }
    }

    fn employment_is(&self, v: &str) -> bool {
        self.employment == Some(v)
    }

    fn interest_in(&self, values: &[&str]) -> bool {
        self.interest.is_some_and(|i| values.contains(&i))
    }

    fn urgency_in(&self, values: &[&str]) -> bool {
        self.urgency.is_some_and(|u| values.contains(&u))
    }

    fn motivation_in(&self, values: &[&str]) -> bool {
        self.motivation.is_some_and(|m| values.contains(&m))
    }
}

/// Priority-ordered rule table. First match wins.
static RULES: &[Rule] = &[
    // Already operating or self-employed — classified by that fact alone.
    Rule {
        archetype: ids::EMERGING_FOUNDER,
        matches: |s| s.employment_is("self_employed") || s.interest_in(&["operating_growing"]),
    },
    // Actively building + urgent timeline, and not recently displaced.
    Rule {
        archetype: ids::SURVIVAL_FREELANCER,
        matches: |s| {
            s.interest_in(&["actively_exploring", "building_intentionally"])
                && s.urgency_in(&["asap", "1_3_months"])
                && !s.employment_is("laid_off_year")
        },
    },
    // Intentional builder with a qualifying motivation and a mid-range timeline.
    Rule {
        archetype: ids::PIVOTING_PROFESSIONAL,
        matches: |s| {
            s.interest_in(&["building_intentionally", "actively_exploring"])
                && s.motivation_in(&[
                    "lifestyle_flexibility",
                    "purpose_impact",
                    "wealth_scaling",
                    "career_security",
                ])
                && s.urgency_in(&["3_6_months", "about_a_year"])
        },
    },
    // Recently displaced with urgent-to-mid income need.
    Rule {
        archetype: ids::DISPLACED_REBUILDER,
        matches: |s| {
            s.employment_is("laid_off_year")
                && s.urgency_in(&["asap", "1_3_months", "3_6_months"])
        },
    },
    // Interested but unclear, with some timeline pressure.
    Rule {
        archetype: ids::OVERWHELMED_STARTER,
        matches: |s| {
            // An unanswered timeline still counts as "not no-urgency" here.
            s.interest_in(&["interested_unclear", "actively_exploring"])
                && !s.urgency_in(&["exploring", "not_income_driven"])
        },
    },
    // Exploring only / not pursuing / no urgency.
    Rule {
        archetype: ids::CURIOUS_EXPLORER,
        matches: |s| {
            s.interest_in(&["exploring_only", "not_pursuing"])
                || s.urgency_in(&["exploring", "not_income_driven"])
        },
    },
    // Fallback: displacement still routes to the rebuilder bucket.
    Rule {
        archetype: ids::DISPLACED_REBUILDER,
        matches: |s| s.employment_is("laid_off_year"),
    },
];

/// Classify a respondent. Pure and total — always returns exactly one
/// archetype, with Curious Explorer as the ultimate fallback.
pub fn classify(answers: &SurveyAnswers) -> &'static Archetype {
    let signals = Signals::from_answers(answers);
    let id = RULES
        .iter()
        .find(|rule| (rule.matches)(&signals))
        .map(|rule| rule.archetype)
        .unwrap_or(ids::CURIOUS_EXPLORER);

    // Rule archetype ids come from the catalog constants above.
    archetype_by_id(id).unwrap_or_else(|| &crate::catalog::archetypes()[0])
}

/// A one-line call-to-action derived from (archetype, motivation, barrier).
///
/// Nested lookup with a per-archetype generic fallback, then an ultimate
/// generic fallback. Pure, always terminates.
pub fn personalized_cta(archetype_id: &str, answers: &SurveyAnswers) -> &'static str {
    let motivation = answers.single("motivation");
    let barrier = answers.single("biggest_barrier");

    match archetype_id {
        ids::CURIOUS_EXPLORER => {
            if barrier == Some("confidence_risk") {
                "Based on your interest in entrepreneurship and your focus on building clarity and confidence before taking big risks — early access may be a strong fit."
            } else if motivation == Some("purpose_impact") {
                "Based on your interest in meaningful work and your early-stage exploration of entrepreneurship — early access may be a strong fit."
            } else {
                "Based on your curiosity about entrepreneurship and your current focus on exploring options before committing to income goals — early access may be a strong fit."
            }
        }
        ids::OVERWHELMED_STARTER => {
            if barrier == Some("choosing_idea") {
                "Based on your desire to start something of your own and your focus on what to sell and how to price it — early access may be a strong fit."
            } else if barrier == Some("business_setup") {
                "Based on your interest in entrepreneurship and your need for clear structure and setup guidance — early access may be a strong fit."
            } else {
                "Based on your interest in starting a business and your focus on figuring out what to build and how to start — early access may be a strong fit."
            }
        }
        ids::DISPLACED_REBUILDER => {
            if motivation == Some("career_security") {
                "Based on your focus on creating career stability and your need for faster paths to income — early access may be a strong fit."
            } else if barrier == Some("financial_runway") {
                "Based on your urgency around income and your concern about financial runway — early access may be a strong fit."
            } else {
                "Based on your need to generate income in the near term and your focus on finding customers or monetizing your skills quickly — early access may be a strong fit."
            }
        }
        ids::PIVOTING_PROFESSIONAL => {
            if motivation == Some("lifestyle_flexibility") || motivation == Some("career_security") {
                "Based on your desire for career control and your focus on building something sustainable long term — early access may be a strong fit."
            } else if barrier == Some("capacity_support") {
                "Based on your serious commitment to entrepreneurship and your focus on building the right systems and strategy — early access may be a strong fit."
            } else {
                "Based on your commitment to building your own path and your focus on creating reliable income from your expertise — early access may be a strong fit."
            }
        }
        ids::SURVIVAL_FREELANCER => {
            if barrier == Some("finding_customers") {
                "Based on your current earning activity and your focus on getting a steady flow of customers — early access may be a strong fit."
            } else if barrier == Some("choosing_idea") {
                "Based on your current client work and your focus on improving pricing and income predictability — early access may be a strong fit."
            } else {
                "Based on the fact that you're already generating some income and your focus on making revenue more consistent and predictable — early access may be a strong fit."
            }
        }
        ids::EMERGING_FOUNDER => {
            if motivation == Some("wealth_scaling") {
                "Based on your focus on long-term wealth and your commitment to growing something scalable — early access may be a strong fit."
            } else if barrier == Some("capacity_support") {
                "Based on your active business and your focus on building leverage and reducing founder workload — early access may be a strong fit."
            } else {
                "Based on your existing business activity and your focus on scaling revenue and building stronger systems — early access may be a strong fit."
            }
        }
        _ => "Based on your responses, early access may be a strong fit.",
    }
}
