//! Archetype Survey — survey funnel core.
//!
//! A multi-step questionnaire that classifies respondents into one of six
//! archetypes, issues a promo code on completion, and enriches the result
//! with a personalized narrative and a certificate image.

pub mod analytics;
pub mod answers;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod enrich;
pub mod error;
pub mod flow;
pub mod http;
pub mod promo;
pub mod session;
pub mod store;
pub mod webhook;
