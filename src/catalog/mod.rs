//! Static survey data — the question catalog and the archetype table.
//!
//! Both are immutable and loaded once; everything else in the crate
//! references them by id.

pub mod archetypes;
pub mod questions;

pub use archetypes::{Archetype, archetype_by_id, archetypes};
pub use questions::{
    Choice, Question, QuestionKind, question_by_id, question_index, questions,
};
