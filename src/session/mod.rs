//! Session lifecycle — identity, local cache, and remote reconciliation.

pub mod cache;
pub mod manager;
pub mod model;
pub mod state;

pub use cache::{CachedSession, FileCache, LocalCache, MemoryCache};
pub use manager::{CompletionOutcome, SessionManager};
pub use model::{AiSummary, Session};
pub use state::SessionPhase;
