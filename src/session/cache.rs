//! Local session cache — the always-available side of persistence.
//!
//! Writes are synchronous and must never fail upward: IO errors are
//! logged and swallowed, because the cache is the fallback source of
//! truth when the remote store is unreachable, not a durability
//! guarantee of its own.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::answers::SurveyAnswers;

/// What the cache remembers between page loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    pub session_id: String,
    pub answers: SurveyAnswers,
    pub step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Local cache seam. Completion state is deliberately absent: restoring
/// from cache alone never assumes a completed session.
pub trait LocalCache: Send + Sync {
    /// The cached session, if a token was ever stored.
    fn load(&self) -> Option<CachedSession>;

    /// Remember the session token (creates the cache entry).
    fn store_token(&self, session_id: &str);

    /// Remember answers and step.
    fn store_progress(&self, answers: &SurveyAnswers, step: usize);

    /// Remember the respondent's name/email.
    fn store_user_info(&self, name: &str, email: Option<&str>);

    /// Wipe everything. Must leave no trace of the previous session.
    fn clear(&self);
}

// ── File-backed cache ───────────────────────────────────────────────

/// JSON-file cache, one document per respondent profile directory.
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Option<CachedSession> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session cache");
                None
            }
        }
    }

    fn write(&self, cached: &CachedSession) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "Failed to create cache directory");
                return;
            }
        }
        match serde_json::to_string_pretty(cached) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %e, "Failed to write session cache");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session cache"),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut CachedSession)) {
        let mut cached = self.read().unwrap_or_default();
        apply(&mut cached);
        self.write(&cached);
    }
}

impl LocalCache for FileCache {
    fn load(&self) -> Option<CachedSession> {
        self.read().filter(|c| !c.session_id.is_empty())
    }

    fn store_token(&self, session_id: &str) {
        self.update(|c| c.session_id = session_id.to_string());
    }

    fn store_progress(&self, answers: &SurveyAnswers, step: usize) {
        self.update(|c| {
            c.answers = answers.clone();
            c.step = step;
        });
    }

    fn store_user_info(&self, name: &str, email: Option<&str>) {
        self.update(|c| {
            c.name = Some(name.to_string());
            if let Some(email) = email {
                c.email = Some(email.to_string());
            }
        });
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to clear session cache");
            }
        }
    }
}

// ── In-memory cache ─────────────────────────────────────────────────

/// In-memory cache for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<Option<CachedSession>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, apply: impl FnOnce(&mut CachedSession)) {
        let mut guard = self.inner.lock().expect("cache lock");
        let mut cached = guard.take().unwrap_or_default();
        apply(&mut cached);
        *guard = Some(cached);
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> Option<CachedSession> {
        self.inner
            .lock()
            .expect("cache lock")
            .clone()
            .filter(|c| !c.session_id.is_empty())
    }

    fn store_token(&self, session_id: &str) {
        self.update(|c| c.session_id = session_id.to_string());
    }

    fn store_progress(&self, answers: &SurveyAnswers, step: usize) {
        self.update(|c| {
            c.answers = answers.clone();
            c.step = step;
        });
    }

    fn store_user_info(&self, name: &str, email: Option<&str>) {
        self.update(|c| {
            c.name = Some(name.to_string());
            if let Some(email) = email {
                c.email = Some(email.to_string());
            }
        });
    }

    fn clear(&self) {
        *self.inner.lock().expect("cache lock") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("session.json"));

        assert!(cache.load().is_none());

        cache.store_token("s1");
        let mut answers = SurveyAnswers::new();
        answers.set_single("motivation", "purpose_impact");
        cache.store_progress(&answers, 4);
        cache.store_user_info("Ada", Some("ada@example.com"));

        let cached = cache.load().unwrap();
        assert_eq!(cached.session_id, "s1");
        assert_eq!(cached.step, 4);
        assert_eq!(cached.answers.single("motivation"), Some("purpose_impact"));
        assert_eq!(cached.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn file_cache_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("session.json"));
        cache.store_token("s1");
        cache.clear();
        assert!(cache.load().is_none());
        // Clearing twice is fine.
        cache.clear();
    }

    #[test]
    fn corrupt_file_is_discarded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let cache = FileCache::new(&path);
        assert!(cache.load().is_none());
        // A write after corruption starts fresh.
        cache.store_token("s2");
        assert_eq!(cache.load().unwrap().session_id, "s2");
    }

    #[test]
    fn progress_without_token_is_not_a_session() {
        let cache = MemoryCache::new();
        cache.store_progress(&SurveyAnswers::new(), 2);
        // No token stored — nothing to restore.
        assert!(cache.load().is_none());
    }
}
