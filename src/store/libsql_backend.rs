//! libSQL session store — async `SessionStore` implementation.
//!
//! Supports local file and in-memory databases; the schema is created
//! idempotently on open. Write-once columns (`archetype_result`,
//! `promo_code`, enrichment outputs) are guarded with `COALESCE` so a
//! racing second writer can never overwrite an earlier value.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analytics::AnalyticsEvent;
use crate::answers::SurveyAnswers;
use crate::error::StoreError;
use crate::promo::IssuedPromo;
use crate::session::model::{AiSummary, Session};
use crate::store::traits::SessionStore;

/// libSQL database backend.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS survey_sessions (
        session_id TEXT PRIMARY KEY,
        name TEXT,
        email TEXT,
        current_step INTEGER NOT NULL DEFAULT 0,
        answers TEXT NOT NULL DEFAULT '{}',
        archetype_result TEXT,
        archetype_data TEXT,
        promo_code TEXT,
        is_completed INTEGER NOT NULL DEFAULT 0,
        ai_summary TEXT,
        certificate_url TEXT,
        referrer_id TEXT,
        completed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS promo_codes (
        code TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        points_value INTEGER NOT NULL,
        is_retake INTEGER NOT NULL DEFAULT 0,
        referrer_id TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS survey_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event TEXT NOT NULL,
        session_id TEXT,
        step INTEGER,
        question_id TEXT,
        value TEXT,
        meta TEXT NOT NULL DEFAULT '{}',
        event_timestamp TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_survey_events_session
        ON survey_events(session_id);
"#;

const SESSION_COLUMNS: &str = "session_id, name, email, current_step, answers, \
     archetype_result, promo_code, is_completed, ai_summary, certificate_url, \
     referrer_id, completed_at";

impl LibSqlStore {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Session store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to create in-memory db: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA)
            .await
            .map_err(|e| StoreError::Query(format!("schema init: {e}")))?;
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Session, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM survey_sessions WHERE session_id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_session: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("get_session: {e}")))?
        {
            Some(row) => row_to_session(&row),
            None => Err(StoreError::session_not_found(id)),
        }
    }

    /// Run a session-scoped UPDATE; zero affected rows means not-found.
    async fn update_guarded(
        &self,
        id: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Session, StoreError> {
        let affected = self
            .conn
            .execute(sql, params)
            .await
            .map_err(|e| StoreError::Query(format!("update: {e}")))?;
        if affected == 0 {
            return Err(StoreError::session_not_found(id));
        }
        self.fetch(id).await
    }
}

/// Map a libsql row to a `Session`.
fn row_to_session(row: &libsql::Row) -> Result<Session, StoreError> {
    let answers_json: String = row
        .get(4)
        .map_err(|e| StoreError::Query(format!("answers column: {e}")))?;
    let answers: SurveyAnswers = serde_json::from_str(&answers_json)?;

    let ai_summary: Option<AiSummary> = row
        .get::<String>(8)
        .ok()
        .map(|raw| serde_json::from_str(&raw))
        .transpose()?;

    let completed_at = row
        .get::<String>(11)
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Session {
        session_id: row
            .get(0)
            .map_err(|e| StoreError::Query(format!("session_id column: {e}")))?,
        name: row.get(1).ok(),
        email: row.get(2).ok(),
        current_step: row.get::<i64>(3).unwrap_or(0).max(0) as usize,
        answers,
        archetype_result: row.get(5).ok(),
        promo_code: row.get(6).ok(),
        is_completed: row.get::<i64>(7).unwrap_or(0) != 0,
        ai_summary,
        certificate_url: row.get(9).ok(),
        referrer_id: row.get(10).ok(),
        completed_at,
    })
}

#[async_trait]
impl SessionStore for LibSqlStore {
    async fn create_session(&self, referrer_id: Option<&str>) -> Result<Session, StoreError> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO survey_sessions \
                 (session_id, answers, current_step, referrer_id, created_at, updated_at) \
                 VALUES (?1, '{}', 0, ?2, ?3, ?3)",
                params![session_id.clone(), referrer_id, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("create_session: {e}")))?;

        debug!(session_id = %session_id, "Session created");
        self.fetch(&session_id).await
    }

    async fn get_session(&self, id: &str) -> Result<Session, StoreError> {
        self.fetch(id).await
    }

    async fn update_answers(
        &self,
        id: &str,
        answers: &SurveyAnswers,
        step: usize,
    ) -> Result<Session, StoreError> {
        let answers_json = serde_json::to_string(answers)?;
        let now = Utc::now().to_rfc3339();
        self.update_guarded(
            id,
            "UPDATE survey_sessions \
             SET answers = ?1, current_step = ?2, updated_at = ?3 \
             WHERE session_id = ?4",
            params![answers_json, step as i64, now, id],
        )
        .await
    }

    async fn update_user_info(
        &self,
        id: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<Session, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.update_guarded(
            id,
            "UPDATE survey_sessions \
             SET name = ?1, email = COALESCE(?2, email), updated_at = ?3 \
             WHERE session_id = ?4",
            params![name, email, now, id],
        )
        .await
    }

    async fn complete_session(
        &self,
        id: &str,
        archetype_id: &str,
        archetype_data: &serde_json::Value,
        promo_code: &str,
    ) -> Result<Session, StoreError> {
        let now = Utc::now().to_rfc3339();
        // COALESCE keeps the first archetype/promo/completion timestamp.
        self.update_guarded(
            id,
            "UPDATE survey_sessions \
             SET archetype_result = COALESCE(archetype_result, ?1), \
                 archetype_data = COALESCE(archetype_data, ?2), \
                 promo_code = COALESCE(promo_code, ?3), \
                 is_completed = 1, \
                 completed_at = COALESCE(completed_at, ?4), \
                 updated_at = ?4 \
             WHERE session_id = ?5",
            params![archetype_id, archetype_data.to_string(), promo_code, now, id],
        )
        .await
    }

    async fn update_enrichment(
        &self,
        id: &str,
        summary: Option<&AiSummary>,
        certificate_url: Option<&str>,
    ) -> Result<Session, StoreError> {
        let summary_json = summary.map(serde_json::to_string).transpose()?;
        let now = Utc::now().to_rfc3339();
        self.update_guarded(
            id,
            "UPDATE survey_sessions \
             SET ai_summary = COALESCE(ai_summary, ?1), \
                 certificate_url = COALESCE(certificate_url, ?2), \
                 updated_at = ?3 \
             WHERE session_id = ?4",
            params![summary_json, certificate_url, now, id],
        )
        .await
    }

    async fn insert_promo(
        &self,
        promo: &IssuedPromo,
        referrer_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO promo_codes (code, session_id, points_value, is_retake, referrer_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    promo.code.clone(),
                    promo.session_id.clone(),
                    promo.points as i64,
                    promo.is_retake as i64,
                    referrer_id,
                    now
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert_promo: {e}")))?;
        Ok(())
    }

    async fn insert_events(&self, events: &[AnalyticsEvent]) -> Result<usize, StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        for event in events {
            self.conn
                .execute(
                    "INSERT INTO survey_events \
                     (event, session_id, step, question_id, value, meta, event_timestamp, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        event.event.clone(),
                        event.session_id.clone(),
                        event.step.map(|s| s as i64),
                        event.question_id.clone(),
                        event.value.clone(),
                        event.meta.to_string(),
                        event.timestamp.to_rfc3339(),
                        now.clone()
                    ],
                )
                .await
                .map_err(|e| StoreError::Query(format!("insert_events: {e}")))?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let created = store.create_session(Some("ref-1")).await.unwrap();
        assert!(!created.session_id.is_empty());
        assert!(!created.is_completed);
        assert_eq!(created.referrer_id.as_deref(), Some("ref-1"));

        let fetched = store.get_session(&created.session_id).await.unwrap();
        assert_eq!(fetched.session_id, created.session_id);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let err = store.get_session("nope").await.unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .update_answers("nope", &SurveyAnswers::new(), 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn answers_and_user_info_persist() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let session = store.create_session(None).await.unwrap();

        let mut answers = SurveyAnswers::new();
        answers.set_single("motivation", "wealth_scaling");
        let updated = store
            .update_answers(&session.session_id, &answers, 3)
            .await
            .unwrap();
        assert_eq!(updated.current_step, 3);
        assert_eq!(updated.answers.single("motivation"), Some("wealth_scaling"));

        let updated = store
            .update_user_info(&session.session_id, "Ada", Some("ada@example.com"))
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ada"));
        assert_eq!(updated.email.as_deref(), Some("ada@example.com"));

        // Name update without email keeps the stored email.
        let updated = store
            .update_user_info(&session.session_id, "Ada L.", None)
            .await
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn completion_is_write_once() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let session = store.create_session(None).await.unwrap();

        let data = serde_json::json!({"name": "The Curious Explorer"});
        let completed = store
            .complete_session(&session.session_id, "curious_explorer", &data, "NF-AAAAA-AAAAA")
            .await
            .unwrap();
        assert!(completed.is_completed);
        assert_eq!(completed.archetype_result.as_deref(), Some("curious_explorer"));

        // A second completion cannot rewrite the archetype or code.
        let again = store
            .complete_session(&session.session_id, "emerging_founder", &data, "NF-BBBBB-BBBBB")
            .await
            .unwrap();
        assert_eq!(again.archetype_result.as_deref(), Some("curious_explorer"));
        assert_eq!(again.promo_code.as_deref(), Some("NF-AAAAA-AAAAA"));
        assert_eq!(again.completed_at, completed.completed_at);
    }

    #[tokio::test]
    async fn enrichment_round_trip_is_set_once() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let session = store.create_session(None).await.unwrap();

        let summary = AiSummary {
            headline: "h".into(),
            summary: "s".into(),
            strengths: vec!["grit".into()],
            next_steps: vec!["test an offer".into()],
            encouragement: "e".into(),
        };
        let updated = store
            .update_enrichment(
                &session.session_id,
                Some(&summary),
                Some("https://cdn/cert.png"),
            )
            .await
            .unwrap();
        assert_eq!(updated.ai_summary.as_ref(), Some(&summary));

        let other = AiSummary {
            headline: "other".into(),
            ..summary.clone()
        };
        let again = store
            .update_enrichment(&session.session_id, Some(&other), Some("https://cdn/x.png"))
            .await
            .unwrap();
        assert_eq!(again.ai_summary.unwrap().headline, "h");
        assert_eq!(again.certificate_url.as_deref(), Some("https://cdn/cert.png"));
    }

    #[tokio::test]
    async fn events_and_promos_insert() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let session = store.create_session(None).await.unwrap();

        let events = vec![
            AnalyticsEvent::survey_start(&session.session_id),
            AnalyticsEvent::step_viewed(&session.session_id, 0, "employment_status"),
        ];
        assert_eq!(store.insert_events(&events).await.unwrap(), 2);

        let promo = crate::promo::PromoIssuer::new().issue(&session.session_id, false);
        store.insert_promo(&promo, None).await.unwrap();
    }
}
