//! Session orchestration — restore, progress, completion, retake.
//!
//! The manager owns the flow controller and mediates between the local
//! cache (always available, synchronous) and the remote store (async,
//! may be unreachable). The remote record is the source of truth on
//! restore; the cache alone never proves completion. Persistence of
//! in-progress answers is fire-and-forget so navigation never blocks on
//! the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsBatcher, AnalyticsEvent};
use crate::answers::AnswerValue;
use crate::catalog::{Archetype, archetype_by_id};
use crate::classifier::{classify, personalized_cta};
use crate::enrich::{EnrichmentPipeline, fallback_summary};
use crate::error::{EnrichError, FlowError, Result};
use crate::flow::{Advance, FlowController};
use crate::promo::PromoIssuer;
use crate::session::cache::LocalCache;
use crate::session::model::Session;
use crate::session::state::SessionPhase;
use crate::store::SessionStore;

/// What the respondent sees immediately after completing the survey.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub archetype: &'static Archetype,
    /// Absent when completion happened offline.
    pub promo_code: Option<String>,
    pub cta: &'static str,
}

/// Offline token, recognizable by prefix so it is never sent to the store.
fn local_token() -> String {
    format!(
        "local_{}_{:08x}",
        Utc::now().timestamp_millis(),
        rand::thread_rng().r#gen::<u32>()
    )
}

fn is_local_token(id: &str) -> bool {
    id.starts_with("local_")
}

struct ManagerState {
    phase: SessionPhase,
    session_id: String,
    flow: FlowController,
    archetype: Option<&'static Archetype>,
    promo_code: Option<String>,
    is_retake: bool,
}

impl Default for ManagerState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            session_id: String::new(),
            flow: FlowController::new(),
            archetype: None,
            promo_code: None,
            is_retake: false,
        }
    }
}

impl ManagerState {
    /// Every phase change goes through the declared transition matrix.
    fn transition(&mut self, next: SessionPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase transition {} -> {next}",
            self.phase
        );
        self.phase = next;
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cache: Arc<dyn LocalCache>,
    enrichment: EnrichmentPipeline,
    analytics: Arc<AnalyticsBatcher>,
    promo: PromoIssuer,
    state: Mutex<ManagerState>,
    /// Bumped on retake; in-flight enrichment results from an older epoch
    /// are discarded instead of being shown for the new attempt.
    epoch: AtomicU64,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        cache: Arc<dyn LocalCache>,
        enrichment: EnrichmentPipeline,
        analytics: Arc<AnalyticsBatcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            cache,
            enrichment,
            analytics,
            promo: PromoIssuer::new(),
            state: Mutex::new(ManagerState::default()),
            epoch: AtomicU64::new(0),
        })
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Restore a cached session or start a fresh one.
    ///
    /// Idempotent: calling again after initialization returns the current
    /// phase without touching the store.
    pub async fn initialize(&self) -> Result<SessionPhase> {
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::Uninitialized {
            return Ok(state.phase);
        }
        state.transition(SessionPhase::Restoring);

        if let Some(cached) = self.cache.load() {
            if is_local_token(&cached.session_id) {
                // A previous run never reached the store. Try to upgrade the
                // offline session to a server one, carrying the progress over.
                match self.store.create_session(None).await {
                    Ok(remote) => {
                        let session_id = remote.session_id;
                        if let Err(e) = self
                            .store
                            .update_answers(&session_id, &cached.answers, cached.step)
                            .await
                        {
                            warn!(error = %e, "Failed to sync offline progress");
                        }
                        self.cache.store_token(&session_id);
                        info!(session_id = %session_id, "Offline session upgraded");
                        state.session_id = session_id;
                        state.flow = FlowController::resume(cached.answers, cached.step);
                        state.transition(SessionPhase::Active);
                    }
                    Err(e) => {
                        warn!(error = %e, "Store still unreachable, staying offline");
                        state.session_id = cached.session_id;
                        state.flow = FlowController::resume(cached.answers, cached.step);
                        state.transition(SessionPhase::Active);
                    }
                }
                return Ok(state.phase);
            }

            match self.store.get_session(&cached.session_id).await {
                Ok(remote) => {
                    debug!(session_id = %remote.session_id, completed = remote.is_completed,
                        "Session restored from store");
                    state.session_id = remote.session_id;
                    state.flow =
                        FlowController::resume(remote.answers, remote.current_step);
                    state.archetype =
                        remote.archetype_result.as_deref().and_then(archetype_by_id);
                    state.promo_code = remote.promo_code;
                    state.transition(if remote.is_completed {
                        SessionPhase::Completed
                    } else {
                        SessionPhase::Active
                    });
                    return Ok(state.phase);
                }
                Err(e) if e.is_not_found() => {
                    debug!(session_id = %cached.session_id,
                        "Cached token unknown to the store, starting fresh");
                }
                Err(e) => {
                    warn!(error = %e, "Store unreachable, restoring from cache");
                    state.session_id = cached.session_id;
                    state.flow = FlowController::resume(cached.answers, cached.step);
                    // The cache never proves completion.
                    state.transition(SessionPhase::Active);
                    return Ok(state.phase);
                }
            }
        }

        let session_id = match self.store.create_session(None).await {
            Ok(session) => session.session_id,
            Err(e) => {
                warn!(error = %e, "Failed to create server session, going offline");
                local_token()
            }
        };
        self.cache.clear();
        self.cache.store_token(&session_id);
        info!(session_id = %session_id, "Session started");
        state.session_id = session_id;
        state.flow = FlowController::new();
        state.transition(SessionPhase::Active);
        self.analytics
            .enqueue(AnalyticsEvent::survey_start(&state.session_id))
            .await;
        Ok(state.phase)
    }

    /// Abandon the current session and reset for a fresh run.
    ///
    /// Only meaningful from Active or Completed; otherwise a no-op.
    pub async fn retake(&self) -> SessionPhase {
        let mut state = self.state.lock().await;
        if !matches!(state.phase, SessionPhase::Active | SessionPhase::Completed) {
            return state.phase;
        }
        state.transition(SessionPhase::Retaking);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
        info!(session_id = %state.session_id, "Session retaken");
        self.analytics
            .enqueue_eager(AnalyticsEvent::survey_retake(
                &state.session_id,
                state.archetype.map(|a| a.id),
            ))
            .await;

        *state = ManagerState {
            is_retake: true,
            ..ManagerState::default()
        };
        state.phase
    }

    // ── Answer entry and navigation ─────────────────────────────────

    pub async fn select(&self, value: &str) {
        let mut state = self.state.lock().await;
        state.flow.select(value);
        self.cache
            .store_progress(state.flow.answers(), state.flow.current_step());
    }

    pub async fn enter_email(&self, email: &str) {
        let mut state = self.state.lock().await;
        state.flow.enter_email(email);
        self.cache
            .store_progress(state.flow.answers(), state.flow.current_step());
    }

    pub async fn enter_other(&self, text: &str) {
        let mut state = self.state.lock().await;
        state.flow.enter_other(text);
        self.cache
            .store_progress(state.flow.answers(), state.flow.current_step());
    }

    /// Move to the next question. `Advance::Completed` means the caller
    /// should follow up with `complete()`.
    pub async fn advance(&self) -> std::result::Result<Advance, FlowError> {
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::Active {
            return Err(FlowError::AlreadyComplete);
        }
        let answered_step = state.flow.current_step();
        let question_id = state.flow.current_question().id;
        let outcome = state.flow.advance()?;
        self.cache
            .store_progress(state.flow.answers(), state.flow.current_step());
        if let Advance::Moved { step } = outcome {
            self.persist_progress(&state, step);
        }
        let value = match state.flow.answers().get(question_id) {
            Some(AnswerValue::Single(s)) => Some(s.clone()),
            Some(AnswerValue::Multi(v)) => Some(v.join(",")),
            None => None,
        };
        self.analytics
            .enqueue(AnalyticsEvent::step_answered(
                &state.session_id,
                answered_step,
                question_id,
                value.as_deref(),
            ))
            .await;
        Ok(outcome)
    }

    pub async fn retreat(&self) -> std::result::Result<usize, FlowError> {
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::Active {
            return Err(FlowError::AlreadyComplete);
        }
        let step = state.flow.retreat()?;
        self.cache
            .store_progress(state.flow.answers(), state.flow.current_step());
        self.persist_progress(&state, step);
        self.analytics
            .enqueue(AnalyticsEvent::step_back(
                &state.session_id,
                step,
                state.flow.current_question().id,
            ))
            .await;
        Ok(step)
    }

    pub async fn record_user_info(&self, name: &str, email: Option<&str>) {
        let state = self.state.lock().await;
        self.cache.store_user_info(name, email);
        if is_local_token(&state.session_id) {
            return;
        }
        let store = Arc::clone(&self.store);
        let id = state.session_id.clone();
        let name = name.to_string();
        let email = email.map(str::to_string);
        tokio::spawn(async move {
            if let Err(e) = store.update_user_info(&id, &name, email.as_deref()).await {
                warn!(session_id = %id, error = %e, "Failed to persist user info");
            }
        });
    }

    fn persist_progress(&self, state: &ManagerState, step: usize) {
        if is_local_token(&state.session_id) {
            return;
        }
        let store = Arc::clone(&self.store);
        let id = state.session_id.clone();
        let answers = state.flow.answers().clone();
        tokio::spawn(async move {
            if let Err(e) = store.update_answers(&id, &answers, step).await {
                warn!(session_id = %id, error = %e, "Failed to persist progress");
            }
        });
    }

    // ── Completion and results ──────────────────────────────────────

    /// Classify the answers, issue the promo code, and mark the session
    /// completed. Store failures degrade to a local completion with no
    /// promo code rather than erroring.
    pub async fn complete(&self) -> Result<CompletionOutcome> {
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::Active {
            return Err(FlowError::AlreadyComplete.into());
        }
        if !(state.flow.is_last_step() && state.flow.has_sufficient_answer()) {
            return Err(
                FlowError::InsufficientAnswer(state.flow.current_question().id.to_string())
                    .into(),
            );
        }
        state.transition(SessionPhase::Completing);

        let archetype = classify(state.flow.answers());
        let cta = personalized_cta(archetype.id, state.flow.answers());
        let session_id = state.session_id.clone();

        let mut promo_code = None;
        if !is_local_token(&session_id) {
            // The completing advance never goes through persist_progress,
            // so the final question's answer is only in memory until now.
            if let Err(e) = self
                .store
                .update_answers(&session_id, state.flow.answers(), state.flow.current_step())
                .await
            {
                warn!(session_id = %session_id, error = %e, "Failed to persist final answers");
            }
            let promo = self.promo.issue(&session_id, state.is_retake);
            let archetype_data =
                serde_json::to_value(archetype).unwrap_or_else(|_| serde_json::json!({}));
            match self
                .store
                .complete_session(&session_id, archetype.id, &archetype_data, &promo.code)
                .await
            {
                Ok(_) => {
                    if let Err(e) = self.store.insert_promo(&promo, None).await {
                        warn!(session_id = %session_id, error = %e, "Failed to record promo code");
                    }
                    promo_code = Some(promo.code);
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e,
                        "Completing locally without a promo code");
                }
            }
        }

        info!(session_id = %session_id, archetype = archetype.id, "Survey completed");
        state.archetype = Some(archetype);
        state.promo_code = promo_code.clone();
        state.transition(SessionPhase::Completed);
        self.analytics
            .enqueue_eager(AnalyticsEvent::survey_completed(&session_id, archetype.id))
            .await;
        Ok(CompletionOutcome {
            archetype,
            promo_code,
            cta,
        })
    }

    /// Produce the enriched results for the completed session.
    ///
    /// Returns `Ok(None)` when a retake superseded the request while the
    /// enrichment round-trip was in flight.
    pub async fn generate_results(&self) -> Result<Option<Session>> {
        let (session_id, archetype) = {
            let state = self.state.lock().await;
            if state.phase != SessionPhase::Completed {
                return Err(EnrichError::NotCompleted.into());
            }
            (state.session_id.clone(), state.archetype)
        };
        let epoch = self.epoch.load(Ordering::SeqCst);

        let session = if is_local_token(&session_id) {
            self.offline_results(&session_id, archetype).await
        } else {
            self.enrichment.enrich(&session_id).await?
        };

        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(session_id = %session_id, "Discarding results from a superseded session");
            return Ok(None);
        }
        if let Some(archetype_id) = session.archetype_result.as_deref() {
            self.analytics
                .enqueue(AnalyticsEvent::results_viewed(&session_id, archetype_id))
                .await;
        }
        Ok(Some(session))
    }

    /// Offline sessions have no store record; assemble the results from
    /// local state with the fallback narrative and no certificate.
    async fn offline_results(
        &self,
        session_id: &str,
        archetype: Option<&'static Archetype>,
    ) -> Session {
        let state = self.state.lock().await;
        let archetype = archetype.unwrap_or_else(|| classify(state.flow.answers()));
        let name = self.cache.load().and_then(|c| c.name);

        let mut session = Session::new(session_id);
        session.record_progress(state.flow.answers().clone(), state.flow.current_step());
        session.name = name.clone();
        session.complete(archetype.id, state.promo_code.clone());
        session.apply_enrichment(Some(fallback_summary(archetype, name.as_deref())), None);
        session
    }

    // ── Snapshots ───────────────────────────────────────────────────

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn session_id(&self) -> String {
        self.state.lock().await.session_id.clone()
    }

    pub async fn current_step(&self) -> usize {
        self.state.lock().await.flow.current_step()
    }

    pub async fn archetype(&self) -> Option<&'static Archetype> {
        self.state.lock().await.archetype
    }

    pub async fn promo_code(&self) -> Option<String> {
        self.state.lock().await.promo_code.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::analytics::{AnalyticsSink, StoreSink};
    use crate::answers::SurveyAnswers;
    use crate::error::StoreError;
    use crate::promo::IssuedPromo;
    use crate::session::cache::MemoryCache;
    use crate::session::model::AiSummary;
    use crate::store::LibSqlStore;

    /// A store that is always unreachable.
    struct DownStore;

    #[async_trait]
    impl SessionStore for DownStore {
        async fn create_session(&self, _: Option<&str>) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn get_session(&self, _: &str) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn update_answers(
            &self,
            _: &str,
            _: &SurveyAnswers,
            _: usize,
        ) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn update_user_info(
            &self,
            _: &str,
            _: &str,
            _: Option<&str>,
        ) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn complete_session(
            &self,
            _: &str,
            _: &str,
            _: &serde_json::Value,
            _: &str,
        ) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn update_enrichment(
            &self,
            _: &str,
            _: Option<&AiSummary>,
            _: Option<&str>,
        ) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn insert_promo(
            &self,
            _: &IssuedPromo,
            _: Option<&str>,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Connection("down".into()))
        }
        async fn insert_events(
            &self,
            _: &[AnalyticsEvent],
        ) -> std::result::Result<usize, StoreError> {
            Err(StoreError::Connection("down".into()))
        }
    }

    fn manager_with(store: Arc<dyn SessionStore>, cache: Arc<dyn LocalCache>) -> Arc<SessionManager> {
        let enrichment = EnrichmentPipeline::new(Arc::clone(&store));
        let analytics = AnalyticsBatcher::new(Arc::new(StoreSink::new(Arc::clone(&store))));
        SessionManager::new(store, cache, enrichment, analytics)
    }

    async fn memory_manager() -> (Arc<SessionManager>, Arc<LibSqlStore>, Arc<MemoryCache>) {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let cache = Arc::new(MemoryCache::new());
        let manager = manager_with(store.clone(), cache.clone());
        (manager, store, cache)
    }

    /// Answer every question from the current position to the end.
    async fn answer_to_the_end(manager: &Arc<SessionManager>) {
        loop {
            let step = manager.current_step().await;
            let question = &crate::catalog::questions()[step];
            match question.kind {
                crate::catalog::QuestionKind::EmailConditional => {
                    manager.select("not_now").await;
                }
                _ => {
                    // Skip options that demand a free-text sidecar.
                    let value = question
                        .options
                        .iter()
                        .map(|o| o.value)
                        .find(|v| question.other_option != Some(*v))
                        .unwrap();
                    manager.select(value).await;
                }
            }
            match manager.advance().await.unwrap() {
                Advance::Moved { .. } => continue,
                Advance::Completed => break,
            }
        }
    }

    #[tokio::test]
    async fn initialize_creates_and_caches_a_token() {
        let (manager, _store, cache) = memory_manager().await;
        assert_eq!(manager.initialize().await.unwrap(), SessionPhase::Active);

        let token = manager.session_id().await;
        assert!(!token.is_empty());
        assert!(!is_local_token(&token));
        assert_eq!(cache.load().unwrap().session_id, token);

        // Idempotent.
        assert_eq!(manager.initialize().await.unwrap(), SessionPhase::Active);
    }

    #[tokio::test]
    async fn restore_prefers_remote_state_over_cache() {
        let (manager, store, cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        let token = manager.session_id().await;

        // Remote moved ahead of what the cache saw.
        let mut answers = SurveyAnswers::new();
        answers.set_single("employment_status", "employed_full_time");
        store.update_answers(&token, &answers, 5).await.unwrap();

        let manager2 = manager_with(store.clone(), cache.clone());
        manager2.initialize().await.unwrap();
        assert_eq!(manager2.current_step().await, 5);
    }

    #[tokio::test]
    async fn offline_initialize_synthesizes_local_token() {
        let cache = Arc::new(MemoryCache::new());
        let manager = manager_with(Arc::new(DownStore), cache.clone());
        assert_eq!(manager.initialize().await.unwrap(), SessionPhase::Active);

        let token = manager.session_id().await;
        assert!(is_local_token(&token));
        assert_eq!(cache.load().unwrap().session_id, token);
    }

    #[tokio::test]
    async fn unreachable_store_restores_from_cache_as_active() {
        let cache = Arc::new(MemoryCache::new());
        // A server token with cached progress, but the store is down.
        cache.store_token("b9a1c2d3-0000-0000-0000-000000000000");
        let mut answers = SurveyAnswers::new();
        answers.set_single("employment_status", "contracted");
        cache.store_progress(&answers, 4);

        let manager = manager_with(Arc::new(DownStore), cache);
        // The cache alone never proves completion.
        assert_eq!(manager.initialize().await.unwrap(), SessionPhase::Active);
        assert_eq!(manager.current_step().await, 4);
        assert_eq!(
            manager.session_id().await,
            "b9a1c2d3-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn offline_session_upgrades_when_store_returns() {
        let cache = Arc::new(MemoryCache::new());
        let offline = manager_with(Arc::new(DownStore), cache.clone());
        offline.initialize().await.unwrap();
        offline.select("employed_full_time").await;
        offline.advance().await.unwrap();

        // Next run, the store is reachable again.
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let manager = manager_with(store.clone(), cache.clone());
        manager.initialize().await.unwrap();

        let token = manager.session_id().await;
        assert!(!is_local_token(&token));
        assert_eq!(manager.current_step().await, 1);
        let remote = store.get_session(&token).await.unwrap();
        assert_eq!(
            remote.answers.single("employment_status"),
            Some("employed_full_time")
        );
    }

    #[tokio::test]
    async fn advance_persists_progress_to_the_store() {
        let (manager, store, _cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        manager.select("employed_full_time").await;
        manager.advance().await.unwrap();

        // Persistence is fire-and-forget; give the spawned task a beat.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let remote = store.get_session(&manager.session_id().await).await.unwrap();
        assert_eq!(remote.current_step, 1);
    }

    #[tokio::test]
    async fn complete_issues_a_promo_and_marks_the_store() {
        let (manager, store, _cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;

        let outcome = manager.complete().await.unwrap();
        assert!(outcome.promo_code.as_deref().unwrap().starts_with("NF-"));
        assert_eq!(manager.phase().await, SessionPhase::Completed);

        let remote = store.get_session(&manager.session_id().await).await.unwrap();
        assert!(remote.is_completed);
        assert_eq!(remote.archetype_result.as_deref(), Some(outcome.archetype.id));
    }

    #[tokio::test]
    async fn offline_completion_has_no_promo_code() {
        let cache = Arc::new(MemoryCache::new());
        let manager = manager_with(Arc::new(DownStore), cache);
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;

        let outcome = manager.complete().await.unwrap();
        assert!(outcome.promo_code.is_none());
        assert_eq!(manager.phase().await, SessionPhase::Completed);

        // Results still work, from local state.
        let results = manager.generate_results().await.unwrap().unwrap();
        assert!(results.ai_summary.is_some());
        assert!(results.certificate_url.is_none());
    }

    #[tokio::test]
    async fn complete_before_the_last_answer_is_rejected() {
        let (manager, _store, _cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        let err = manager.complete().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Flow(FlowError::InsufficientAnswer(_))
        ));
        // Completion never started, so the session stays Active.
        assert_eq!(manager.phase().await, SessionPhase::Active);
    }

    #[tokio::test]
    async fn retake_wipes_cache_and_resets_state() {
        let (manager, _store, cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;
        manager.complete().await.unwrap();

        assert_eq!(manager.retake().await, SessionPhase::Uninitialized);
        assert!(cache.load().is_none());
        assert_eq!(manager.current_step().await, 0);
        assert!(manager.promo_code().await.is_none());

        // A fresh initialize starts a brand-new session.
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;
        let outcome = manager.complete().await.unwrap();
        // Retake completions are worth the lower point value; the code
        // itself still looks the same.
        assert!(outcome.promo_code.is_some());
    }

    #[tokio::test]
    async fn results_before_completion_are_an_error() {
        let (manager, _store, _cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        let err = manager.generate_results().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Enrich(EnrichError::NotCompleted)
        ));
    }

    #[tokio::test]
    async fn completion_persists_the_final_answer() {
        let (manager, store, _cache) = memory_manager().await;
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;
        manager.complete().await.unwrap();

        // The completing advance has no fire-and-forget persist behind
        // it; complete() must write the last answer itself.
        let remote = store.get_session(&manager.session_id().await).await.unwrap();
        assert_eq!(remote.answers.single("prior_income"), Some("under_30k"));
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<AnalyticsEvent>>>,
    }

    #[async_trait]
    impl AnalyticsSink for RecordingSink {
        async fn ingest(&self, batch: Vec<AnalyticsEvent>) {
            self.batches.lock().await.push(batch);
        }
    }

    async fn recorded_manager() -> (Arc<SessionManager>, Arc<RecordingSink>) {
        let store: Arc<dyn SessionStore> = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let sink = Arc::new(RecordingSink::default());
        // A debounce far past the test horizon: only eager flushes land.
        let analytics =
            AnalyticsBatcher::with_flush_delay(sink.clone(), Duration::from_secs(60));
        let enrichment = EnrichmentPipeline::new(Arc::clone(&store));
        let manager =
            SessionManager::new(store, Arc::new(MemoryCache::new()), enrichment, analytics);
        (manager, sink)
    }

    #[tokio::test]
    async fn completion_flushes_the_funnel_events_eagerly() {
        let (manager, sink) = recorded_manager().await;
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;
        manager.complete().await.unwrap();

        let batches = sink.batches.lock().await;
        assert_eq!(batches.len(), 1);
        let events: Vec<&str> = batches[0].iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events.first(), Some(&"survey_start"));
        assert_eq!(events.last(), Some(&"survey_completed"));
        assert!(events.iter().filter(|e| **e == "step_answered").count() >= 10);
    }

    #[tokio::test]
    async fn retake_flushes_a_retake_event_eagerly() {
        let (manager, sink) = recorded_manager().await;
        manager.initialize().await.unwrap();
        answer_to_the_end(&manager).await;
        manager.complete().await.unwrap();
        manager.retake().await;

        let batches = sink.batches.lock().await;
        assert_eq!(batches.len(), 2);
        let retake = batches[1].last().unwrap();
        assert_eq!(retake.event, "survey_retake");
        assert!(retake.meta["previousArchetype"].is_string());
    }

    #[tokio::test]
    async fn lifecycle_phases_follow_the_declared_matrix() {
        // Phase changes debug-assert the transition matrix, so driving
        // the whole lifecycle fails loudly if any change skips an edge.
        let (manager, _store, _cache) = memory_manager().await;
        assert_eq!(manager.phase().await, SessionPhase::Uninitialized);
        manager.initialize().await.unwrap();
        assert_eq!(manager.phase().await, SessionPhase::Active);
        answer_to_the_end(&manager).await;
        manager.complete().await.unwrap();
        assert_eq!(manager.phase().await, SessionPhase::Completed);
        manager.retake().await;
        assert_eq!(manager.phase().await, SessionPhase::Uninitialized);
    }
}
