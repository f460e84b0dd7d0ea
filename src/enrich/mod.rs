//! Results enrichment — AI summary and certificate for completed sessions.
//!
//! Enrichment is additive and cacheable: outputs already stored on the
//! session are reused as-is, and a failed collaborator degrades to the
//! deterministic fallback (summary) or to no certificate at all. The only
//! hard error is asking for results before completion.

pub mod certificate;
pub mod narrative;

use std::sync::Arc;

use tracing::warn;

pub use certificate::{CertificateRenderer, CloudinaryRenderer};
pub use narrative::{NarrativeGenerator, OpenAiNarrative, fallback_summary};

use crate::catalog::{Archetype, archetype_by_id};
use crate::classifier::classify;
use crate::error::{EnrichError, Result};
use crate::session::model::Session;
use crate::store::SessionStore;

pub struct EnrichmentPipeline {
    store: Arc<dyn SessionStore>,
    narrative: Option<Arc<dyn NarrativeGenerator>>,
    certificate: Option<Arc<dyn CertificateRenderer>>,
}

impl EnrichmentPipeline {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            narrative: None,
            certificate: None,
        }
    }

    pub fn with_narrative(mut self, narrative: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrative = Some(narrative);
        self
    }

    pub fn with_certificate(mut self, certificate: Arc<dyn CertificateRenderer>) -> Self {
        self.certificate = Some(certificate);
        self
    }

    fn resolve_archetype(session: &Session) -> &'static Archetype {
        session
            .archetype_result
            .as_deref()
            .and_then(archetype_by_id)
            .unwrap_or_else(|| classify(&session.answers))
    }

    /// Enrich a completed session, reusing any cached outputs.
    ///
    /// Collaborator failures degrade rather than fail: a broken narrative
    /// provider yields the fallback summary, a broken renderer yields no
    /// certificate. Persisting the outputs is best-effort too.
    pub async fn enrich(&self, session_id: &str) -> Result<Session> {
        let mut session = self.store.get_session(session_id).await?;
        if !session.is_completed {
            return Err(EnrichError::NotCompleted.into());
        }

        let archetype = Self::resolve_archetype(&session);

        let summary = match &session.ai_summary {
            Some(cached) => cached.clone(),
            None => match &self.narrative {
                Some(generator) => match generator.generate(&session, archetype).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!(session_id, error = %e, "Narrative generation failed, using fallback");
                        fallback_summary(archetype, session.name.as_deref())
                    }
                },
                None => fallback_summary(archetype, session.name.as_deref()),
            },
        };

        let certificate_url = match &session.certificate_url {
            Some(cached) => Some(cached.clone()),
            None => self.certificate.as_ref().and_then(|renderer| {
                let name = session.name.clone().unwrap_or_default();
                let at = session.completed_at.unwrap_or_else(chrono::Utc::now);
                match renderer.render_url(&name, archetype, at) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(session_id, error = %e, "Certificate rendering failed");
                        None
                    }
                }
            }),
        };

        let newly_enriched =
            session.ai_summary.is_none() || session.certificate_url != certificate_url;
        if newly_enriched {
            match self
                .store
                .update_enrichment(session_id, Some(&summary), certificate_url.as_deref())
                .await
            {
                Ok(stored) => return Ok(stored),
                Err(e) => {
                    warn!(session_id, error = %e, "Failed to persist enrichment outputs");
                }
            }
        }

        session.apply_enrichment(Some(summary), certificate_url);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::session::model::AiSummary;
    use crate::store::LibSqlStore;

    struct CountingNarrative {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingNarrative {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl NarrativeGenerator for CountingNarrative {
        async fn generate(
            &self,
            _session: &Session,
            archetype: &Archetype,
        ) -> std::result::Result<AiSummary, EnrichError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EnrichError::RequestFailed("provider down".to_string()));
            }
            Ok(AiSummary {
                headline: format!("Generated for {}", archetype.id),
                summary: "s".to_string(),
                strengths: vec![],
                next_steps: vec![],
                encouragement: "e".to_string(),
            })
        }
    }

    async fn completed_session(store: &LibSqlStore) -> Session {
        let session = store.create_session(None).await.unwrap();
        store
            .update_user_info(&session.session_id, "Ada", None)
            .await
            .unwrap();
        store
            .complete_session(
                &session.session_id,
                "curious_explorer",
                &serde_json::json!({}),
                "NF-AAAAA-AAAAA",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn enrich_before_completion_is_an_error() {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let session = store.create_session(None).await.unwrap();
        let pipeline = EnrichmentPipeline::new(store.clone());
        let err = pipeline.enrich(&session.session_id).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Enrich(EnrichError::NotCompleted)
        ));
    }

    #[tokio::test]
    async fn second_enrichment_reuses_cached_outputs() {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let session = completed_session(&store).await;

        let narrative = CountingNarrative::new(false);
        let pipeline = EnrichmentPipeline::new(store.clone())
            .with_narrative(narrative.clone())
            .with_certificate(Arc::new(CloudinaryRenderer::new("demo")));

        let first = pipeline.enrich(&session.session_id).await.unwrap();
        assert!(first.is_enriched());
        assert_eq!(narrative.calls.load(Ordering::SeqCst), 1);

        let second = pipeline.enrich(&session.session_id).await.unwrap();
        assert_eq!(second.ai_summary, first.ai_summary);
        assert_eq!(second.certificate_url, first.certificate_url);
        // Cached: no extra provider call.
        assert_eq!(narrative.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback() {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let session = completed_session(&store).await;

        let narrative = CountingNarrative::new(true);
        let pipeline = EnrichmentPipeline::new(store.clone()).with_narrative(narrative);

        let enriched = pipeline.enrich(&session.session_id).await.unwrap();
        let summary = enriched.ai_summary.unwrap();
        assert!(summary.summary.starts_with("Ada, you"));
        // No renderer configured: no certificate, and that is not an error.
        assert!(enriched.certificate_url.is_none());
    }

    #[tokio::test]
    async fn missing_session_surfaces_not_found() {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let pipeline = EnrichmentPipeline::new(store);
        let err = pipeline.enrich("nope").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Store(e) if e.is_not_found()));
    }
}
