use std::sync::Arc;

use archetype_survey::analytics::StoreSink;
use archetype_survey::config::SurveyConfig;
use archetype_survey::enrich::{CloudinaryRenderer, EnrichmentPipeline, OpenAiNarrative};
use archetype_survey::http::{AppState, survey_routes};
use archetype_survey::promo::PromoIssuer;
use archetype_survey::store::{LibSqlStore, SessionStore};
use archetype_survey::webhook::CompletionWebhook;
use secrecy::SecretString;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = SurveyConfig::from_env()?;

    eprintln!("📋 Archetype Survey v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Database: {}", config.db_path);

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = Arc::new(
        LibSqlStore::new_local(std::path::Path::new(&config.db_path))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
                std::process::exit(1);
            }),
    );

    // ── Enrichment ───────────────────────────────────────────────────────
    let mut enrichment = EnrichmentPipeline::new(Arc::clone(&store));
    match config.openai_api_key.clone() {
        Some(key) => {
            enrichment = enrichment.with_narrative(Arc::new(OpenAiNarrative::new(
                key,
                config.openai_model.clone(),
            )));
            eprintln!("   Narratives: OpenAI ({})", config.openai_model);
        }
        None => eprintln!("   Narratives: fallback (OPENAI_API_KEY not set)"),
    }
    match &config.cloudinary_cloud_name {
        Some(cloud) => {
            enrichment = enrichment.with_certificate(Arc::new(CloudinaryRenderer::new(cloud)));
            eprintln!("   Certificates: Cloudinary ({cloud})");
        }
        None => eprintln!("   Certificates: disabled (CLOUDINARY_CLOUD_NAME not set)"),
    }

    // ── Webhook ──────────────────────────────────────────────────────────
    let webhook = config.webhook_url.as_ref().map(|url| {
        eprintln!("   Webhook: {url}");
        CompletionWebhook::new(
            url.clone(),
            config.webhook_secret.clone().map(SecretString::from),
        )
    });
    if webhook.is_none() {
        eprintln!("   Webhook: disabled");
    }

    // ── HTTP API ─────────────────────────────────────────────────────────
    let state = AppState {
        store: Arc::clone(&store),
        enrichment: Arc::new(enrichment),
        analytics: Arc::new(StoreSink::new(Arc::clone(&store))),
        promo: PromoIssuer::new(),
        webhook,
    };
    let app = survey_routes(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Survey API started");
    axum::serve(listener, app).await?;

    Ok(())
}
