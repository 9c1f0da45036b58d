use std::sync::Arc;

use anyhow::Context;

use orsa_api::auth::oauth::GoogleOAuth;
use orsa_api::config::Config;
use orsa_api::services::personality::{OpenAiAnalyzer, PersonalityAnalyzer};
use orsa_api::services::pillars::SexagenaryCalculator;
use orsa_api::{build_router, db, AppState, ROUTES};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orsa_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    // Unreachable store aborts startup.
    let store = db::connect(&config.database_url).await?;

    let analyzer: Option<Arc<dyn PersonalityAnalyzer>> = match &config.openai_api_key {
        Some(key) => Some(Arc::new(
            OpenAiAnalyzer::new(
                key.clone(),
                config.openai_api_base.clone(),
                config.openai_model.clone(),
                config.analyzer_timeout(),
            )
            .context("Failed to build OpenAI client")?,
        )),
        None => {
            tracing::warn!("OPENAI_API_KEY not set; /chat-history will answer 503");
            None
        }
    };

    let oauth = match (
        &config.google_client_id,
        &config.google_client_secret,
        &config.secret_key,
    ) {
        (Some(id), Some(secret), Some(_)) => Some(Arc::new(
            GoogleOAuth::new(id.clone(), secret.clone(), config.oauth_redirect_uri.clone())
                .context("Failed to build OAuth client")?,
        )),
        _ => {
            tracing::warn!("Google OAuth or SECRET_KEY not configured; /login will answer 503");
            None
        }
    };

    let state = AppState {
        store,
        config: config.clone(),
        analyzer,
        pillars: Arc::new(SexagenaryCalculator),
        oauth,
    };

    let app = build_router(state);

    for (methods, path) in ROUTES {
        tracing::info!(methods = %methods, path = %path, "Registered route");
    }

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
