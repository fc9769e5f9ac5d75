//! services/api/src/bin/api.rs

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use notes_api_lib::{
    adapters::{FileHistoryLog, OpenAiNotesAdapter, PdfNoteExporter, TiktokenCounter},
    config::{Config, ConfigError},
    error::ApiError,
    web::{
        self,
        rest::ApiDoc,
        state::{session_registry_from, usage_guard_from, AppState},
    },
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let api_key = config
        .llm_api_key
        .as_ref()
        .ok_or_else(|| ConfigError::MissingVar("GROQ_API_KEY".to_string()))?;
    let notes_adapter = Arc::new(OpenAiNotesAdapter::connect(
        api_key,
        &config.llm_base_url,
        config.note_model.clone(),
    ));
    let token_counter = Arc::new(TiktokenCounter::cl100k()?);
    let history = Arc::new(FileHistoryLog::new(config.history_path.clone()));
    let exporter = Arc::new(PdfNoteExporter::new(config.export_path.clone()));
    info!(
        "Using model {} at {}; history at {}, exports at {}",
        config.note_model,
        config.llm_base_url,
        config.history_path.display(),
        config.export_path.display()
    );

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        guard: usage_guard_from(&config),
        notes_adapter,
        token_counter,
        history,
        exporter,
        sessions: Arc::new(session_registry_from(&config)),
    });
    info!(
        "Usage limits: {} requests per session, {}s cooldown, {}s idle expiry, daily rollover {}",
        config.daily_limit,
        config.cooldown_seconds,
        config.session_idle_ttl_seconds,
        if config.quota_daily_rollover { "on" } else { "off" }
    );

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let app = Router::new()
        .merge(web::router(app_state))
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
