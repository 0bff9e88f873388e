//! Repairline server binary.
//!
//! Wires configuration, adapters, and the orchestrator, spawns the TTL
//! sweepers, and serves the chat API.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use secrecy::ExposeSecret;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repairline::adapters::ai::{LlmClient, LlmConfig, MockAiService};
use repairline::adapters::http::chat::{chat_router, ChatAppState};
use repairline::adapters::memory::{
    InMemoryCatalog, InMemoryNotifier, InMemoryRecordStore, InMemorySessionStore,
    InMemoryStateStore,
};
use repairline::config::AppConfig;
use repairline::domain::chat::{ChatOrchestrator, Collaborators, OrchestratorSettings};
use repairline::ports::{
    FieldExtraction, FlowStateStore, GenerativeResponder, Part, SessionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (extraction, responder): (Arc<dyn FieldExtraction>, Arc<dyn GenerativeResponder>) =
        if let Some(key) = &config.ai.api_key {
            let llm = Arc::new(LlmClient::new(
                LlmConfig::new(key.expose_secret().clone())
                    .with_base_url(config.ai.base_url.clone())
                    .with_model(config.ai.model.clone())
                    .with_timeout(config.ai.timeout()),
            )?);
            (llm.clone(), llm)
        } else {
            tracing::warn!("no AI api key configured, using the mock AI service");
            let mock = Arc::new(MockAiService::new());
            (mock.clone(), mock)
        };

    let sessions = Arc::new(InMemorySessionStore::new());
    let states = Arc::new(InMemoryStateStore::new());
    let orchestrator = ChatOrchestrator::new(
        Collaborators {
            sessions: sessions.clone(),
            states: states.clone(),
            extraction,
            responder,
            catalog: Arc::new(seed_catalog()),
            records: Arc::new(InMemoryRecordStore::new()),
            notifier: Arc::new(InMemoryNotifier::new()),
        },
        config.business.contact(),
        config.business.pickup_address.clone(),
        OrchestratorSettings {
            failed_call_threshold: config.chat.failed_call_threshold,
            flow_max_age_secs: config.chat.flow_max_age_secs,
            ai_timeout: config.ai.timeout(),
            history_turns: config.chat.history_turns,
        },
    );

    spawn_sweepers(
        sessions,
        states,
        config.chat.sweep_interval_secs,
        config.chat.session_ttl_secs,
        config.chat.flow_max_age_secs,
    );

    let cors = match config.server.cors_origins_list().as_slice() {
        [] => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
        origins => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any)
        }
    };

    let app = chat_router()
        .with_state(ChatAppState {
            orchestrator: Arc::new(orchestrator),
        })
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "repairline listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Background TTL sweeps for sessions and flow states.
fn spawn_sweepers(
    sessions: Arc<InMemorySessionStore>,
    states: Arc<InMemoryStateStore>,
    interval_secs: u64,
    session_ttl_secs: u64,
    flow_max_age_secs: u64,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sessions.sweep_expired(session_ttl_secs).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(swept = n, "expired sessions removed"),
                Err(err) => tracing::warn!(error = %err, "session sweep failed"),
            }
            match states.sweep_expired(flow_max_age_secs).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(swept = n, "expired flow states removed"),
                Err(err) => tracing::warn!(error = %err, "flow state sweep failed"),
            }
        }
    });
}

/// Development parts catalog. A production deployment would back the
/// catalog port with the shop's inventory system.
fn seed_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_parts(vec![
        Part {
            id: "part-ac-remote".to_string(),
            name: "AC Remote Control".to_string(),
            price: 450,
            bulk_price: Some(400),
            stock_quantity: 40,
        },
        Part {
            id: "part-fridge-thermostat".to_string(),
            name: "Fridge Thermostat".to_string(),
            price: 650,
            bulk_price: Some(580),
            stock_quantity: 25,
        },
        Part {
            id: "part-wm-motor".to_string(),
            name: "Washing Machine Motor".to_string(),
            price: 2800,
            bulk_price: None,
            stock_quantity: 8,
        },
        Part {
            id: "part-ac-capacitor".to_string(),
            name: "AC Compressor Capacitor".to_string(),
            price: 350,
            bulk_price: Some(300),
            stock_quantity: 60,
        },
        Part {
            id: "part-purifier-filter".to_string(),
            name: "Water Purifier Filter".to_string(),
            price: 1200,
            bulk_price: Some(1050),
            stock_quantity: 30,
        },
    ])
}
