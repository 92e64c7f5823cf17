use anyhow::Result;
use mongoose::analysis::Detector;
use mongoose::api::{self, app_state::AppState};
use mongoose::config::AppConfig;
use mongoose::config::loader::ConfigLoader;
use mongoose::engagement::EngagementEngine;
use mongoose::llm::create_generator;
use mongoose::models::persona::Persona;
use mongoose::observability::{AppMetrics, ObservabilityState, create_observability_router};
use mongoose::services::registry::SessionRegistry;
use mongoose::services::turn::create_turn_service;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::load()?;
    ConfigLoader::validate(&config)?;

    let _log_guard = init_tracing(&config);

    info!("Starting Mongoose...");
    info!("Configuration loaded successfully");

    let generator = create_generator(&config.generation)?;
    info!(
        "Generation backend initialized: {}",
        config.generation.backend
    );

    let metrics = Arc::new(AppMetrics::default());
    let registry = Arc::new(SessionRegistry::new());
    let persona = Arc::new(Persona::default());
    info!("Session registry and persona initialized");

    let detector = Detector::new(
        generator.clone(),
        config.detection.clone(),
        Duration::from_secs(config.generation.timeout),
    );
    info!("Detector initialized");

    let engagement = EngagementEngine::new(
        generator,
        persona,
        &config.engagement,
        config.pacing.clone(),
        config.typo.clone(),
        Duration::from_secs(config.generation.timeout),
    );
    info!("Engagement engine initialized");

    let turn_service = create_turn_service(registry.clone(), detector, engagement, metrics.clone());
    info!("Turn service initialized");

    let app_state = AppState::new(turn_service, registry, config.clone(), metrics.clone());
    info!("Application state created");

    let observability_state = Arc::new(ObservabilityState::new("0.1.0".to_string(), metrics));
    let api_router = api::create_router(app_state);
    let router = create_observability_router(observability_state).merge(api_router);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}

/// 初始化日志：配置了目录时写滚动文件，否则输出到终端
fn init_tracing(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    match &config.logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mongoose.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if config.logging.structured {
                builder.json().init();
            } else {
                builder.init();
            }
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
