//! FAQ dialog server binary

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use faq_dialog_config::SlotConfigStore;
use faq_dialog_engine::{DialogController, HttpSlotPredictor, PredictorConfig, SlotPredictor};
use faq_dialog_server::{create_router, load_settings, metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings_path = std::env::args().nth(1);
    let settings = load_settings(settings_path.as_deref())?;

    metrics::init_metrics()?;

    let mut configs = SlotConfigStore::new();
    let loaded = configs.load_dir(&settings.dialog.config_dir)?;
    tracing::info!(loaded, dir = %settings.dialog.config_dir, "loaded slot configs");

    let mut controller = DialogController::new(Arc::new(configs));
    if let Some(endpoint) = &settings.dialog.predictor_endpoint {
        let timeout = Duration::from_millis(settings.dialog.predictor_timeout_ms);
        let predictor = HttpSlotPredictor::new(PredictorConfig {
            endpoint: endpoint.clone(),
            timeout,
        })?;
        controller = controller.with_predictor(
            Arc::new(predictor) as Arc<dyn SlotPredictor>,
            timeout,
        );
        tracing::info!(%endpoint, "slot predictor enabled");
    }
    let controller = Arc::new(controller);

    // Periodic sweep of idle conversations.
    {
        let controller = Arc::clone(&controller);
        let sweep = Duration::from_secs(settings.dialog.idle_sweep_secs);
        let max_age = Duration::from_secs(settings.dialog.idle_max_age_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                controller.states().cleanup_idle(max_age);
            }
        });
    }

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app = create_router(AppState::new(Arc::clone(&controller), settings));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "faq-dialog server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
