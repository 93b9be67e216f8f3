use anyhow::Context;
use log::{error, info, warn};
use std::sync::Arc;

use bookstore_assistant::api::{create_router, AppState};
use bookstore_assistant::index::{IndexSpec, PgVectorIndex};
use bookstore_assistant::orders::PgOrderStore;
use bookstore_assistant::transformers::providers::get_provider;
use bookstore_assistant::util::Config;
use bookstore_assistant::{AssistantService, FaqSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("starting bookstore assistant");

    let cfg = Config::from_env()?;
    let service_cfg = cfg.service_config();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await
        .context("failed to connect to database")?;

    let embedder = get_provider(
        &cfg.embedding_model.source,
        cfg.openai_api_key.clone(),
        cfg.embedding_svc_url.clone(),
        service_cfg.embedding_timeout,
    )?;
    let model_name = cfg.embedding_model.api_name();
    match embedder.model_dim(&model_name).await {
        Ok(dim) if dim as usize != cfg.embedding_dimension => warn!(
            "model {} reports dimension {}, but EMBEDDING_DIMENSION is {}",
            cfg.embedding_model, dim, cfg.embedding_dimension
        ),
        Ok(_) => {}
        Err(e) => warn!("could not look up dimension for {}: {}", cfg.embedding_model, e),
    }
    let index = PgVectorIndex::new(pool.clone(), &cfg.index_schema)?;
    let orders = PgOrderStore::new(pool, &cfg.orders_table)?;
    let index_spec = IndexSpec::new(&cfg.index_name, cfg.embedding_dimension)?;

    let service = Arc::new(AssistantService::new(
        Arc::from(embedder),
        Arc::new(index),
        Arc::new(orders),
        index_spec,
        service_cfg,
    ));

    if let Err(e) = service.initialize(&FaqSource::from_path(&cfg.faq_path)).await {
        error!("failed to initialize assistant from {}: {}", cfg.faq_path, e);
        return Err(e.into());
    }

    let app = create_router(Arc::new(AppState {
        service,
        frontend_url: cfg.frontend_url.clone(),
    }));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.server_port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {}", e);
            }
            info!("shutting down");
        })
        .await?;
    Ok(())
}
