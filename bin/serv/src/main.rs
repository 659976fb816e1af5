use std::net::SocketAddr;

use axum::{Router, middleware, routing::get};
use n7_api::{config::ApiConfig, state::ApiState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional, real deployments set the variables directly
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    n7_api::tracing::init_tracing(&config.env);

    let metrics_handle = n7_api::metrics::init_metrics()?;

    let pool = n7_db::create_pool(&config.database_url, config.db_max_connections).await?;
    n7_db::ensure_db_and_migrate(&config.database_url, &pool).await?;
    tracing::info!("Database ready");

    let state = ApiState::new(&config, pool)?;

    let _job_handles = n7_api::jobs::start_background_jobs(state.pool.clone());

    let cors = n7_api::middleware::cors::create_cors_layer(config.parsed_allowed_origins());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_app = Router::new()
        .route("/metrics", get(n7_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = n7_api::router::router()
        .with_state(state)
        .merge(metrics_app)
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(n7_api::metrics::track_metrics))
        .layer(middleware::from_fn(
            n7_api::middleware::request_id::request_id_middleware,
        ));

    let app = n7_api::middleware::security_headers::apply_security_headers(app, config.env);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(environment = ?config.env, "Server listening on http://{addr}");

    // The rate limiter keys on the peer address when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
