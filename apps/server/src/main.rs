use billpay_server::{
    api::app_router, build_state, config::Config, init_tracing, load_env_file,
    scheduler::start_probe_scheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file(None);
    init_tracing();
    let config = Config::from_env();
    let state = build_state(&config).await?;

    if let Some(every) = config.probe_interval {
        start_probe_scheduler(state.clone(), every);
    }

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
