use anyhow::Context;
use chatpay_gateway::messaging::LineMessagingClient;
use chatpay_gateway::payments::LinePayClient;
use chatpay_gateway::{router, AppConfig, AppState, Orchestrator};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = Arc::new(AppConfig::from_env()?);

    // One client for both gateways; the timeout bounds every provider call
    // so a stalled provider cannot exhaust the request-handling pool.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.gateway_timeout_secs))
        .build()
        .context("failed to build http client")?;

    let payments = Arc::new(LinePayClient::new(http.clone(), &config));
    let messaging = Arc::new(LineMessagingClient::new(http, &config));
    let orchestrator = Arc::new(Orchestrator::new(payments, messaging));

    let state = AppState {
        config: config.clone(),
        orchestrator,
    };
    let app = router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::new(host.parse()?, port);
    println!("starting chatpay-gateway on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
