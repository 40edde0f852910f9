use std::sync::Arc;

mod config;
mod contact;
mod handler;
mod http;
mod logger;
mod mail;
mod server;

const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in production
    let _ = dotenvy::dotenv();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;

    // Create Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    // The SMTP pool spawns onto the runtime, so the state is built in here
    let state = Arc::new(config::AppState::from_config(cfg)?);

    logger::log_server_start(&addr, &state.config);
    server::start_server_loop(listener, state, server::shutdown_signal()).await;
    Ok(())
}
