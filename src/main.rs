use std::sync::Arc;

use apidocs::config::{AppState, Config};
use apidocs::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    // Worker thread count follows server.workers, otherwise one per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let listener = match server::create_listener(addr) {
        Ok(l) => l,
        Err(e) => {
            logger::log_bind_failed(&addr, &e, &cfg.paths.env_file);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(&cfg)?);
    logger::log_server_start(&addr, &cfg);

    server::serve(listener, state).await;
    Ok(())
}
