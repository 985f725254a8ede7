use std::sync::Arc;
use tokio::sync::Notify;

use reciteserve::config::{AppState, Config};
use reciteserve::logger;
use reciteserve::server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    // 创建 Tokio 运行时，根据 workers 配置设置线程数
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let root = match cfg.resolve_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("[ERROR] Servable root is not accessible: {e}");
            return Err(e.into());
        }
    };

    let addr = cfg.get_socket_addr()?;

    // A bind failure is fatal: the server cannot run without its port
    let listener = match server::create_listener(addr) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[ERROR] Failed to bind {addr}: {e}");
            eprintln!("        Is port {} already in use?", addr.port());
            return Err(e.into());
        }
    };

    let state = Arc::new(AppState::new(cfg, root));
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&addr, &state);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        server::accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    Ok(())
}
