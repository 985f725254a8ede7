use crate::config::AppState;
use chrono::Local;
use hyper::Method;
use std::net::SocketAddr;

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    println!("======================================");
    println!("Recitation library server started");
    println!("Serving directory: {}", state.root.display());
    println!("Visit: http://localhost:{}/", state.config.server.port);
    println!("Listening on: http://{addr}");
    if let Some(workers) = state.config.server.workers {
        println!("Worker threads: {workers}");
    }
    println!("Press Ctrl+C to stop the server");
    println!("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    println!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[Error] Failed to serve connection: {err:?}");
}

/// One Common Log Format style line per handled request.
pub fn log_access(method: &Method, path: &str, status: u16, body_bytes: u64) {
    println!(
        "[{}] \"{method} {path}\" {status} {body_bytes}",
        Local::now().format("%d/%b/%Y:%H:%M:%S %z")
    );
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn log_shutdown() {
    println!("\nServer stopped");
}
