//! The TCP accept loop: one thread per connection (spec.md §4.9).

use std::net::TcpListener;
use std::sync::Arc;

use crate::net::connection::{Connection, Shared};

/// Binds `shared.config.port` and spawns one thread per accepted
/// connection, each running the full handshake → status|login → play state
/// machine. Never returns unless the bind itself fails.
pub fn run(shared: Arc<Shared>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", shared.config.port))?;
    log::info!("listening on port {}", shared.config.port);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("failed to accept connection: {err}");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let shared = Arc::clone(&shared);

        std::thread::spawn(move || {
            let connection = Connection::new(shared, stream);
            if let Err(err) = connection.run() {
                log::debug!("connection from {peer} ended: {err}");
            }
        });
    }

    Ok(())
}
