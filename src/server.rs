use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

use crate::config::Config;
use crate::proxy::proxy_connection;
use crate::stats::Stats;

/// Run the proxy server, accepting plain TCP connections.
pub async fn run_server(config: Config, stats: Arc<Stats>) -> io::Result<()> {
    let listener = TcpListener::bind(&config.listen).await?;

    info!("Listening on {}", config.listen);
    info!("Forwarding to {}", config.upstream);

    let reader_config = config.reader_config();
    loop {
        let (tcp_stream, peer_addr) = listener.accept().await?;
        let upstream_addr = config.upstream.clone();
        let stats = stats.clone();

        tokio::spawn(async move {
            info!("New connection from {}", peer_addr);

            // Connect to upstream
            let upstream = match TcpStream::connect(&upstream_addr).await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to connect to upstream {}: {}", upstream_addr, e);
                    return;
                }
            };

            // Proxy the connection
            proxy_connection(tcp_stream, upstream, reader_config, stats).await;
            info!("Connection from {} closed", peer_addr);
        });
    }
}
