use std::sync::Arc;

use resp_reader::{CommandReader, Error, ReaderConfig, ReplyReader};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::stats::Stats;

/// Proxy one client connection to the upstream server, decoding every
/// command and reply and forwarding the exact bytes each was read from.
///
/// A client that sends a malformed command gets the protocol error back and
/// is disconnected. A malformed reply from upstream ends the connection.
pub async fn proxy_connection<C, U>(
    client: C,
    upstream: U,
    config: ReaderConfig,
    stats: Arc<Stats>,
) where
    C: AsyncRead + AsyncWrite + Unpin,
    U: AsyncRead + AsyncWrite + Unpin,
{
    let (client_read, mut client_write) = tokio::io::split(client);
    let (upstream_read, mut upstream_write) = tokio::io::split(upstream);
    let mut commands = CommandReader::with_config(client_read, config);
    let mut replies = ReplyReader::with_config(upstream_read, config);

    loop {
        tokio::select! {
            // Client -> Upstream
            result = commands.read_async() => {
                match result {
                    Ok(command) => {
                        match command.name() {
                            Some(name) => {
                                debug!("Command: {}", String::from_utf8_lossy(name));
                                stats.record_command(name);
                            }
                            None => debug!("Empty command"),
                        }

                        if let Err(e) = upstream_write.write_all(command.data()).await {
                            error!("Failed to write to upstream: {}", e);
                            break;
                        }
                    }
                    Err(Error::Eof) => {
                        debug!("Client disconnected");
                        break;
                    }
                    Err(e) => {
                        match e.error_value() {
                            Some(value) => {
                                warn!("Client protocol error: {}", value);
                                stats.record_protocol_error();
                                let _ = client_write.write_all(&value.resp()).await;
                            }
                            None => error!("Failed to read from client: {}", e),
                        }
                        break;
                    }
                }
            }

            // Upstream -> Client
            result = replies.read_async() => {
                match result {
                    Ok(reply) => {
                        stats.record_reply(reply.first() == Some(&b'-'));
                        if let Err(e) = client_write.write_all(&reply).await {
                            error!("Failed to write to client: {}", e);
                            break;
                        }
                    }
                    Err(Error::Eof) => {
                        debug!("Upstream disconnected");
                        break;
                    }
                    Err(e) => {
                        if matches!(e, Error::Parse(_)) {
                            stats.record_protocol_error();
                        }
                        error!("Failed to read from upstream: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // Flush any remaining data
    let _ = client_write.flush().await;
    let _ = upstream_write.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, duplex};

    #[tokio::test]
    async fn test_forwards_commands_and_replies() {
        let (client, mut client_peer) = duplex(1024);
        let (upstream, mut upstream_peer) = duplex(1024);
        let stats = Stats::new();
        let task = tokio::spawn(proxy_connection(
            client,
            upstream,
            ReaderConfig::default(),
            stats.clone(),
        ));

        client_peer.write_all(b"*1\r\n$4\r\nPI").await.unwrap();
        client_peer.write_all(b"NG\r\n").await.unwrap();
        let mut forwarded = [0u8; 14];
        upstream_peer.read_exact(&mut forwarded).await.unwrap();
        assert_eq!(&forwarded, b"*1\r\n$4\r\nPING\r\n");

        upstream_peer.write_all(b"+PONG\r\n").await.unwrap();
        let mut reply = [0u8; 7];
        client_peer.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"+PONG\r\n");

        drop(client_peer);
        task.await.unwrap();
        assert_eq!(stats.command_counts().get("PING"), Some(&1));
    }

    #[tokio::test]
    async fn test_protocol_error_is_sent_to_client() {
        let (client, mut client_peer) = duplex(1024);
        let (upstream, _upstream_peer) = duplex(1024);
        let task = tokio::spawn(proxy_connection(
            client,
            upstream,
            ReaderConfig::default(),
            Stats::new(),
        ));

        client_peer.write_all(b"SET 'some key\r\n").await.unwrap();
        let mut response = Vec::new();
        client_peer.read_to_end(&mut response).await.unwrap();
        assert_eq!(
            response,
            b"-ERR Protocol error: unbalanced quotes in request\r\n"
        );
        task.await.unwrap();
    }
}
