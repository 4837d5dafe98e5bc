use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Plain TCP echo server to point `echo-bench` at.
#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7777".to_string());

    let listener = TcpListener::bind(&addr).await?;
    info!("Echo server listening on {}", listener.local_addr()?);

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                debug!("New connection from {}", peer);
                tokio::spawn(async move {
                    if let Err(e) = handle_client(socket).await {
                        error!("Error handling client {}: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(mut socket: TcpStream) -> Result<()> {
    socket.set_nodelay(true)?;
    let mut buf = vec![0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        socket.write_all(&buf[..n]).await?;
    }

    Ok(())
}
