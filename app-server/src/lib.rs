//! # Mentor app server
//!
//! Serves the embedding operations over line-delimited JSON. Each line read
//! from the input is one request; each request runs in its own task and its
//! response is written as one line once it completes, so responses may be
//! out of order and are matched by `id`.

pub mod admission;
pub mod config;
pub mod message_processor;
pub mod protocol;

use std::future::Future;
use std::sync::Arc;

use mentor_retrieval::EmbeddingService;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub use config::ServerConfig;
pub use message_processor::{MessageProcessor, ProcessError};
pub use protocol::{ErrorBody, Request, Response};

/// Capacity of the outgoing response queue.
const CHANNEL_CAPACITY: usize = 128;

/// Serve requests from stdin until EOF or Ctrl-C, writing responses to stdout.
pub async fn run_main(service: Arc<EmbeddingService>) -> std::io::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, draining in-flight requests"),
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    serve_until(service, reader, tokio::io::stdout(), interrupted).await?;
    Ok(())
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(
    service: Arc<EmbeddingService>,
    reader: R,
    writer: W,
) -> std::io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    serve_until(service, reader, writer, std::future::pending::<()>()).await
}

/// Serve requests from `reader` until EOF or until `shutdown` completes.
///
/// Lines already buffered in `reader` are read before `shutdown` is honored.
/// In-flight requests and pending usage log writes are awaited before this
/// returns. The writer is handed back once every response has been written.
pub async fn serve_until<R, W, F>(
    service: Arc<EmbeddingService>,
    reader: R,
    writer: W,
    shutdown: F,
) -> std::io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    F: Future,
{
    let processor = Arc::new(MessageProcessor::new(Arc::clone(&service)));
    let (outgoing_tx, outgoing_rx) = mpsc::channel::<Response>(CHANNEL_CAPACITY);
    let writer_task = tokio::spawn(write_responses(outgoing_rx, writer));

    let mut lines = reader.lines();
    let mut requests = JoinSet::new();

    tokio::pin!(shutdown);

    info!("Listening for requests");
    loop {
        let next = tokio::select! {
            biased;
            next = lines.next_line() => next,
            _ = &mut shutdown => {
                debug!("Shutdown requested");
                break;
            }
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Input closed");
                break;
            }
            Err(e) => {
                error!("Failed to read request: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let processor = Arc::clone(&processor);
                let outgoing = outgoing_tx.clone();
                requests.spawn(async move {
                    let response = processor.process(request).await;
                    if outgoing.send(response).await.is_err() {
                        warn!("Response dropped: writer closed");
                    }
                });
            }
            Err(e) => {
                warn!("Failed to parse request: {e}");
                let response = Response::failure(
                    Value::Null,
                    ErrorBody::new("invalid-argument", format!("malformed request: {e}")),
                );
                if outgoing_tx.send(response).await.is_err() {
                    break;
                }
            }
        }

        while let Some(result) = requests.try_join_next() {
            if let Err(e) = result {
                error!("Request task failed: {e}");
            }
        }
    }

    while let Some(result) = requests.join_next().await {
        if let Err(e) = result {
            error!("Request task failed: {e}");
        }
    }
    service.flush().await;

    let failures = service.usage_log_failures();
    if failures > 0 {
        warn!("{failures} usage log writes failed");
    }

    drop(outgoing_tx);
    let writer = writer_task.await.map_err(std::io::Error::other)??;
    info!("Shutdown complete");
    Ok(writer)
}

async fn write_responses<W>(mut rx: mpsc::Receiver<Response>, mut writer: W) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = match serde_json::to_vec(&response) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode response: {e}");
                continue;
            }
        };
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(writer)
}
