// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Endpoint HTTP Server
//!
//! A minimal HTTP server exposing `/metrics` (Prometheus text format) and
//! `/health`. No `axum`, no router — a raw `TcpListener` loop, matching the
//! weight spec §4.9 asks for: this sits outside the pipeline's hard core,
//! so a bind failure only logs a warning rather than aborting the stage.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::infrastructure::metrics::service::StageMetrics;

pub struct MetricsEndpoint {
    metrics: Arc<StageMetrics>,
}

impl MetricsEndpoint {
    pub fn new(metrics: Arc<StageMetrics>) -> Self {
        Self { metrics }
    }

    /// Bind to `127.0.0.1:{port}` and serve requests until the process
    /// exits. A bind failure is logged and swallowed — metrics are
    /// ambient, not part of the pipeline's correctness surface.
    pub async fn serve(&self, port: u16) {
        let addr = format!("127.0.0.1:{port}");
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!("metrics endpoint failed to bind {addr}: {e}");
                return;
            }
        };

        info!("Prometheus metrics endpoint listening on http://{addr}/metrics");

        loop {
            match listener.accept().await {
                Ok((mut stream, _)) => {
                    let metrics = self.metrics.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_request(&mut stream, metrics).await {
                            error!("error handling metrics request: {e}");
                        }
                    });
                }
                Err(e) => error!("error accepting metrics connection: {e}"),
            }
        }
    }
}

async fn handle_request(
    stream: &mut tokio::net::TcpStream,
    metrics: Arc<StageMetrics>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = [0; 1024];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]);
    debug!("metrics request: {}", request.lines().next().unwrap_or(""));

    if request.starts_with("GET /metrics") {
        match metrics.render() {
            Ok(body) => {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
            Err(e) => {
                let body = format!("error generating metrics: {e}");
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
        }
    } else if request.starts_with("GET /health") {
        stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK").await?;
    } else {
        stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\n\r\nNot Found").await?;
    }

    stream.flush().await?;
    Ok(())
}
