//! `/metrics` and `/healthz` listener

use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use http_body_util::Full;
use anyhow::{Context, Result};
use hyper_util::rt::TokioIo;
use pool_engine::WatchMetrics;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Start the listener in the background if `addr` can be bound.
///
/// Failures are logged and the watcher carries on without metrics.
pub async fn spawn_listener(addr: &str, metrics: WatchMetrics) -> bool {
    match bind(addr).await {
        Ok(listener) => {
            info!("Metrics listening on {}", addr);
            tokio::spawn(serve(listener, metrics));
            true
        }
        Err(e) => {
            warn!("Metrics listener disabled: {:#}", e);
            false
        }
    }
}

async fn bind(addr: &str) -> Result<TcpListener> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid metrics_addr {}", addr))?;
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))
}

/// Accept connections until the process exits
async fn serve(listener: TcpListener, metrics: WatchMetrics) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Error accepting metrics connection: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let metrics = metrics.clone();
                async move { Ok::<_, hyper::Error>(handle_request(req, &metrics)) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving metrics connection from {}: {}", peer_addr, e);
            }
        });
    }
}

fn handle_request<B>(req: Request<B>, metrics: &WatchMetrics) -> Response<Full<Bytes>> {
    debug!("{} {}", req.method(), req.uri().path());

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => match metrics.gather() {
            Ok(text) => {
                let mut response = text_response(StatusCode::OK, text);
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
            Err(e) => {
                warn!("Failed to gather metrics: {}", e);
                text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to gather metrics\n".to_string(),
                )
            }
        },
        (_, "/healthz") => text_response(StatusCode::OK, "OK\n".to_string()),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found\n".to_string()),
    }
}

fn text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
}
