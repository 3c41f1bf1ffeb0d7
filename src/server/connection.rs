// Connection handling module
// Serves one TCP connection and turns each request into a routed event

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::USER_AGENT;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::adapter;
use crate::api;
use crate::config::AppState;
use crate::logger::{self, AccessLogEntry};

/// Handle a single connection in a spawned task.
///
/// The connection is dropped once `http.read_timeout` elapses.
pub fn spawn_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = Duration::from_secs(state.config.http.read_timeout);

        let conn = http1::Builder::new().keep_alive(true).serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { handle_request(req, state, peer_addr).await }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_debug(&format!(
                "Connection from {peer_addr} closed after {} seconds",
                timeout_duration.as_secs()
            )),
        }
    });
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = match adapter::read_body(req, state.config.http.max_body_size).await {
        Ok(body) => {
            let event = adapter::build_event(
                &method,
                &path,
                query.as_deref(),
                body,
                state.config.server.stage.as_deref(),
            );
            adapter::resolve_result(api::handle_event(&state.context, &event).await)
        }
        Err(rejection) => {
            logger::log_warning(&format!("Rejected {method} {path}: {rejection:?}"));
            rejection.into_response()
        }
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method, path);
        entry.query = query;
        entry.status = response.status_code;
        entry.body_bytes = response.body.len();
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(adapter::to_http(response))
}
