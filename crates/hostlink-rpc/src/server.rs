//! HTTP transport
//!
//! One `POST` route. Content type, body size and JSON are checked by hand instead of
//! through axum's extractors so every failure maps to a JSON-RPC error object.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::oneshot;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use url::Url;

use crate::config::RpcConfig;
use crate::context::{Application, Context};
use crate::error::{RpcError, ServerError};
use crate::protocol::{parse_request, Rejection, RequestId, RpcRequest, RpcResponse};
use crate::registry::{Call, Failure, RpcRegistry};
use crate::Result;

struct ServerState<A: Application> {
    registry: Arc<RpcRegistry<A>>,
    application: Arc<A>,
    window_header: HeaderName,
    id_as_window_fallback: bool,
    max_body_bytes: usize,
}

impl<A: Application> ServerState<A> {
    /// Window token comes from the explicit header; the request id is only
    /// consulted when the fallback is switched on.
    fn resolve_window(&self, headers: &HeaderMap, id: Option<&RequestId>) -> Option<A::Window> {
        let token = headers
            .get(&self.window_header)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| {
                self.id_as_window_fallback
                    .then(|| id.map(RequestId::to_string))
                    .flatten()
            })?;

        self.application.window(&token)
    }
}

impl<A: Application> Clone for ServerState<A> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            application: Arc::clone(&self.application),
            window_header: self.window_header.clone(),
            id_as_window_fallback: self.id_as_window_fallback,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

/// JSON-RPC server bound to a local port.
///
/// The port is bound in `bind`, so `url()` is usable before serving starts.
pub struct RpcServer<A: Application> {
    listener: std::net::TcpListener,
    url: Url,
    path: String,
    state: ServerState<A>,
}

impl<A: Application> RpcServer<A> {
    pub fn bind(registry: RpcRegistry<A>, application: Arc<A>, config: RpcConfig) -> Result<Self> {
        if !config.path.starts_with('/') {
            return Err(ServerError::Config(format!(
                "path must start with '/': {}",
                config.path
            )));
        }

        let window_header = HeaderName::from_bytes(config.window_header.as_bytes())
            .map_err(|_| {
                ServerError::Config(format!("invalid window header: {}", config.window_header))
            })?;

        let addr = format!("{}:{}", config.host, config.port);
        let listener = std::net::TcpListener::bind((config.host.as_str(), config.port))
            .map_err(|source| ServerError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;

        let local = listener.local_addr()?;
        let url = Url::parse(&format!("http://{}{}", local, config.path))?;

        tracing::info!(url = %url, methods = registry.len(), "RPC server initialized");

        Ok(Self {
            listener,
            url,
            path: config.path,
            state: ServerState {
                registry: Arc::new(registry),
                application,
                window_header,
                id_as_window_fallback: config.id_as_window_fallback,
                max_body_bytes: config.max_body_bytes,
            },
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &RpcRegistry<A> {
        &self.state.registry
    }

    /// The axum router serving the endpoint, with CORS open to any origin.
    pub fn router(&self) -> Router {
        // `*` cannot be combined with credentials, so origin and headers are mirrored.
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true)
            .allow_headers(AllowHeaders::mirror_request())
            .allow_methods([Method::POST]);

        Router::new()
            .route(&self.path, post(handle_rpc::<A>))
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Serve on the current runtime until the task is dropped.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let listener = tokio::net::TcpListener::from_std(self.listener)?;

        tracing::info!(url = %self.url, "RPC server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!(url = %self.url, "RPC server stopped");
        Ok(())
    }

    /// Serve on the calling thread with a dedicated single-threaded runtime.
    pub fn run_blocking(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(self.serve())
    }

    /// Serve from a background thread running its own event loop.
    pub fn spawn(self) -> Result<ServerHandle> {
        let url = self.url.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("hostlink-rpc".to_string())
            .spawn(move || -> Result<()> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;

                runtime.block_on(self.serve_with_shutdown(async move {
                    // Dropping the handle detaches the server; only an explicit
                    // shutdown stops it.
                    if shutdown_rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }))
            })?;

        Ok(ServerHandle {
            url,
            shutdown: Some(shutdown_tx),
            thread,
        })
    }
}

/// Handle to a server running on its own thread.
pub struct ServerHandle {
    url: Url,
    shutdown: Option<oneshot::Sender<()>>,
    thread: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Ask the server to stop accepting requests and finish in-flight ones.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    pub fn join(self) -> Result<()> {
        self.thread.join().map_err(|_| ServerError::Panicked)?
    }

    pub fn stop(mut self) -> Result<()> {
        self.shutdown();
        self.join()
    }
}

async fn handle_rpc<A: Application>(
    State(state): State<ServerState<A>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if !is_json(&headers) {
        return reply(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RpcResponse::error(RpcError::unsupported_content_type(), None),
        );
    }

    let body = match read_body(&headers, body, state.max_body_bytes).await {
        Some(body) => body,
        None => {
            tracing::debug!(limit = state.max_body_bytes, "Rejected oversized RPC request");
            return reply(
                StatusCode::PAYLOAD_TOO_LARGE,
                RpcResponse::error(RpcError::payload_too_large(state.max_body_bytes), None),
            );
        }
    };

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(Rejection { error, id }) => {
            tracing::debug!(code = error.code, message = %error.message, "Rejected RPC request");
            return reply(StatusCode::BAD_REQUEST, RpcResponse::error(error, id));
        }
    };

    let id = request.id.clone();
    let method = request.method.clone();

    match AssertUnwindSafe(dispatch(&state, &headers, request))
        .catch_unwind()
        .await
    {
        Ok(response) => response,
        Err(panic) => {
            tracing::error!(
                method = %method,
                panic = %panic_message(panic.as_ref()),
                "Fatal error in RPC handler"
            );
            respond_error(StatusCode::INTERNAL_SERVER_ERROR, RpcError::internal_error(), id)
        }
    }
}

async fn dispatch<A: Application>(
    state: &ServerState<A>,
    headers: &HeaderMap,
    request: RpcRequest,
) -> Response {
    let RpcRequest { method: name, params, id } = request;

    let Some(method) = state.registry.get(&name) else {
        tracing::debug!(method = %name, "Method not found");
        return respond_error(StatusCode::NOT_FOUND, RpcError::method_not_found(), id);
    };

    let args = match method.bind(params) {
        Ok(args) => args,
        Err(error) => return respond_error(StatusCode::BAD_REQUEST, error, id),
    };

    let ctx = method.accepts_context().then(|| {
        Context::new(
            Arc::clone(&state.application),
            state.resolve_window(headers, id.as_ref()),
        )
    });

    tracing::debug!(
        method = %name,
        args = args.len(),
        notification = id.is_none(),
        "Executing RPC method"
    );

    let started = Instant::now();
    let outcome = method.invoke(Call { ctx, args }).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => match id {
            Some(id) => {
                tracing::debug!(method = %name, elapsed_ms, "RPC method succeeded");
                reply(StatusCode::OK, RpcResponse::result(result, Some(id)))
            }
            None => StatusCode::NO_CONTENT.into_response(),
        },
        Err(Failure::Method(error)) => match error.as_rpc() {
            Some(rpc_error) => {
                tracing::warn!(
                    method = %name,
                    code = rpc_error.code,
                    message = %rpc_error.message,
                    elapsed_ms,
                    "RPC execution error"
                );
                respond_error(StatusCode::INTERNAL_SERVER_ERROR, rpc_error.clone(), id)
            }
            None => {
                tracing::error!(
                    method = %name,
                    error = %error,
                    elapsed_ms,
                    "Unexpected error during execution of RPC method"
                );
                respond_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RpcError::server_error(error.type_name()),
                    id,
                )
            }
        },
        Err(Failure::Encode(error)) => {
            tracing::error!(method = %name, error = %error, "Failed to encode RPC result");
            respond_error(StatusCode::INTERNAL_SERVER_ERROR, RpcError::internal_error(), id)
        }
    }
}

/// Error response for a validated request. Notifications never get a body.
fn respond_error(status: StatusCode, error: RpcError, id: Option<RequestId>) -> Response {
    match id {
        Some(id) => reply(status, RpcResponse::error(error, Some(id))),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn reply(status: StatusCode, body: RpcResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Buffer the request body, or `None` once it exceeds `limit`.
///
/// A declared `Content-Length` over the limit is refused before reading anything.
/// A streamed body is cut off at the limit; any read failure is treated the same way
/// since the body cannot be parsed either way.
async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Option<Bytes> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return None;
    }

    axum::body::to_bytes(body, limit).await.ok()
}

/// Media type check; parameters such as `charset` are ignored.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
