//! HTTP server and graceful shutdown.
//!
//! The server owns no routing logic. Per request it:
//! 1. parses the method (unknown → `405`),
//! 2. collects the body,
//! 3. normalizes the path (no query string, empty → `/`),
//! 4. hands the request to [`Router::handle`].
//!
//! On SIGTERM or Ctrl-C it stops accepting, lets in-flight connections
//! finish, and returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::method::{Method, UnknownMethod};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use senda::Server;
    /// let server = Server::bind("127.0.0.1:3000").unwrap();
    /// assert_eq!(server.addr().port(), 3000);
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr
            .parse()
            .map_err(|source| Error::Addr { addr: addr.to_owned(), source })?;
        Ok(Self { addr })
    }

    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // The route table is read-only from here on; every connection task
        // shares it.
        let router = Arc::new(router);

        info!(addr = %self.addr, "listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM immediately stops
                // accepting, even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure becomes a
/// response, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_inner());
        }
    };

    let request = match to_request(&parts, body) {
        Ok(request) => request,
        Err(e) => {
            warn!(peer = %remote_addr, "{e}");
            return Ok(Response::status(Status::MethodNotAllowed).into_inner());
        }
    };
    let method = request.method();

    let response = router.handle(request).await;
    info!(%method, path = parts.uri.path(), status = response.status_code(), "request");
    Ok(response.into_inner())
}

/// Converts hyper's request head to a routable [`Request`]: known method,
/// path and query split apart, headers that are valid UTF-8.
fn to_request(parts: &http::request::Parts, body: Bytes) -> Result<Request, UnknownMethod> {
    let method: Method = parts.method.as_str().parse()?;
    let target = match parts.uri.query() {
        Some(q) => format!("{}?{q}", parts.uri.path()),
        None => parts.uri.path().to_owned(),
    };
    Ok(parts.headers.iter().fold(
        Request::new(method, &target).with_body(body),
        |req, (name, value)| match value.to_str() {
            Ok(value) => req.with_header(name.as_str(), value),
            Err(_) => req,
        },
    ))
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(method: &str, uri: &str) -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("x-trace", "abc")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn query_is_split_off_before_routing() {
        let req = to_request(&head("GET", "/flights/LAX-SFO?class=economy"), Bytes::new()).unwrap();
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.path(), "/flights/LAX-SFO");
        assert_eq!(req.query(), Some("class=economy"));
        assert_eq!(req.header("X-Trace"), Some("abc"));
    }

    #[test]
    fn body_is_carried_through() {
        let req = to_request(&head("POST", "/book"), Bytes::from_static(b"title")).unwrap();
        assert_eq!(req.body(), b"title");
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = to_request(&head("BREW", "/coffee"), Bytes::new()).err().unwrap();
        assert_eq!(err.0, "BREW");
    }

    #[tokio::test]
    async fn unknown_method_answers_405() {
        use http_body_util::Empty;

        let router = Arc::new(Router::new().get("/", |_req: Request| async { "root" }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, remote_addr) = listener.accept().await.unwrap();
            let svc = service_fn(move |req| dispatch(Arc::clone(&router), req, remote_addr));
            let _ = hyper::server::conn::http1::Builder::new()
                .serve_connection(TokioIo::new(stream), svc)
                .await;
        });

        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await.unwrap();
        tokio::spawn(conn);

        let send = |method: &str, uri: &str| {
            http::Request::builder()
                .method(method)
                .uri(uri)
                .header("host", addr.to_string())
                .body(Empty::<Bytes>::new())
                .unwrap()
        };

        let res = sender.send_request(send("BREW", "/")).await.unwrap();
        assert_eq!(res.status(), http::StatusCode::METHOD_NOT_ALLOWED);

        let res = sender.send_request(send("GET", "/?x=1")).await.unwrap();
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"root");
    }
}
