use std::future::Future;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// How serving ended once shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every in-flight request finished inside the grace period.
    Completed,
    /// The grace period ran out and the server task was aborted.
    Aborted,
}

/// Wrap the API routes in the per-request timeout and request tracing.
pub fn app(routes: Router, request_timeout: Duration) -> Router {
    routes
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` until `shutdown` resolves, then stop accepting connections and
/// give in-flight requests up to `grace` to finish.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send,
    grace: Duration,
) -> anyhow::Result<Drain> {
    let token = CancellationToken::new();
    let mut server = tokio::spawn({
        let token = token.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
        }
    });

    tokio::select! {
        res = &mut server => {
            // Only reachable if serving failed before shutdown was requested
            res??;
            return Ok(Drain::Completed);
        }
        _ = shutdown => {}
    }

    token.cancel();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(res) => {
            res??;
            Ok(Drain::Completed)
        }
        Err(_) => {
            warn!("In-flight requests still running after {:?}, aborting", grace);
            server.abort();
            // Cancelled join errors are expected here
            let _ = server.await;
            Ok(Drain::Aborted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::{Notify, oneshot};
    use tower::ServiceExt;

    /// A route that signals once it starts and then takes `delay` to answer.
    fn slow_routes(delay: Duration, started: Arc<Notify>) -> Router {
        Router::new().route(
            "/slow",
            get(move || {
                let started = started.clone();
                async move {
                    started.notify_one();
                    tokio::time::sleep(delay).await;
                    "done"
                }
            }),
        )
    }

    async fn start_request(addr: std::net::SocketAddr) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /slow HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        stream
    }

    #[tokio::test]
    async fn slow_request_times_out_with_408() {
        let routes = slow_routes(Duration::from_secs(5), Arc::new(Notify::new()));
        let app = app(routes, Duration::from_millis(50));

        let req = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn fast_request_is_untouched_by_timeout() {
        let routes = slow_routes(Duration::ZERO, Arc::new(Notify::new()));
        let app = app(routes, Duration::from_secs(5));

        let req = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn in_flight_request_finishes_within_grace() {
        let started = Arc::new(Notify::new());
        let routes = slow_routes(Duration::from_millis(200), started.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let serving = tokio::spawn(serve(
            listener,
            app(routes, Duration::from_secs(5)),
            async move {
                stopped.await.ok();
            },
            Duration::from_secs(5),
        ));

        let mut stream = start_request(addr).await;
        started.notified().await;
        stop.send(()).unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.ends_with("done"), "{}", response);

        let drain = serving.await.unwrap().unwrap();
        assert_eq!(drain, Drain::Completed);
    }

    #[tokio::test]
    async fn request_past_grace_is_aborted() {
        let started = Arc::new(Notify::new());
        let routes = slow_routes(Duration::from_secs(30), started.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let serving = tokio::spawn(serve(
            listener,
            app(routes, Duration::from_secs(60)),
            async move {
                stopped.await.ok();
            },
            Duration::from_millis(100),
        ));

        let _stream = start_request(addr).await;
        started.notified().await;
        stop.send(()).unwrap();

        let drain = tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .expect("serve did not return after the grace period")
            .unwrap()
            .unwrap();
        assert_eq!(drain, Drain::Aborted);
    }

    #[tokio::test]
    async fn idle_server_drains_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let routes = slow_routes(Duration::ZERO, Arc::new(Notify::new()));

        let drain = serve(
            listener,
            app(routes, Duration::from_secs(5)),
            async {},
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(drain, Drain::Completed);
    }
}
