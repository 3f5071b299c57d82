use probe_config::ServiceConfig;
use probe_server::{ProbeServer, ServeHandle};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::broadcast;

struct Running {
    addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
    handle: ServeHandle,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.send(()).expect("server should be listening");
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop in time")
            .expect("server task should not panic")
            .expect("server should stop cleanly");
    }
}

async fn start() -> Running {
    let config = ServiceConfig {
        port: 0,
        ..ServiceConfig::default()
    };
    let server = ProbeServer::new(config).expect("default config is valid").shared();
    let listener = server.listen().await.expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound address");

    let (shutdown, signal) = broadcast::channel(1);
    let handle = tokio::spawn(async move { server.serve(listener, signal).await });

    Running {
        addr,
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn range_requests_over_a_real_connection() {
    let server = start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/range/26"))
        .header("Range", "bytes=0-4")
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(response.status().as_u16(), 206);
    assert_eq!(response.headers()["content-range"], "bytes 0-4/26");
    assert_eq!(response.headers()["content-length"], "5");
    assert_eq!(&response.bytes().await.expect("body")[..], b"abcde");

    server.stop().await;
}

#[tokio::test]
async fn origin_comes_from_the_peer_address() {
    let server = start().await;

    let body = reqwest::get(server.url("/get"))
        .await
        .expect("request should succeed")
        .text()
        .await
        .expect("body");
    let echo: probe_server::echo::Echo = serde_json::from_str(&body).expect("echo json");
    assert_eq!(echo.origin, "127.0.0.1");
    assert!(body.ends_with('\n'));

    server.stop().await;
}

#[tokio::test]
async fn client_leaving_mid_drip_does_not_hurt_the_server() {
    let server = start().await;
    let client = reqwest::Client::new();

    let mut response = client
        .get(server.url("/drip?numbytes=20&duration=2&delay=0"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status().as_u16(), 200);

    let first = response
        .chunk()
        .await
        .expect("first chunk should arrive")
        .expect("body should not be empty");
    assert!(first.iter().all(|byte| *byte == b'*'));
    drop(response);

    let status = client
        .get(server.url("/status/418"))
        .send()
        .await
        .expect("server should still answer")
        .status();
    assert_eq!(status.as_u16(), 418);

    server.stop().await;
}
