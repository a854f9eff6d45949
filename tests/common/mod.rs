//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires an in-memory DB and a full
//! [`AppContext`] against two wiremock servers: one playing the conversion
//! service, one hosting the source videos. [`TestHarness::serve`] starts
//! Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use serde_json::{json, Value};
use vodbridge::config::Config;
use vodbridge::remote::api_key_hash;
use vodbridge::server::{create_router, AppContext};
use vodbridge_db::pool::{init_memory_pool, DbPool, PooledConnection};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Shared secret used by every harness.
pub const API_KEY: &str = "integration-secret";

pub const SITE_URL: &str = "https://site.example.com";

pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    /// Stands in for the conversion service.
    pub remote: MockServer,
    /// Serves `HEAD /videos/*` with 200; everything else is 404.
    pub media: MockServer,
}

impl TestHarness {
    /// Harness with a fully configured conversion service.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Harness whose config can be adjusted before the context is built.
    /// The remote URL, key and site are filled in first.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let remote = MockServer::start().await;
        let media = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path_regex("^/videos/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&media)
            .await;

        let mut config = Config::default();
        config.server.site_url = Some(SITE_URL.into());
        config.remote.server_url = Some(remote.uri());
        config.remote.api_key = Some(API_KEY.into());
        config.remote.retry_delay_secs = 0;
        config.probe.timeout_secs = 5;
        adjust(&mut config);

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::from_config(config, db.clone()).expect("failed to build context");

        Self {
            ctx,
            db,
            remote,
            media,
        }
    }

    /// Harness with no conversion service credentials.
    pub async fn unconfigured() -> Self {
        Self::with_config(|config| {
            config.remote.server_url = None;
            config.remote.api_key = None;
        })
        .await
    }

    /// A source URL the probe will accept.
    pub fn video_url(&self, name: &str) -> String {
        format!("{}/videos/{}", self.media.uri(), name)
    }

    /// Start an Axum server on a random port and return its address.
    pub async fn serve(&self) -> SocketAddr {
        let app = create_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        vodbridge_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    pub fn job_count(&self) -> usize {
        self.ctx.manager.list(None).expect("list jobs").len()
    }

    /// Make `POST /api/convert` reply with the given JSON body.
    pub async fn mock_convert(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path("/api/convert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.remote)
            .await;
    }

    /// Make `POST /api/convert` report the submitted video as the one
    /// currently being processed.
    pub async fn mock_convert_processing(&self) {
        Mock::given(method("POST"))
            .and(path("/api/convert"))
            .respond_with(|req: &Request| {
                let body: Value = req.body_json().unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "currently_processing": body["video_uuid"],
                    "queue_position": 1,
                }))
            })
            .mount(&self.remote)
            .await;
    }

    /// Mount a single-path responder on the conversion service.
    pub async fn mock_remote(&self, route: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.remote)
            .await;
    }
}

/// Digest header value the conversion service would send.
pub fn key_hash() -> String {
    api_key_hash(API_KEY)
}

/// An address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let addr = listener.local_addr().expect("failed to get local addr");
    drop(listener);
    format!("http://{addr}")
}
