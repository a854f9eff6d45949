//! Job API integration tests.
//!
//! Exercises the `/api` router in-process with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::TestHarness;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use vodbridge::lifecycle::CallbackUpdate;
use vodbridge::server::create_router;
use vodbridge_common::JobStatus;

fn router(harness: &TestHarness) -> Router {
    create_router(harness.ctx.clone())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_returns_ok() {
    let harness = TestHarness::new().await;
    let (status, _) = send(router(&harness), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn submit_job_returns_created() {
    let harness = TestHarness::new().await;
    harness.mock_convert(json!({ "queue_position": 4 })).await;

    let (status, body) = send(
        router(&harness),
        Method::POST,
        "/api/jobs",
        Some(json!({ "video_url": harness.video_url("talk.mp4"), "title": "  Keynote  " })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["queue_position"], 4);
    assert_eq!(body["job"]["title"], "Keynote");
    assert_eq!(body["job"]["status"], "queued");
    assert_eq!(body["job"]["status_label"], "In Queue");
    assert_eq!(body["job"]["duration_formatted"], "-");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .ends_with("queue at position #4"));
}

#[tokio::test]
async fn submit_job_validation_errors() {
    let harness = TestHarness::new().await;

    let (status, body) = send(
        router(&harness),
        Method::POST,
        "/api/jobs",
        Some(json!({ "video_url": harness.video_url("talk.mp4") })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["error"], "Video title is required");

    // malformed JSON body
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/jobs")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router(&harness).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_job_unconfigured_is_unavailable() {
    let harness = TestHarness::unconfigured().await;

    let (status, body) = send(
        router(&harness),
        Method::POST,
        "/api/jobs",
        Some(json!({ "video_url": harness.video_url("talk.mp4"), "title": "Keynote" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "configuration_error");
}

#[tokio::test]
async fn remote_failure_is_bad_gateway() {
    let harness = TestHarness::new().await;
    harness.mock_remote("/api/convert", 500, json!({})).await;

    let (status, body) = send(
        router(&harness),
        Method::POST,
        "/api/jobs",
        Some(json!({ "video_url": harness.video_url("talk.mp4"), "title": "Keynote" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "remote_error");

    // the failed job is still listed
    let (_, list) = send(router(&harness), Method::GET, "/api/jobs", None).await;
    assert_eq!(list[0]["status"], "failed");
    assert_eq!(list[0]["status_label"], "Failed");
}

#[tokio::test]
async fn list_jobs_newest_first_with_search() {
    let harness = TestHarness::new().await;
    harness.mock_convert(json!({ "queue_position": 1 })).await;

    let manager = &harness.ctx.manager;
    for title in ["Rust Conf Keynote", "Cooking Basics", "rust workshop"] {
        manager
            .submit(&harness.video_url("v.mp4"), title)
            .await
            .unwrap();
    }

    let (status, all) = send(router(&harness), Method::GET, "/api/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["rust workshop", "Cooking Basics", "Rust Conf Keynote"]);

    let (_, found) = send(router(&harness), Method::GET, "/api/jobs?search=RUST", None).await;
    assert_eq!(found.as_array().unwrap().len(), 2);

    let (_, none) = send(router(&harness), Method::GET, "/api/jobs?search=100%25", None).await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_job_and_not_found() {
    let harness = TestHarness::new().await;
    harness.mock_convert(json!({ "queue_position": 1 })).await;

    let job = harness
        .ctx
        .manager
        .submit(&harness.video_url("talk.mp4"), "Keynote")
        .await
        .unwrap()
        .job;
    harness
        .ctx
        .manager
        .apply_callback(
            job.uuid,
            CallbackUpdate {
                status: Some(JobStatus::Completed),
                duration: Some(3723),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (status, body) = send(
        router(&harness),
        Method::GET,
        &format!("/api/jobs/{}", job.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], job.uuid.to_string().as_str());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["duration_formatted"], "01:02:03");

    let (status, body) = send(router(&harness), Method::GET, "/api/jobs/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn retry_endpoint() {
    let harness = TestHarness::new().await;
    harness.mock_convert(json!({ "queue_position": 1 })).await;

    let job = harness
        .ctx
        .manager
        .submit(&harness.video_url("talk.mp4"), "Keynote")
        .await
        .unwrap()
        .job;

    // queued jobs cannot be retried
    let uri = format!("/api/jobs/{}/retry", job.id);
    let (status, body) = send(router(&harness), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    harness
        .ctx
        .manager
        .apply_callback(
            job.uuid,
            CallbackUpdate {
                status: Some(JobStatus::Failed),
                error_message: Some("boom".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (status, body) = send(router(&harness), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["id"], job.id.get());
    assert_eq!(body["job"]["status"], "queued");
    assert_eq!(body["job"]["error_message"], Value::Null);
}

#[tokio::test]
async fn delete_endpoint() {
    let harness = TestHarness::new().await;
    harness.mock_convert(json!({ "queue_position": 1 })).await;
    harness
        .mock_remote("/api/remove-from-queue", 200, json!({ "success": true }))
        .await;

    let job = harness
        .ctx
        .manager
        .submit(&harness.video_url("talk.mp4"), "Keynote")
        .await
        .unwrap()
        .job;

    let uri = format!("/api/jobs/{}", job.id);
    let (status, body) = send(router(&harness), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Video deleted successfully");
    assert_eq!(body["remote_cleanup_failed"], false);

    let (status, _) = send(router(&harness), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_while_processing_is_conflict() {
    let harness = TestHarness::new().await;
    harness.mock_convert_processing().await;
    harness
        .mock_remote(
            "/api/remove-from-queue",
            409,
            json!({ "is_processing": true }),
        )
        .await;

    let job = harness
        .ctx
        .manager
        .submit(&harness.video_url("talk.mp4"), "Keynote")
        .await
        .unwrap()
        .job;
    assert_eq!(job.status, JobStatus::Downloading);

    let uri = format!("/api/jobs/{}", job.id);
    let (status, body) = send(router(&harness), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "video_processing");
    assert_eq!(
        body["error"],
        "Video is currently being processed and cannot be removed from queue"
    );
    assert_eq!(harness.job_count(), 1);
}

#[tokio::test]
async fn queue_status_passthrough() {
    let harness = TestHarness::new().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/api/queue-status"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
            "currently_processing": "abc",
            "queue_length": 2,
            "queue": [{ "video_uuid": "def" }, { "video_uuid": "ghi" }],
            "workers": 1
        })))
        .mount(&harness.remote)
        .await;

    let (status, body) = send(router(&harness), Method::GET, "/api/queue-status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currently_processing"], "abc");
    assert_eq!(body["queue_length"], 2);
    assert_eq!(body["queue"].as_array().unwrap().len(), 2);
    assert_eq!(body["workers"], 1);
}
