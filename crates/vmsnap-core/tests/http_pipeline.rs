use vmsnap_api::RunPayload;
use vmsnap_core::{AppConfig, Trigger, build_job};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLES: &str = "/bigquery/v2/projects/analytics/datasets/compute_status/tables";

fn config(uri: &str) -> AppConfig {
    let mut config = AppConfig::from_toml(
        r#"
        [snapshot]
        source_project = "src"
        destination_project = "analytics"
        dataset = "compute_status"

        [auth]
        access_token = "token"
        request_timeout_secs = 5
        "#,
    )
    .unwrap();
    config.endpoints.compute = uri.to_string();
    config.endpoints.bigquery = uri.to_string();
    config
}

async fn mount_listing(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/src/aggregated/instances"))
        .and(header("Authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_snapshot_against_google_apis() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        serde_json::json!({
            "items": {
                "zones/us-central1-a": {
                    "instances": [{"name": "vm1", "status": "RUNNING"}]
                },
                "zones/us-central1-b": {
                    "warning": {"code": "NO_RESULTS_ON_PAGE", "message": "no instances"}
                }
            }
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path_regex(format!(r"^{TABLES}/vm_status_\d{{8}}$")))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "Not found: Table"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TABLES))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tableReference": {
                "projectId": "analytics",
                "datasetId": "compute_status",
                "tableId": "vm_status_20240105"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(format!(r"^{TABLES}/vm_status_\d{{8}}/insertAll$")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "bigquery#tableDataInsertAllResponse"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = build_job(&config(&server.uri())).unwrap();
    let response = job.handle(Trigger::http()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        serde_json::to_value(&response.payload).unwrap(),
        serde_json::json!({
            "instances": [
                {"project_id": "src", "instance_name": "vm1", "zone": "us-central1-a", "status": "RUNNING"}
            ],
            "status": "success"
        })
    );
}

#[tokio::test]
async fn test_empty_project_never_touches_bigquery() {
    let server = MockServer::start().await;

    mount_listing(&server, serde_json::json!({"items": {}})).await;

    Mock::given(path_regex("^/bigquery/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let job = build_job(&config(&server.uri())).unwrap();
    let response = job.handle(Trigger::schedule()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.payload, RunPayload::no_instances());
}

#[tokio::test]
async fn test_dataset_permission_error_is_500() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        serde_json::json!({
            "items": {"zones/us-east1-b": {"instances": [{"name": "vm1", "status": "RUNNING"}]}}
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path_regex(format!(r"^{TABLES}/")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TABLES))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "Access Denied: Dataset analytics:compute_status"}
        })))
        .mount(&server)
        .await;

    let job = build_job(&config(&server.uri())).unwrap();
    let response = job.handle(Trigger::http()).await;

    assert_eq!(response.status_code, 500);
    match response.payload {
        RunPayload::Message(message) => {
            assert!(message.starts_with("Internal error:"));
            assert!(message.contains("Access Denied"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}
