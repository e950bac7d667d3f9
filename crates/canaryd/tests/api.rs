//! In-process HTTP tests of the daemon router.

use std::path::Path;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use canaryd::{router, DaemonConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use tracing_test::traced_test;

fn write_object(root: &Path, account: &str, group: &str, id: &str, value: &Value) {
    let dir = root.join(account).join(group);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{id}.json")), value.to_string()).unwrap();
}

/// A daemon with one filesystem account holding two configs and one metric list.
fn app_with(extra_toml: &str) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_object(
        root,
        "local",
        "canary_config",
        "cfg-plain",
        &json!({"name": "plain"}),
    );
    write_object(
        root,
        "local",
        "canary_config",
        "cfg-unknown",
        &json!({"name": "unknown", "judge": {"name": "NetflixACAJudge-v1.0"}}),
    );
    write_object(
        root,
        "local",
        "metric_pairs",
        "pairs-1",
        &json!([
            {"name": "cpu", "values": {"control": [1.0, 1.0], "experiment": [1.0, 1.0]}},
            {"name": "errors", "values": {"control": [2.0], "experiment": [2.0, null]}}
        ]),
    );

    let toml = format!(
        r#"
        [[accounts]]
        name = "local"
        types = ["CONFIGURATION_STORE", "OBJECT_STORE"]
        root = "{}"
        {extra_toml}
        "#,
        root.display()
    );
    let config = DaemonConfig::parse(&toml).unwrap();
    (router(config.build_state().unwrap()), dir)
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, body)
}

const JUDGE_QUERY: &str = "metricSetPairListId=pairs-1&passThreshold=95&marginalThreshold=75";

#[tokio::test]
async fn health_answers_ok() {
    let (app, _dir) = app_with("");
    let (status, body) = call(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn lists_builtin_judge() {
    let (app, _dir) = app_with("");
    let (status, body) = call(&app, Method::GET, "/judges").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"name": "mean-delta-v1", "visible": true}]));
}

#[tokio::test]
async fn judge_runs_default_judge() {
    let (app, _dir) = app_with("");
    let uri = format!("/judges/judge?canaryConfigId=cfg-plain&{JUDGE_QUERY}");
    let (status, body) = call(&app, Method::POST, &uri).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["judgeName"], json!("mean-delta-v1"));
    assert_eq!(body["score"]["classification"], json!("Pass"));
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_judge_is_404_naming_it() {
    let (app, _dir) = app_with("");
    let uri = format!("/judges/judge?canaryConfigId=cfg-unknown&{JUDGE_QUERY}");
    let (status, body) = call(&app, Method::POST, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(body["error"]["status"], json!(404));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("NetflixACAJudge-v1.0"));
}

#[tokio::test]
async fn missing_parameter_is_400() {
    let (app, _dir) = app_with("");
    let (status, body) = call(
        &app,
        Method::POST,
        "/judges/judge?canaryConfigId=cfg-plain&passThreshold=95",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn unknown_account_is_404() {
    let (app, _dir) = app_with("");
    let uri = format!(
        "/judges/judge?canaryConfigId=cfg-plain&storageAccountName=elsewhere&{JUDGE_QUERY}"
    );
    let (status, _) = call(&app, Method::POST, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comparison_round_trip_through_http() {
    let (app, _dir) = app_with("");
    let uri = format!("/judges/comparison?canaryConfigId=cfg-plain&{JUDGE_QUERY}");
    let (status, body) = call(&app, Method::POST, &uri).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let execution_id = body["canaryExecutionId"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..200 {
        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/judges/comparison/{execution_id}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        last = body;
        if last.get("comparisonResult").is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(
        last["comparisonResult"]["judge1Result"]["judgeName"],
        json!("mean-delta-v1")
    );
    assert!(last.get("exceptions").is_none());
}

#[tokio::test]
async fn comparison_with_unknown_override_reports_exception() {
    let (app, _dir) = app_with("");
    let uri = format!(
        "/judges/comparison?canaryConfigId=cfg-plain&overrideCanaryJudge2=ghost&{JUDGE_QUERY}"
    );
    let (_, body) = call(&app, Method::POST, &uri).await;
    let execution_id = body["canaryExecutionId"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..200 {
        let (_, body) = call(
            &app,
            Method::GET,
            &format!("/judges/comparison/{execution_id}"),
        )
        .await;
        last = body;
        if last.get("exceptions").is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(last.get("comparisonResult").is_none());
    assert!(last["exceptions"]["Judge 2"]["details"]["error"]
        .as_str()
        .unwrap()
        .contains("ghost"));
}

#[tokio::test]
async fn unknown_execution_is_404() {
    let (app, _dir) = app_with("");
    let (status, body) = call(&app, Method::GET, "/judges/comparison/E404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"].as_str().unwrap().contains("E404"));
}

#[tokio::test]
async fn concourse_without_igor_is_503() {
    let (app, _dir) = app_with("");
    let (status, body) = call(&app, Method::GET, "/concourse/ci/teams").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], json!("NOT_CONFIGURED"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/concourse/stage/start?stageId=s&job=j&buildNumber=1",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn concourse_lists_are_proxied() {
    let igor = Router::new()
        .route(
            "/concourse/:master/teams",
            get(|| async { Json(vec!["main", "ops"]) }),
        )
        .route(
            "/concourse/:master/teams/:team/pipelines",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "igor exploded") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, igor).await.unwrap();
    });

    let (app, _dir) = app_with(&format!(
        "[concourse]\nigor_url = \"http://{addr}\"\ntimeout_secs = 5"
    ));

    let (status, body) = call(&app, Method::GET, "/concourse/ci/teams").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["main", "ops"]));

    let (status, body) = call(&app, Method::GET, "/concourse/ci/teams/main/pipelines").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]["message"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn invalid_stage_start_query_is_400() {
    let (app, _dir) = app_with("");
    let (status, _) = call(
        &app,
        Method::POST,
        "/concourse/stage/start?stageId=s&job=j&buildNumber=seven",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[traced_test]
async fn failed_requests_are_logged() {
    let (app, _dir) = app_with("");
    let uri = format!("/judges/judge?canaryConfigId=absent&{JUDGE_QUERY}");
    let (status, _) = call(&app, Method::POST, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(logs_contain("request.failed"));
    assert!(logs_contain("judges.judge"));
}
