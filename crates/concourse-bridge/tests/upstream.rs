//! Bridge clients against a local stand-in for the upstream services.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use concourse_bridge::{BridgeError, ConcourseBridge};
use tokio::net::TcpListener;

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn stand_in() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(
            "/concourse/:master/teams",
            get(|Path(master): Path<String>| async move {
                if master == "missing" {
                    Err((StatusCode::NOT_FOUND, "unknown build master"))
                } else {
                    Ok(Json(vec!["main".to_string(), format!("{master}-ops")]))
                }
            }),
        )
        .route(
            "/concourse/:master/teams/:team/pipelines",
            get(|Path((_, team)): Path<(String, String)>| async move {
                Json(vec![format!("{team}-deploy")])
            }),
        )
        .route(
            "/concourse/:master/teams/:team/pipelines/:pipeline/jobs",
            get(|| async { Json(vec!["build", "ship"]) }),
        )
        .route(
            "/concourse/:master/teams/:team/pipelines/:pipeline/resources",
            get(|| async { "not json" }),
        )
        .route(
            "/concourse/stage/start",
            post(
                |State(seen): State<Seen>, Query(params): Query<HashMap<String, String>>| async move {
                    seen.lock().unwrap().push(params);
                    StatusCode::OK
                },
            ),
        )
        .with_state(seen.clone());
    (serve(router).await, seen)
}

fn bridge(base: &str) -> ConcourseBridge {
    ConcourseBridge::new(Some(base), Some(base), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn lists_are_forwarded_verbatim() {
    let (base, _) = stand_in().await;
    let bridge = bridge(&base);
    let igor = bridge.igor().unwrap();

    assert_eq!(igor.teams("ci").await.unwrap(), vec!["main", "ci-ops"]);
    assert_eq!(
        igor.pipelines("ci", "main").await.unwrap(),
        vec!["main-deploy"]
    );
    assert_eq!(
        igor.jobs("ci", "main", "deploy").await.unwrap(),
        vec!["build", "ship"]
    );
}

#[tokio::test]
async fn upstream_status_is_reported() {
    let (base, _) = stand_in().await;
    let err = bridge(&base).igor().unwrap().teams("missing").await.unwrap_err();
    match err {
        BridgeError::Upstream { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "unknown build master");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let (base, _) = stand_in().await;
    let err = bridge(&base)
        .igor()
        .unwrap()
        .resources("ci", "main", "deploy")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode { .. }));
}

#[tokio::test]
async fn stage_start_forwards_query() {
    let (base, seen) = stand_in().await;
    bridge(&base)
        .orca()
        .unwrap()
        .concourse_stage_execution("01STAGE", "deploy", 7)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["stageId"], "01STAGE");
    assert_eq!(seen[0]["job"], "deploy");
    assert_eq!(seen[0]["buildNumber"], "7");
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = bridge(&base).igor().unwrap().teams("ci").await.unwrap_err();
    assert!(matches!(err, BridgeError::Transport { .. }));
    assert!(err.is_upstream());
}
