mod common;

use std::{fs, time::Duration};

use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::json;

use multimodal_llm_service::{
    ClientError,
    client::{self, DescriptionClient},
    payload::DescribeRequest,
};

use common::{scratch_dir, spawn_blocking_stub};

fn image_file(name: &str) -> std::path::PathBuf {
    let dir = scratch_dir(name);
    let path = dir.join("pixel.png");
    fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
    path
}

#[test]
fn missing_file_makes_no_request() {
    let (addr, hits) = spawn_blocking_stub(Router::new().route(
        "/",
        post(|| async { Json(json!({ "description": "unused" })) }),
    ));

    let outcome = client::describe(
        std::path::Path::new("/no/such/image.png"),
        &format!("http://{addr}/"),
    );

    assert!(matches!(outcome, Err(ClientError::FileNotFound(_))));
    assert_eq!(hits.count(), 0);

    let mut out = Vec::new();
    client::report(&outcome, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Error: Image file '/no/such/image.png' not found.\n"
    );
}

#[test]
fn success_prints_the_description_once() {
    let (addr, hits) = spawn_blocking_stub(Router::new().route(
        "/",
        post(|Json(req): Json<DescribeRequest>| async move {
            assert_eq!(req.image_data, "iVBORw0KGgo=");
            Json(json!({ "description": "X" }))
        }),
    ));
    let image = image_file("client-success");

    let outcome = client::describe(&image, &format!("http://{addr}/"));
    assert_eq!(outcome.as_ref().unwrap().description, "X");
    assert_eq!(hits.count(), 1);

    let mut out = Vec::new();
    client::report(&outcome, &mut out).unwrap();
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.strip_prefix("Image Description:\n"), Some("X\n"));
}

#[test]
fn server_error_is_surfaced_verbatim() {
    let (addr, hits) = spawn_blocking_stub(Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ));

    let client = DescriptionClient::new(format!("http://{addr}/")).unwrap();
    let err = client.submit("aGk=".into()).unwrap_err();

    match err {
        ClientError::Remote { status, ref body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    assert_eq!(hits.count(), 1);
}

#[test]
fn missing_description_is_malformed() {
    let (addr, _hits) = spawn_blocking_stub(Router::new().route(
        "/",
        post(|| async { Json(json!({ "caption": "nope" })) }),
    ));

    let client = DescriptionClient::new(format!("http://{addr}/")).unwrap();
    let err = client.submit("aGk=".into()).unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[test]
fn slow_servers_are_waited_for() {
    // reqwest's blocking client gives up after 30 s unless told otherwise
    let (addr, hits) = spawn_blocking_stub(Router::new().route(
        "/",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(32)).await;
            Json(json!({ "description": "worth the wait" }))
        }),
    ));

    let client = DescriptionClient::new(format!("http://{addr}/")).unwrap();
    let result = client.submit("aGk=".into()).unwrap();
    assert_eq!(result.description, "worth the wait");
    assert_eq!(hits.count(), 1);
}

#[test]
fn refused_connection_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let client = DescriptionClient::new(format!("http://{addr}/")).unwrap();
    let err = client.submit("aGk=".into()).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.to_string().starts_with("error making API request"));
}
