//! HttpSubmitter against a local mock endpoint

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use pitch_gauge::error::SubmissionError;
use pitch_gauge::stability::RoundedAngle;
use pitch_gauge::submission::{HttpSubmitter, SubmissionTarget, Submitter};

#[derive(Clone, Default)]
struct Endpoint {
    /// Statuses to answer with, in order; 200 once exhausted
    statuses: Arc<Mutex<Vec<u16>>>,
    received: Arc<Mutex<Vec<(String, String)>>>,
}

async fn receive(
    State(endpoint): State<Endpoint>,
    Path(session_id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    let value = form.get("value").cloned().unwrap_or_default();
    endpoint.received.lock().unwrap().push((session_id, value));

    let mut statuses = endpoint.statuses.lock().unwrap();
    let status = if statuses.is_empty() {
        200
    } else {
        statuses.remove(0)
    };
    StatusCode::from_u16(status).unwrap()
}

async fn serve(endpoint: Endpoint) -> SocketAddr {
    let app = Router::new()
        .route("/mobile/:session_id", post(receive))
        .with_state(endpoint);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn submitter(addr: SocketAddr, route: &str) -> HttpSubmitter {
    let target =
        SubmissionTarget::from_path(format!("http://{}", addr), route, "/mobile/98765").unwrap();
    HttpSubmitter::new(target).unwrap()
}

#[tokio::test]
async fn posts_value_as_form_field() {
    let endpoint = Endpoint::default();
    let addr = serve(endpoint.clone()).await;

    submitter(addr, "/mobile")
        .submit(RoundedAngle::from_degrees(27.46))
        .await
        .unwrap();

    assert_eq!(
        *endpoint.received.lock().unwrap(),
        vec![("98765".to_string(), "27.5".to_string())]
    );
}

#[tokio::test]
async fn server_error_then_success() {
    let endpoint = Endpoint {
        statuses: Arc::new(Mutex::new(vec![500])),
        ..Endpoint::default()
    };
    let addr = serve(endpoint.clone()).await;
    let submitter = submitter(addr, "mobile/");

    let first = submitter.submit(RoundedAngle::from_degrees(12.0)).await;
    assert_eq!(first, Err(SubmissionError::Server { status: 500 }));

    submitter
        .submit(RoundedAngle::from_degrees(12.0))
        .await
        .unwrap();
    assert_eq!(endpoint.received.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_route_is_a_server_error() {
    let addr = serve(Endpoint::default()).await;

    let result = submitter(addr, "/elsewhere")
        .submit(RoundedAngle::from_degrees(1.0))
        .await;
    assert_eq!(result, Err(SubmissionError::Server { status: 404 }));
}
