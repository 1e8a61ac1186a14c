use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri},
    response::IntoResponse,
    routing::any,
    Router,
};
use fetch_builder::{
    ConfigStore, ErrorKind, FetchBuilder, FetchError, Payload, ReqwestTransport,
};
use serde_json::json;

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Duration,
    headers: Vec<(&'static str, &'static str)>,
}

impl MockResponse {
    fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::from_millis(0),
            headers: Vec::new(),
        }
    }

    fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
struct Received {
    content_type: Option<String>,
    query: Option<String>,
    body: String,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Received>>>,
}

async fn resource_handler(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .received
        .lock()
        .expect("received mutex must not be poisoned")
        .push(Received {
            content_type: headers
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            query: uri.query().map(str::to_owned),
            body,
        });

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "no mock response available")
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let mut headers = HeaderMap::new();
    for (name, value) in response.headers {
        headers.append(name, HeaderValue::from_static(value));
    }

    (response.status, headers, response.body)
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Received>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn resource_url(&self) -> String {
        format!("{}/resource", self.base_url)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<Received> {
        self.received
            .lock()
            .expect("received mutex must not be poisoned")
            .clone()
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        hits: Arc::new(AtomicUsize::new(0)),
        received: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/resource", any(resource_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        received: state.received,
        task,
    }
}

fn isolated(builder: FetchBuilder) -> FetchBuilder {
    builder
        .with_store(ConfigStore::new())
        .with_transport(ReqwestTransport::new())
}

#[tokio::test]
async fn get_decodes_json_body() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::OK, r#"{"a":1}"#)]).await;

    let response = isolated(FetchBuilder::get(server.resource_url()))
        .execute()
        .await
        .expect("request must succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.data, Payload::Json(json!({"a": 1})));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn retries_on_service_unavailable() {
    let server = spawn_server(vec![
        MockResponse::new(StatusCode::SERVICE_UNAVAILABLE, "busy"),
        MockResponse::new(StatusCode::OK, "ok"),
    ])
    .await;

    let response = isolated(FetchBuilder::get(server.resource_url()))
        .text()
        .max_retries(1)
        .retry_delay_ms(1)
        .execute()
        .await
        .expect("request must succeed after retry");

    assert_eq!(response.data, Payload::Text("ok".to_owned()));
    assert_eq!(response.attempts, 2);
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn not_found_is_reported_without_retry() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::NOT_FOUND, "missing")]).await;

    let err = isolated(FetchBuilder::get(server.resource_url()))
        .max_retries(3)
        .retry_delay_ms(1)
        .execute()
        .await
        .expect_err("request must fail");

    assert_eq!(
        err,
        FetchError::Http {
            status: 404,
            status_text: "Not Found".to_owned(),
        }
    );
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = spawn_server(vec![
        MockResponse::new(StatusCode::OK, "{}").with_delay(Duration::from_millis(300))
    ])
    .await;

    let err = isolated(FetchBuilder::get(server.resource_url()))
        .timeout_ms(20)
        .max_retries(2)
        .execute()
        .await
        .expect_err("request must time out");

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind probe listener");
    let address = listener.local_addr().expect("must have local addr");
    drop(listener);

    let err = isolated(FetchBuilder::get(format!("http://{address}/resource")))
        .max_retries(1)
        .retry_delay_ms(1)
        .execute()
        .await
        .expect_err("request must fail");

    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn structured_body_and_query_reach_the_server() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::CREATED, r#"{"id":7}"#)]).await;

    let response = isolated(FetchBuilder::post(server.resource_url(), json!({"name": "kit"})))
        .transport_option("query", json!({"dry_run": true}))
        .execute()
        .await
        .expect("request must succeed");

    assert_eq!(response.status, 201);
    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(received[0].query.as_deref(), Some("dry_run=true"));
    assert_eq!(received[0].body, r#"{"name":"kit"}"#);
}

#[tokio::test]
async fn text_body_is_sent_verbatim() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::OK, "done")]).await;

    isolated(FetchBuilder::put(server.resource_url(), "raw=1"))
        .text()
        .execute()
        .await
        .expect("request must succeed");

    let received = server.received();
    assert_eq!(received[0].body, "raw=1");
    assert_eq!(received[0].content_type, None);
}

#[tokio::test]
async fn repeated_response_headers_survive_the_transport() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::OK, "{}")
        .with_header("set-cookie", "session=a")
        .with_header("set-cookie", "theme=dark")])
    .await;

    let response = isolated(FetchBuilder::get(server.resource_url()))
        .execute()
        .await
        .expect("request must succeed");

    assert_eq!(
        response.headers.get_all("Set-Cookie"),
        vec!["session=a", "theme=dark"]
    );
}
