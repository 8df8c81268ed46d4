//! Operation lifecycle tests against a local mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use beacon_net::{
    BackendConfig, MemoryTokenStore, Method, NetError, NetworkOperation, OperationHandle,
    OperationQueue, OperationState, RequestDescriptor, TokenStore,
};

fn operation_for(server: &MockServer, endpoint: &str) -> NetworkOperation {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = Arc::new(BackendConfig::new(&server.uri()).unwrap());
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let descriptor = RequestDescriptor::builder(endpoint, Method::Get).build();
    NetworkOperation::new(config, tokens, descriptor).unwrap()
}

async fn wait_for_terminal(handle: &OperationHandle) -> OperationState {
    for _ in 0..300 {
        let state = handle.state();
        if state.is_terminal() {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.state()
}

#[tokio::test]
async fn successful_run_walks_ready_executing_finished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let transitions: Arc<Mutex<Vec<(OperationState, OperationState)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let received: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&received);
    let operation = operation_for(&server, "/ok").on_success(move |value| {
        *sink.lock() = value;
    });

    let handle = operation.handle();
    assert_eq!(handle.state(), OperationState::Ready);

    let log = Arc::clone(&transitions);
    handle.observe(move |from, to| log.lock().push((from, to)));

    operation.start().await.unwrap();

    assert_eq!(handle.state(), OperationState::Finished);
    assert_eq!(*received.lock(), Some(json!({"ok": true})));
    assert_eq!(
        *transitions.lock(),
        vec![
            (OperationState::Ready, OperationState::Executing),
            (OperationState::Executing, OperationState::Finished),
        ]
    );
}

#[tokio::test]
async fn failure_status_invokes_failure_callback_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/denied"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let failures = Arc::new(AtomicUsize::new(0));
    let successes = Arc::new(AtomicUsize::new(0));

    let failure_count = Arc::clone(&failures);
    let success_count = Arc::clone(&successes);
    let operation = operation_for(&server, "/denied")
        .on_success(move |_| {
            success_count.fetch_add(1, Ordering::SeqCst);
        })
        .on_failure(move |err| {
            assert!(matches!(err, NetError::Status { code: 403, .. }));
            failure_count.fetch_add(1, Ordering::SeqCst);
        });

    let handle = operation.handle();
    operation.start().await.unwrap();

    // The operation finished through its own completion path even though
    // the call failed.
    assert_eq!(handle.state(), OperationState::Finished);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(successes.load(Ordering::SeqCst), 0);
}

/// Cancelling mid-flight suppresses both callbacks and parks the state at
/// Cancelled.
#[tokio::test]
async fn cancel_mid_flight_suppresses_callbacks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"late": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let callbacks = Arc::new(AtomicUsize::new(0));
    let success_count = Arc::clone(&callbacks);
    let failure_count = Arc::clone(&callbacks);

    let operation = operation_for(&server, "/slow")
        .on_success(move |_| {
            success_count.fetch_add(1, Ordering::SeqCst);
        })
        .on_failure(move |_| {
            failure_count.fetch_add(1, Ordering::SeqCst);
        });

    let handle = OperationQueue::new().enqueue(operation);
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();

    assert_eq!(wait_for_terminal(&handle).await, OperationState::Cancelled);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(callbacks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_before_start_blocks_the_run() {
    let server = MockServer::start().await;
    let operation = operation_for(&server, "/never");
    let handle = operation.handle();

    handle.cancel();
    assert_eq!(handle.state(), OperationState::Cancelled);

    let result = operation.start().await;
    assert!(matches!(
        result,
        Err(NetError::InvalidTransition { from: OperationState::Cancelled, event: "start" })
    ));
    assert_eq!(handle.state(), OperationState::Cancelled);
}

#[tokio::test]
async fn cancel_after_finish_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let operation = operation_for(&server, "/ok");
    let handle = operation.handle();
    operation.start().await.unwrap();
    assert_eq!(handle.state(), OperationState::Finished);

    handle.cancel();
    assert_eq!(handle.state(), OperationState::Finished);
}

#[tokio::test]
async fn cancelling_twice_reports_cancelled_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let cancel_events = Arc::new(AtomicUsize::new(0));

    let operation = operation_for(&server, "/slow");
    let handle = OperationQueue::new().enqueue(operation);

    let counter = Arc::clone(&cancel_events);
    handle.observe(move |_, to| {
        if to == OperationState::Cancelled {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();
    handle.cancel();

    assert_eq!(wait_for_terminal(&handle).await, OperationState::Cancelled);
    assert_eq!(cancel_events.load(Ordering::SeqCst), 1);
}
