//! End-to-end controller flow: capture, dispatch to a `wiremock` backend, render.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quanbuy::capture::StoreSelection;
use quanbuy::controller::Completion;
use quanbuy::models::{SearchResult, SearchType, StoreRef};
use quanbuy::render::{SortKey, View};
use quanbuy::{AppController, Dispatcher, Outcome, Phase};

fn controller(server: &MockServer) -> AppController {
    let dispatcher = Dispatcher::new(&server.uri(), 5).expect("failed to build dispatcher");
    AppController::new(
        Arc::new(dispatcher),
        "flow-user",
        StoreSelection::with_presets([
            StoreRef::new("Amazon", "https://www.amazon.com"),
            StoreRef::new("Target", "https://www.target.com"),
        ]),
    )
}

fn result_named(query: &str) -> serde_json::Value {
    json!({
        "products": [
            {"name": format!("{query} deluxe"), "price": "$120.00", "store": "Amazon", "confidence": 0.4, "url": "https://a.example/1"},
            {"name": format!("{query} basic"), "price": "$15.50", "store": "Target", "confidence": 0.9, "url": "https://t.example/2"},
            {"name": format!("{query} plus"), "price": "$42", "store": "Amazon", "confidence": 0.7, "url": "https://a.example/3"}
        ],
        "total_found": 3,
        "stores_searched": 2,
        "search_query": query
    })
}

#[tokio::test]
async fn prompt_search_flows_to_sorted_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(result_named("mug")))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = controller(&server);
    app.prompt_mut().apply_transcript("ceramic", true);
    app.prompt_mut().apply_transcript("mug", true);
    app.set_sort(SortKey::PriceAsc);

    app.submit(SearchType::Prompt).unwrap();
    assert_eq!(app.phase(), Phase::AwaitingResponse);
    assert_eq!(app.view(), View::Loading);

    assert_eq!(app.next_event().await, Some(Phase::ShowingResults));
    let View::Products(grid) = app.view() else {
        panic!("expected products view, got {:?}", app.view());
    };
    let prices: Vec<_> = grid.products.iter().map(|p| p.price.as_str()).collect();
    assert_eq!(prices, vec!["$15.50", "$42", "$120.00"]);
    assert_eq!(grid.store_options, vec!["Amazon", "Target"]);
}

#[tokio::test]
async fn request_carries_photo_prompt_and_selected_stores() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .and(body_partial_json(json!({
            "search_type": "both",
            "image_data": "AQID",
            "prompt_text": "in green",
            "store_list": [{"name": "Target", "url": "https://www.target.com"}],
            "user_id": "flow-user"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(result_named("sofa")))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = controller(&server);
    app.upload_photo("image/png", vec![1u8, 2, 3]).await.unwrap();
    app.prompt_mut().set_text("in green");
    app.stores_mut().toggle("Amazon");

    app.submit(SearchType::Both).unwrap();
    assert_eq!(app.next_event().await, Some(Phase::ShowingResults));
}

#[tokio::test]
async fn blank_prompt_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(result_named("x")))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = controller(&server);
    app.prompt_mut().set_text("   ");
    assert!(app.submit(SearchType::Prompt).is_err());
    assert_eq!(app.next_event().await, None);
}

#[tokio::test]
async fn error_payload_shows_error_and_waits_for_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "timeout"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = controller(&server);
    app.prompt_mut().set_text("headphones");
    app.submit(SearchType::Prompt).unwrap();

    assert_eq!(app.next_event().await, Some(Phase::ShowingError));
    assert_eq!(
        app.view(),
        View::Error {
            message: "timeout".to_string()
        }
    );

    // nothing further is dispatched while the error is shown
    assert_eq!(app.next_event().await, None);
    tokio::time::sleep(Duration::from_millis(50)).await;

    app.retry();
    assert_eq!(app.phase(), Phase::Idle);
    assert!(app.prompt().is_blank());
}

#[tokio::test]
async fn http_failure_shows_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut app = controller(&server);
    app.prompt_mut().set_text("headphones");
    app.submit(SearchType::Prompt).unwrap();

    assert_eq!(app.next_event().await, Some(Phase::ShowingError));
    assert!(app.view().is_error());
    assert!(app.view().to_string().contains("HTTP 502 Bad Gateway"));
}

#[tokio::test]
async fn newer_request_wins_when_older_response_arrives_later() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .and(body_partial_json(json!({"prompt_text": "slow"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(result_named("slow"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .and(body_partial_json(json!({"prompt_text": "fast"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(result_named("fast")))
        .mount(&server)
        .await;

    let mut app = controller(&server);
    app.prompt_mut().set_text("slow");
    let first = app.submit(SearchType::Prompt).unwrap();
    app.prompt_mut().set_text("fast");
    let second = app.submit(SearchType::Prompt).unwrap();
    assert!(second > first);

    assert_eq!(app.next_event().await, Some(Phase::ShowingResults));

    // the older request's reply turns up after the newer one was shown
    let late: SearchResult = serde_json::from_value(result_named("slow")).unwrap();
    assert!(!app.apply(Completion {
        ticket: first,
        outcome: Outcome::Search(late),
    }));

    // nothing else is queued once the superseded task was aborted
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(app.next_event().await, None);

    let View::Products(grid) = app.view() else {
        panic!("expected products view");
    };
    assert_eq!(grid.search_query.as_deref(), Some("fast"));
    assert!(grid.products.iter().all(|p| p.name.starts_with("fast")));
}
