//! Integration tests for `Dispatcher` against a `wiremock` backend.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quanbuy::Dispatcher;
use quanbuy::models::{SearchRequest, SearchType, StoreRef, StyleRequest};

fn prompt_request(text: &str) -> SearchRequest {
    SearchRequest {
        search_type: SearchType::Prompt,
        image_data: None,
        prompt_text: Some(text.to_string()),
        store_list: vec![StoreRef::new("Target", "https://www.target.com")],
        user_id: "user-1".to_string(),
    }
}

fn style_request() -> StyleRequest {
    StyleRequest {
        image_base64: "aGVsbG8=".to_string(),
        user_question: "What shoes go with this?".to_string(),
        occasion: "wedding".to_string(),
        budget_range: "$50-150".to_string(),
        user_id: "user-1".to_string(),
    }
}

#[tokio::test]
async fn search_posts_request_and_parses_products() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .and(body_partial_json(json!({
            "search_type": "prompt",
            "prompt_text": "rain jacket",
            "store_list": [{"name": "Target", "url": "https://www.target.com"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "name": "Packable rain jacket",
                "price": "$49.99",
                "store": "Target",
                "confidence": 0.87,
                "url": "https://www.target.com/p/1"
            }],
            "total_found": 1,
            "stores_searched": 1,
            "search_query": "rain jacket"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(&server.uri(), 5).unwrap();
    let result = dispatcher.search(&prompt_request("rain jacket")).await;

    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert_eq!(result.products.len(), 1);
    assert_eq!(result.products[0].store, "Target");
    assert_eq!(result.search_query.as_deref(), Some("rain jacket"));
}

#[tokio::test]
async fn non_success_status_becomes_error_result_with_status_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(&server.uri(), 5).unwrap();
    let result = dispatcher.search(&prompt_request("lamp")).await;

    assert_eq!(result.error.as_deref(), Some("HTTP 503 Service Unavailable"));
    assert!(result.products.is_empty());
}

#[tokio::test]
async fn unparseable_body_becomes_error_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search-products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(&server.uri(), 5).unwrap();
    let result = dispatcher.search(&prompt_request("lamp")).await;

    let error = result.error.expect("expected an error result");
    assert!(error.starts_with("Invalid response body"), "got: {error}");
}

#[tokio::test]
async fn transport_failure_becomes_error_result() {
    // port 9 (discard) is not listening in test environments
    let dispatcher = Dispatcher::new("http://127.0.0.1:9", 2).unwrap();
    let result = dispatcher.search(&prompt_request("lamp")).await;

    assert!(result.error.is_some());
    assert!(result.products.is_empty());
}

#[tokio::test]
async fn analyze_style_applies_default_confidence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze-style"))
        .and(body_partial_json(json!({"occasion": "wedding", "user_id": "user-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analysis": "A soft pastel look",
            "recommendations": [{"id": "r1", "name": "Nude heels", "price": "$80", "reason": "Elongates"}],
            "persuasion_points": ["Keep accessories minimal"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(&server.uri(), 5).unwrap();
    let result = dispatcher.analyze_style(&style_request()).await;

    assert!(result.error.is_none());
    assert_eq!(result.confidence_score, 0.9);
    assert_eq!(result.recommendations[0].name, "Nude heels");
}

#[tokio::test]
async fn analyze_style_failure_is_reported_in_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze-style"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(&server.uri(), 5).unwrap();
    let result = dispatcher.analyze_style(&style_request()).await;

    assert_eq!(result.error.as_deref(), Some("HTTP 500 Internal Server Error"));
}
