//! Integration tests for retailer reads against a mocked `PostgREST`.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use retailmap_core::UrlOverrides;
use retailmap_supabase::{SupabaseClient, SupabaseError};

fn test_client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&server.uri(), "anon-key", 5).expect("failed to build test client")
}

fn retailer_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "address": "12 MG Road",
        "latitude": 12.97,
        "longitude": "77.59",
        "retailer_status": "Active",
        "is_active": true,
        "last_visit_date": "2024-05-30T10:00:00+00:00",
        "next_scheduled_visit": null
    })
}

#[tokio::test]
async fn fetch_all_retailers_sends_auth_headers_and_ordering() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(query_param("select", "*"))
        .and(query_param("order", "name.asc"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([retailer_json("r1", "Alpha"), retailer_json("r2", "Beta")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retailers = test_client(&server)
        .fetch_all_retailers(&UrlOverrides::default())
        .await
        .expect("fetch should succeed");

    assert_eq!(retailers.len(), 2);
    assert_eq!(retailers[0].name, "Alpha");
    assert_eq!(retailers[0].longitude, Some(77.59));
    assert!(retailers[0].last_visit_date.is_some());
}

#[tokio::test]
async fn fetch_all_retailers_pages_until_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([retailer_json("r1", "A"), retailer_json("r2", "B")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("offset", "2"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([retailer_json("r3", "C")])))
        .expect(1)
        .mount(&server)
        .await;

    let retailers = test_client(&server)
        .with_page_size(2)
        .fetch_all_retailers(&UrlOverrides::default())
        .await
        .expect("fetch should succeed");

    let ids: Vec<&str> = retailers.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);
}

#[tokio::test]
async fn fetch_all_retailers_stops_on_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([retailer_json("r1", "A"), retailer_json("r2", "B")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let retailers = test_client(&server)
        .with_page_size(2)
        .fetch_all_retailers(&UrlOverrides::default())
        .await
        .expect("fetch should succeed");
    assert_eq!(retailers.len(), 2);
}

#[tokio::test]
async fn overrides_become_escaped_ilike_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("darkstore", "ilike.BLR\\_01"))
        .and(query_param("sk_id", "ilike.SK42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([retailer_json("r1", "A")])))
        .expect(1)
        .mount(&server)
        .await;

    let overrides = UrlOverrides {
        darkstore: Some("BLR_01".to_string()),
        sk_id: Some("SK42".to_string()),
        buying_category: None,
    };
    let retailers = test_client(&server)
        .fetch_all_retailers(&overrides)
        .await
        .expect("filtered fetch should succeed");
    assert_eq!(retailers.len(), 1);
}

#[tokio::test]
async fn failed_second_page_discards_everything() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([retailer_json("r1", "A"), retailer_json("r2", "B")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key",
            "hint": "Double check your Supabase `anon` or `service_role` API key."
        })))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .with_page_size(2)
        .fetch_all_retailers(&UrlOverrides::default())
        .await;

    match result {
        Err(SupabaseError::UnexpectedStatus {
            status, message, ..
        }) => {
            assert_eq!(status, 401);
            assert!(message.starts_with("Invalid API key"), "message: {message}");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([retailer_json("r1", "A")])))
        .mount(&server)
        .await;

    let retailers = test_client(&server)
        .with_retry(2, 0)
        .fetch_all_retailers(&UrlOverrides::default())
        .await
        .expect("retry should recover from 429");
    assert_eq!(retailers.len(), 1);
}

#[tokio::test]
async fn rate_limit_without_retries_surfaces_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .fetch_all_retailers(&UrlOverrides::default())
        .await;
    assert!(matches!(
        result,
        Err(SupabaseError::RateLimited {
            retry_after_secs: 17
        })
    ));
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .fetch_all_retailers(&UrlOverrides::default())
        .await;
    assert!(matches!(result, Err(SupabaseError::Deserialize { .. })));
}

#[tokio::test]
async fn fetch_retailer_categories_decodes_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/retailer_categories"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Active", "color_hex": "#00AA00", "icon_name": "map-pin"},
            {"id": 2, "name": "Dormant", "color_hex": "#777777", "icon_name": null}
        ])))
        .mount(&server)
        .await;

    let categories = test_client(&server)
        .fetch_retailer_categories()
        .await
        .expect("categories should decode");
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].name, "Dormant");
    assert!(categories[1].icon_name.is_none());
}
