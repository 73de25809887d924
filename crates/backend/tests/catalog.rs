//! Integration tests for product table access using wiremock HTTP mocks.

use curio_backend::{BackendClient, BackendConfig, BackendError, BearerToken};
use curio_core::{Category, CategoryFilter, Price, ProductDraft, ProductId};
use secrecy::SecretString;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> BackendClient {
    let config = BackendConfig::new(base_url, SecretString::from("anon-test-key"))
        .expect("config should parse");
    BackendClient::new(&config).expect("client construction should not fail")
}

fn row(id: i64, title: &str, category: &str, created_at: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "Vinyl figure",
        "price": 450.5,
        "image_url": format!("https://cdn.test/{id}.png"),
        "images": [format!("https://cdn.test/{id}.png")],
        "category": category,
        "created_at": created_at
    })
}

#[tokio::test]
async fn list_products_orders_newest_first_with_anon_key() {
    let server = MockServer::start().await;
    let body = serde_json::json!([
        row(2, "Chum", "figure", "2025-02-01T00:00:00Z"),
        row(1, "Urge", "art", "2025-01-01T00:00:00Z"),
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-test-key"))
        .and(header("authorization", "Bearer anon-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client(&server.uri())
        .list_products(CategoryFilter::All)
        .await
        .expect("should list products");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].title, "Chum");
    assert_eq!(products[0].price.to_string(), "450.50");
    assert_eq!(products[1].category, Category::Art);
}

#[tokio::test]
async fn list_products_filters_by_category() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("category", "eq.figure"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([row(3, "BFF", "figure", "2025-03-01T00:00:00Z")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client(&server.uri())
        .list_products(CategoryFilter::Only(Category::Figure))
        .await
        .expect("should list figures");
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn get_product_missing_row_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .get_product(ProductId::new(99))
        .await
        .expect_err("missing product should fail");
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn create_product_sends_draft_with_admin_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/products"))
        .and(header("authorization", "Bearer admin-access"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({
            "title": "Chum",
            "image_url": "https://cdn.test/a.png",
            "images": ["https://cdn.test/a.png", "https://cdn.test/b.png"],
            "category": "figure"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([row(7, "Chum", "figure", "2025-04-01T00:00:00Z")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let draft = ProductDraft {
        title: "Chum".to_string(),
        description: "Glow".to_string(),
        price: Price::from(450),
        images: vec!["https://cdn.test/a.png".into(), "https://cdn.test/b.png".into()],
        category: Category::Figure,
    };
    let product = test_client(&server.uri())
        .create_product(&BearerToken::new("admin-access"), &draft)
        .await
        .expect("should create product");
    assert_eq!(product.id, ProductId::new(7));
}

#[tokio::test]
async fn write_rejected_by_policy_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .update_product(
            &BearerToken::new("stale"),
            ProductId::new(7),
            &ProductDraft::default(),
        )
        .await
        .expect_err("expired token should fail");
    assert!(err.is_auth());
    assert_eq!(err.to_string(), "Unauthorized: JWT expired");
}

#[tokio::test]
async fn delete_product_reports_missing_rows() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([row(5, "Gone", "figure", "2025-01-01T00:00:00Z")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let token = BearerToken::new("admin-access");
    client
        .delete_product(&token, ProductId::new(5))
        .await
        .expect("existing row should delete");
    let err = client
        .delete_product(&token, ProductId::new(6))
        .await
        .expect_err("missing row should fail");
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .list_products(CategoryFilter::All)
        .await
        .expect_err("503 should fail");
    assert!(matches!(err, BackendError::Api { status: 503, .. }));
}
