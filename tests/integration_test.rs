// Integration tests for Storefront Gateway
//
// These tests drive the real reqwest transport against a mock backend and
// verify credential attachment, refresh and the typed endpoint wrappers.

use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

use storefront_gateway::{
    api,
    auth::{CredentialStore, SessionEvent, TokenPair},
    error::{ApiError, RefreshError},
    http_client::{AuthClient, PipelineConfig},
    models::{
        CreateOrderRequest, CreateProductRequest, EditProductRequest, OrderItem, OrderStatus,
        PageRequest, SignInRequest,
    },
    transport::ReqwestTransport,
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

fn create_client(base_url: &str) -> AuthClient {
    let transport = ReqwestTransport::new(4, 5, 10).expect("Failed to create transport");
    AuthClient::new(
        PipelineConfig::new(base_url),
        Arc::new(transport),
        CredentialStore::in_memory(),
    )
}

fn store_tokens(client: &AuthClient, access: &str, refresh: &str) {
    client
        .credentials()
        .store_pair(&TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        })
        .unwrap();
}

// ==================================================================================================
// Authentication
// ==================================================================================================

#[tokio::test]
async fn test_sign_in_skips_auth_and_stores_token() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    // A stale token must not leak onto the sign-in call
    client.credentials().set_access_token("stale").unwrap();

    let sign_in = server
        .mock("POST", "/user/auth/sign-in")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "username": "ana", "password": "secret" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": { "token": "T1" } }).to_string())
        .expect(1)
        .create_async()
        .await;

    let profile = server
        .mock("GET", "/user/user/me")
        .match_header("authorization", "Bearer T1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": { "id": "u1", "name": "Ana", "address": "Lisbon" } }).to_string())
        .expect(1)
        .create_async()
        .await;

    let user = api::auth::sign_in_with_profile(
        &client,
        &SignInRequest {
            username: "ana".to_string(),
            password: "secret".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(user.name, "Ana");
    assert_eq!(
        client.credentials().access_token().unwrap().as_deref(),
        Some("T1")
    );
    sign_in.assert_async().await;
    profile.assert_async().await;
}

#[tokio::test]
async fn test_sign_in_failure_surfaces_backend_message() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());

    let sign_in = server
        .mock("POST", "/user/auth/sign-in")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Invalid email or password", "code": 401 }).to_string())
        .expect(1)
        .create_async()
        .await;

    let err = api::auth::sign_in(
        &client,
        &SignInRequest {
            username: "ana".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await
    .unwrap_err();

    match err {
        ApiError::Unauthorized { message } => assert_eq!(message, "Invalid email or password"),
        other => panic!("unexpected error: {:?}", other),
    }
    sign_in.assert_async().await;
}

#[tokio::test]
async fn test_sign_up_skips_auth() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let sign_up = server
        .mock("POST", "/user/auth/sign-up")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({
            "username": "ana",
            "password": "secret",
            "name": "Ana"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": "User registered successfully" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let message = api::auth::sign_up(
        &client,
        &json!({ "username": "ana", "password": "secret", "name": "Ana" }),
    )
    .await
    .unwrap();

    assert_eq!(message, json!("User registered successfully"));
    sign_up.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let expired = server
        .mock("GET", "/user/user/me")
        .match_header("authorization", "Bearer T1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let refresh = server
        .mock("POST", "/user/auth/refresh")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "refreshToken": "R1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": { "accessToken": "T2", "refreshToken": "R2" } }).to_string())
        .expect(1)
        .create_async()
        .await;

    let replay = server
        .mock("GET", "/user/user/me")
        .match_header("authorization", "Bearer T2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "u1", "name": "Ana", "address": "Lisbon" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let user = api::auth::my_profile(&client).await.unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(
        client.credentials().access_token().unwrap().as_deref(),
        Some("T2")
    );
    assert_eq!(
        client.credentials().refresh_token().unwrap().as_deref(),
        Some("R2")
    );
    expired.assert_async().await;
    refresh.assert_async().await;
    replay.assert_async().await;
}

#[tokio::test]
async fn test_refresh_failure_wipes_credentials_and_emits_event() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");
    let mut events = client.subscribe();

    let _expired = server
        .mock("GET", "/order/orders")
        .with_status(401)
        .create_async()
        .await;

    let refresh = server
        .mock("POST", "/user/auth/refresh")
        .with_status(500)
        .with_body("refresh backend down")
        .expect(1)
        .create_async()
        .await;

    let err = api::orders::list_orders(&client, PageRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Refresh(RefreshError::Rejected { status: 500, .. })
    ));
    assert_eq!(client.credentials().access_token().unwrap(), None);
    assert_eq!(client.credentials().refresh_token().unwrap(), None);
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Expired {
            sign_in_path: "/auth".to_string(),
            reason: "refresh rejected: 500 - refresh backend down".to_string(),
        }
    );
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Nothing listens on the discard port
    let client = create_client("http://127.0.0.1:9");
    store_tokens(&client, "T1", "R1");

    let err = api::auth::my_profile(&client).await.unwrap_err();

    assert_eq!(err.kind(), "network_error");
    assert_eq!(
        err.to_json(),
        json!({
            "type": "network_error",
            "message": "Network error. Please check your connection."
        })
    );
    assert!(!client.is_refreshing());
}

// ==================================================================================================
// Products & Orders
// ==================================================================================================

#[tokio::test]
async fn test_list_products_sends_pagination() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let products = server
        .mock("GET", "/product/products")
        .match_header("authorization", "Bearer T1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pageNo".into(), "1".into()),
            Matcher::UrlEncoded("pageSz".into(), "2".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": {
                    "content": [{
                        "id": "p-1",
                        "name": "Mug",
                        "description": "Ceramic",
                        "price": 9.5,
                        "stock": 12,
                        "createdAt": "2025-01-12T10:30:00Z"
                    }],
                    "totalElements": 3,
                    "totalPages": 2,
                    "number": 1,
                    "size": 2,
                    "numberOfElements": 1,
                    "last": true
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let page = api::products::list_products(&client, PageRequest::new(1, 2))
        .await
        .unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].name, "Mug");
    assert_eq!(page.content[0].image_url, None);
    assert!(!page.has_next());
    products.assert_async().await;
}

fn product_json(name: &str, stock: i64) -> serde_json::Value {
    json!({
        "data": {
            "id": "p-1",
            "name": name,
            "description": "Ceramic",
            "price": 9.5,
            "stock": stock,
            "createdAt": "2025-01-12T10:30:00Z"
        }
    })
}

#[tokio::test]
async fn test_create_product_posts_payload() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let create = server
        .mock("POST", "/product/products")
        .match_header("authorization", "Bearer T1")
        .match_body(Matcher::Json(json!({
            "name": "Mug",
            "price": 9.5,
            "description": "Ceramic",
            "stock": 12
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(product_json("Mug", 12).to_string())
        .expect(1)
        .create_async()
        .await;

    let product = api::products::create_product(
        &client,
        &CreateProductRequest {
            name: "Mug".to_string(),
            price: 9.5,
            description: "Ceramic".to_string(),
            stock: 12,
        },
    )
    .await
    .unwrap();

    assert_eq!(product.id, "p-1");
    assert_eq!(product.stock, 12);
    create.assert_async().await;
}

#[tokio::test]
async fn test_update_product_patches_by_id() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let update = server
        .mock("PATCH", "/product/products/p-1")
        .match_header("authorization", "Bearer T1")
        .match_body(Matcher::Json(json!({
            "name": "Large mug",
            "price": 9.5,
            "description": "Ceramic",
            "stock": 3
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(product_json("Large mug", 3).to_string())
        .expect(1)
        .create_async()
        .await;

    let product = api::products::update_product(
        &client,
        "p-1",
        &EditProductRequest {
            name: "Large mug".to_string(),
            price: 9.5,
            description: "Ceramic".to_string(),
            stock: 3,
        },
    )
    .await
    .unwrap();

    assert_eq!(product.name, "Large mug");
    assert_eq!(product.stock, 3);
    update.assert_async().await;
}

#[tokio::test]
async fn test_delete_missing_product_passes_status_through() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let delete = server
        .mock("DELETE", "/product/products/p-404")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Product not found", "code": 404 }).to_string())
        .expect(1)
        .create_async()
        .await;

    let err = api::products::delete_product(&client, "p-404")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "HTTP error: 404 - Product not found");
    assert_eq!(err.response().and_then(|r| r.error_code()), Some(404));
    delete.assert_async().await;
}

#[tokio::test]
async fn test_create_order_and_list_orders() {
    let mut server = Server::new_async().await;
    let client = create_client(&server.url());
    store_tokens(&client, "T1", "R1");

    let create = server
        .mock("POST", "/order/orders")
        .match_header("authorization", "Bearer T1")
        .match_body(Matcher::Json(json!({
            "customerName": "Ana",
            "items": [{ "productId": "p-1", "quantity": 2 }]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": {
                    "id": "o-1",
                    "customerName": "Ana",
                    "items": [{ "productId": "p-1", "quantity": 2 }],
                    "createdAt": "2025-01-12T10:30:00Z"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let list = server
        .mock("GET", "/order/orders")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pageNumber".into(), "0".into()),
            Matcher::UrlEncoded("pageSize".into(), "10".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": {
                    "content": [{
                        "id": "o-1",
                        "customerName": "Ana",
                        "status": "PENDING",
                        "totalPrice": 19.0,
                        "createdAt": "2025-01-12T10:30:00Z"
                    }],
                    "totalElements": 1,
                    "totalPages": 1,
                    "number": 0,
                    "size": 10,
                    "numberOfElements": 1
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let placed = api::orders::create_order(
        &client,
        &CreateOrderRequest {
            customer_name: "Ana".to_string(),
            items: vec![OrderItem {
                product_id: "p-1".to_string(),
                quantity: 2,
            }],
        },
    )
    .await
    .unwrap();
    assert_eq!(placed.id, "o-1");

    let page = api::orders::list_orders(&client, PageRequest::new(0, 10))
        .await
        .unwrap();
    assert_eq!(page.content[0].status, OrderStatus::Pending);
    assert!(!page.has_next());

    create.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn test_sign_out_clears_credentials() {
    let client = create_client("http://localhost");
    store_tokens(&client, "T1", "R1");

    api::auth::sign_out(&client).unwrap();

    assert_eq!(client.credentials().access_token().unwrap(), None);
    assert_eq!(client.credentials().refresh_token().unwrap(), None);
}
