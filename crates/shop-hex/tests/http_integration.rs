use shop_hex::application::order_service::OrderService;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::memory::InMemoryStore;
use shop_types::domain::catalog::Product;
use shop_types::domain::user::User;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::{OrderListQuery, OrderRepository};

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn serve(store: InMemoryStore) -> String {
    let port = find_free_port();
    let service = OrderService::new(store);
    let server = HttpServer::new(
        service,
        HttpServerConfig {
            port: port.to_string(),
            page_size: 10,
        },
    )
    .await
    .unwrap();

    tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

struct Seeded {
    store: InMemoryStore,
    user: User,
    token: String,
    product: Product,
}

/// One user with a live token, the "technology" category, and a "mouse"
/// product priced 100.
async fn seeded() -> Seeded {
    let store = InMemoryStore::new();
    let user = store.add_user("carl", "carl@example.com").await.unwrap();
    let token = store.issue_token(user.id).await.unwrap();
    let category = store.add_category("technology").await.unwrap();
    let product = store
        .add_product("mouse", 100, &[category.id])
        .await
        .unwrap();
    Seeded {
        store,
        user,
        token,
        product,
    }
}

#[tokio::test]
async fn listing_exposes_nested_product_titles() {
    let s = seeded().await;
    s.store.create(s.user.id, &[s.product.id]).await.unwrap();
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["results"][0]["product"][0]["title"], "mouse");
    assert_eq!(body["results"][0]["product"][0]["price"], 100);
    assert_eq!(
        body["results"][0]["product"][0]["category"][0]["title"],
        "technology"
    );
    assert_eq!(body["results"][0]["user"], s.user.id);
    assert_eq!(body["count"], 1);
    assert!(body["next"].is_null());
    assert!(body["previous"].is_null());
}

#[tokio::test]
async fn creating_an_order_links_user_and_product() {
    let s = seeded().await;
    let new_product = s.store.add_product("keyboard", 250, &[]).await.unwrap();
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Token {}", s.token))
        .json(&serde_json::json!({
            "products_id": [new_product.id],
            "user": s.user.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["user"], s.user.id);
    assert_eq!(created["product"][0]["id"], new_product.id);

    // A lookup of that exact (user, product) pair succeeds.
    let listing = s
        .store
        .list(OrderListQuery {
            user_id: Some(s.user.id),
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();
    assert!(listing
        .orders
        .iter()
        .any(|o| o.id == created["id"].as_i64().unwrap()
            && o.product_ids == vec![new_product.id]));
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let s = seeded().await;
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();

    let missing = client.get(format!("{addr}/v1/orders")).send().await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::UNAUTHORIZED);

    let wrong_scheme = client
        .get(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Bearer {}", s.token))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_scheme.status(), reqwest::StatusCode::UNAUTHORIZED);

    let unknown_key = client
        .post(format!("{addr}/v1/orders"))
        .header("Authorization", "Token 0000")
        .json(&serde_json::json!({
            "products_id": [s.product.id],
            "user": s.user.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_key.status(), reqwest::StatusCode::UNAUTHORIZED);

    // The rejected create never reached the repository.
    let listing = s
        .store
        .list(OrderListQuery {
            user_id: None,
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
}

#[tokio::test]
async fn empty_product_list_is_a_bad_request() {
    let s = seeded().await;
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Token {}", s.token))
        .json(&serde_json::json!({ "products_id": [], "user": s.user.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["field"], "products_id");

    let listing = s
        .store
        .list(OrderListQuery {
            user_id: None,
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
}

#[tokio::test]
async fn unknown_product_ids_are_reported() {
    let s = seeded().await;
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Token {}", s.token))
        .json(&serde_json::json!({
            "products_id": [s.product.id, 999],
            "user": s.user.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["field"], "products_id");
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let s = seeded().await;
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Token {}", s.token))
        .header("Content-Type", "application/json")
        .body(r#"{"products_id": "mouse"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_params_are_a_bad_request() {
    let s = seeded().await;
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{addr}/v1/orders?limit=abc"))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    // Same JSON error shape as a malformed body, not the extractor's
    // plain-text default.
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["field"], "query");
}

#[tokio::test]
async fn ordering_for_another_user_is_forbidden() {
    let s = seeded().await;
    let other = s.store.add_user("mallory", "m@example.com").await.unwrap();
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{addr}/v1/orders"))
        .header("Authorization", format!("Token {}", s.token))
        .json(&serde_json::json!({
            "products_id": [s.product.id],
            "user": other.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_pages_carry_next_and_previous_links() {
    let s = seeded().await;
    for _ in 0..3 {
        s.store.create(s.user.id, &[s.product.id]).await.unwrap();
    }
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let first: serde_json::Value = client
        .get(format!("{addr}/v1/orders?limit=2"))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["count"], 3);
    assert_eq!(first["results"].as_array().unwrap().len(), 2);
    assert_eq!(first["next"], "/v1/orders?limit=2&offset=2");
    assert!(first["previous"].is_null());

    let second: serde_json::Value = client
        .get(format!("{addr}{}", first["next"].as_str().unwrap()))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["results"].as_array().unwrap().len(), 1);
    assert!(second["next"].is_null());
    assert_eq!(second["previous"], "/v1/orders?limit=2&offset=0");

    // Filtering by user rides along in the page links.
    let filtered: serde_json::Value = client
        .get(format!("{addr}/v1/orders?limit=2&user={}", s.user.id))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered["count"], 3);
    assert_eq!(
        filtered["next"],
        format!("/v1/orders?limit=2&offset=2&user={}", s.user.id)
    );

    let zero_limit = client
        .get(format!("{addr}/v1/orders?limit=0"))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap();
    assert_eq!(zero_limit.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn an_extreme_paging_window_returns_a_well_formed_page() {
    let s = seeded().await;
    s.store.create(s.user.id, &[s.product.id]).await.unwrap();
    let addr = serve(s.store.clone()).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{addr}/v1/orders?limit={}&offset=1", i64::MAX))
        .header("Authorization", format!("Token {}", s.token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    assert!(body["next"].is_null());
    assert_eq!(
        body["previous"],
        format!("/v1/orders?limit={}&offset=0", i64::MAX)
    );
}

#[tokio::test]
async fn health_needs_no_token() {
    let s = seeded().await;
    let addr = serve(s.store).await;

    let res = reqwest::get(format!("{addr}/health")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
