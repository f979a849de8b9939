///  To run :
///  cargo r --example client_demo
use reqwest::StatusCode;
use shop_client::{CreateOrderRequest, ListOrdersQuery, ShopClient};
use shop_hex::application::order_service::OrderService;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_hex::ports::catalog_store::CatalogStore;
use shop_hex::ports::identity_store::IdentityStore;
use shop_repo::build_store;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("shop.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let store = build_store(Some(&db_url)).await?;

    // Seed one user with a token and a small catalog.
    let user = store.add_user("demo", "demo@example.com").await?;
    let token = store.issue_token(user.id).await?;
    let tech = store.add_category("technology").await?;
    let mouse = store.add_product("mouse", 100, &[tech.id]).await?;

    let service = OrderService::new(store);
    let server = HttpServer::new(
        service,
        HttpServerConfig {
            port: port.to_string(),
            page_size: 10,
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Use client against the running server.
    let client = ShopClient::builder(&addr)?.with_token(&token)?.build()?;
    let created = client
        .create_order(CreateOrderRequest {
            products_id: vec![mouse.id],
            user: user.id,
        })
        .await?;
    println!("Created order id={}", created.id);
    assert_eq!(created.product[0].title, "mouse");

    let page = client.list_orders(ListOrdersQuery::default()).await?;
    println!("Listing holds {} order(s)", page.count);
    assert_eq!(page.results[0].product[0].category[0].title, "technology");

    // Unknown product ids are rejected with a 400, nothing is written.
    match client
        .create_order(CreateOrderRequest {
            products_id: vec![mouse.id + 999],
            user: user.id,
        })
        .await
    {
        Ok(_) => anyhow::bail!("expected a validation failure"),
        Err(err) => {
            let status = err
                .downcast_ref::<reqwest::Error>()
                .and_then(|e| e.status());
            assert_eq!(status, Some(StatusCode::BAD_REQUEST));
            println!("Unknown product rejected as expected");
        }
    }

    let after = client.list_orders(ListOrdersQuery::default()).await?;
    assert_eq!(after.count, 1);

    handle.abort();
    Ok(())
}
