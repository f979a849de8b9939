use shop_hex::application::order_service::OrderService;
use shop_hex::config::Config;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_hex::ports::catalog_store::CatalogStore;
use shop_hex::ports::identity_store::IdentityStore;
use shop_repo::{build_store, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / PAGE_SIZE when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let store: Store = build_store(config.database_url.as_deref()).await?;

    if std::env::var("SHOP_SEED_DEMO").map(|v| v == "1").unwrap_or(false) {
        seed_demo(&store).await?;
    }

    let service = OrderService::new(store);

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        page_size: config.page_size,
    };

    let http = HttpServer::new(service, server_cfg).await?;
    http.run().await
}

/// Seeds one user with a live token and a small catalog so a fresh store can
/// be exercised immediately. The token lands in the log.
async fn seed_demo(store: &Store) -> anyhow::Result<()> {
    let user = store.add_user("demo", "demo@example.com").await?;
    let token = store.issue_token(user.id).await?;
    let tech = store.add_category("technology").await?;
    let mouse = store.add_product("mouse", 100, &[tech.id]).await?;
    tracing::info!(
        user_id = user.id,
        product_id = mouse.id,
        token = %token,
        "seeded demo user and catalog"
    );
    Ok(())
}
