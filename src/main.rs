use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fu_platform::{app, config, db, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fu_platform=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_path = config::load_database_path();
  let pool = db::init_db(&db_path).expect("Failed to initialize database");

  {
    let conn = pool.lock().expect("Database lock failed during startup");
    db::seed_demo_catalog(&conn).expect("Failed to seed demo catalog");
  }

  let app = app::router(AppState::new(pool));

  let bind_addr = config::server_bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config::SERVER_PORT);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
