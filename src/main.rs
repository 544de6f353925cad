use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use entraide::auth::{self, password};
use entraide::db;
use entraide::handlers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/app.db".to_string());
    if let Some(dir) = std::path::Path::new(&database_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).expect("Failed to create data directory");
        }
    }

    let pool = db::init_pool(&database_path);
    db::run_migrations(&pool);

    // Seed the admin account on first start; the password must be changed
    // before any real deployment.
    let admin_hash = password::hash_password(
        &std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
    )
    .expect("Failed to hash admin password");
    db::seed(&pool, &admin_hash);

    // Session encryption key — load from SESSION_KEY env var for persistent
    // sessions across restarts.
    let secret_key = match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!(
                "SESSION_KEY too short ({} bytes, need 64+) — generating random key",
                val.len()
            );
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set — generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_secure(false)
                .cookie_http_only(true)
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            // Public routes
            .route("/register", web::post().to(handlers::auth_handlers::register))
            .route("/login", web::post().to(handlers::auth_handlers::login))
            // Protected routes
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                    .route("/logout", web::post().to(handlers::auth_handlers::logout))
                    // Accounts
                    .route("/admin/users", web::post().to(handlers::user_handlers::admin_create_user))
                    .route("/api/users/{id}", web::get().to(handlers::user_handlers::get_user))
                    .route("/admin/overview", web::get().to(handlers::user_handlers::overview))
                    .route("/categories", web::get().to(handlers::user_handlers::categories))
                    .route("/transporteurs/disponibles", web::get().to(handlers::user_handlers::transporteurs_disponibles))
                    .route("/missions", web::get().to(handlers::user_handlers::missions))
                    // Propositions — donation offers
                    .route("/propositions", web::post().to(handlers::proposition_handlers::create))
                    .route("/propositions", web::get().to(handlers::proposition_handlers::list_mine))
                    .route("/propositions/{id}", web::get().to(handlers::proposition_handlers::detail))
                    .route("/propositions/{id}/validate", web::post().to(handlers::proposition_handlers::validate))
                    .route("/propositions/{id}/assign", web::post().to(handlers::proposition_handlers::assign))
                    .route("/propositions/{id}/respond", web::post().to(handlers::proposition_handlers::respond))
                    .route("/propositions/{id}/confirm-handoff", web::post().to(handlers::proposition_handlers::confirm_handoff))
                    .route("/propositions/{id}/confirm-receipt", web::post().to(handlers::proposition_handlers::confirm_receipt))
                    .route("/propositions/{id}/convert", web::post().to(handlers::proposition_handlers::convert))
                    .route("/propositions/{id}/complete", web::post().to(handlers::proposition_handlers::complete))
                    .route("/propositions/{id}/cancel", web::post().to(handlers::proposition_handlers::cancel))
                    // Demandes — donation requests
                    .route("/demandes", web::post().to(handlers::demande_handlers::create))
                    .route("/demandes", web::get().to(handlers::demande_handlers::list_mine))
                    .route("/demandes/{id}", web::get().to(handlers::demande_handlers::detail))
                    .route("/demandes/{id}/related-stock", web::get().to(handlers::demande_handlers::related_stock))
                    .route("/demandes/{id}/validate", web::post().to(handlers::demande_handlers::validate))
                    .route("/demandes/{id}/assign", web::post().to(handlers::demande_handlers::assign))
                    .route("/demandes/{id}/respond", web::post().to(handlers::demande_handlers::respond))
                    .route("/demandes/{id}/start", web::post().to(handlers::demande_handlers::start))
                    .route("/demandes/{id}/complete", web::post().to(handlers::demande_handlers::complete))
                    .route("/demandes/{id}/attribute", web::post().to(handlers::demande_handlers::attribute))
                    .route("/demandes/{id}/confirm-reception", web::post().to(handlers::demande_handlers::confirm_reception))
                    .route("/demandes/{id}/cancel", web::post().to(handlers::demande_handlers::cancel))
                    // Stock
                    .route("/stock", web::get().to(handlers::stock_handlers::list))
                    .route("/stock/{id}/release", web::post().to(handlers::stock_handlers::release))
                    // Notifications
                    .route("/notifications", web::get().to(handlers::notification_handlers::list))
                    .route("/notifications/{id}/read", web::post().to(handlers::notification_handlers::mark_read))
                    // Messaging collaborator
                    .route("/messages", web::post().to(handlers::message_handlers::create))
                    .route("/messages/thread/{user_id}", web::get().to(handlers::message_handlers::thread)),
            )
    })
    .bind(&bind_addr)?
    .run()
    .await
}
