use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub const MIGRATIONS: &str = include_str!("schema.sql");

/// Base categories seeded on first start so members can classify items
/// before anyone has created a taxonomy by hand.
const BASE_CATEGORIES: &[(&str, &str)] = &[
    ("Mobilier", "Tables, chaises, armoires, literie"),
    ("Électroménager", "Appareils de cuisine et d'entretien"),
    ("Vêtements", "Vêtements et chaussures, tous âges"),
    ("Informatique", "Ordinateurs, périphériques, téléphonie"),
    ("Puériculture", "Matériel pour bébés et jeunes enfants"),
];

pub fn init_pool(database_url: &str) -> DbPool {
    let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(())
    });
    Pool::builder()
        .max_size(8)
        .build(manager)
        .expect("Failed to create DB pool")
}

pub fn run_migrations(pool: &DbPool) {
    let conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");
    log::info!("Database migrations complete");
}

/// Seed the admin account and base categories if the database is empty.
/// Idempotent: skipped as soon as any user exists.
pub fn seed(pool: &DbPool, admin_password_hash: &str) {
    let conn = pool.get().expect("Failed to get DB connection for seeding");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap_or(0);
    if count > 0 {
        log::info!("Database already seeded ({} users), skipping", count);
        return;
    }

    conn.execute(
        "INSERT INTO users (username, password, email, role) VALUES (?1, ?2, ?3, 'admin')",
        params!["admin", admin_password_hash, "admin@entraide.local"],
    )
    .expect("Failed to seed admin user");

    for (nom, description) in BASE_CATEGORIES {
        conn.execute(
            "INSERT INTO categories (nom, description) VALUES (?1, ?2)",
            params![nom, description],
        )
        .expect("Failed to seed category");
    }

    log::info!("Seeded admin account and {} base categories", BASE_CATEGORIES.len());
}
