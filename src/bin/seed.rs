use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use liveorder_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let seller_id = ensure_seller(&pool, "seller@example.com", "seller123").await?;
    let session_id = seed_demo_session(&pool).await?;

    println!("Seed completed. Seller ID: {seller_id}, Session ID: {session_id}");
    Ok(())
}

async fn ensure_seller(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, 'admin')
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let seller_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured seller {email}");
    Ok(seller_id)
}

async fn seed_demo_session(pool: &sqlx::PgPool) -> anyhow::Result<Uuid> {
    let session_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO sessions (id, title, is_closed, ship_threshold, ship_fee_normal, ship_fee_jeju)
        VALUES ($1, $2, false, 100000, 3500, 7000)
        "#,
    )
    .bind(session_id)
    .bind("Demo live session")
    .execute(pool)
    .await?;

    let products = vec![
        ("Hand cream set", 12000_i64, 1_i32),
        ("Wool scarf", 28000, 2),
        ("Ceramic mug pair", 19000, 3),
        ("Gift wrapping", 1500, 4),
    ];

    for (name, price, sort_order) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, session_id, name, price, is_active, is_soldout, sort_order)
            VALUES ($1, $2, $3, $4, true, false, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(name)
        .bind(price)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    println!("Seeded demo session and products");
    Ok(session_id)
}
