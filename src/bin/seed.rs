use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let superadmin_id =
        ensure_user(&pool, "root@example.com", "root1234", "superadmin").await?;
    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let seller_id = ensure_user(&pool, "seller@example.com", "seller123", "seller").await?;
    let customer_id = ensure_user(&pool, "user@example.com", "user1234", "customer").await?;

    let shop_id = ensure_shop(&pool, seller_id, "Ferris Goods").await?;
    let category_id = ensure_category(&pool, "Merchandise").await?;
    seed_products(&pool, shop_id, category_id).await?;
    seed_coupon(&pool).await?;

    println!(
        "Seed completed. superadmin={superadmin_id} admin={admin_id} seller={seller_id} customer={customer_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(email.split('@').next().unwrap_or("user"))
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO loyalty_accounts (id, user_id, points_balance, lifetime_spend, tier)
        VALUES ($1, $2, 0, 0, 'bronze')
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(row.0)
    .execute(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn ensure_shop(pool: &sqlx::PgPool, owner_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO shops (id, owner_user_id, name, slug)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(name)
    .bind("ferris-goods")
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET slug = EXCLUDED.slug
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(name.to_lowercase())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    shop_id: Uuid,
    category_id: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550_000, 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120_000, 100),
        ("Rust Sticker Pack", "Decorate your laptop", 50_000, 200),
        ("E-book: Async Rust", "Learn async Rust patterns", 250_000, 75),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, shop_id, category_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(shop_id)
        .bind(category_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_coupon(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO coupons (id, code, kind, value, min_order_value, max_discount, usage_limit,
                             valid_from, valid_until)
        VALUES ($1, 'WELCOME10', 'percentage', 10, 100000, 100000, 500, $2, $3)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(Utc::now())
    .bind(Utc::now() + Duration::days(90))
    .execute(pool)
    .await?;

    println!("Seeded coupon WELCOME10");
    Ok(())
}
