use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use orders_api::{
    catalog::parse_catalog,
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::enums::UserType,
    services::catalog_service::{ShopSource, import_catalog},
};

const CATALOG_PATH: &str = "data/shop1.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let shop_id = ensure_user(&pool, "shop@example.com", "shop-pass-123", UserType::Shop).await?;
    let customer_id =
        ensure_user(&pool, "buyer@example.com", "buyer-pass-123", UserType::Customer).await?;

    let raw = tokio::fs::read(CATALOG_PATH).await?;
    let catalog = parse_catalog(&raw)?;
    let orm = create_orm_conn(&pool);
    let summary = import_catalog(
        &orm,
        shop_id,
        &catalog,
        &ShopSource::File("shop1.yaml".to_string()),
    )
    .await?;

    println!(
        "Seed completed. Shop user ID: {shop_id}, customer ID: {customer_id}, goods: {}",
        summary.goods
    );
    Ok(())
}

/// Active user with a known password; existing rows keep their id.
async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    user_type: UserType,
) -> anyhow::Result<i64> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, user_type, is_active)
        VALUES ($1, $2, 'Demo', 'User', $3, TRUE)
        ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                user_type = EXCLUDED.user_type,
                is_active = TRUE
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(user_type.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (type={})", user_type.as_str());
    Ok(id)
}
