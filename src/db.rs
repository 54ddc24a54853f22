// src/db.rs

pub mod address_repo;
pub mod catalog_repo;
pub mod notification_repo;
pub mod order_repo;
pub mod traits;
pub mod user_repo;

#[cfg(test)]
pub mod memory;

pub use address_repo::AddressRepository;
pub use catalog_repo::CatalogRepository;
pub use notification_repo::NotificationRepository;
pub use order_repo::OrderRepository;
pub use traits::{AddressStore, CatalogStore, NotificationStore, OrderStore, UserStore};
pub use user_repo::UserRepository;

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Abre o pool de conexões com o Postgres.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}
