// src/db/address_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, unique_violation},
        error::AppError,
    },
    db::traits::AddressStore,
    models::address::{Address, NewAddress},
};

const ADDRESS_COLUMNS: &str = "id, user_id, label, street, city, state, zip_code, \
     latitude, longitude, is_default, created_at, updated_at";

#[derive(Clone)]
pub struct AddressRepository {
    pool: PgPool,
}

impl AddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn clear_defaults(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE addresses SET is_default = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(user_id)
        .bind(except)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

// Duas transações concorrentes marcando padrão esbarram no índice parcial
fn map_default_race(e: sqlx::Error) -> AppError {
    match unique_violation(&e).as_deref() {
        Some("addresses_one_default_per_user") => {
            AppError::Conflict("Default address changed concurrently, please retry".into())
        }
        _ => e.into(),
    }
}

#[async_trait]
impl AddressStore for AddressRepository {
    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, AppError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r#"
            SELECT {ADDRESS_COLUMNS} FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(addresses)
    }

    async fn find_address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>, AppError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    async fn create_address(&self, user_id: Uuid, address: NewAddress) -> Result<Address, AppError> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            Self::clear_defaults(&mut tx, user_id, None).await?;
        }

        let created = sqlx::query_as::<_, Address>(&format!(
            r#"
            INSERT INTO addresses
                (user_id, label, street, city, state, zip_code, latitude, longitude, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&address.label)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(address.latitude)
        .bind(address.longitude)
        .bind(address.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_default_race)?;

        tx.commit().await?;
        Ok(created)
    }

    async fn save_address(
        &self,
        id: Uuid,
        user_id: Uuid,
        address: NewAddress,
    ) -> Result<Option<Address>, AppError> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            Self::clear_defaults(&mut tx, user_id, Some(id)).await?;
        }

        let saved = sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses
            SET label = $3, street = $4, city = $5, state = $6, zip_code = $7,
                latitude = $8, longitude = $9, is_default = $10, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&address.label)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(address.latitude)
        .bind(address.longitude)
        .bind(address.is_default)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_default_race)?;

        // Endereço alheio: desfaz a limpeza dos padrões
        if saved.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_address(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict("Address is used by existing orders".into())
                } else {
                    e.into()
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn make_default(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // Confirma a posse e trava a linha até o commit
        let owned: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM addresses WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Ok(false);
        }

        Self::clear_defaults(&mut tx, user_id, Some(id)).await?;

        sqlx::query("UPDATE addresses SET is_default = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_default_race)?;

        tx.commit().await?;
        Ok(true)
    }
}
