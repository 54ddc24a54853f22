// src/services/address_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AddressStore,
    models::address::{Address, AddressPayload, NewAddress, UpdateAddressPayload},
};

#[derive(Clone)]
pub struct AddressService {
    addresses: Arc<dyn AddressStore>,
}

impl AddressService {
    pub fn new(addresses: Arc<dyn AddressStore>) -> Self {
        Self { addresses }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Address>, AppError> {
        self.addresses.list_addresses(user_id).await
    }

    pub async fn create(&self, user_id: Uuid, payload: AddressPayload) -> Result<Address, AppError> {
        let address = self.addresses.create_address(user_id, payload.into_new_address()).await?;
        tracing::debug!(address_id = %address.id, %user_id, "Endereço criado");
        Ok(address)
    }

    /// Atualização parcial; os campos ausentes mantêm o valor atual.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: UpdateAddressPayload,
    ) -> Result<Address, AppError> {
        let current = self
            .addresses
            .find_address(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Address"))?;

        let mut merged = NewAddress::from_existing(&current);
        if let Some(label) = payload.label {
            merged.label = label;
        }
        if let Some(street) = payload.street {
            merged.street = street;
        }
        if let Some(city) = payload.city {
            merged.city = city;
        }
        if let Some(state) = payload.state {
            merged.state = state;
        }
        if let Some(zip_code) = payload.zip_code {
            merged.zip_code = zip_code;
        }
        if let Some(latitude) = payload.latitude {
            merged.latitude = Some(latitude);
        }
        if let Some(longitude) = payload.longitude {
            merged.longitude = Some(longitude);
        }
        if let Some(is_default) = payload.is_default {
            merged.is_default = is_default;
        }

        self.addresses
            .save_address(id, user_id, merged)
            .await?
            .ok_or_else(|| AppError::not_found("Address"))
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if !self.addresses.delete_address(id, user_id).await? {
            return Err(AppError::not_found("Address"));
        }
        Ok(())
    }

    pub async fn set_default(&self, id: Uuid, user_id: Uuid) -> Result<Address, AppError> {
        if !self.addresses.make_default(id, user_id).await? {
            return Err(AppError::not_found("Address"));
        }
        self.addresses
            .find_address(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Address"))
    }
}
