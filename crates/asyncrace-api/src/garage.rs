//! Garage client: paged vehicle CRUD.

use asyncrace_errors::ApiError;
use tracing::debug;

use crate::config::ApiConfig;
use crate::types::{self, NewVehicle, Page, Vehicle, VehicleId, VehicleUpdate};

/// Client for the `/garage` resource.
#[derive(Debug, Clone)]
pub struct GarageClient {
    http: reqwest::Client,
    base_url: String,
}

impl GarageClient {
    /// Create a client from the shared backend configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: config.client()?,
            base_url: config.base_url.clone(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/garage", self.base_url)
    }

    fn item_url(&self, id: VehicleId) -> String {
        format!("{}/garage/{id}", self.base_url)
    }

    /// List one page of vehicles. `total` is taken from the backend's
    /// `X-Total-Count` header.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, error status, or a
    /// malformed body.
    pub async fn list(&self, page: u32, limit: u32) -> Result<Page<Vehicle>, ApiError> {
        let url = self.collection_url();
        let page_param = page.to_string();
        let limit_param = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("_page", page_param.as_str()),
                ("_limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }

        let header_total = types::total_count(response.headers(), 0);
        let items: Vec<Vehicle> = response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))?;
        let total = if header_total == 0 {
            items.len() as u64
        } else {
            header_total
        };
        debug!(page, limit, total, "listed garage page");
        Ok(Page { items, total })
    }

    /// Create a vehicle. Input is expected to be validated already (see
    /// [`crate::types::validate_name`]).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or error status.
    pub async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle, ApiError> {
        let url = self.collection_url();
        let response = self
            .http
            .post(&url)
            .json(vehicle)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }
        response.json().await.map_err(|e| ApiError::decode(&url, e))
    }

    /// Apply a partial update to a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or error status;
    /// [`ApiError::NotFound`] when the vehicle no longer exists.
    pub async fn update(&self, id: VehicleId, update: &VehicleUpdate) -> Result<Vehicle, ApiError> {
        let url = self.item_url(id);
        let response = self
            .http
            .patch(&url)
            .json(update)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }
        response.json().await.map_err(|e| ApiError::decode(&url, e))
    }

    /// Delete a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or error status;
    /// [`ApiError::NotFound`] when the vehicle was already gone.
    pub async fn delete(&self, id: VehicleId) -> Result<(), ApiError> {
        let url = self.item_url(id);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }
        debug!(vehicle = %id, "deleted vehicle");
        Ok(())
    }
}
