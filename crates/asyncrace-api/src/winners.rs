//! Winners table client.
//!
//! The winner ledger in `asyncrace-core` drives its read-modify-write cycle
//! through the [`WinnerStore`] trait; [`HttpWinnersClient`] is the production
//! implementation. A 404 on read is the expected first-win path and maps to
//! `Ok(None)`, not an error.

use async_trait::async_trait;
use asyncrace_errors::ApiError;
use tracing::debug;

use crate::config::ApiConfig;
use crate::types::{self, Page, VehicleId, Winner, WinnerUpdate, WinnersQuery};

/// Persistence seam for winner records.
#[async_trait]
pub trait WinnerStore: Send + Sync {
    /// Read the record for a vehicle; `None` when the vehicle has never won.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-404 error
    /// status.
    async fn get(&self, id: VehicleId) -> Result<Option<Winner>, ApiError>;

    /// Create the first record for a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or error status.
    async fn create(&self, winner: &Winner) -> Result<Winner, ApiError>;

    /// Replace the wins/time of an existing record.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or error status.
    async fn update(&self, id: VehicleId, update: &WinnerUpdate) -> Result<Winner, ApiError>;

    /// Delete a record. Surfaces [`ApiError::NotFound`] so callers can
    /// decide whether a missing record is tolerable (it is on the vehicle
    /// deletion cascade).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or error status.
    async fn delete(&self, id: VehicleId) -> Result<(), ApiError>;
}

/// HTTP implementation of [`WinnerStore`] plus the winners listing.
#[derive(Debug, Clone)]
pub struct HttpWinnersClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWinnersClient {
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
        format!("{}/winners", self.base_url)
    }

    fn item_url(&self, id: VehicleId) -> String {
        format!("{}/winners/{id}", self.base_url)
    }

    /// List one page of winners with sort parameters.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, error status, or a
    /// malformed body.
    pub async fn list(&self, query: &WinnersQuery) -> Result<Page<Winner>, ApiError> {
        let url = self.collection_url();
        let page_param = query.page.to_string();
        let limit_param = query.limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("_page", page_param.as_str()),
                ("_limit", limit_param.as_str()),
                ("_sort", query.sort.as_str()),
                ("_order", query.order.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }

        let header_total = types::total_count(response.headers(), 0);
        let items: Vec<Winner> = response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))?;
        let total = if header_total == 0 {
            items.len() as u64
        } else {
            header_total
        };
        Ok(Page { items, total })
    }
}

#[async_trait]
impl WinnerStore for HttpWinnersClient {
    async fn get(&self, id: VehicleId) -> Result<Option<Winner>, ApiError> {
        let url = self.item_url(id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }
        let winner = response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))?;
        Ok(Some(winner))
    }

    async fn create(&self, winner: &Winner) -> Result<Winner, ApiError> {
        let url = self.collection_url();
        let response = self
            .http
            .post(&url)
            .json(winner)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }
        debug!(vehicle = %winner.id, "created winner record");
        response.json().await.map_err(|e| ApiError::decode(&url, e))
    }

    async fn update(&self, id: VehicleId, update: &WinnerUpdate) -> Result<Winner, ApiError> {
        let url = self.item_url(id);
        let response = self
            .http
            .put(&url)
            .json(update)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), &url));
        }
        debug!(vehicle = %id, wins = update.wins, "updated winner record");
        response.json().await.map_err(|e| ApiError::decode(&url, e))
    }

    async fn delete(&self, id: VehicleId) -> Result<(), ApiError> {
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
        Ok(())
    }
}
