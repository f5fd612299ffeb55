//! Engine control client: start, stop, drive.
//!
//! All three operations are `PATCH /engine?id={id}&status={status}` against
//! the mock backend. The drive endpoint answers 500 on roughly 10% of calls;
//! that status is the documented "engine broke down" outcome and is mapped to
//! [`DriveOutcome::Breakdown`], never to an error. Any *other* non-success
//! status is a transport failure, which the race treats the same way but
//! which is surfaced distinctly for observability.

use async_trait::async_trait;
use asyncrace_errors::{ApiError, EngineError};
use tracing::debug;

use crate::config::ApiConfig;
use crate::types::{DriveOutcome, EngineStart, VehicleId};

/// Engine operations keyed by vehicle id.
///
/// The HTTP implementation is [`HttpEngineClient`]; tests substitute a
/// scripted fake so velocities and breakdowns are deterministic.
#[async_trait]
pub trait EngineControl: Send + Sync {
    /// Start the engine, obtaining the server-simulated velocity and
    /// distance for this run.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::Unavailable`] when the backend is
    /// unreachable or answers with an error status. The caller treats this
    /// as "vehicle withdrawn from this race"; no retry is attempted.
    async fn start(&self, id: VehicleId) -> Result<EngineStart, EngineError>;

    /// Stop the engine. Best-effort: callers log failures and never block
    /// a session transition on them.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::Transport`] when the call does not succeed.
    async fn stop(&self, id: VehicleId) -> Result<(), EngineError>;

    /// Drive the vehicle. Resolves to [`DriveOutcome::Breakdown`] on the
    /// backend's documented 500.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::Transport`] on any other non-success
    /// status or network failure.
    async fn drive(&self, id: VehicleId) -> Result<DriveOutcome, EngineError>;
}

/// HTTP implementation of [`EngineControl`].
#[derive(Debug, Clone)]
pub struct HttpEngineClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEngineClient {
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

    fn endpoint(&self) -> String {
        format!("{}/engine", self.base_url)
    }
}

#[async_trait]
impl EngineControl for HttpEngineClient {
    async fn start(&self, id: VehicleId) -> Result<EngineStart, EngineError> {
        let id_param = id.to_string();
        let response = self
            .http
            .patch(self.endpoint())
            .query(&[("id", id_param.as_str()), ("status", "started")])
            .send()
            .await
            .map_err(|_| EngineError::unavailable(id.0, None))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::unavailable(id.0, Some(status.as_u16())));
        }

        let start: EngineStart = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse {
                id: id.0,
                reason: e.to_string(),
            })?;
        debug!(vehicle = %id, velocity = start.velocity, distance = start.distance, "engine started");
        Ok(start)
    }

    async fn stop(&self, id: VehicleId) -> Result<(), EngineError> {
        let id_param = id.to_string();
        let response = self
            .http
            .patch(self.endpoint())
            .query(&[("id", id_param.as_str()), ("status", "stopped")])
            .send()
            .await
            .map_err(|e| EngineError::transport(id.0, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::transport(
                id.0,
                format!("stop returned {status}"),
            ));
        }
        debug!(vehicle = %id, "engine stopped");
        Ok(())
    }

    async fn drive(&self, id: VehicleId) -> Result<DriveOutcome, EngineError> {
        let id_param = id.to_string();
        let response = self
            .http
            .patch(self.endpoint())
            .query(&[("id", id_param.as_str()), ("status", "drive")])
            .send()
            .await
            .map_err(|e| EngineError::transport(id.0, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(DriveOutcome::Completed);
        }
        // 500 is the documented breakdown status, a domain outcome.
        if status.as_u16() == 500 {
            debug!(vehicle = %id, "engine breakdown");
            return Ok(DriveOutcome::Breakdown);
        }
        Err(EngineError::transport(
            id.0,
            format!("drive returned {status}"),
        ))
    }
}
