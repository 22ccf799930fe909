//! HTTP client for the admin gateway.
//!
//! Every call claims the session's identity through `X-Admin-Id` and
//! `X-Admin-Role`. Mutations are gated client-side on the `ADMIN` role and
//! fail without touching the network when the session lacks it.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::client::session::{AdminRole, AdminSession};
use crate::security::identity::{X_ADMIN_ID, X_ADMIN_ROLE};

/// City sent by the dashboard when none is chosen.
pub const DEFAULT_CITY: &str = "Austin, TX";

/// Role required for every mutating call.
pub const MUTATION_ROLE: AdminRole = AdminRole::Admin;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no admin is logged in")]
    NotLoggedIn,

    #[error("role {actual} may not perform this action (requires {required})")]
    Forbidden { required: AdminRole, actual: AdminRole },

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct DashboardClient {
    client: Client,
    base_url: Url,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(base_url, Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (proxy, TLS, timeouts).
    pub fn with_client(base_url: &str, client: Client) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self { client, base_url })
    }

    /// Gateway URL for `segments`, each percent-encoded as one path segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn dashboard_overview(&self, session: &AdminSession, city: Option<&str>) -> Result<Value, ClientError> {
        let url = self.url(&["api", "admin", "dashboard-overview"])?;
        let request = self.request(session, Method::GET, url).query(&[("city", city.unwrap_or(DEFAULT_CITY))]);
        read(request.send().await?).await
    }

    pub async fn live_fleet(&self, session: &AdminSession, city: Option<&str>) -> Result<Value, ClientError> {
        let url = self.url(&["api", "admin", "live-fleet"])?;
        let request = self.request(session, Method::GET, url).query(&[("city", city.unwrap_or(DEFAULT_CITY))]);
        read(request.send().await?).await
    }

    pub async fn drivers(&self, session: &AdminSession) -> Result<Value, ClientError> {
        self.get(session, &["api", "admin", "drivers"]).await
    }

    pub async fn riders(&self, session: &AdminSession) -> Result<Value, ClientError> {
        self.get(session, &["api", "admin", "riders"]).await
    }

    pub async fn active_rides(&self, session: &AdminSession) -> Result<Value, ClientError> {
        self.get(session, &["api", "admin", "rides-active"]).await
    }

    pub async fn logs(&self, session: &AdminSession) -> Result<Value, ClientError> {
        self.get(session, &["api", "admin", "logs"]).await
    }

    pub async fn set_driver_status(&self, session: &AdminSession, driver_id: &str, status: &str) -> Result<Value, ClientError> {
        authorize(session)?;
        let url = self.url(&["api", "admin", "action", "drivers", driver_id, "status"])?;
        let request = self.request(session, Method::PATCH, url).json(&json!({ "status": status }));
        read(request.send().await?).await
    }

    pub async fn update_wallet(&self, session: &AdminSession, rider_id: &str, amount: f64) -> Result<Value, ClientError> {
        authorize(session)?;
        let admin_name = session.current().map(|p| p.name.as_str()).unwrap_or("Admin");
        let url = self.url(&["api", "admin", "riders", rider_id, "wallet"])?;
        let request = self.request(session, Method::PATCH, url).json(&json!({
            "amount": amount,
            "action": "UPDATE_WALLET_BALANCE",
            "admin_name": admin_name,
        }));
        read(request.send().await?).await
    }

    pub async fn assign_driver(&self, session: &AdminSession, ride_id: &str, payload: Value) -> Result<Value, ClientError> {
        authorize(session)?;
        let url = self.url(&["api", "admin", "assign-driver"])?;
        let request = self
            .request(session, Method::POST, url)
            .json(&json!({ "rideId": ride_id, "payload": payload }));
        read(request.send().await?).await
    }

    pub async fn cancel_ride(&self, session: &AdminSession, ride_id: &str) -> Result<Value, ClientError> {
        authorize(session)?;
        let url = self.url(&["api", "admin", "action", "rides", ride_id, "cancel"])?;
        read(self.request(session, Method::POST, url).send().await?).await
    }

    /// Ask the AI service for a reply draft to a support ticket.
    pub async fn draft_response(
        &self,
        session: &AdminSession,
        ticket_id: &str,
        complaint: &str,
        ride_id: &str,
    ) -> Result<Value, ClientError> {
        let url = self.url(&["api", "ai", "draft-response"])?;
        let request = self.request(session, Method::POST, url).json(&json!({
            "ticketId": ticket_id,
            "complaintText": complaint,
            "rideDetails": { "id": ride_id, "driver": "Unknown" },
        }));
        read(request.send().await?).await
    }

    async fn get(&self, session: &AdminSession, segments: &[&str]) -> Result<Value, ClientError> {
        let url = self.url(segments)?;
        read(self.request(session, Method::GET, url).send().await?).await
    }

    fn request(&self, session: &AdminSession, method: Method, url: Url) -> RequestBuilder {
        let (id, role) = session.identity();
        self.client
            .request(method, url)
            .header(X_ADMIN_ID, id)
            .header(X_ADMIN_ROLE, role)
    }
}

fn authorize(session: &AdminSession) -> Result<(), ClientError> {
    let profile = session.current().ok_or(ClientError::NotLoggedIn)?;
    if !session.has_permission(MUTATION_ROLE) {
        return Err(ClientError::Forbidden {
            required: MUTATION_ROLE,
            actual: profile.role,
        });
    }
    Ok(())
}

/// Decode a gateway answer: JSON when possible, text otherwise, null when empty.
async fn read(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
