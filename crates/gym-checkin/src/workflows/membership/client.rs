use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::domain::{MemberRecord, RecordId, VisitRecord};
use super::parser::parse_member_list;
use crate::config::MembershipApiConfig;

/// Remote membership API the kiosk talks to. Each call is attempted once.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    async fn list_members(&self) -> Result<Vec<MemberRecord>, MembershipApiError>;

    async fn patch_remaining_classes(
        &self,
        record_id: &RecordId,
        remaining: u32,
    ) -> Result<(), MembershipApiError>;

    async fn record_visit(&self, visit: &VisitRecord) -> Result<(), MembershipApiError>;
}

/// Failure talking to the membership API.
#[derive(Debug, thiserror::Error)]
pub enum MembershipApiError {
    /// Transport failure, timeout, or a non-2xx answer to a read.
    #[error("membership API unreachable: {0}")]
    Unreachable(String),
    #[error("membership API returned an invalid payload: {0}")]
    InvalidPayload(String),
    /// The write was answered, but not with the status that confirms it.
    #[error("membership API answered {status} to {operation}")]
    Rejected {
        operation: &'static str,
        status: u16,
    },
    #[error("failed to build membership API client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct RemainingClassesPatch {
    clases_restantes: u32,
}

/// reqwest-backed [`MembershipApi`].
#[derive(Debug, Clone)]
pub struct HttpMembershipApi {
    client: Client,
    base_url: String,
}

impl HttpMembershipApi {
    pub fn new(config: &MembershipApiConfig) -> Result<Self, MembershipApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MembershipApiError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> MembershipApiError {
    if err.is_timeout() {
        MembershipApiError::Unreachable(format!("{url} timed out"))
    } else {
        MembershipApiError::Unreachable(format!("{url}: {err}"))
    }
}

#[async_trait]
impl MembershipApi for HttpMembershipApi {
    async fn list_members(&self) -> Result<Vec<MemberRecord>, MembershipApiError> {
        let url = self.url("api/socios/");
        debug!(%url, "fetching member list");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MembershipApiError::Unreachable(format!(
                "{url} answered {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| transport_error(&url, err))?;
        debug!(%status, bytes = body.len(), "member list received");

        parse_member_list(&body).map_err(|err| MembershipApiError::InvalidPayload(err.to_string()))
    }

    async fn patch_remaining_classes(
        &self,
        record_id: &RecordId,
        remaining: u32,
    ) -> Result<(), MembershipApiError> {
        let url = self.url(&format!("api/socios/{record_id}/"));
        let body = RemainingClassesPatch {
            clases_restantes: remaining,
        };
        debug!(%url, remaining, "updating remaining classes");

        let response = self
            .client
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(MembershipApiError::Rejected {
                operation: "remaining classes update",
                status: status.as_u16(),
            }),
        }
    }

    async fn record_visit(&self, visit: &VisitRecord) -> Result<(), MembershipApiError> {
        let url = self.url("api/registrar-ingreso/");
        debug!(%url, dni = %visit.dni, "recording visit");

        let response = self
            .client
            .post(&url)
            .json(visit)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => Err(MembershipApiError::Rejected {
                operation: "visit registration",
                status: status.as_u16(),
            }),
        }
    }
}
