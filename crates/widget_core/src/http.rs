//! `RemoteCall` implementations over the backend's JSON/HTTP API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::RemoteError,
    protocol::{ContractHoursRequest, FacilityResponse, SearchRequest, StaffingResponse},
};
use url::Url;

use crate::RemoteCall;

const NEARBY_FACILITIES_PATH: &str = "facilities/nearby";
const QUARTERLY_CONTRACT_HOURS_PATH: &str = "staffing/quarterly-contract-hours";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(mut base_url: Url) -> Self {
        // `Url::join` replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::transport(format!("invalid endpoint {path}: {err}")))
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::transport(err.to_string())
}

/// Maps a response to the decoded list, treating an empty body as `null`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(RemoteError::http_status(status.as_u16(), &body));
    }

    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body)
        .map_err(|err| RemoteError::transport(format!("failed to decode response: {err}")))
}

#[async_trait]
impl RemoteCall<SearchRequest, FacilityResponse> for HttpBackend {
    async fn call(&self, request: SearchRequest) -> Result<FacilityResponse, RemoteError> {
        let response = self
            .http
            .post(self.endpoint(NEARBY_FACILITIES_PATH)?)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

#[async_trait]
impl RemoteCall<ContractHoursRequest, StaffingResponse> for HttpBackend {
    async fn call(&self, request: ContractHoursRequest) -> Result<StaffingResponse, RemoteError> {
        let response = self
            .http
            .get(self.endpoint(QUARTERLY_CONTRACT_HOURS_PATH)?)
            .query(&[("accountId", request.account_id.as_str())])
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
