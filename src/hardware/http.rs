use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{DeviceControl, DeviceError};

/// Request/response client for the device-control backend
#[derive(Clone)]
pub struct HttpDeviceClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDeviceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DeviceError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("homepilot/0.1"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn device_url(&self, device_id: &str, action: &str) -> String {
        format!(
            "{}/api/devices/{}/{}",
            self.base_url.trim_end_matches('/'),
            device_id,
            action
        )
    }

    /// `GET /api/devices/{id}/status`. Non-2xx answers mean "no status".
    pub async fn fetch_status(&self, device_id: &str) -> Result<Option<Value>, DeviceError> {
        let resp = self
            .client
            .get(self.device_url(device_id, "status"))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(device_id, %status, "no status from device backend");
            return Ok(None);
        }
        Ok(Some(resp.json::<Value>().await?))
    }

    /// `POST /api/devices/{id}/cmd` with a JSON body.
    pub async fn post_command(&self, device_id: &str, command: &Value) -> Result<Value, DeviceError> {
        let resp = self
            .client
            .post(self.device_url(device_id, "cmd"))
            .json(command)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(DeviceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DeviceControl for HttpDeviceClient {
    async fn post_command(&self, device_id: &str, command: &Value) -> Result<Value, DeviceError> {
        HttpDeviceClient::post_command(self, device_id, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_url_trims_trailing_slash() {
        let client = HttpDeviceClient::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.device_url("abc", "status"),
            "http://localhost:3000/api/devices/abc/status"
        );
    }
}
