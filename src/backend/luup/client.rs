use std::num::NonZeroU64;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use vera::sdata::Sdata;
use vera::{Association, Settings};
use zigate_api::config::LuupConfig;
use zigate_api::requests::{CreationRequest, GatewayError};

use crate::backend::luup::{CHILD_SID, DevicesInfos, GATEWAY_SID, PLUGIN_NAME};
use crate::error::{ApiError, ApiResult};

/// HTTP client for the Luup engine's `data_request` interface.
///
/// Every failure here is a [`ApiError::Communication`] and is surfaced
/// immediately; nothing is retried.
pub struct LuupClient {
    base_url: Url,
    gateway_device: u32,
    http: reqwest::Client,
}

impl LuupClient {
    const DEFAULT_TIMEOUT_SECS: u64 = 15;

    pub fn new(config: &LuupConfig) -> ApiResult<Self> {
        let timeout = config
            .request_timeout_secs
            .map_or(Self::DEFAULT_TIMEOUT_SECS, NonZeroU64::get);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            base_url: config.url.clone(),
            gateway_device: config.gateway_device,
            http,
        })
    }

    fn data_request(&self, params: &[(&str, String)]) -> ApiResult<Url> {
        let mut url = self.base_url.join("data_request")?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    async fn fetch(&self, params: &[(&str, String)], what: &str) -> ApiResult<reqwest::Response> {
        let url = self.data_request(params)?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(ApiError::communication(format!(
                "Luup engine returned {status} for {what}"
            )));
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
        what: &str,
    ) -> ApiResult<T> {
        let response = self.fetch(params, what).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::communication(format!("Invalid {what} response: {err}")))
    }

    async fn plugin_request<T: DeserializeOwned>(&self, command: &str) -> ApiResult<T> {
        self.fetch_json(
            &[
                ("id", format!("lr_{PLUGIN_NAME}")),
                ("command", command.to_string()),
                ("output_format", "json".to_string()),
            ],
            command,
        )
        .await
    }

    /// Run a UPnP action on the gateway device. The engine answers 200 even
    /// for rejected actions, so the `u:<Action>Response` envelope is checked
    /// the way the plugin defines success: an `OK` field or a `JobID`.
    async fn gateway_action(&self, action: &str, arguments: &[(&str, String)]) -> ApiResult<()> {
        let mut params = vec![
            ("id", "action".to_string()),
            ("output_format", "json".to_string()),
            ("DeviceNum", self.gateway_device.to_string()),
            ("serviceId", GATEWAY_SID.to_string()),
            ("action", action.to_string()),
        ];
        params.extend(arguments.iter().map(|(k, v)| (*k, v.clone())));

        let value: Value = self.fetch_json(&params, action).await?;
        let ok = value
            .get(format!("u:{action}Response"))
            .is_some_and(|response| {
                response.get("OK").and_then(Value::as_str) == Some("OK")
                    || response.get("JobID").is_some()
            });
        if !ok {
            return Err(ApiError::communication(format!(
                "Gateway action {action} rejected: {value}"
            )));
        }
        Ok(())
    }

    /// Full equipment/discovery document.
    pub async fn get_devices_infos(&self) -> ApiResult<DevicesInfos> {
        self.plugin_request("getDevicesInfos").await
    }

    /// Gateway-side error log.
    pub async fn get_errors(&self) -> ApiResult<Vec<GatewayError>> {
        self.plugin_request("getErrors").await
    }

    /// Controller room/device/scene summary, used to list association targets.
    pub async fn get_sdata(&self) -> ApiResult<Sdata> {
        self.fetch_json(&[("id", "sdata".to_string())], "sdata")
            .await
    }

    /// Ask the gateway to re-scan its equipments.
    pub async fn refresh(&self) -> ApiResult<()> {
        self.gateway_action("Refresh", &[]).await
    }

    /// Open the mesh network for inclusion.
    pub async fn start_inclusion(&self) -> ApiResult<()> {
        self.gateway_action("Inclusion", &[]).await
    }

    /// Create host devices for the selected discovered mappings. Items go
    /// over the wire in the order given; the gateway may assign ids by it.
    pub async fn create_devices(&self, items: &[CreationRequest]) -> ApiResult<()> {
        let json = serde_json::to_string(items)?;
        self.gateway_action("CreateDevices", &[("items", json)])
            .await
    }

    /// Persist the association links of one equipment feature.
    pub async fn associate(
        &self,
        address: &str,
        endpoint: Option<&str>,
        feature: &str,
        association: &Association,
    ) -> ApiResult<()> {
        self.gateway_action(
            "Associate",
            &[
                ("address", address.to_string()),
                ("endPoint", endpoint.unwrap_or_default().to_string()),
                ("feature", feature.to_string()),
                ("association", association.encode()),
            ],
        )
        .await
    }

    /// Persist a device's settings on its `Setting` state variable. The
    /// encoded string is stored verbatim by the engine.
    pub async fn set_device_settings(&self, device_id: u32, settings: &Settings) -> ApiResult<()> {
        let params = [
            ("id", "variableset".to_string()),
            ("DeviceNum", device_id.to_string()),
            ("serviceId", CHILD_SID.to_string()),
            ("Variable", "Setting".to_string()),
            ("Value", settings.encode()),
        ];
        self.fetch(&params, "variableset").await?;
        Ok(())
    }

    /// Read back a device's persisted settings.
    pub async fn get_device_settings(&self, device_id: u32) -> ApiResult<Settings> {
        let params = [
            ("id", "variableget".to_string()),
            ("DeviceNum", device_id.to_string()),
            ("serviceId", CHILD_SID.to_string()),
            ("Variable", "Setting".to_string()),
        ];
        let raw = self.fetch(&params, "variableget").await?.text().await?;
        Ok(Settings::decode(raw.trim()))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;

    fn client() -> LuupClient {
        LuupClient::new(&LuupConfig {
            url: Url::parse("http://vera.local:3480/").unwrap(),
            gateway_device: 171,
            request_timeout_secs: NonZeroU64::new(5),
        })
        .unwrap()
    }

    #[test]
    fn data_request_url_encodes_parameters() {
        let url = client()
            .data_request(&[
                ("id", format!("lr_{PLUGIN_NAME}")),
                ("command", "getDevicesInfos".to_string()),
                ("association", "12,+34,%56".to_string()),
            ])
            .unwrap();

        assert_eq!(url.host_str(), Some("vera.local"));
        assert_eq!(url.path(), "/data_request");
        let query = url.query().unwrap();
        assert!(query.contains("id=lr_ZiGateGateway"));
        // '+' and '%' must not survive unescaped in a query value
        assert!(query.contains("association=12%2C%2B34%2C%2556"));
    }
}
