use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::logger::{MessageLogMode, MessageLogger};
use crate::types::{POWER_OFF_BUTTON, RawAppliance};
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.nature.global/1";

pub struct RemoClientBuilder {
    token: String,
    base_url: String,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl RemoClientBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            log_mode: None,
            log_path: None,
        }
    }

    /// Point the client somewhere other than the vendor cloud (tests,
    /// local proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> RemoClient {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .expect("token contains invalid header characters");
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("failed to build HTTP client");

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Arc::new(Mutex::new(
                MessageLogger::new(mode, &path).expect("failed to open log file"),
            ))),
            _ => None,
        };

        RemoClient {
            http,
            base_url: self.base_url,
            logger,
        }
    }
}

/// Thin async client for the vendor cloud API. Cheap to clone; every
/// clone shares the HTTP pool and the wire log.
#[derive(Clone)]
pub struct RemoClient {
    http: reqwest::Client,
    base_url: String,
    logger: Option<Arc<Mutex<MessageLogger>>>,
}

impl RemoClient {
    pub fn builder(token: impl Into<String>) -> RemoClientBuilder {
        RemoClientBuilder::new(token)
    }

    /// Fetch the full appliance listing.
    pub async fn list_appliances(&self) -> Result<Vec<RawAppliance>> {
        let url = format!("{}/appliances", self.base_url);
        debug!(url = %url, "fetching appliance listing");

        let resp = check_status(self.http.get(&url).send().await?)?;
        let status = resp.status().as_u16();
        let body: Value = resp.json().await?;

        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_listing(status, &body);
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Switch the operation mode. Off is not a mode on the wire; use
    /// [`set_power_off`](Self::set_power_off).
    pub async fn set_operation_mode(&self, appliance_id: &str, mode: &str) -> Result<()> {
        self.post_settings(appliance_id, "set_operation_mode", &[("operation_mode", mode)])
            .await
    }

    /// Press the dedicated power-off button.
    pub async fn set_power_off(&self, appliance_id: &str) -> Result<()> {
        self.post_settings(appliance_id, "set_power_off", &[("button", POWER_OFF_BUTTON)])
            .await
    }

    /// Send a target temperature. The wire format is a decimal string
    /// with no trailing `.0` on whole values.
    pub async fn set_temperature(&self, appliance_id: &str, value: f64) -> Result<()> {
        let value = format_temperature(value);
        self.post_settings(appliance_id, "set_temperature", &[("temperature", &value)])
            .await
    }

    pub async fn set_fan_speed(&self, appliance_id: &str, volume: &str) -> Result<()> {
        self.post_settings(appliance_id, "set_fan_speed", &[("air_volume", volume)])
            .await
    }

    pub async fn set_horizontal_swing(&self, appliance_id: &str, direction: &str) -> Result<()> {
        self.post_settings(appliance_id, "set_horizontal_swing", &[("air_direction_h", direction)])
            .await
    }

    pub async fn set_vertical_swing(&self, appliance_id: &str, direction: &str) -> Result<()> {
        self.post_settings(appliance_id, "set_vertical_swing", &[("air_direction", direction)])
            .await
    }

    /// All setting writes share one endpoint and form encoding. The
    /// response body is not consumed.
    async fn post_settings(
        &self,
        appliance_id: &str,
        action: &str,
        fields: &[(&str, &str)],
    ) -> Result<()> {
        let url = format!("{}/appliances/{}/aircon_settings", self.base_url, appliance_id);
        debug!(action, appliance_id, "sending setting write");

        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_command(action, fields);
        }

        check_status(self.http.post(&url).form(fields).send().await?)?;
        Ok(())
    }
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status() == StatusCode::UNAUTHORIZED {
        return Err(Error::Auth);
    }
    Ok(resp.error_for_status()?)
}

/// 0.5 steps serialize as-is; whole degrees drop the decimal point.
pub(crate) fn format_temperature(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_degrees_have_no_decimal_point() {
        assert_eq!(format_temperature(26.0), "26");
        assert_eq!(format_temperature(-2.0), "-2");
        assert_eq!(format_temperature(0.0), "0");
    }

    #[test]
    fn half_degrees_keep_the_fraction() {
        assert_eq!(format_temperature(26.5), "26.5");
        assert_eq!(format_temperature(-1.5), "-1.5");
    }
}
