use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};

use crate::{
    config::{Config, Units},
    dto::decode_current,
    error::FetchError,
    model::WeatherObservation,
};

/// Source of current conditions and their icons.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Current conditions for a place name.
    async fn fetch(&self, query: &str, api_key: &str) -> Result<WeatherObservation, FetchError>;

    /// Image bytes for a condition icon code.
    async fn fetch_icon(&self, icon_code: &str) -> Result<Vec<u8>, FetchError>;
}

/// Client for OpenWeather's "current weather by city name" endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    icon_base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        icon_base_url: impl Into<String>,
        units: Units,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into(),
            icon_base_url: icon_base_url.into(),
            units,
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            config.base_url.clone(),
            config.icon_base_url.clone(),
            config.units,
            config.request_timeout(),
        )
    }

    pub fn icon_url(&self, icon_code: &str) -> String {
        icon_url(&self.icon_base_url, icon_code)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, query: &str, api_key: &str) -> Result<WeatherObservation, FetchError> {
        let mut params = vec![("q", query), ("appid", api_key)];
        if let Some(units) = self.units.as_query() {
            params.push(("units", units));
        }

        tracing::debug!(query, "Requesting current weather");

        let res = self.http.get(&self.base_url).query(&params).send().await?;

        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&String::from_utf8_lossy(&body)),
            });
        }

        Ok(decode_current(&body)?)
    }

    async fn fetch_icon(&self, icon_code: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.icon_url(icon_code);

        let res = self.http.get(&url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: url,
            });
        }

        Ok(res.bytes().await?.to_vec())
    }
}

/// `<base>/<code>@2x.png`. An empty code still yields a URL; it just won't resolve.
pub fn icon_url(base: &str, icon_code: &str) -> String {
    format!("{}/{}@2x.png", base.trim_end_matches('/'), icon_code)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
