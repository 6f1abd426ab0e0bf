//! Reverse geocoding through OpenStreetMap Nominatim.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{
    error::GeocodeError,
    model::{Coordinates, Placemark},
};

const USER_AGENT: &str = concat!("weather-widget/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Placemark, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,

    suburb: Option<String>,
    city_district: Option<String>,
    borough: Option<String>,
    quarter: Option<String>,
    neighbourhood: Option<String>,
}

impl From<NominatimAddress> for Placemark {
    fn from(addr: NominatimAddress) -> Self {
        // Prefer city > town > village > municipality for the locality
        let locality = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality);

        let sub_locality = addr
            .suburb
            .or(addr.city_district)
            .or(addr.borough)
            .or(addr.quarter)
            .or(addr.neighbourhood);

        Placemark {
            locality,
            sub_locality,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Placemark, GeocodeError> {
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(GeocodeError::Status(res.status().as_u16()));
        }

        let body: NominatimResponse = res.json().await?;

        body.address
            .map(Placemark::from)
            .ok_or(GeocodeError::NoAddress {
                latitude: at.latitude,
                longitude: at.longitude,
            })
    }
}
