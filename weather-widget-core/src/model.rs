use serde::{Deserialize, Serialize};

/// Current conditions decoded from one weather response.
///
/// Values are exactly what the provider sent; nothing is rounded or converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Provider icon code such as `01d`. Empty when the payload had none.
    pub icon_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Raw reverse-geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    /// City-level name.
    pub locality: Option<String>,
    /// Neighbourhood-level name.
    pub sub_locality: Option<String>,
}

/// The place currently shown on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub display_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Place {
    /// A place with a name but no fix yet.
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            latitude: None,
            longitude: None,
        }
    }
}

/// One event from the location stream.
///
/// Every fix is delivered first without a placemark; a second update with the
/// placemark follows once reverse geocoding succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub coordinates: Coordinates,
    pub placemark: Option<Placemark>,
}

/// Single-flight gate for weather fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
}
