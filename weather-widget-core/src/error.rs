//! Error taxonomy for the widget.
//!
//! Every one of these is caught where it happens and logged; none of them is
//! allowed to take the screen down.

/// The weather payload was malformed or missing a required field.
#[derive(Debug, thiserror::Error)]
#[error("Malformed weather payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// A weather or icon request failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Reverse geocoding failed.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geocoder returned status {0}")]
    Status(u16),

    #[error("Geocoder returned no address for {latitude}, {longitude}")]
    NoAddress { latitude: f64, longitude: f64 },
}

/// The position source could not produce a fix.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location lookup failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Location service unavailable: {0}")]
    Unavailable(String),
}
