//! Core library for the `weather-widget` screen.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Decoding of the OpenWeather current-weather payload
//! - The weather HTTP client
//! - Position sources, reverse geocoding and place-name resolution
//! - The screen orchestrator and the view trait it drives
//!
//! It is used by `weather-widget`, but any front end implementing
//! [`WeatherView`] can host the screen.

pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod location;
pub mod model;
pub mod screen;
pub mod view;

pub use client::{OpenWeatherClient, WeatherSource};
pub use config::{Config, LocationSourceKind, Units};
pub use error::{DecodeError, FetchError, GeocodeError, LocationError};
pub use location::LocationProvider;
pub use model::{Coordinates, FetchState, LocationUpdate, Place, Placemark, WeatherObservation};
pub use screen::{ScreenSettings, WeatherScreen};
pub use view::{Chrome, ConditionIcon, WeatherView};
