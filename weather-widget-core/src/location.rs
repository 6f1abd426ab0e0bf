use std::sync::Arc;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{
    config::{Config, LocationSourceKind},
    error::LocationError,
    model::{Coordinates, LocationUpdate},
};

pub mod geocode;
pub mod place;
pub mod source;

pub use geocode::{NominatimGeocoder, ReverseGeocoder};
pub use place::{PlaceResolution, UNKNOWN_LOCATION, resolve_place};
pub use source::{Authorization, DeniedPosition, FixedPosition, IpPosition, PositionSource};

/// Streams position fixes, each followed by its reverse-geocoded placemark.
#[derive(Debug)]
pub struct LocationProvider {
    source: Option<Box<dyn PositionSource>>,
    geocoder: Arc<dyn ReverseGeocoder>,
    updates: UnboundedSender<LocationUpdate>,
    task: Option<JoinHandle<()>>,
}

impl LocationProvider {
    pub fn new(
        source: Box<dyn PositionSource>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> (Self, UnboundedReceiver<LocationUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();

        let provider = Self {
            source: Some(source),
            geocoder,
            updates,
            task: None,
        };

        (provider, rx)
    }

    pub fn from_config(config: &Config) -> anyhow::Result<(Self, UnboundedReceiver<LocationUpdate>)> {
        let source = position_source_from_config(config)?;
        let geocoder = NominatimGeocoder::new(
            config.location.geocoder_url.clone(),
            config.request_timeout(),
        )?;

        Ok(Self::new(source, Arc::new(geocoder)))
    }

    /// Ask for authorization and begin streaming. Calling it again does nothing.
    pub fn start(&mut self) {
        let Some(source) = self.source.take() else {
            tracing::debug!("Location updates already started");
            return;
        };

        let geocoder = Arc::clone(&self.geocoder);
        let updates = self.updates.clone();

        self.task = Some(tokio::spawn(stream_fixes(source, geocoder, updates)));
    }

    pub fn is_started(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for LocationProvider {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn stream_fixes(
    mut source: Box<dyn PositionSource>,
    geocoder: Arc<dyn ReverseGeocoder>,
    updates: UnboundedSender<LocationUpdate>,
) {
    if source.request_authorization().await == Authorization::Denied {
        tracing::warn!("Location permission denied; showing the default place only");
        return;
    }

    loop {
        let coordinates = match source.next_fix().await {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                tracing::debug!("Position stream ended");
                return;
            }
            Err(LocationError::PermissionDenied) => {
                tracing::warn!("Location permission revoked");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get user location");
                continue;
            }
        };

        tracing::debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "Position fix"
        );

        let fix = LocationUpdate {
            coordinates,
            placemark: None,
        };
        if updates.send(fix).is_err() {
            return;
        }

        match geocoder.reverse_geocode(coordinates).await {
            Ok(placemark) => {
                let resolved = LocationUpdate {
                    coordinates,
                    placemark: Some(placemark),
                };
                if updates.send(resolved).is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Reverse geocode failed"),
        }
    }
}

/// Build the configured position source.
pub fn position_source_from_config(config: &Config) -> anyhow::Result<Box<dyn PositionSource>> {
    let loc = &config.location;

    let boxed: Box<dyn PositionSource> = match loc.source {
        LocationSourceKind::Ip => Box::new(IpPosition::new(
            loc.ip_lookup_url.clone(),
            loc.refresh(),
            config.request_timeout(),
        )?),
        LocationSourceKind::Fixed => {
            let (Some(latitude), Some(longitude)) = (loc.latitude, loc.longitude) else {
                anyhow::bail!(
                    "Location source 'fixed' needs both latitude and longitude.\n\
                     Hint: set them under [location] or pass --lat/--lon."
                );
            };
            Box::new(FixedPosition::new(
                Coordinates::new(latitude, longitude),
                loc.refresh(),
            ))
        }
        LocationSourceKind::Denied => Box::new(DeniedPosition),
    };

    Ok(boxed)
}
