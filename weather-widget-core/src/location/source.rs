use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{error::LocationError, model::Coordinates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

/// A stream of position fixes.
#[async_trait]
pub trait PositionSource: Send + Debug {
    async fn request_authorization(&mut self) -> Authorization;

    /// Wait for the next fix. `Ok(None)` ends the stream.
    async fn next_fix(&mut self) -> Result<Option<Coordinates>, LocationError>;
}

/// Tracks whether the first fix went out and paces the rest.
#[derive(Debug, Clone, Copy)]
struct Pacing {
    refresh: Option<Duration>,
    started: bool,
}

impl Pacing {
    fn new(refresh: Option<Duration>) -> Self {
        Self {
            refresh,
            started: false,
        }
    }

    /// Returns `false` once a one-shot source has been used up.
    async fn wait_turn(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }

        match self.refresh {
            Some(every) => {
                tokio::time::sleep(every).await;
                true
            }
            None => false,
        }
    }
}

/// Coordinates pinned by configuration.
#[derive(Debug)]
pub struct FixedPosition {
    coordinates: Coordinates,
    pacing: Pacing,
}

impl FixedPosition {
    pub fn new(coordinates: Coordinates, refresh: Option<Duration>) -> Self {
        Self {
            coordinates,
            pacing: Pacing::new(refresh),
        }
    }
}

#[async_trait]
impl PositionSource for FixedPosition {
    async fn request_authorization(&mut self) -> Authorization {
        Authorization::Granted
    }

    async fn next_fix(&mut self) -> Result<Option<Coordinates>, LocationError> {
        if self.pacing.wait_turn().await {
            Ok(Some(self.coordinates))
        } else {
            Ok(None)
        }
    }
}

/// A source the user never authorised.
#[derive(Debug, Default)]
pub struct DeniedPosition;

#[async_trait]
impl PositionSource for DeniedPosition {
    async fn request_authorization(&mut self) -> Authorization {
        Authorization::Denied
    }

    async fn next_fix(&mut self) -> Result<Option<Coordinates>, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

/// Approximate position from the public IP address.
#[derive(Debug)]
pub struct IpPosition {
    lookup_url: String,
    http: Client,
    pacing: Pacing,
}

impl IpPosition {
    pub fn new(
        lookup_url: impl Into<String>,
        refresh: Option<Duration>,
        timeout: Duration,
    ) -> Result<Self, LocationError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            lookup_url: lookup_url.into(),
            http,
            pacing: Pacing::new(refresh),
        })
    }

    async fn lookup(&self) -> Result<Coordinates, LocationError> {
        let res = self.http.get(&self.lookup_url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP lookup returned status {status}"
            )));
        }

        let body: IpLookupResponse = res.json().await?;

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates::new(latitude, longitude)),
            _ => Err(LocationError::Unavailable(
                body.reason
                    .unwrap_or_else(|| "IP lookup returned no coordinates".to_string()),
            )),
        }
    }
}

#[async_trait]
impl PositionSource for IpPosition {
    async fn request_authorization(&mut self) -> Authorization {
        Authorization::Granted
    }

    async fn next_fix(&mut self) -> Result<Option<Coordinates>, LocationError> {
        if !self.pacing.wait_turn().await {
            return Ok(None);
        }

        self.lookup().await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_shot_fixed_position_emits_once() {
        let mut source = FixedPosition::new(Coordinates::new(37.5, 127.0), None);

        assert_eq!(source.request_authorization().await, Authorization::Granted);
        assert_eq!(
            source.next_fix().await.unwrap(),
            Some(Coordinates::new(37.5, 127.0))
        );
        assert_eq!(source.next_fix().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_fixed_position_keeps_emitting() {
        let mut source = FixedPosition::new(
            Coordinates::new(1.0, 2.0),
            Some(Duration::from_secs(60)),
        );

        for _ in 0..3 {
            assert!(source.next_fix().await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn denied_position_never_fixes() {
        let mut source = DeniedPosition;

        assert_eq!(source.request_authorization().await, Authorization::Denied);
        assert!(matches!(
            source.next_fix().await,
            Err(LocationError::PermissionDenied)
        ));
    }
}
