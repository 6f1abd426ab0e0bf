//! Wire types for the OpenWeather "current weather" response.

use serde::Deserialize;

use crate::{error::DecodeError, model::WeatherObservation};

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    wind: OwWind,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

impl From<OwCurrentResponse> for WeatherObservation {
    fn from(parsed: OwCurrentResponse) -> Self {
        let icon_code = parsed
            .weather
            .into_iter()
            .next()
            .and_then(|w| w.icon)
            .unwrap_or_default();

        Self {
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            icon_code,
        }
    }
}

/// Decode a raw response body into an observation.
pub fn decode_current(body: &[u8]) -> Result<WeatherObservation, DecodeError> {
    let parsed: OwCurrentResponse = serde_json::from_slice(body)?;
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEOUL: &str = r#"{
        "coord": {"lon": 126.9778, "lat": 37.5683},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 21.5, "feels_like": 21.1, "pressure": 1015, "humidity": 60},
        "wind": {"speed": 3.2, "deg": 270},
        "name": "Seoul"
    }"#;

    #[test]
    fn decodes_fields_verbatim() {
        let obs = decode_current(SEOUL.as_bytes()).expect("valid payload");

        assert_eq!(
            obs,
            WeatherObservation {
                temperature: 21.5,
                humidity: 60.0,
                wind_speed: 3.2,
                icon_code: "01d".to_string(),
            }
        );
    }

    #[test]
    fn missing_temp_is_a_decode_error() {
        let body = r#"{"main": {"humidity": 60}, "wind": {"speed": 3.2}, "weather": []}"#;
        let err = decode_current(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("temp"));
    }

    #[test]
    fn wrong_type_is_a_decode_error() {
        let body = r#"{"main": {"temp": "warm", "humidity": 60}, "wind": {"speed": 3.2}}"#;
        assert!(decode_current(body.as_bytes()).is_err());
    }

    #[test]
    fn missing_wind_is_a_decode_error() {
        let body = r#"{"main": {"temp": 1.0, "humidity": 60}}"#;
        assert!(decode_current(body.as_bytes()).is_err());
    }

    #[test]
    fn absent_icon_yields_empty_code() {
        for body in [
            r#"{"main": {"temp": 1.0, "humidity": 2}, "wind": {"speed": 3.0}}"#,
            r#"{"main": {"temp": 1.0, "humidity": 2}, "wind": {"speed": 3.0}, "weather": []}"#,
            r#"{"main": {"temp": 1.0, "humidity": 2}, "wind": {"speed": 3.0}, "weather": [{"id": 1}]}"#,
        ] {
            let obs = decode_current(body.as_bytes()).expect("icon is optional");
            assert_eq!(obs.icon_code, "");
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_current(b"<html>502 Bad Gateway</html>").is_err());
    }
}
