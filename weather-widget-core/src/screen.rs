//! The weather screen: owns all screen state and is the only thing that
//! touches the view.
//!
//! Fetches and icon downloads run on spawned tasks and report back through a
//! channel, so every state change happens on the task driving [`WeatherScreen`].

use std::{future::Future, sync::Arc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    client::{WeatherSource, icon_url},
    config::{Config, Units},
    error::FetchError,
    location::{LocationProvider, resolve_place},
    model::{FetchState, LocationUpdate, Place, WeatherObservation},
    view::{Chrome, ConditionIcon, WeatherView},
};

pub const GREETING: &str = "오늘도 행복한 하루 되세요";

/// Settings the screen needs from configuration.
#[derive(Debug, Clone)]
pub struct ScreenSettings {
    pub default_place: String,
    pub api_key: String,
    pub units: Units,
    pub icon_base_url: String,
}

impl ScreenSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            default_place: config.default_place.clone(),
            api_key: config.api_key()?,
            units: config.units,
            icon_base_url: config.icon_base_url.clone(),
        })
    }
}

#[derive(Debug)]
enum ScreenEvent {
    FetchCompleted(Result<WeatherObservation, FetchError>),
    IconLoaded {
        code: String,
        result: Result<Vec<u8>, FetchError>,
    },
}

#[derive(Debug, Clone)]
struct ScreenState {
    place: Place,
    /// Place name sent as the weather query.
    query: String,
    fetch: FetchState,
    /// The query changed while a fetch was in flight; fetch again when it lands.
    query_changed: bool,
    observation: Option<WeatherObservation>,
}

enum Step {
    Shutdown,
    Location(LocationUpdate),
    Internal(ScreenEvent),
}

pub struct WeatherScreen<V> {
    settings: ScreenSettings,
    state: ScreenState,
    view: V,
    source: Arc<dyn WeatherSource>,
    events_tx: UnboundedSender<ScreenEvent>,
    events_rx: UnboundedReceiver<ScreenEvent>,
}

impl<V: WeatherView> WeatherScreen<V> {
    pub fn new(settings: ScreenSettings, view: V, source: Arc<dyn WeatherSource>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let state = ScreenState {
            place: Place::named(settings.default_place.clone()),
            query: settings.default_place.clone(),
            fetch: FetchState::Idle,
            query_changed: false,
            observation: None,
        };

        Self {
            settings,
            state,
            view,
            source,
            events_tx,
            events_rx,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn place(&self) -> &Place {
        &self.state.place
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    pub fn fetch_state(&self) -> FetchState {
        self.state.fetch
    }

    pub fn observation(&self) -> Option<&WeatherObservation> {
        self.state.observation.as_ref()
    }

    /// Decorate the view, show the default place and issue the first fetch.
    pub fn on_load(&mut self) {
        let chrome = Chrome {
            date_text: chrono::Local::now()
                .format("%m월 %d일 %H시 %M분")
                .to_string(),
            greeting: GREETING.to_string(),
        };
        self.view.apply_chrome(&chrome);
        self.view.set_place_label(&self.state.place.display_name);
        self.view.present();

        self.request_fetch();
    }

    pub fn on_location_update(&mut self, update: LocationUpdate) {
        self.state.place.latitude = Some(update.coordinates.latitude);
        self.state.place.longitude = Some(update.coordinates.longitude);

        if let Some(placemark) = &update.placemark {
            let resolution = resolve_place(placemark);
            let label = resolution.label();

            self.view.set_place_label(&label);
            self.view.present();
            self.state.place.display_name = label;

            if let Some(key) = resolution.query_key().filter(|k| *k != self.state.query) {
                tracing::info!(from = %self.state.query, to = key, "Adopting new weather query");
                self.state.query = key.to_string();
                if self.state.fetch == FetchState::Fetching {
                    self.state.query_changed = true;
                }
            }
        }

        self.request_fetch();
    }

    /// Start a fetch unless one is already in flight. Returns whether one started.
    pub fn request_fetch(&mut self) -> bool {
        if self.state.fetch == FetchState::Fetching {
            tracing::debug!(query = %self.state.query, "Fetch already in flight; request dropped");
            return false;
        }
        self.state.fetch = FetchState::Fetching;

        let source = Arc::clone(&self.source);
        let query = self.state.query.clone();
        let api_key = self.settings.api_key.clone();
        let events = self.events_tx.clone();

        tracing::info!(query = %query, "Fetching weather");

        tokio::spawn(async move {
            let result = source.fetch(&query, &api_key).await;
            // The screen may be gone by now; nothing to do then.
            let _ = events.send(ScreenEvent::FetchCompleted(result));
        });

        true
    }

    pub fn on_fetch_result(&mut self, result: Result<WeatherObservation, FetchError>) {
        self.state.fetch = FetchState::Idle;

        if std::mem::take(&mut self.state.query_changed) {
            tracing::debug!(query = %self.state.query, "Query changed mid-flight; fetching again");
            self.request_fetch();
        }

        let observation = match result {
            Ok(observation) => observation,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching weather data");
                return;
            }
        };

        let units = self.settings.units;
        self.view
            .set_temperature_text(&temperature_text(observation.temperature, units));
        self.view
            .set_humidity_text(&humidity_text(observation.humidity));
        self.view
            .set_wind_speed_text(&wind_speed_text(observation.wind_speed, units));
        self.view.present();

        self.load_icon(observation.icon_code.clone());
        self.state.observation = Some(observation);
    }

    fn load_icon(&self, code: String) {
        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let result = source.fetch_icon(&code).await;
            let _ = events.send(ScreenEvent::IconLoaded { code, result });
        });
    }

    fn on_icon_loaded(&mut self, code: String, result: Result<Vec<u8>, FetchError>) {
        let current = self.state.observation.as_ref().map(|o| o.icon_code.as_str());
        if current != Some(code.as_str()) {
            tracing::debug!(code = %code, "Discarding icon for a superseded observation");
            return;
        }

        match result {
            Ok(image) => {
                let icon = ConditionIcon {
                    url: icon_url(&self.settings.icon_base_url, &code),
                    code,
                    image,
                };
                self.view.set_icon(Some(&icon));
            }
            Err(e) => {
                tracing::warn!(error = %e, code = %code, "Failed to load weather icon");
                self.view.set_icon(None);
            }
        }
        self.view.present();
    }

    fn handle(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::FetchCompleted(result) => self.on_fetch_result(result),
            ScreenEvent::IconLoaded { code, result } => self.on_icon_loaded(code, result),
        }
    }

    /// Wait for the next fetch or icon completion and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Drive the screen until `shutdown` resolves, then tear it down and hand
    /// the view back.
    pub async fn run(
        mut self,
        mut location: LocationProvider,
        mut updates: UnboundedReceiver<LocationUpdate>,
        shutdown: impl Future<Output = ()>,
    ) -> V {
        tokio::pin!(shutdown);

        self.on_load();
        location.start();

        loop {
            let step = tokio::select! {
                _ = &mut shutdown => Step::Shutdown,
                Some(update) = updates.recv() => Step::Location(update),
                Some(event) = self.events_rx.recv() => Step::Internal(event),
            };

            match step {
                Step::Shutdown => break,
                Step::Location(update) => self.on_location_update(update),
                Step::Internal(event) => self.handle(event),
            }
        }

        tracing::info!("Weather screen torn down");
        drop(location);
        self.view
    }
}

// `{:?}` keeps the fractional part of whole numbers: 60.0, not 60.

pub fn temperature_text(temperature: f64, units: Units) -> String {
    format!("지금은 {temperature:?}{}에요", units.temperature_suffix())
}

pub fn humidity_text(humidity: f64) -> String {
    format!("{humidity:?}만큼 습해요")
}

pub fn wind_speed_text(speed: f64, units: Units) -> String {
    format!("{speed:?}{}의 바람이 불어요", units.speed_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Placemark};
    use async_trait::async_trait;
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tokio::sync::Notify;

    #[derive(Debug, Default)]
    struct RecordingView {
        chrome: Option<Chrome>,
        place: String,
        temperature: Option<String>,
        humidity: Option<String>,
        wind_speed: Option<String>,
        icon_url: Option<String>,
    }

    impl WeatherView for RecordingView {
        fn apply_chrome(&mut self, chrome: &Chrome) {
            self.chrome = Some(chrome.clone());
        }

        fn set_place_label(&mut self, text: &str) {
            self.place = text.to_string();
        }

        fn set_temperature_text(&mut self, text: &str) {
            self.temperature = Some(text.to_string());
        }

        fn set_humidity_text(&mut self, text: &str) {
            self.humidity = Some(text.to_string());
        }

        fn set_wind_speed_text(&mut self, text: &str) {
            self.wind_speed = Some(text.to_string());
        }

        fn set_icon(&mut self, icon: Option<&ConditionIcon>) {
            self.icon_url = icon.map(|i| i.url.clone());
        }
    }

    #[derive(Debug, Default)]
    struct ScriptedSource {
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
        responses: Mutex<VecDeque<Result<WeatherObservation, FetchError>>>,
        gate: Option<Notify>,
        icon_fails: bool,
    }

    impl ScriptedSource {
        fn answering(responses: Vec<Result<WeatherObservation, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherSource for ScriptedSource {
        async fn fetch(
            &self,
            query: &str,
            _api_key: &str,
        ) -> Result<WeatherObservation, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(server_error()))
        }

        async fn fetch_icon(&self, _icon_code: &str) -> Result<Vec<u8>, FetchError> {
            if self.icon_fails {
                Err(server_error())
            } else {
                Ok(b"\x89PNG".to_vec())
            }
        }
    }

    fn server_error() -> FetchError {
        FetchError::Status {
            status: 500,
            body: "boom".into(),
        }
    }

    fn clear_sky() -> WeatherObservation {
        WeatherObservation {
            temperature: 21.5,
            humidity: 60.0,
            wind_speed: 3.2,
            icon_code: "01d".into(),
        }
    }

    fn settings() -> ScreenSettings {
        ScreenSettings {
            default_place: "Seoul".into(),
            api_key: "KEY".into(),
            units: Units::Metric,
            icon_base_url: "https://openweathermap.org/img/wn".into(),
        }
    }

    fn screen(source: &Arc<ScriptedSource>) -> WeatherScreen<RecordingView> {
        let source: Arc<dyn WeatherSource> = source.clone();
        WeatherScreen::new(settings(), RecordingView::default(), source)
    }

    fn update(placemark: Option<Placemark>) -> LocationUpdate {
        LocationUpdate {
            coordinates: Coordinates::new(37.5, 127.03),
            placemark,
        }
    }

    fn placemark(locality: Option<&str>, sub_locality: Option<&str>) -> Placemark {
        Placemark {
            locality: locality.map(String::from),
            sub_locality: sub_locality.map(String::from),
        }
    }

    #[tokio::test]
    async fn load_shows_default_place_and_renders_result() {
        let source = Arc::new(ScriptedSource::answering(vec![Ok(clear_sky())]));
        let mut screen = screen(&source);

        screen.on_load();
        assert_eq!(screen.fetch_state(), FetchState::Fetching);
        assert_eq!(screen.view().place, "Seoul");
        assert_eq!(
            screen.view().chrome.as_ref().map(|c| c.greeting.as_str()),
            Some(GREETING)
        );

        assert!(screen.process_next().await);
        assert_eq!(screen.fetch_state(), FetchState::Idle);
        assert_eq!(source.queries(), vec!["Seoul"]);

        let view = screen.view();
        assert_eq!(view.temperature.as_deref(), Some("지금은 21.5°C에요"));
        assert_eq!(view.humidity.as_deref(), Some("60.0만큼 습해요"));
        assert_eq!(view.wind_speed.as_deref(), Some("3.2m/s의 바람이 불어요"));

        assert!(screen.process_next().await);
        assert_eq!(
            screen.view().icon_url.as_deref(),
            Some("https://openweathermap.org/img/wn/01d@2x.png")
        );
    }

    #[tokio::test]
    async fn requests_while_fetching_are_dropped() {
        let source = Arc::new(ScriptedSource {
            gate: Some(Notify::new()),
            ..ScriptedSource::answering(vec![Ok(clear_sky())])
        });
        let mut screen = screen(&source);

        screen.on_load();
        screen.on_location_update(update(None));
        screen.on_location_update(update(None));
        assert!(!screen.request_fetch());

        if let Some(gate) = &source.gate {
            gate.notify_one();
        }
        assert!(screen.process_next().await);

        assert_eq!(source.calls(), 1);
        assert_eq!(screen.fetch_state(), FetchState::Idle);
        assert!(screen.request_fetch(), "gate reopens after completion");
    }

    #[tokio::test]
    async fn failed_fetch_leaves_display_unchanged() {
        let source = Arc::new(ScriptedSource::answering(vec![
            Ok(clear_sky()),
            Err(server_error()),
        ]));
        let mut screen = screen(&source);

        screen.on_load();
        screen.process_next().await;
        screen.process_next().await;

        let before = (
            screen.view().temperature.clone(),
            screen.view().humidity.clone(),
            screen.view().wind_speed.clone(),
        );

        assert!(screen.request_fetch());
        screen.process_next().await;

        let after = (
            screen.view().temperature.clone(),
            screen.view().humidity.clone(),
            screen.view().wind_speed.clone(),
        );
        assert_eq!(before, after);
        assert_eq!(screen.observation(), Some(&clear_sky()));
        assert_eq!(screen.fetch_state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn locality_only_becomes_the_query() {
        let source = Arc::new(ScriptedSource::default());
        let mut screen = screen(&source);

        screen.on_location_update(update(Some(placemark(Some("Gangnam-gu"), None))));

        assert_eq!(screen.view().place, "Gangnam-gu");
        assert_eq!(screen.query(), "Gangnam-gu");
        assert_eq!(screen.place().latitude, Some(37.5));

        screen.process_next().await;
        assert_eq!(source.queries(), vec!["Gangnam-gu"]);
    }

    #[tokio::test]
    async fn detailed_place_updates_label_only() {
        let source = Arc::new(ScriptedSource::default());
        let mut screen = screen(&source);

        screen.on_location_update(update(Some(placemark(
            Some("Gangnam-gu"),
            Some("Yeoksam-dong"),
        ))));

        assert_eq!(screen.view().place, "Gangnam-gu, Yeoksam-dong");
        assert_eq!(screen.place().display_name, "Gangnam-gu, Yeoksam-dong");
        assert_eq!(screen.query(), "Seoul");
    }

    #[tokio::test]
    async fn unresolved_place_is_unknown() {
        let source = Arc::new(ScriptedSource::default());
        let mut screen = screen(&source);

        screen.on_location_update(update(Some(placemark(None, None))));

        assert_eq!(screen.view().place, "Unknown location");
        assert_eq!(screen.query(), "Seoul");
    }

    #[tokio::test]
    async fn coordinates_alone_keep_the_label() {
        let source = Arc::new(ScriptedSource::default());
        let mut screen = screen(&source);

        screen.on_load();
        screen.process_next().await;
        screen.on_location_update(update(None));

        assert_eq!(screen.view().place, "Seoul");
        assert_eq!(screen.fetch_state(), FetchState::Fetching);
    }

    #[tokio::test]
    async fn icon_failure_leaves_icon_blank() {
        let source = Arc::new(ScriptedSource {
            icon_fails: true,
            ..ScriptedSource::answering(vec![Ok(clear_sky())])
        });
        let mut screen = screen(&source);

        screen.on_load();
        screen.process_next().await;
        screen.process_next().await;

        assert_eq!(screen.view().icon_url, None);
        assert!(screen.view().temperature.is_some());
    }

    #[tokio::test]
    async fn locality_adopted_mid_flight_is_fetched_afterwards() {
        let gangnam = WeatherObservation {
            temperature: 18.0,
            ..clear_sky()
        };
        let source = Arc::new(ScriptedSource::answering(vec![
            Ok(clear_sky()),
            Ok(gangnam.clone()),
        ]));
        let mut screen = screen(&source);

        screen.on_load();
        screen.on_location_update(update(None));
        screen.on_location_update(update(Some(placemark(Some("Gangnam-gu"), None))));
        assert_eq!(screen.query(), "Gangnam-gu");

        // Seoul result, then the follow-up fetch and the first icon in either order
        for _ in 0..3 {
            screen.process_next().await;
        }

        assert_eq!(source.queries(), vec!["Seoul", "Gangnam-gu"]);
        assert_eq!(screen.observation(), Some(&gangnam));
        assert_eq!(
            screen.view().temperature.as_deref(),
            Some("지금은 18.0°C에요")
        );
    }

    #[tokio::test]
    async fn unchanged_query_is_not_refetched() {
        let source = Arc::new(ScriptedSource::answering(vec![Ok(clear_sky())]));
        let mut screen = screen(&source);

        screen.on_load();
        screen.on_location_update(update(Some(placemark(Some("Seoul"), None))));
        screen.process_next().await;

        assert_eq!(screen.fetch_state(), FetchState::Idle);
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn whole_numbers_keep_their_decimal() {
        assert_eq!(humidity_text(60.0), "60.0만큼 습해요");
        assert_eq!(temperature_text(21.0, Units::Metric), "지금은 21.0°C에요");
        assert_eq!(wind_speed_text(3.2, Units::Metric), "3.2m/s의 바람이 불어요");
    }

    #[test]
    fn labels_follow_units() {
        assert_eq!(temperature_text(294.65, Units::Standard), "지금은 294.65K에요");
        assert_eq!(temperature_text(70.7, Units::Imperial), "지금은 70.7°F에요");
        assert_eq!(wind_speed_text(7.2, Units::Imperial), "7.2mph의 바람이 불어요");
    }
}
