/// Static decorations applied once when the screen loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chrome {
    /// Load time, e.g. `06월 21일 14시 05분`.
    pub date_text: String,
    pub greeting: String,
}

/// A condition icon that finished downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionIcon {
    pub code: String,
    pub url: String,
    pub image: Vec<u8>,
}

/// Everything the screen can change on whatever is rendering it.
///
/// Only the screen's own task calls these.
pub trait WeatherView {
    fn apply_chrome(&mut self, chrome: &Chrome);

    fn set_place_label(&mut self, text: &str);

    fn set_temperature_text(&mut self, text: &str);

    fn set_humidity_text(&mut self, text: &str);

    fn set_wind_speed_text(&mut self, text: &str);

    /// `None` leaves the icon area blank.
    fn set_icon(&mut self, icon: Option<&ConditionIcon>);

    /// Called after each batch of changes.
    fn present(&mut self) {}
}
