use std::io::Write;

use weather_widget_core::{Chrome, ConditionIcon, WeatherView};

/// Renders the screen as a text panel, redrawn after every change.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
    date: String,
    greeting: String,
    place: String,
    temperature: String,
    humidity: String,
    wind_speed: String,
    icon: Option<(String, String)>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            date: String::new(),
            greeting: String::new(),
            place: String::new(),
            temperature: String::new(),
            humidity: String::new(),
            wind_speed: String::new(),
            icon: None,
        }
    }

    fn render(&mut self) -> std::io::Result<()> {
        let icon = match &self.icon {
            Some((code, url)) => format!("{} {url}", glyph(code)),
            None => String::new(),
        };

        writeln!(self.out, "{}", "─".repeat(40))?;
        writeln!(self.out, "{}", self.date)?;
        // refresh and share are decorative only
        writeln!(self.out, "➤ {:<30} ⇪  ↻", self.place)?;
        for line in [&self.temperature, &self.humidity, &self.wind_speed, &icon] {
            if !line.is_empty() {
                writeln!(self.out, "  {line}")?;
            }
        }
        writeln!(self.out, "  {}", self.greeting)?;
        self.out.flush()
    }
}

impl<W: Write> WeatherView for TerminalView<W> {
    fn apply_chrome(&mut self, chrome: &Chrome) {
        self.date = chrome.date_text.clone();
        self.greeting = chrome.greeting.clone();
    }

    fn set_place_label(&mut self, text: &str) {
        self.place = text.to_string();
    }

    fn set_temperature_text(&mut self, text: &str) {
        self.temperature = text.to_string();
    }

    fn set_humidity_text(&mut self, text: &str) {
        self.humidity = text.to_string();
    }

    fn set_wind_speed_text(&mut self, text: &str) {
        self.wind_speed = text.to_string();
    }

    fn set_icon(&mut self, icon: Option<&ConditionIcon>) {
        self.icon = icon.map(|i| (i.code.clone(), i.url.clone()));
    }

    fn present(&mut self) {
        if let Err(e) = self.render() {
            tracing::warn!(error = %e, "Failed to draw weather screen");
        }
    }
}

/// Terminal stand-in for the provider's icon image.
fn glyph(code: &str) -> &'static str {
    match code.get(..2) {
        Some("01") => "☀",
        Some("02") => "⛅",
        Some("03" | "04") => "☁",
        Some("09" | "10") => "🌧",
        Some("11") => "⛈",
        Some("13") => "❄",
        Some("50") => "🌫",
        _ => "·",
    }
}
