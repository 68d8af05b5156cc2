use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use time::Month;
use tracing::{debug, warn};

use crate::config::WeatherConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    /// Degrees Fahrenheit.
    pub temperature: i64,
    pub condition: String,
    pub icon: &'static str,
    pub description: String,
    pub mock: bool,
}

impl WeatherReport {
    pub fn fallback(location: &str) -> Self {
        Self {
            location: location.to_string(),
            temperature: 72,
            condition: "Sunny".into(),
            icon: weather_icon("Clear"),
            description: "Clear sky".into(),
            mock: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
    weather: Vec<Conditions>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    main: String,
    #[serde(default)]
    description: String,
}

pub fn weather_icon(condition: &str) -> &'static str {
    match condition {
        "Clear" => "\u{2600}\u{fe0f}",
        "Clouds" => "\u{2601}\u{fe0f}",
        "Rain" => "\u{1f327}\u{fe0f}",
        "Drizzle" => "\u{1f326}\u{fe0f}",
        "Thunderstorm" => "\u{26c8}\u{fe0f}",
        "Snow" => "\u{2744}\u{fe0f}",
        "Mist" | "Fog" => "\u{1f32b}\u{fe0f}",
        _ => "\u{1f324}\u{fe0f}",
    }
}

fn into_report(location: &str, current: CurrentWeather) -> anyhow::Result<WeatherReport> {
    let conditions = current
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("weather response has no conditions"))?;
    Ok(WeatherReport {
        location: location.to_string(),
        temperature: current.main.temp.trunc() as i64,
        icon: weather_icon(&conditions.main),
        condition: conditions.main,
        description: conditions.description,
        mock: false,
    })
}

async fn fetch_live(
    http: &reqwest::Client,
    cfg: &WeatherConfig,
    api_key: &str,
    location: &str,
) -> anyhow::Result<WeatherReport> {
    let response = http
        .get(&cfg.api_url)
        .query(&[("q", location), ("appid", api_key), ("units", "imperial")])
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .context("weather request")?
        .error_for_status()
        .context("weather status")?;
    let current: CurrentWeather = response.json().await.context("weather body")?;
    into_report(location, current)
}

/// Current weather for `location`. Falls back to a static report when no key is
/// configured or the lookup fails.
pub async fn fetch_weather(http: &reqwest::Client, cfg: &WeatherConfig, location: &str) -> WeatherReport {
    let Some(api_key) = cfg.api_key.as_deref() else {
        debug!("no weather api key, using static report");
        return WeatherReport::fallback(location);
    };
    match fetch_live(http, cfg, api_key, location).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, %location, "weather lookup failed, using static report");
            WeatherReport::fallback(location)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Meteorological season of a northern-hemisphere month.
    pub fn of(month: Month) -> Self {
        use Month::*;
        match month {
            December | January | February => Season::Winter,
            March | April | May => Season::Spring,
            June | July | August => Season::Summer,
            September | October | November => Season::Fall,
        }
    }

    pub fn palette(self) -> [&'static str; 5] {
        match self {
            Season::Winter => ["#000000", "#FFFFFF", "#4A4A4A", "#8B4513", "#2F4F4F"],
            Season::Spring => ["#FFB6C1", "#98FB98", "#87CEEB", "#FFD700", "#FFA07A"],
            Season::Summer => ["#FF6347", "#FFD700", "#00CED1", "#FF69B4", "#32CD32"],
            Season::Fall => ["#8B4513", "#A0522D", "#CD853F", "#D2691E", "#B22222"],
        }
    }
}
