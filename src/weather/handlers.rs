use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::instrument;

use super::services::{fetch_weather, Season, WeatherReport};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/weather", get(get_weather))
        .route("/season-colors", get(season_colors))
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeasonColors {
    pub season: Season,
    pub colors: [&'static str; 5],
}

#[instrument(skip(state))]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(q): Query<WeatherQuery>,
) -> Json<WeatherReport> {
    let location = q
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(state.config.weather.default_location.as_str());
    Json(fetch_weather(&state.http, &state.config.weather, location).await)
}

pub async fn season_colors() -> Json<SeasonColors> {
    let season = Season::of(OffsetDateTime::now_utc().month());
    Json(SeasonColors {
        season,
        colors: season.palette(),
    })
}
