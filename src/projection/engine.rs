use serde::Serialize;
use time::{macros::format_description, Duration, OffsetDateTime};

use crate::market::PriceSample;

/// Number of trailing samples the projection looks at.
pub const WINDOW: usize = 24;
/// Applied to extrapolated momentum so long horizons do not run away linearly.
pub const DAMPING_FACTOR: f64 = 0.8;
pub const DEFAULT_HORIZON_HOURS: u32 = 24;

const MIN_CONFIDENCE: f64 = 10.0;
const MAX_CONFIDENCE: f64 = 95.0;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Insufficient data for prediction: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("Invalid price series: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
}

/// Dispersion and momentum of the trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// stddev / mean, as a ratio.
    pub volatility: f64,
    pub avg_hourly_change: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResult {
    pub coin_id: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub conservative_prediction: f64,
    pub optimistic_prediction: f64,
    pub confidence: f64,
    pub trend: Trend,
    #[serde(with = "time::serde::rfc3339")]
    pub prediction_timestamp: OffsetDateTime,
    pub days_to_target: f64,
    pub hours_to_target: u32,
    pub prediction_date: String,
    pub prediction_time: String,
    /// Percent.
    pub volatility: f64,
    /// Average hourly change scaled to a day, in percent.
    pub average_daily_change: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Mean, population stddev and mean step-to-step relative change of `prices`.
pub fn window_stats(prices: &[f64]) -> WindowStats {
    let n = prices.len() as f64;
    let total = prices.iter().sum::<f64>();
    let mean = if total.is_finite() {
        total / n
    } else {
        // Prices near f64::MAX overflow the plain sum.
        prices.iter().map(|p| p / n).sum::<f64>()
    };
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let volatility = variance.sqrt() / mean;

    let changes: Vec<f64> = prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
    let avg_hourly_change = if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    };

    WindowStats {
        volatility,
        avg_hourly_change,
    }
}

pub fn confidence(volatility: f64) -> f64 {
    let consistency = 1.0 - volatility * 10.0;
    (consistency * 100.0).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Project the price `horizon_hours` past `now` from the trailing [`WINDOW`]
/// samples of a chronological series. Pure: same inputs, same output.
pub fn project(
    coin_id: &str,
    series: &[PriceSample],
    horizon_hours: u32,
    now: OffsetDateTime,
) -> Result<ProjectionResult, ProjectionError> {
    if series.len() < WINDOW {
        return Err(ProjectionError::InsufficientData {
            needed: WINDOW,
            got: series.len(),
        });
    }
    let window = &series[series.len() - WINDOW..];
    if let Some(bad) = window
        .iter()
        .find(|s| !s.price.is_finite() || s.price <= 0.0)
    {
        return Err(ProjectionError::InvalidInput(format!(
            "non-positive price {} at timestamp {}",
            bad.price, bad.timestamp
        )));
    }
    if window.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
        return Err(ProjectionError::InvalidInput(
            "samples are not in chronological order".into(),
        ));
    }

    let prices: Vec<f64> = window.iter().map(|s| s.price).collect();
    let stats = window_stats(&prices);
    let current_price = prices[prices.len() - 1];

    if !stats.volatility.is_finite() || !stats.avg_hourly_change.is_finite() {
        return Err(ProjectionError::InvalidInput(
            "price window statistics are out of range".into(),
        ));
    }

    let projected_change = stats.avg_hourly_change * horizon_hours as f64 * DAMPING_FACTOR;
    let predicted_price = current_price * (1.0 + projected_change);
    let conservative_prediction = current_price * (1.0 + projected_change * 0.5);
    let optimistic_prediction = current_price * (1.0 + projected_change * 1.5);
    if ![predicted_price, conservative_prediction, optimistic_prediction]
        .iter()
        .all(|p| p.is_finite())
    {
        return Err(ProjectionError::InvalidInput(
            "projected price is out of range".into(),
        ));
    }

    let target = now
        .checked_add(Duration::hours(horizon_hours as i64))
        .ok_or_else(|| {
            ProjectionError::InvalidInput(format!("horizon of {horizon_hours} hours is out of range"))
        })?;

    Ok(ProjectionResult {
        coin_id: coin_id.to_string(),
        current_price,
        predicted_price,
        conservative_prediction,
        optimistic_prediction,
        confidence: confidence(stats.volatility),
        trend: if projected_change > 0.0 {
            Trend::Bullish
        } else {
            Trend::Bearish
        },
        prediction_timestamp: target,
        days_to_target: (horizon_hours as f64 / 24.0 * 100.0).round() / 100.0,
        hours_to_target: horizon_hours,
        prediction_date: target
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default(),
        prediction_time: target
            .format(format_description!("[hour]:[minute]"))
            .unwrap_or_default(),
        volatility: stats.volatility * 100.0,
        average_daily_change: stats.avg_hourly_change * 24.0 * 100.0,
        timestamp: now,
    })
}
