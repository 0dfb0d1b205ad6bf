use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;

/// Day-ahead price for `[time_start, time_end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub price_eur_per_mwh: f64,
}

/// Solar production estimate for the period ending at `period_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarEstimate {
    pub period_end: DateTime<Utc>,
    /// ISO 8601 duration of the period, e.g. `PT30M`.
    pub period: String,
    #[serde(alias = "pv_estimate")]
    pub pv_estimate_kw: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct SolarForecastResponse {
    forecasts: Vec<SolarEstimate>,
}

/// Live battery reading captured right before assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub name: String,
    pub capacity_kwh: f64,
    pub soc_kwh: f64,
}

#[async_trait]
pub trait PriceForecaster: Send + Sync {
    async fn day_ahead_prices(&self) -> Result<Vec<PricePoint>>;
}

#[async_trait]
pub trait SolarForecaster: Send + Sync {
    async fn solar_forecast(&self) -> Result<Vec<SolarEstimate>>;
}

#[async_trait]
pub trait BatteryTelemetry: Send + Sync {
    async fn battery_readings(&self) -> Result<Vec<BatteryReading>>;
}

/// Source backed by a JSON file that some other process keeps fresh.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&body)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

#[async_trait]
impl PriceForecaster for JsonFile {
    async fn day_ahead_prices(&self) -> Result<Vec<PricePoint>> {
        self.read().await
    }
}

#[async_trait]
impl SolarForecaster for JsonFile {
    async fn solar_forecast(&self) -> Result<Vec<SolarEstimate>> {
        let response: SolarForecastResponse = self.read().await?;
        Ok(response.forecasts)
    }
}

#[async_trait]
impl BatteryTelemetry for JsonFile {
    async fn battery_readings(&self) -> Result<Vec<BatteryReading>> {
        self.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "home-energy-dispatch-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_solcast_style_forecast() {
        let path = temp_file(
            "forecast.json",
            r#"{"forecasts":[{"pv_estimate":1.5,"pv_estimate10":1.0,"pv_estimate90":2.0,
                "period_end":"2026-10-18T10:30:00Z","period":"PT30M"}]}"#,
        );
        let forecast = JsonFile::new(&path).solar_forecast().await.unwrap();
        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast[0].pv_estimate_kw, 1.5);
        assert_eq!(forecast[0].period, "PT30M");
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn reads_price_points() {
        let path = temp_file(
            "prices.json",
            r#"[{"time_start":"2026-10-18T10:00:00Z","time_end":"2026-10-18T11:00:00Z",
                "price_eur_per_mwh":95.5}]"#,
        );
        let prices = JsonFile::new(&path).day_ahead_prices().await.unwrap();
        assert_eq!(prices[0].price_eur_per_mwh, 95.5);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let source = JsonFile::new("/nonexistent/telemetry.json");
        let err = source.battery_readings().await.unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/telemetry.json"));
    }
}
