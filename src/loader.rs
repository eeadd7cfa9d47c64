//! Data loader: fetches raw balance records for a date range and shapes them
//! into an [`HourlyTable`] summed across price areas.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::LoadError;
use crate::table::HourlyTable;

/// Energi Data Service dataset with per-hour, per-price-area balance records.
pub const DATASET_URL: &str =
    "https://api.energidataservice.dk/dataset/ElectricityBalanceNonv";

/// Grouping drops the UTC hour and the price area; every other field is a
/// candidate measurement.
const DISCARDED_FIELDS: [&str; 2] = ["HourUTC", "PriceArea"];

#[derive(Debug, Deserialize)]
struct DatasetResponse {
    records: Vec<BalanceRecord>,
}

/// One raw observation as it arrives on the wire. `HourDK` keys the hourly
/// grouping; everything else lands in the flattened field map.
#[derive(Debug, Deserialize)]
struct BalanceRecord {
    #[serde(rename = "HourDK")]
    hour_dk: String,
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

/// Client for the balance dataset endpoint.
///
/// The fetch is synchronous and blocks until the response completes or
/// errors; no timeout is configured and nothing is retried.
pub struct EnergyDataClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl EnergyDataClient {
    pub fn new() -> Result<Self, LoadError> {
        Self::with_base_url(DATASET_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, LoadError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetches records for the inclusive `[start, end]` date range, sorted by
    /// hour, and aggregates them per local-time hour.
    ///
    /// Transport failures and non-success statuses surface as
    /// [`LoadError::Fetch`]; a malformed body or missing `records` field as
    /// [`LoadError::Processing`]. No partial table is ever returned.
    pub fn load_power_data(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HourlyTable, LoadError> {
        let url = format!(
            "{}?start={}&end={}&sort=HourUTC",
            self.base_url, start, end
        );
        tracing::debug!(%url, "fetching electricity balance records");

        let response = self.http.get(&url).send()?.error_for_status()?;
        let body = response.text()?;
        let records = parse_records(&body)?;
        tracing::info!(records = records.len(), %start, %end, "fetched balance records");

        aggregate_hourly(records)
    }
}

/// Convenience wrapper: a default [`EnergyDataClient`] against the public
/// dataset endpoint.
pub fn load_power_data(start: NaiveDate, end: NaiveDate) -> Result<HourlyTable, LoadError> {
    EnergyDataClient::new()?.load_power_data(start, end)
}

fn parse_records(body: &str) -> Result<Vec<BalanceRecord>, LoadError> {
    let payload: DatasetResponse = serde_json::from_str(body)?;
    Ok(payload.records)
}

/// Folds raw records into one row per distinct local hour, summing every
/// numeric field across price areas. Null measurements count as zero, so a
/// missing value reads as "no generation" rather than as unknown.
fn aggregate_hourly(records: Vec<BalanceRecord>) -> Result<HourlyTable, LoadError> {
    let mut table = HourlyTable::new();
    for record in records {
        let hour = parse_hour(&record.hour_dk)?;
        for (field, value) in &record.fields {
            if DISCARDED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            let value = match value {
                serde_json::Value::Null => 0.0,
                serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
                other => {
                    tracing::trace!(field = %field, ?other, "skipping non-numeric field");
                    continue;
                }
            };
            table.add(hour, field, value);
        }
    }
    tracing::debug!(
        hours = table.len(),
        columns = table.columns().len(),
        "aggregated records per local hour"
    );
    Ok(table)
}

fn parse_hour(raw: &str) -> Result<NaiveDateTime, LoadError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(LoadError::from)
}
