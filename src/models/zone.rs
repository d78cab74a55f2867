use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ZoneRate {
    #[serde(default)]
    pub rate_numeric: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ZoneRate {
    pub fn numeric(rate: f64) -> Self {
        Self {
            rate_numeric: Some(rate),
            extra: Map::new(),
        }
    }
}

/// A parking zone as delivered by the zone data source. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    /// Hourly rate; the data source sends either a number or numeric text.
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub rates: Vec<ZoneRate>,
    #[serde(default)]
    pub max_duration_mins: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// The `price` field as a number, when present and numeric.
    pub fn price_value(&self) -> Option<f64> {
        match self.price.as_ref()? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        }
        .filter(|rate| rate.is_finite())
    }

    /// Highest `rate_numeric` across the time-sliced rates; entries without a
    /// numeric rate count as zero.
    pub fn max_rate(&self) -> Option<f64> {
        if self.rates.is_empty() {
            return None;
        }
        Some(
            self.rates
                .iter()
                .map(|rate| rate.rate_numeric.unwrap_or(0.0))
                .fold(f64::MIN, f64::max),
        )
    }

    /// Maximum parking duration in minutes; zero or negative means unlimited.
    pub fn max_duration(&self) -> Option<u32> {
        self.max_duration_mins
            .filter(|mins| *mins > 0)
            .map(|mins| u32::try_from(mins).unwrap_or(u32::MAX))
    }
}
