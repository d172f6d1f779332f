use std::collections::HashMap;

use crate::constants::{
    ASSUMED_AVG_CAPACITY, ASSUMED_HOSPITAL_COUNT, ASSUMED_POPULATION_DENSITY,
    DISEASE_RISK_PRIOR, PM10_AQI_SHARE, PM2_5_AQI_SHARE,
};
use crate::models::ForecastRequest;

/// Lag offsets (in days) the model was trained with
pub const LAG_DAYS: [u32; 5] = [1, 2, 3, 7, 14];

/// Outcome columns that carry lagged history
pub const LAGGED_COLUMNS: [&str; 6] = [
    "patient_load",
    "respiratory_cases",
    "flu_cases",
    "vector_cases",
    "gastro_cases",
    "other_cases",
];

/// The complete named numeric input vector consumed by the trained models.
///
/// A row never errors on lookup: a feature that was never set reads as 0.0,
/// matching how the trained schema fills gaps.
#[derive(Debug, Clone, Default)]
pub struct FeatureRow {
    values: HashMap<String, f64>,
}

impl FeatureRow {
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Projects the row onto the trained feature list, in that exact order.
    /// Features the row lacks are filled with 0.0.
    pub fn aligned(&self, features: &[String]) -> Vec<f64> {
        features.iter().map(|f| self.get(f)).collect()
    }
}

/// Builds the initial inference row from an environmental reading.
///
/// Static context, calendar flags, and disease-risk priors are fixed
/// placeholders; no real history is available at request time, so every lag
/// feature starts at zero.
pub fn build_feature_row(reading: &ForecastRequest, month: u32) -> FeatureRow {
    let mut row = FeatureRow::default();

    row.set("city", 0.0);
    row.set("pincode", f64::from(reading.pincode));
    row.set("population_density", ASSUMED_POPULATION_DENSITY);
    row.set("no_of_hospitals", ASSUMED_HOSPITAL_COUNT);
    row.set("avg_capacity", ASSUMED_AVG_CAPACITY);

    row.set("pm2_5", reading.aqi_index * PM2_5_AQI_SHARE);
    row.set("pm10", reading.aqi_index * PM10_AQI_SHARE);
    row.set("temperature_mean_c", reading.temperature_mean_c);
    row.set("relative_humidity_mean", reading.relative_humidity_mean);
    row.set("uv_index_mean", reading.uv_index_mean);
    row.set("rain_mm", reading.rain_mm);

    row.set("is_weekend", 0.0);
    row.set("is_festival", 0.0);
    row.set("school_open", 1.0);
    row.set("month", f64::from(month));

    row.set("respiratory_risk", DISEASE_RISK_PRIOR);
    row.set("flu_risk", DISEASE_RISK_PRIOR);
    row.set("vector_risk", DISEASE_RISK_PRIOR);
    row.set("gastro_risk", DISEASE_RISK_PRIOR);

    for lag in LAG_DAYS {
        for col in LAGGED_COLUMNS {
            row.set(&format!("{col}_lag{lag}"), 0.0);
        }
    }

    row
}
