use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, NaiveDate};
use thiserror::Error;

use crate::features::build_feature_row;
use crate::models::{ForecastRequest, SurgeForecast, TimeBucket};
use crate::predictor::{ModelError, SurgePredictor};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("invalid environmental reading: {0}")]
    InvalidInput(String),
    #[error("prediction model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
}

/// AQI bucket label per the standard six-band table. Values outside 0-500
/// (and NaN) yield "Invalid AQI" rather than an error so the pipeline stays
/// available on bad sensor data.
pub fn intensity_from_aqi(aqi: f64) -> &'static str {
    if (0.0..=50.0).contains(&aqi) {
        "Good"
    } else if (51.0..=100.0).contains(&aqi) {
        "Moderate"
    } else if (101.0..=150.0).contains(&aqi) {
        "Unhealthy for Sensitive Groups"
    } else if (151.0..=200.0).contains(&aqi) {
        "Unhealthy"
    } else if (201.0..=300.0).contains(&aqi) {
        "Very Unhealthy"
    } else if (301.0..=500.0).contains(&aqi) {
        "Hazardous"
    } else {
        "Invalid AQI"
    }
}

/// Collapses an intensity label to an overall severity bucket
pub fn severity_from_intensity(intensity: &str) -> &'static str {
    match intensity {
        "Good" => "Low",
        "Moderate" | "Unhealthy for Sensitive Groups" => "Moderate",
        "Unhealthy" | "Very Unhealthy" => "High",
        "Hazardous" => "Severe",
        _ => "Low",
    }
}

fn validate_reading(reading: &ForecastRequest) -> Result<(), ForecastError> {
    let numeric_fields = [
        ("aqi_index", reading.aqi_index),
        ("temperature_mean_c", reading.temperature_mean_c),
        ("relative_humidity_mean", reading.relative_humidity_mean),
        ("rain_mm", reading.rain_mm),
        ("uv_index_mean", reading.uv_index_mean),
    ];
    for (name, value) in numeric_fields {
        if !value.is_finite() {
            return Err(ForecastError::InvalidInput(format!(
                "{name} must be a finite number"
            )));
        }
    }
    if !(0.0..=100.0).contains(&reading.relative_humidity_mean) {
        return Err(ForecastError::InvalidInput(format!(
            "relative_humidity_mean must be between 0 and 100, got {}",
            reading.relative_humidity_mean
        )));
    }
    if reading.rain_mm < 0.0 {
        return Err(ForecastError::InvalidInput(format!(
            "rain_mm must be non-negative, got {}",
            reading.rain_mm
        )));
    }
    if reading.uv_index_mean < 0.0 {
        return Err(ForecastError::InvalidInput(format!(
            "uv_index_mean must be non-negative, got {}",
            reading.uv_index_mean
        )));
    }
    Ok(())
}

/// Statistical mode of the per-step disease votes. Without a unique mode the
/// most recent step wins.
fn dominant_disease(votes: &[String]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.as_str()).or_default() += 1;
    }
    let top = counts.values().copied().max().unwrap_or(0);
    let modes: Vec<&str> = counts
        .iter()
        .filter(|(_, &count)| count == top)
        .map(|(&label, _)| label)
        .collect();
    match modes.as_slice() {
        [unique] => (*unique).to_string(),
        _ => votes
            .last()
            .cloned()
            .unwrap_or_else(|| "respiratory_risk".to_string()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Runs the autoregressive forecast anchored at the current wall-clock date.
pub fn forecast(
    reading: &ForecastRequest,
    predictor: &dyn SurgePredictor,
    horizon_steps: u32,
) -> Result<SurgeForecast, ForecastError> {
    forecast_from(reading, predictor, horizon_steps, Local::now().date_naive())
}

/// Autoregressive multi-day surge forecast.
///
/// Builds one feature row from the reading, then walks the horizon one day at
/// a time: predict load and disease, then feed the predicted load back into
/// the row's 1-day patient-load lag before the next step. That feedback is the
/// only state carried between steps; every other lag feature stays at zero.
///
/// Deterministic for a fixed `today` and pure predictors; `reading` is never
/// mutated. Dates run from `today + 1` through `today + horizon_steps`.
pub fn forecast_from(
    reading: &ForecastRequest,
    predictor: &dyn SurgePredictor,
    horizon_steps: u32,
    today: NaiveDate,
) -> Result<SurgeForecast, ForecastError> {
    validate_reading(reading)?;
    if horizon_steps == 0 {
        return Err(ForecastError::InvalidInput(
            "horizon must span at least one day".to_string(),
        ));
    }

    // Intensity is a property of the input reading, not of the day; it is
    // computed once and repeated on every bucket.
    let intensity = intensity_from_aqi(reading.aqi_index);
    let severity = severity_from_intensity(intensity);

    let mut row = build_feature_row(reading, today.month());
    let mut time_buckets = Vec::with_capacity(horizon_steps as usize);
    let mut disease_votes = Vec::with_capacity(horizon_steps as usize);
    let mut last_pred_load = 0.0;

    for step in 0..horizon_steps {
        let day = today + Duration::days(i64::from(step) + 1);
        if step > 0 {
            row.set("patient_load_lag1", last_pred_load);
        }

        let load_pred = predictor.predict_load(&row)?;
        let disease_pred = predictor.predict_disease(&row)?;
        last_pred_load = load_pred;
        disease_votes.push(disease_pred.clone());

        time_buckets.push(TimeBucket {
            date: day.format("%Y-%m-%d").to_string(),
            predicted_patient_load: round2(load_pred),
            predicted_disease_spike: disease_pred,
            predicted_intensity: intensity.to_string(),
        });
    }

    Ok(SurgeForecast {
        horizon_hours: horizon_steps * 24,
        primary_surge_type: dominant_disease(&disease_votes),
        primary_surge_severity: severity.to_string(),
        time_buckets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureRow;
    use std::cell::RefCell;

    /// Replays scripted predictions and records the lag features it was shown
    struct ScriptedPredictor {
        loads: Vec<f64>,
        diseases: Vec<&'static str>,
        load_calls: RefCell<usize>,
        disease_calls: RefCell<usize>,
        lag1_seen: RefCell<Vec<f64>>,
        other_lags_seen: RefCell<Vec<f64>>,
    }

    impl ScriptedPredictor {
        fn new(loads: Vec<f64>, diseases: Vec<&'static str>) -> Self {
            Self {
                loads,
                diseases,
                load_calls: RefCell::new(0),
                disease_calls: RefCell::new(0),
                lag1_seen: RefCell::new(Vec::new()),
                other_lags_seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl SurgePredictor for ScriptedPredictor {
        fn predict_load(&self, row: &FeatureRow) -> Result<f64, ModelError> {
            self.lag1_seen.borrow_mut().push(row.get("patient_load_lag1"));
            for lag in [2, 3, 7, 14] {
                self.other_lags_seen
                    .borrow_mut()
                    .push(row.get(&format!("patient_load_lag{lag}")));
            }
            let mut calls = self.load_calls.borrow_mut();
            let load = self.loads[*calls % self.loads.len()];
            *calls += 1;
            Ok(load)
        }

        fn predict_disease(&self, _row: &FeatureRow) -> Result<String, ModelError> {
            let mut calls = self.disease_calls.borrow_mut();
            let disease = self.diseases[*calls % self.diseases.len()];
            *calls += 1;
            Ok(disease.to_string())
        }
    }

    struct BrokenPredictor;

    impl SurgePredictor for BrokenPredictor {
        fn predict_load(&self, _row: &FeatureRow) -> Result<f64, ModelError> {
            Err(ModelError::EmptySchema)
        }

        fn predict_disease(&self, _row: &FeatureRow) -> Result<String, ModelError> {
            Err(ModelError::EmptySchema)
        }
    }

    fn reading_with_aqi(aqi: f64) -> ForecastRequest {
        ForecastRequest {
            pincode: 600002,
            aqi_index: aqi,
            temperature_mean_c: 28.0,
            relative_humidity_mean: 60.0,
            rain_mm: 1.0,
            uv_index_mean: 3.5,
        }
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn produces_consecutive_dates_starting_tomorrow() {
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["flu_risk"]);
        let forecast =
            forecast_from(&reading_with_aqi(90.0), &predictor, 3, fixed_today()).unwrap();
        assert_eq!(forecast.horizon_hours, 72);
        let dates: Vec<&str> = forecast
            .time_buckets
            .iter()
            .map(|b| b.date.as_str())
            .collect();
        assert_eq!(dates, ["2026-03-11", "2026-03-12", "2026-03-13"]);
    }

    #[test]
    fn intensity_is_constant_across_steps() {
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["flu_risk"]);
        let forecast =
            forecast_from(&reading_with_aqi(250.0), &predictor, 3, fixed_today()).unwrap();
        for bucket in &forecast.time_buckets {
            assert_eq!(bucket.predicted_intensity, "Very Unhealthy");
        }
        assert_eq!(forecast.primary_surge_severity, "High");
    }

    #[test]
    fn aqi_bucket_table() {
        assert_eq!(intensity_from_aqi(10.0), "Good");
        assert_eq!(intensity_from_aqi(90.0), "Moderate");
        assert_eq!(intensity_from_aqi(120.0), "Unhealthy for Sensitive Groups");
        assert_eq!(intensity_from_aqi(180.0), "Unhealthy");
        assert_eq!(intensity_from_aqi(250.0), "Very Unhealthy");
        assert_eq!(intensity_from_aqi(400.0), "Hazardous");
        assert_eq!(intensity_from_aqi(600.0), "Invalid AQI");
        assert_eq!(intensity_from_aqi(-5.0), "Invalid AQI");
        assert_eq!(intensity_from_aqi(f64::NAN), "Invalid AQI");
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(severity_from_intensity("Good"), "Low");
        assert_eq!(severity_from_intensity("Moderate"), "Moderate");
        assert_eq!(
            severity_from_intensity("Unhealthy for Sensitive Groups"),
            "Moderate"
        );
        assert_eq!(severity_from_intensity("Unhealthy"), "High");
        assert_eq!(severity_from_intensity("Very Unhealthy"), "High");
        assert_eq!(severity_from_intensity("Hazardous"), "Severe");
        assert_eq!(severity_from_intensity("Invalid AQI"), "Low");
    }

    #[test]
    fn invalid_aqi_falls_back_to_low_severity() {
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["flu_risk"]);
        let forecast =
            forecast_from(&reading_with_aqi(600.0), &predictor, 3, fixed_today()).unwrap();
        assert_eq!(forecast.time_buckets[0].predicted_intensity, "Invalid AQI");
        assert_eq!(forecast.primary_surge_severity, "Low");
    }

    #[test]
    fn unanimous_votes_set_primary_surge_type() {
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["respiratory_risk"]);
        let forecast =
            forecast_from(&reading_with_aqi(90.0), &predictor, 3, fixed_today()).unwrap();
        assert_eq!(forecast.primary_surge_type, "respiratory_risk");
    }

    #[test]
    fn vote_tie_falls_back_to_last_step() {
        let predictor = ScriptedPredictor::new(
            vec![120.0],
            vec!["flu_risk", "vector_risk", "gastro_risk"],
        );
        let forecast =
            forecast_from(&reading_with_aqi(90.0), &predictor, 3, fixed_today()).unwrap();
        assert_eq!(forecast.primary_surge_type, "gastro_risk");
    }

    #[test]
    fn majority_beats_last_step() {
        assert_eq!(
            dominant_disease(&[
                "flu_risk".to_string(),
                "flu_risk".to_string(),
                "gastro_risk".to_string(),
            ]),
            "flu_risk"
        );
    }

    #[test]
    fn predicted_load_feeds_back_into_lag1_only() {
        let predictor =
            ScriptedPredictor::new(vec![110.0, 135.0, 150.0], vec!["respiratory_risk"]);
        forecast_from(&reading_with_aqi(90.0), &predictor, 3, fixed_today()).unwrap();
        // Step 1 sees no history; steps 2 and 3 see the previous predictions.
        assert_eq!(*predictor.lag1_seen.borrow(), vec![0.0, 110.0, 135.0]);
        assert!(predictor.other_lags_seen.borrow().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn identical_inputs_yield_identical_forecasts() {
        let reading = reading_with_aqi(90.0);
        let first = forecast_from(
            &reading,
            &ScriptedPredictor::new(vec![110.0, 135.0, 150.0], vec!["flu_risk"]),
            3,
            fixed_today(),
        )
        .unwrap();
        let second = forecast_from(
            &reading,
            &ScriptedPredictor::new(vec![110.0, 135.0, 150.0], vec!["flu_risk"]),
            3,
            fixed_today(),
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_is_rounded_to_two_decimals() {
        let predictor = ScriptedPredictor::new(vec![110.23456], vec!["flu_risk"]);
        let forecast =
            forecast_from(&reading_with_aqi(90.0), &predictor, 1, fixed_today()).unwrap();
        assert_eq!(forecast.time_buckets[0].predicted_patient_load, 110.23);
    }

    #[test]
    fn rejects_out_of_range_humidity() {
        let mut reading = reading_with_aqi(90.0);
        reading.relative_humidity_mean = -5.0;
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["flu_risk"]);
        let err = forecast_from(&reading, &predictor, 3, fixed_today()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
        assert!(err.to_string().contains("relative_humidity_mean"));
    }

    #[test]
    fn rejects_non_finite_fields() {
        let mut reading = reading_with_aqi(90.0);
        reading.rain_mm = f64::NAN;
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["flu_risk"]);
        let err = forecast_from(&reading, &predictor, 3, fixed_today()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_horizon() {
        let predictor = ScriptedPredictor::new(vec![120.0], vec!["flu_risk"]);
        let err =
            forecast_from(&reading_with_aqi(90.0), &predictor, 0, fixed_today()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn model_failure_propagates() {
        let err =
            forecast_from(&reading_with_aqi(90.0), &BrokenPredictor, 3, fixed_today())
                .unwrap_err();
        assert!(matches!(err, ForecastError::ModelUnavailable(_)));
    }
}
