use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// MCP Tool Request Models
// ============================================================================

/// A point-in-time environmental reading for one pincode
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ForecastRequest {
    pub pincode: u32,
    pub aqi_index: f64,
    pub temperature_mean_c: f64,
    pub relative_humidity_mean: f64,
    pub rain_mm: f64,
    pub uv_index_mean: f64,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FindHospitalsRequest {
    pub pincode: u32,
}

// ============================================================================
// Surge Forecast Response Models
// ============================================================================

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub date: String,
    pub predicted_patient_load: f64,
    pub predicted_disease_spike: String,
    pub predicted_intensity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeForecast {
    #[serde(rename = "horizonHours")]
    pub horizon_hours: u32,
    #[serde(rename = "primarySurgeType")]
    pub primary_surge_type: String,
    #[serde(rename = "primarySurgeSeverity")]
    pub primary_surge_severity: String,
    #[serde(rename = "timeBuckets")]
    pub time_buckets: Vec<TimeBucket>,
}

/// One hospital registry record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub hospital_id: String,
    pub hospital_name: String,
    pub city: String,
    pub pincode: String,
    pub specialty: String,
    pub total_beds: u32,
    pub icu_beds: u32,
    pub ventilators: u32,
    pub doctors_available: u32,
    pub nurses_available: u32,
    pub oxygen_cylinders: u32,
    pub ppe_kits: u32,
    pub emergency_available: String,
    pub rating: f64,
    pub contact_number: String,
    pub last_updated: String,
}

/// Full tool response: forecast plus the hospitals serving the pincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub pincode: String,
    #[serde(rename = "surgeForecast")]
    pub surge_forecast: SurgeForecast,
    pub hospitals: Vec<Hospital>,
}

// ============================================================================
// Gemini API Models
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        if candidate.content.parts.is_empty() {
            return None;
        }
        Some(
            candidate
                .content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect(),
        )
    }
}
