use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;

use crate::constants::{
    GEMINI_API_BASE, GEMINI_FALLBACK_MODEL, GEMINI_MAX_ATTEMPTS, GEMINI_PRIMARY_MODEL,
};
use crate::formatters::format_surge_forecast;
use crate::models::{ForecastResponse, GenerateContentRequest, GenerateContentResponse};

/// Error fragments that indicate the primary model itself is the problem,
/// so retrying it is pointless and the fallback model should be used instead
const FALLBACK_TRIGGERS: [&str; 4] = ["not found", "quota", "limit", "unavailable"];

/// Gemini-backed hospital operations planner.
///
/// Consumes a surge forecast plus the matching hospital records and asks the
/// planning model for one structured operational plan per hospital.
pub struct Planner {
    client: Arc<Client>,
    api_key: Option<String>,
}

impl Planner {
    pub fn new(client: Arc<Client>, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Produces the per-hospital operations plan as parsed JSON
    pub async fn plan(&self, response: &ForecastResponse) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY is not set; cannot run the operations planner"))?;

        let prompt = build_prompt(response)?;
        let text = self.generate_with_fallback(&prompt, api_key).await?;
        extract_json(&text)
    }

    /// Calls the primary model with bounded retry, switching to the fallback
    /// model when the error points at the primary itself
    async fn generate_with_fallback(&self, prompt: &str, api_key: &str) -> Result<String> {
        for attempt in 0..GEMINI_MAX_ATTEMPTS {
            match self.generate(GEMINI_PRIMARY_MODEL, prompt, api_key).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!("Primary planning model error: {e}");
                    if should_fall_back(&e.to_string()) {
                        tracing::info!("Falling back to {}", GEMINI_FALLBACK_MODEL);
                        return self.generate(GEMINI_FALLBACK_MODEL, prompt, api_key).await;
                    }
                    if attempt + 1 < GEMINI_MAX_ATTEMPTS {
                        sleep(Duration::from_secs(1u64 << attempt)).await;
                    } else {
                        return Err(e);
                    }
                }
            }
        }
        Err(anyhow!("all planning model attempts failed"))
    }

    async fn generate(&self, model: &str, prompt: &str, api_key: &str) -> Result<String> {
        let url = format!("{GEMINI_API_BASE}/{model}:generateContent?key={api_key}");

        let response = self
            .client
            .post(&url)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Request failed with status: {}", response.status());
        }

        let data = response.json::<GenerateContentResponse>().await?;
        data.text()
            .ok_or_else(|| anyhow!("planning model returned no text"))
    }
}

fn should_fall_back(error_text: &str) -> bool {
    let lowered = error_text.to_lowercase();
    FALLBACK_TRIGGERS.iter().any(|k| lowered.contains(k))
}

/// Builds the operations-planner prompt from the forecast and hospital records
fn build_prompt(response: &ForecastResponse) -> Result<String> {
    let surge = &response.surge_forecast;
    let hospitals_json = serde_json::to_string_pretty(&response.hospitals)
        .context("failed to serialize hospital records for the prompt")?;

    Ok(format!(
        r#"You are an AI hospital operations planner.

You will receive a 72-hour surge forecast and a list of hospitals in pincode {pincode}.
Each hospital includes specialty, capacity, staff, and emergency availability.

Generate an individualized operational plan for each hospital based on the surge type and severity.

### Surge Details
- Type: {surge_type}
- Severity: {surge_severity}
- Pincode: {pincode}

{forecast_summary}
### Rules
- Match hospital specialty to surge type.
- Large capacity + emergency availability + rating above 4 => Primary-Surge-Center.
- Small or non-specialty => Support-Overflow.
- Irrelevant specialty => Non-Target.
- Never exceed total_beds, icu_beds, or staff counts.
- Actions must be feasible within 72 hours.
- Include the hospital's specialty in the output for context.

### Output Schema (JSON only)
{{
  "pincode": "{pincode}",
  "surgeType": "{surge_type}",
  "surgeSeverity": "{surge_severity}",
  "hospitalPlans": [
    {{
      "hospital_id": "<string>",
      "hospital_name": "<string>",
      "specialty": "<string>",
      "role": "<Primary-Surge-Center|Support-Overflow|Non-Target>",
      "rationale": ["<reason1>", "<reason2>"],
      "recommendedActions": {{
        "staffing": ["..."],
        "capacity": ["..."],
        "inventory": ["..."],
        "coordination": ["..."]
      }}
    }}
  ]
}}

### Hospitals Data
{hospitals_json}

Return valid JSON only - no markdown, no explanations.
"#,
        pincode = response.pincode,
        surge_type = surge.primary_surge_type,
        surge_severity = surge.primary_surge_severity,
        forecast_summary = format_surge_forecast(surge),
    ))
}

/// Extracts the first JSON object embedded in model output.
///
/// Planning models wrap JSON in prose or markdown fences often enough that a
/// plain parse is not reliable; a cleanup pass handles single quotes and
/// trailing commas before giving up.
pub fn extract_json(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        anyhow::bail!("empty response from planning model");
    }

    let object = Regex::new(r"(?s)\{.*\}")?;
    if let Some(found) = object.find(text) {
        if let Ok(value) = serde_json::from_str(found.as_str()) {
            return Ok(value);
        }
    }

    let cleaned = text
        .replace('\'', "\"")
        .replace(",}", "}")
        .replace(",]", "]");
    let candidate = object
        .find(&cleaned)
        .map(|m| m.as_str())
        .unwrap_or(cleaned.trim());
    serde_json::from_str(candidate).context("planning model returned invalid JSON")
}
