use anyhow::Result;
use reqwest::Client;
use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use std::env;
use std::path::Path;
use std::sync::Arc;

use crate::constants::{
    DEFAULT_HORIZON_DAYS, DEFAULT_HOSPITAL_DATA_PATH, DEFAULT_MODEL_PATH, GEMINI_API_KEY_ENV,
    HOSPITAL_DATA_ENV, MODEL_PATH_ENV, USER_AGENT,
};
use crate::forecaster::{forecast, ForecastError};
use crate::formatters::format_hospitals;
use crate::hospitals::HospitalRegistry;
use crate::models::{FindHospitalsRequest, ForecastRequest, ForecastResponse};
use crate::planner::Planner;
use crate::predictor::ModelBundle;

/// Main surge forecasting service that handles MCP requests
#[derive(Clone)]
pub struct SurgeOps {
    model: Arc<ModelBundle>,
    hospitals: Arc<HospitalRegistry>,
    planner: Arc<Planner>,
    tool_router: ToolRouter<Self>,
}

impl SurgeOps {
    /// Creates a new service instance, loading the model artifact and the
    /// hospital registry from env-configured paths
    pub fn new() -> Result<Self> {
        let model_path =
            env::var(MODEL_PATH_ENV).unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
        let hospital_path =
            env::var(HOSPITAL_DATA_ENV).unwrap_or_else(|_| DEFAULT_HOSPITAL_DATA_PATH.to_string());

        let model = ModelBundle::load(Path::new(&model_path))?;
        tracing::info!(
            "Loaded model bundle from {} ({} features, {} disease classes)",
            model_path,
            model.features.len(),
            model.disease_classes.len()
        );

        let hospitals = HospitalRegistry::load(Path::new(&hospital_path))?;

        let client = Arc::new(Client::builder().user_agent(USER_AGENT).build()?);
        let api_key = env::var(GEMINI_API_KEY_ENV).ok();
        if api_key.is_none() {
            tracing::warn!("{GEMINI_API_KEY_ENV} not set; plan_operations will be unavailable");
        }

        Ok(Self {
            model: Arc::new(model),
            hospitals: Arc::new(hospitals),
            planner: Arc::new(Planner::new(client, api_key)),
            tool_router: Self::tool_router(),
        })
    }

    /// Runs the forecaster and attaches the registry matches for the pincode
    fn run_forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse, McpError> {
        let surge = forecast(request, self.model.as_ref(), DEFAULT_HORIZON_DAYS)
            .map_err(map_forecast_error)?;
        let pincode = request.pincode.to_string();
        let hospitals = self.hospitals.find_by_pincode(&pincode).to_vec();

        Ok(ForecastResponse {
            pincode,
            surge_forecast: surge,
            hospitals,
        })
    }
}

fn map_forecast_error(e: ForecastError) -> McpError {
    match e {
        ForecastError::InvalidInput(_) => McpError::invalid_params(e.to_string(), None),
        ForecastError::ModelUnavailable(_) => McpError::internal_error(e.to_string(), None),
    }
}

#[tool_handler]
impl ServerHandler for SurgeOps {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-surge-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "A hospital surge forecasting service. Forecasts 72-hour patient-load \
                surges from environmental readings, looks up hospitals by pincode, and \
                drafts per-hospital operations plans."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl SurgeOps {
    /// Produces the 72-hour surge forecast plus matching hospitals
    #[tool(description = "Forecast the next 72 hours of hospital patient load for a pincode from an environmental reading (AQI, temperature, humidity, rainfall, UV index). Returns the surge forecast and the hospitals registered for that pincode as JSON.")]
    async fn forecast_surge(
        &self,
        Parameters(request): Parameters<ForecastRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Forecasting surge for pincode {} (AQI {})",
            request.pincode,
            request.aqi_index
        );

        let response = self.run_forecast(&request)?;
        let serialized = serde_json::to_string_pretty(&response).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize forecast: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(serialized)]))
    }

    /// Lists the hospitals registered for a pincode
    #[tool(description = "List the hospitals registered for a pincode, with capacity, staffing, inventory, and emergency availability.")]
    async fn find_hospitals(
        &self,
        Parameters(request): Parameters<FindHospitalsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Looking up hospitals for pincode {}", request.pincode);

        let pincode = request.pincode.to_string();
        let formatted = format_hospitals(&pincode, self.hospitals.find_by_pincode(&pincode));

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Produces per-hospital operations plans for the forecasted surge
    #[tool(description = "Forecast the 72-hour surge for a pincode and draft an individualized operations plan for each registered hospital (role, rationale, staffing/capacity/inventory/coordination actions). Requires a configured planning-model API key.")]
    async fn plan_operations(
        &self,
        Parameters(request): Parameters<ForecastRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Planning hospital operations for pincode {} (AQI {})",
            request.pincode,
            request.aqi_index
        );

        let response = self.run_forecast(&request)?;
        let plan = self.planner.plan(&response).await.map_err(|e| {
            McpError::internal_error(format!("Failed to produce operations plan: {}", e), None)
        })?;

        let serialized = serde_json::to_string_pretty(&plan).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize plan: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(serialized)]))
    }
}
