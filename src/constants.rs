/// User agent string for HTTP requests
pub const USER_AGENT: &str = "mcp-surge-server/0.1.0";

/// Gemini generateContent API base URL
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Preferred planning model
pub const GEMINI_PRIMARY_MODEL: &str = "models/gemini-pro-latest";

/// Fallback planning model when the primary is unavailable or over quota
pub const GEMINI_FALLBACK_MODEL: &str = "models/gemini-flash-latest";

/// Attempts against the primary model before giving up
pub const GEMINI_MAX_ATTEMPTS: u32 = 2;

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model artifact path
pub const MODEL_PATH_ENV: &str = "SURGE_MODEL_PATH";

/// Default model artifact path
pub const DEFAULT_MODEL_PATH: &str = "models/surge_model.json";

/// Environment variable overriding the hospital registry path
pub const HOSPITAL_DATA_ENV: &str = "HOSPITAL_DATA_PATH";

/// Default hospital registry path
pub const DEFAULT_HOSPITAL_DATA_PATH: &str = "data/hospital_details.csv";

/// Forecast horizon in days (72 hours)
pub const DEFAULT_HORIZON_DAYS: u32 = 3;

// Static context assumed for every pincode; real per-location values are not
// available at request time.
pub const ASSUMED_POPULATION_DENSITY: f64 = 2000.0;
pub const ASSUMED_HOSPITAL_COUNT: f64 = 5.0;
pub const ASSUMED_AVG_CAPACITY: f64 = 150.0;

// Particulate proxy split: AQI stands in for true PM measurements.
pub const PM2_5_AQI_SHARE: f64 = 0.6;
pub const PM10_AQI_SHARE: f64 = 0.4;

/// Fixed disease-risk prior applied to all four categories
pub const DISEASE_RISK_PRIOR: f64 = 0.3;
