// Provider credentials, search settings and static reference data

use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "TRIP_PLANNER";

// Returned when a city name is unknown to both the provider and the local table
pub const FALLBACK_CITY_CODE: &str = "MXP";

const PLACEHOLDER_PREFIX: &str = "YOUR_";

// Common city names (Italian and English) mapped to their location codes
const COMMON_CITY_CODES: &[(&str, &str)] = &[
    ("milano", "MXP"),
    ("milan", "MXP"),
    ("roma", "FCO"),
    ("rome", "FCO"),
    ("napoli", "NAP"),
    ("naples", "NAP"),
    ("venezia", "VCE"),
    ("venice", "VCE"),
    ("firenze", "FLR"),
    ("florence", "FLR"),
    ("parigi", "PAR"),
    ("paris", "PAR"),
    ("londra", "LON"),
    ("london", "LON"),
    ("madrid", "MAD"),
    ("barcellona", "BCN"),
    ("barcelona", "BCN"),
    ("amsterdam", "AMS"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Test,
    Production,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ProviderEndpoint {
    fn placeholder(base_url: &str, environment: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client_id: format!("{}{}_API_KEY", PLACEHOLDER_PREFIX, environment),
            client_secret: format!("{}{}_API_SECRET", PLACEHOLDER_PREFIX, environment),
        }
    }

    pub fn has_valid_credentials(&self) -> bool {
        let usable = |value: &str| !value.trim().is_empty() && !value.starts_with(PLACEHOLDER_PREFIX);
        usable(&self.client_id) && usable(&self.client_secret)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PopularCity {
    pub name: String,
    pub code: String,
    pub country: String,
}

impl PopularCity {
    fn new(name: &str, code: &str, country: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            country: country.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
    pub api_timeout_ms: u64,
    pub flight_offers_per_destination: u32,
    pub hotels_per_destination: usize,
    pub min_budget: f64,
    pub mock_delay_ms: u64,
    pub default_currency: String,
    pub supported_currencies: Vec<String>,
    pub anywhere_country_codes: Vec<String>,
    pub popular_cities: Vec<PopularCity>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 10,
            api_timeout_ms: 10_000,
            flight_offers_per_destination: 10,
            hotels_per_destination: 20,
            min_budget: 100.0,
            mock_delay_ms: 2_000,
            default_currency: "EUR".to_string(),
            supported_currencies: ["EUR", "USD", "GBP"].map(String::from).to_vec(),
            anywhere_country_codes: [
                "FR", "ES", "GB", "DE", "AT", "CH", "NL", "BE", "CZ", "HU", "PT",
            ]
            .map(String::from)
            .to_vec(),
            popular_cities: vec![
                PopularCity::new("Paris", "PAR", "France"),
                PopularCity::new("London", "LON", "United Kingdom"),
                PopularCity::new("Madrid", "MAD", "Spain"),
                PopularCity::new("Barcelona", "BCN", "Spain"),
                PopularCity::new("Amsterdam", "AMS", "Netherlands"),
                PopularCity::new("Vienna", "VIE", "Austria"),
                PopularCity::new("Prague", "PRG", "Czech Republic"),
                PopularCity::new("Budapest", "BUD", "Hungary"),
                PopularCity::new("Lisbon", "LIS", "Portugal"),
                PopularCity::new("Berlin", "BER", "Germany"),
            ],
        }
    }
}

/// Top-level configuration: which provider environment to talk to, the
/// credentials for each, and the knobs of the search pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TravelConfig {
    pub environment: Environment,
    pub test: ProviderEndpoint,
    pub production: ProviderEndpoint,
    pub settings: SearchSettings,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Test,
            test: ProviderEndpoint::placeholder("https://test.api.amadeus.com", "TEST"),
            production: ProviderEndpoint::placeholder("https://api.amadeus.com", "PRODUCTION"),
            settings: SearchSettings::default(),
        }
    }
}

impl TravelConfig {
    /// Loads defaults, then the optional JSON document, then `TRIP_PLANNER_*`
    /// environment variables (`__` separates nested keys).
    pub fn load(json: Option<&str>) -> Result<Self, config::ConfigError> {
        Self::builder(json)?
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Same as [`TravelConfig::load`] without the environment layer.
    pub fn from_json_str(json: &str) -> Result<Self, config::ConfigError> {
        Self::builder(Some(json))?.build()?.try_deserialize()
    }

    fn builder(
        json: Option<&str>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let defaults = serde_json::to_string(&Self::default())
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(&defaults, config::FileFormat::Json));
        if let Some(json) = json {
            builder = builder.add_source(config::File::from_str(json, config::FileFormat::Json));
        }
        Ok(builder)
    }

    pub fn endpoint(&self) -> &ProviderEndpoint {
        match self.environment {
            Environment::Test => &self.test,
            Environment::Production => &self.production,
        }
    }

    pub fn has_valid_credentials(&self) -> bool {
        self.endpoint().has_valid_credentials()
    }

    pub fn anywhere_city_codes(&self) -> Vec<String> {
        self.settings
            .popular_cities
            .iter()
            .map(|city| city.code.clone())
            .collect()
    }

    /// Display name for a location code, or the code itself when unknown.
    pub fn city_name(&self, code: &str) -> String {
        self.settings
            .popular_cities
            .iter()
            .find(|city| city.code.eq_ignore_ascii_case(code))
            .map(|city| city.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    pub fn fallback_city_code(&self, city_name: &str) -> &'static str {
        let needle = city_name.trim().to_lowercase();
        COMMON_CITY_CODES
            .iter()
            .find(|(name, _)| *name == needle)
            .map(|(_, code)| *code)
            .unwrap_or(FALLBACK_CITY_CODE)
    }
}
