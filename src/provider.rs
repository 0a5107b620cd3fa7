// Flight and hotel provider: the API seam used by the fetcher and its
// Amadeus implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::TravelConfig;

const USER_AGENT: &str = "trip-planner/0.1.0";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub iata_code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub adults: u32,
    pub max_offers: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelQuery {
    pub city_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
}

// Wire structures, mirroring the provider's JSON

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Provider price. For flight offers the pipeline reads `total` as the
/// price per traveler and multiplies it by the party size.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawPrice {
    pub total: String,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawPrice {
    /// The decimal total, `None` unless it is a finite non-negative number.
    pub fn amount(&self) -> Option<f64> {
        self.total
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEndpoint {
    pub iata_code: String,
    pub at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegment {
    pub departure: RawEndpoint,
    pub arrival: RawEndpoint,
    pub carrier_code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawItinerary {
    #[serde(default)]
    pub duration: Option<String>,
    pub segments: Vec<RawSegment>,
}

/// A flight offer as returned by the flight-offer search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawFlight {
    #[serde(default)]
    pub id: String,
    pub price: RawPrice,
    pub itineraries: Vec<RawItinerary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawRating {
    Number(f64),
    Text(String),
}

impl RawRating {
    pub fn value(&self) -> Option<f64> {
        match self {
            RawRating::Number(n) => Some(*n),
            RawRating::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHotelInfo {
    #[serde(default)]
    pub hotel_id: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<RawRating>,
    #[serde(default)]
    pub city_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawHotelRate {
    #[serde(default)]
    pub id: String,
    pub price: RawPrice,
}

/// A hotel with its bookable rates as returned by the hotel-offer search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawHotel {
    pub hotel: RawHotelInfo,
    #[serde(default)]
    pub offers: Vec<RawHotelRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelRef {
    hotel_id: String,
}

/// The remote endpoints the search pipeline depends on.
#[async_trait]
pub trait TravelApi: Send + Sync {
    // Client-credentials grant
    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, ApiError>;

    async fn search_locations(&self, token: &str, keyword: &str) -> Result<Vec<Location>, ApiError>;

    async fn search_flights(&self, token: &str, query: &FlightQuery)
        -> Result<Vec<RawFlight>, ApiError>;

    async fn search_hotels(&self, token: &str, query: &HotelQuery) -> Result<Vec<RawHotel>, ApiError>;
}

/// reqwest-backed client for the Amadeus self-service API.
#[derive(Debug, Clone)]
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    hotels_per_city: usize,
}

impl AmadeusClient {
    pub fn new(config: &TravelConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(config.settings.api_timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.endpoint().base_url.trim_end_matches('/').to_string(),
            hotels_per_city: config.settings.hotels_per_destination,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(path);
        debug!(%url, ?query, "provider request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let envelope: DataEnvelope<T> = Self::decode(response).await?;
        debug!(%url, items = envelope.data.len(), "provider response");
        Ok(envelope.data)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ApiResponseError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::DecodeError(e.to_string()))
    }
}

#[async_trait]
impl TravelApi for AmadeusClient {
    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, ApiError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self
            .http
            .post(self.url("/v1/security/oauth2/token"))
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        match Self::decode::<AccessToken>(response).await {
            Err(ApiError::ApiResponseError {
                status_code,
                message,
            }) => Err(ApiError::AuthError(format!("{} - {}", status_code, message))),
            other => other,
        }
    }

    async fn search_locations(&self, token: &str, keyword: &str) -> Result<Vec<Location>, ApiError> {
        let query = [
            ("subType", "CITY".to_string()),
            ("keyword", keyword.to_string()),
            ("max", "1".to_string()),
        ];
        self.get_data(token, "/v1/reference-data/locations", &query)
            .await
    }

    async fn search_flights(
        &self,
        token: &str,
        query: &FlightQuery,
    ) -> Result<Vec<RawFlight>, ApiError> {
        let params = [
            ("originLocationCode", query.origin.clone()),
            ("destinationLocationCode", query.destination.clone()),
            ("departureDate", query.departure_date.to_string()),
            ("returnDate", query.return_date.to_string()),
            ("adults", query.adults.to_string()),
            ("max", query.max_offers.to_string()),
        ];
        self.get_data(token, "/v2/shopping/flight-offers", &params)
            .await
    }

    // Two calls: hotel ids for the city, then the offers of those hotels
    async fn search_hotels(&self, token: &str, query: &HotelQuery) -> Result<Vec<RawHotel>, ApiError> {
        let hotels: Vec<HotelRef> = self
            .get_data(
                token,
                "/v1/reference-data/locations/hotels/by-city",
                &[("cityCode", query.city_code.clone())],
            )
            .await?;

        let hotel_ids: Vec<String> = hotels
            .into_iter()
            .take(self.hotels_per_city)
            .map(|h| h.hotel_id)
            .collect();
        if hotel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("hotelIds", hotel_ids.join(",")),
            ("adults", query.adults.to_string()),
            ("checkInDate", query.check_in.to_string()),
            ("checkOutDate", query.check_out.to_string()),
        ];
        self.get_data(token, "/v3/shopping/hotel-offers", &params)
            .await
    }
}
