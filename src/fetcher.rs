// Remote offer fetching: token, city resolution and per-destination searches

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::combiner::OfferCombiner;
use crate::config::TravelConfig;
use crate::model::{SearchParams, TripOffer};
use crate::provider::{AccessToken, ApiError, FlightQuery, HotelQuery, TravelApi};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Token acquisition failed: {0}")]
    AuthError(#[source] ApiError),

    #[error("Search for {destination} failed: {source}")]
    RemoteError {
        destination: String,
        #[source]
        source: ApiError,
    },
}

/// Provider state carried between searches of one user: the bearer token
/// (never refreshed) and the city codes resolved so far.
#[derive(Debug, Default, Clone)]
pub struct ProviderSession {
    token: Option<AccessToken>,
    city_codes: HashMap<String, String>,
}

impl ProviderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn cached_city_code(&self, city: &str) -> Option<&str> {
        self.city_codes.get(&city_key(city)).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteOffers {
    pub offers: Vec<TripOffer>,
    // Destination codes whose flight search failed
    pub unavailable: Vec<String>,
}

pub struct RemoteOfferFetcher<A> {
    api: A,
    config: Arc<TravelConfig>,
}

impl<A: TravelApi> RemoteOfferFetcher<A> {
    pub fn new(api: A, config: Arc<TravelConfig>) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Searches every destination in turn and combines flights with hotels.
    ///
    /// Only a failed token exchange aborts the search. A failing flight
    /// search skips its destination, a failing hotel search leaves the
    /// combiner with no hotels.
    pub async fn fetch_offers(
        &self,
        session: &mut ProviderSession,
        params: &SearchParams,
    ) -> Result<RemoteOffers, FetchError> {
        let token = self.access_token(session).await?;

        let origin = self
            .resolve_city(session, &token, &params.origin_city)
            .await;
        let destinations = match params.destination() {
            Some(destination) => vec![self.resolve_city(session, &token, destination).await],
            None => self.config.anywhere_city_codes(),
        };

        info!(%origin, destinations = destinations.len(), "searching provider offers");

        let combiner = OfferCombiner::new(&self.config);
        let mut result = RemoteOffers::default();

        for destination in destinations {
            let query = FlightQuery {
                origin: origin.clone(),
                destination: destination.clone(),
                departure_date: params.departure_date,
                return_date: params.return_date,
                adults: params.travelers,
                max_offers: self.config.settings.flight_offers_per_destination,
            };

            let flights = match self.api.search_flights(&token, &query).await {
                Ok(flights) => flights,
                Err(source) => {
                    let error = FetchError::RemoteError {
                        destination: destination.clone(),
                        source,
                    };
                    warn!(%error, "destination skipped");
                    result.unavailable.push(destination);
                    continue;
                }
            };

            if flights.is_empty() {
                debug!(%destination, "no flights");
                continue;
            }

            let hotel_query = HotelQuery {
                city_code: destination.clone(),
                check_in: params.departure_date,
                check_out: params.return_date,
                adults: params.travelers,
            };
            let hotels = self
                .api
                .search_hotels(&token, &hotel_query)
                .await
                .unwrap_or_else(|error| {
                    warn!(%destination, %error, "hotel search failed, combining without hotels");
                    Vec::new()
                });

            let offers = combiner.combine(&flights, &hotels, params.budget, params.travelers);
            debug!(
                %destination,
                flights = flights.len(),
                hotels = hotels.len(),
                offers = offers.len(),
                "destination combined"
            );
            result.offers.extend(offers);
        }

        result.offers.retain(|offer| offer.total_price <= params.budget);
        result
            .offers
            .sort_by(|a, b| a.total_price.total_cmp(&b.total_price));
        result.offers.truncate(self.config.settings.max_results);

        Ok(result)
    }

    async fn access_token(&self, session: &mut ProviderSession) -> Result<String, FetchError> {
        if let Some(token) = &session.token {
            return Ok(token.access_token.clone());
        }

        let endpoint = self.config.endpoint();
        let token = self
            .api
            .request_token(&endpoint.client_id, &endpoint.client_secret)
            .await
            .map_err(FetchError::AuthError)?;

        info!(expires_in = ?token.expires_in, "access token acquired");
        let value = token.access_token.clone();
        session.token = Some(token);
        Ok(value)
    }

    /// Location code for a free-text city name: the provider's first match,
    /// else the common city table, else the default code.
    pub async fn resolve_city(
        &self,
        session: &mut ProviderSession,
        token: &str,
        city: &str,
    ) -> String {
        let key = city_key(city);
        if let Some(code) = session.city_codes.get(&key) {
            return code.clone();
        }

        match self.api.search_locations(token, city.trim()).await {
            Ok(locations) => {
                let code = match locations.into_iter().next() {
                    Some(location) => location.iata_code,
                    None => {
                        let code = self.config.fallback_city_code(city);
                        debug!(city, code, "no location match, using fallback table");
                        code.to_string()
                    }
                };
                session.city_codes.insert(key, code.clone());
                code
            }
            // Not memoised, the next search asks the provider again
            Err(error) => {
                let code = self.config.fallback_city_code(city);
                warn!(city, code, %error, "location lookup failed, using fallback table");
                code.to_string()
            }
        }
    }
}

fn city_key(city: &str) -> String {
    city.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::rome_anywhere;
    use crate::provider::stub::{raw_flight, raw_hotel, StubApi, STUB_TOKEN};

    fn fetcher(api: StubApi) -> RemoteOfferFetcher<StubApi> {
        RemoteOfferFetcher::new(api, Arc::new(TravelConfig::default()))
    }

    fn paris_params() -> SearchParams {
        let mut params = rome_anywhere(2, 1000.0);
        params.anywhere = false;
        params.destination_city = Some("Paris".to_string());
        params
    }

    #[tokio::test]
    async fn test_token_is_reused_for_the_session() {
        let fetcher = fetcher(StubApi::new().with_flights("PAR", vec![raw_flight("PAR", "100")]));
        let mut session = ProviderSession::new();

        fetcher.fetch_offers(&mut session, &paris_params()).await.unwrap();
        fetcher.fetch_offers(&mut session, &paris_params()).await.unwrap();

        assert!(session.has_token());
        assert_eq!(fetcher.api().token_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_the_search() {
        let fetcher = fetcher(StubApi::new().rejecting_credentials());
        let mut session = ProviderSession::new();

        let result = fetcher.fetch_offers(&mut session, &paris_params()).await;
        assert!(matches!(result, Err(FetchError::AuthError(ApiError::AuthError(_)))));
        assert!(!session.has_token());
        assert!(fetcher.api().flight_calls().is_empty());
    }

    #[tokio::test]
    async fn test_city_resolution_prefers_provider_match() {
        let fetcher = fetcher(StubApi::new().with_location("milano", "MIL"));
        let mut session = ProviderSession::new();

        let code = fetcher.resolve_city(&mut session, STUB_TOKEN, "Milano").await;
        assert_eq!(code, "MIL");
    }

    #[tokio::test]
    async fn test_city_resolution_falls_back_to_common_table() {
        let fetcher = fetcher(StubApi::new());
        let mut session = ProviderSession::new();

        assert_eq!(fetcher.resolve_city(&mut session, STUB_TOKEN, "milano").await, "MXP");
        assert_eq!(fetcher.resolve_city(&mut session, STUB_TOKEN, "Firenze").await, "FLR");
        assert_eq!(fetcher.resolve_city(&mut session, STUB_TOKEN, "Gotham").await, "MXP");
        assert_eq!(session.cached_city_code("MILANO"), Some("MXP"));
    }

    #[tokio::test]
    async fn test_city_resolution_survives_lookup_errors() {
        let fetcher = fetcher(StubApi::new().failing_lookups());
        let mut session = ProviderSession::new();

        assert_eq!(fetcher.resolve_city(&mut session, STUB_TOKEN, "Roma").await, "FCO");
        assert_eq!(session.cached_city_code("Roma"), None);
    }

    #[tokio::test]
    async fn test_resolved_cities_are_memoised() {
        let fetcher = fetcher(
            StubApi::new()
                .with_location("roma", "ROM")
                .with_location("paris", "PAR")
                .with_flights("PAR", vec![raw_flight("PAR", "100")]),
        );
        let mut session = ProviderSession::new();

        fetcher.fetch_offers(&mut session, &paris_params()).await.unwrap();
        fetcher.fetch_offers(&mut session, &paris_params()).await.unwrap();

        // origin and destination, looked up once each
        assert_eq!(fetcher.api().lookup_calls(), 2);
    }

    #[tokio::test]
    async fn test_anywhere_search_tolerates_failing_destinations() {
        let fetcher = fetcher(
            StubApi::new()
                .with_flights("PAR", vec![raw_flight("PAR", "150")])
                .with_flights("VIE", vec![raw_flight("VIE", "100")])
                .failing_flights("LON")
                .failing_flights("BER"),
        );
        let mut session = ProviderSession::new();

        let result = fetcher
            .fetch_offers(&mut session, &rome_anywhere(2, 1000.0))
            .await
            .unwrap();

        assert_eq!(fetcher.api().flight_calls().len(), 10);
        assert_eq!(result.unavailable, vec!["LON", "BER"]);

        let names: Vec<&str> = result
            .offers
            .iter()
            .map(|o| o.destination_name.as_str())
            .collect();
        assert_eq!(names, vec!["Vienna", "Paris"]);
    }

    #[tokio::test]
    async fn test_hotels_only_searched_where_flights_exist() {
        let fetcher = fetcher(
            StubApi::new()
                .with_flights("MAD", vec![raw_flight("MAD", "100")])
                .with_hotels("MAD", vec![raw_hotel("Hotel Sol", "80")]),
        );
        let mut session = ProviderSession::new();

        let result = fetcher
            .fetch_offers(&mut session, &rome_anywhere(2, 1000.0))
            .await
            .unwrap();

        assert_eq!(fetcher.api().hotel_calls(), vec!["MAD"]);
        assert_eq!(result.offers.len(), 1);
        assert_eq!(result.offers[0].accommodation.name, "Hotel Sol");
        assert_eq!(result.offers[0].total_price, 280.0);
    }

    #[tokio::test]
    async fn test_hotel_failure_falls_back_to_placeholder() {
        let fetcher = fetcher(
            StubApi::new()
                .with_flights("PAR", vec![raw_flight("PAR", "100")])
                .failing_hotels("PAR"),
        );
        let mut session = ProviderSession::new();

        let result = fetcher.fetch_offers(&mut session, &paris_params()).await.unwrap();

        assert!(result.unavailable.is_empty());
        assert_eq!(result.offers.len(), 1);
        assert_eq!(result.offers[0].accommodation.name, "Hotel Central");
    }

    #[tokio::test]
    async fn test_results_sorted_by_price_and_capped() {
        let flights: Vec<_> = (0..15)
            .map(|i| raw_flight("PAR", &format!("{}", 300 - i * 10)))
            .collect();
        let fetcher = fetcher(StubApi::new().with_flights("PAR", flights));
        let mut session = ProviderSession::new();

        let result = fetcher.fetch_offers(&mut session, &paris_params()).await.unwrap();

        assert_eq!(result.offers.len(), 10);
        assert!(result
            .offers
            .windows(2)
            .all(|pair| pair[0].total_price <= pair[1].total_price));
        assert!(result.offers.iter().all(|o| o.total_price <= 1000.0));
        // cheapest flight is 160 per traveler, plus the placeholder stay
        assert_eq!(result.offers[0].total_price, 420.0);
    }
}
