// Search entry point: validation, provider search with mock fallback,
// cancellation and the caller-owned session

use futures::future::{AbortRegistration, Abortable, Aborted};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::TravelConfig;
use crate::fetcher::{FetchError, ProviderSession, RemoteOfferFetcher, RemoteOffers};
use crate::mock::MockItineraryGenerator;
use crate::model::{SearchParams, SortKey, TripOffer, ValidationError};
use crate::provider::{AmadeusClient, ClientError, TravelApi};
use crate::ranker::rank;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid search: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Provider search failed: {0}")]
    RemoteError(#[from] FetchError),

    #[error("Provider returned no offers ({} destinations unavailable)", .unavailable.len())]
    PipelineExhausted { unavailable: Vec<String> },

    #[error("Search cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferSource {
    // Provider offers
    Remote,
    // Demo mode, no usable credentials
    Mock,
    // Provider failed or found nothing
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub offers: Vec<TripOffer>,
    pub source: OfferSource,
    pub unavailable_destinations: Vec<String>,
}

/// Everything that outlives a single search for one user: provider token,
/// resolved cities, the random source of the mock generator and the last
/// results for re-sorting.
///
/// Searches borrow the session mutably, so two searches can never run on the
/// same session at once.
pub struct SearchSession<R = StdRng> {
    provider: ProviderSession,
    rng: R,
    last_results: Vec<TripOffer>,
}

impl SearchSession<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SearchSession<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SearchSession<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            provider: ProviderSession::new(),
            rng,
            last_results: Vec::new(),
        }
    }

    pub fn provider(&self) -> &ProviderSession {
        &self.provider
    }

    pub fn last_results(&self) -> &[TripOffer] {
        &self.last_results
    }

    /// The last results ordered by `key`; the stored order is kept.
    pub fn sorted(&self, key: SortKey) -> Vec<TripOffer> {
        rank(&self.last_results, key)
    }
}

pub struct TripPlanner<A> {
    config: Arc<TravelConfig>,
    fetcher: RemoteOfferFetcher<A>,
    generator: MockItineraryGenerator,
}

impl TripPlanner<AmadeusClient> {
    pub fn from_config(config: TravelConfig) -> Result<Self, ClientError> {
        let api = AmadeusClient::new(&config)?;
        Ok(Self::new(api, config))
    }
}

impl<A: TravelApi> TripPlanner<A> {
    pub fn new(api: A, config: TravelConfig) -> Self {
        let config = Arc::new(config);
        Self {
            fetcher: RemoteOfferFetcher::new(api, Arc::clone(&config)),
            config,
            generator: MockItineraryGenerator::new(),
        }
    }

    pub fn config(&self) -> &TravelConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        self.fetcher.api()
    }

    /// Without usable credentials every search is answered by the generator.
    pub fn demo_mode(&self) -> bool {
        !self.config.has_valid_credentials()
    }

    /// Runs one search. Only invalid parameters are reported as an error;
    /// provider failures degrade to generated itineraries.
    pub async fn search<R: Rng>(
        &self,
        session: &mut SearchSession<R>,
        params: &SearchParams,
    ) -> Result<SearchOutcome, SearchError> {
        params.validate(self.config.settings.min_budget)?;

        info!(
            origin = %params.origin_city,
            destination = ?params.destination(),
            travelers = params.travelers,
            budget = params.budget,
            demo = self.demo_mode(),
            "search started"
        );

        let outcome = if self.demo_mode() {
            SearchOutcome {
                offers: self.mock_offers(session, params).await,
                source: OfferSource::Mock,
                unavailable_destinations: Vec::new(),
            }
        } else {
            match self.search_remote(&mut session.provider, params).await {
                Ok(remote) => SearchOutcome {
                    offers: remote.offers,
                    source: OfferSource::Remote,
                    unavailable_destinations: remote.unavailable,
                },
                Err(error) => {
                    warn!(%error, "falling back to generated itineraries");
                    let unavailable_destinations = match error {
                        SearchError::PipelineExhausted { unavailable } => unavailable,
                        _ => Vec::new(),
                    };
                    SearchOutcome {
                        offers: self.mock_offers(session, params).await,
                        source: OfferSource::Fallback,
                        unavailable_destinations,
                    }
                }
            }
        };

        info!(
            results = outcome.offers.len(),
            source = ?outcome.source,
            unavailable = outcome.unavailable_destinations.len(),
            "search finished"
        );
        session.last_results = outcome.offers.clone();
        Ok(outcome)
    }

    /// [`TripPlanner::search`] that stops when the matching abort handle
    /// fires. A cancelled search leaves the previous results in the session.
    pub async fn search_abortable<R: Rng>(
        &self,
        session: &mut SearchSession<R>,
        params: &SearchParams,
        registration: AbortRegistration,
    ) -> Result<SearchOutcome, SearchError> {
        match Abortable::new(self.search(session, params), registration).await {
            Ok(result) => result,
            Err(Aborted) => {
                info!("search cancelled");
                Err(SearchError::Cancelled)
            }
        }
    }

    async fn search_remote(
        &self,
        provider: &mut ProviderSession,
        params: &SearchParams,
    ) -> Result<RemoteOffers, SearchError> {
        let remote = self.fetcher.fetch_offers(provider, params).await?;
        if remote.offers.is_empty() {
            return Err(SearchError::PipelineExhausted {
                unavailable: remote.unavailable,
            });
        }
        Ok(remote)
    }

    async fn mock_offers<R: Rng>(
        &self,
        session: &mut SearchSession<R>,
        params: &SearchParams,
    ) -> Vec<TripOffer> {
        let delay = self.config.settings.mock_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.generator.generate(params, &mut session.rng)
    }
}
