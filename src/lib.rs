// Trip planner library: search widget pipeline over the Amadeus API

pub mod combiner;
pub mod config;
pub mod fetcher;
pub mod mock;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod ranker;

// Re-export key types for convenience
pub use config::{Environment, ProviderEndpoint, SearchSettings, TravelConfig};
pub use fetcher::{FetchError, ProviderSession, RemoteOfferFetcher, RemoteOffers};
pub use mock::MockItineraryGenerator;
pub use model::{
    AccommodationCategory, AccommodationOffer, Leg, SearchParams, SortKey, TransportMode,
    TransportOffer, TripOffer, UnknownSortKey, ValidationError,
};
pub use pipeline::{OfferSource, SearchError, SearchOutcome, SearchSession, TripPlanner};
pub use provider::{AmadeusClient, ApiError, ClientError, TravelApi};
pub use ranker::rank;
