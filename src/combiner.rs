// Pairs provider flight offers with hotel offers under a budget ceiling

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TravelConfig;
use crate::model::{
    AccommodationCategory, AccommodationOffer, Leg, TransportMode, TransportOffer, TripOffer,
};
use crate::provider::{RawFlight, RawHotel, RawItinerary};

// Price assumed for a hotel without any rate, and for the placeholder stay
pub const DEFAULT_HOTEL_PRICE: f64 = 100.0;

const DEFAULT_HOTEL_RATING: f64 = 4.0;
const DEFAULT_REVIEW_COUNT: u32 = 150;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Flight offer {0} has no itinerary")]
    MissingItinerary(String),

    #[error("Itinerary without segments in flight offer {0}")]
    MissingSegments(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

/// Merges flights and hotels of one destination into trip offers.
pub struct OfferCombiner<'a> {
    config: &'a TravelConfig,
}

impl<'a> OfferCombiner<'a> {
    pub fn new(config: &'a TravelConfig) -> Self {
        Self { config }
    }

    /// At most one offer per flight: the flight plus the first hotel that
    /// fits what is left of the budget, or the placeholder stay.
    ///
    /// The flight's `price.total` is taken as a per-traveler price.
    pub fn combine(
        &self,
        flights: &[RawFlight],
        hotels: &[RawHotel],
        budget: f64,
        travelers: u32,
    ) -> Vec<TripOffer> {
        let travelers = travelers.max(1);
        let mut offers = Vec::new();

        for flight in flights {
            match self.combine_flight(flight, hotels, budget, travelers) {
                Ok(Some(offer)) => offers.push(offer),
                Ok(None) => debug!(flight = %flight.id, budget, "flight over budget, discarded"),
                Err(e) => warn!(flight = %flight.id, error = %e, "skipping malformed flight offer"),
            }
        }

        offers
    }

    fn combine_flight(
        &self,
        flight: &RawFlight,
        hotels: &[RawHotel],
        budget: f64,
        travelers: u32,
    ) -> Result<Option<TripOffer>, ConversionError> {
        let price_per_traveler = flight
            .price
            .amount()
            .ok_or_else(|| ConversionError::InvalidPrice(flight.price.total.clone()))?;

        let flight_total = price_per_traveler * travelers as f64;
        let remaining_budget = budget - flight_total;
        if remaining_budget <= 0.0 {
            return Ok(None);
        }

        let accommodation = hotels
            .iter()
            .find(|hotel| hotel_price(hotel) <= remaining_budget)
            .map(accommodation_from_hotel)
            .unwrap_or_else(placeholder_accommodation);

        let total_price = (flight_total + accommodation.price).round();
        if !(total_price <= budget) {
            return Ok(None);
        }

        let outbound = flight
            .itineraries
            .first()
            .ok_or_else(|| ConversionError::MissingItinerary(flight.id.clone()))?;
        let inbound = flight.itineraries.get(1).unwrap_or(outbound);

        let (departure_leg, departed) = leg_from(flight, outbound)?;
        let (return_leg, returned) = leg_from(flight, inbound)?;

        let duration_minutes = outbound
            .duration
            .as_deref()
            .and_then(parse_iso_duration_minutes)
            .unwrap_or_else(|| elapsed_minutes(departed.0, departed.1));

        let carrier = outbound
            .segments
            .first()
            .map(|segment| segment.carrier_code.clone())
            .unwrap_or_default();

        let destination_name = self.config.city_name(&departure_leg.to);

        Ok(Some(TripOffer {
            destination_name,
            total_price,
            price_per_traveler: (total_price / travelers as f64).round(),
            transport: TransportOffer {
                mode: TransportMode::Flight,
                departure_leg,
                return_leg,
                duration_minutes,
                carrier,
                price_per_traveler,
            },
            accommodation,
            trip_duration_days: trip_days(departed.0, returned.1),
        }))
    }
}

pub fn hotel_price(hotel: &RawHotel) -> f64 {
    hotel
        .offers
        .first()
        .and_then(|rate| rate.price.amount())
        .unwrap_or(DEFAULT_HOTEL_PRICE)
}

fn accommodation_from_hotel(hotel: &RawHotel) -> AccommodationOffer {
    let rating = hotel
        .hotel
        .rating
        .as_ref()
        .and_then(|r| r.value())
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 5.0))
        .unwrap_or(DEFAULT_HOTEL_RATING);

    AccommodationOffer {
        category: AccommodationCategory::Hotel,
        name: hotel.hotel.name.clone(),
        rating,
        star_class: rating.round().clamp(1.0, 5.0) as u8,
        review_count: DEFAULT_REVIEW_COUNT,
        amenities: ["Free WiFi", "Breakfast included", "Parking", "24h reception"]
            .map(String::from)
            .to_vec(),
        price: hotel_price(hotel),
    }
}

/// Stay used when no provider hotel fits the remaining budget.
pub fn placeholder_accommodation() -> AccommodationOffer {
    AccommodationOffer {
        category: AccommodationCategory::Hotel,
        name: "Hotel Central".to_string(),
        rating: 4.2,
        star_class: 4,
        review_count: 180,
        amenities: ["Free WiFi", "Breakfast included", "Parking"]
            .map(String::from)
            .to_vec(),
        price: DEFAULT_HOTEL_PRICE,
    }
}

// Leg from the first departure to the last arrival, plus both timestamps
fn leg_from(
    flight: &RawFlight,
    itinerary: &RawItinerary,
) -> Result<(Leg, (NaiveDateTime, NaiveDateTime)), ConversionError> {
    let (first, last) = match (itinerary.segments.first(), itinerary.segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ConversionError::MissingSegments(flight.id.clone())),
    };

    let departs = parse_timestamp(&first.departure.at)?;
    let arrives = parse_timestamp(&last.arrival.at)?;

    let leg = Leg {
        from: first.departure.iata_code.clone(),
        to: last.arrival.iata_code.clone(),
        departs_at: departs.time(),
        arrives_at: arrives.time(),
    };
    Ok((leg, (departs, arrives)))
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ConversionError> {
    value
        .parse::<NaiveDateTime>()
        .map_err(|_| ConversionError::InvalidTimestamp(value.to_string()))
}

fn elapsed_minutes(from: NaiveDateTime, to: NaiveDateTime) -> u32 {
    (to - from).num_minutes().max(0) as u32
}

// Whole days started between outbound departure and return arrival, at least one
fn trip_days(from: NaiveDateTime, to: NaiveDateTime) -> u32 {
    let seconds = (to - from).num_seconds().max(0) as f64;
    ((seconds / 86_400.0).ceil() as u32).max(1)
}

/// Minutes in an ISO-8601 duration such as `PT2H10M` or `P1DT3H`.
/// Seconds are dropped.
pub fn parse_iso_duration_minutes(value: &str) -> Option<u32> {
    let rest = value.trim().strip_prefix('P')?;
    let (date_part, time_part) = rest.split_once('T').unwrap_or((rest, ""));

    let mut minutes = 0u32;
    let mut seen_unit = false;

    for (part, is_time) in [(date_part, false), (time_part, true)] {
        let mut number = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }

            let amount: u32 = number.parse().ok()?;
            number.clear();
            seen_unit = true;

            let unit_minutes = match (c, is_time) {
                ('D', false) => amount.checked_mul(24 * 60)?,
                ('H', true) => amount.checked_mul(60)?,
                ('M', true) => amount,
                ('S', true) => 0,
                _ => return None,
            };
            minutes = minutes.checked_add(unit_minutes)?;
        }
        if !number.is_empty() {
            return None;
        }
    }

    seen_unit.then_some(minutes)
}
