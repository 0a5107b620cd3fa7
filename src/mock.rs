// Synthetic itineraries used in demo mode and when the provider is unavailable

use chrono::{Duration, NaiveTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{
    AccommodationCategory, AccommodationOffer, Leg, SearchParams, TransportMode, TransportOffer,
    TripOffer,
};

pub const MAX_MOCK_RESULTS: usize = 8;

pub const ANYWHERE_DESTINATIONS: [&str; 8] = [
    "Paris",
    "London",
    "Madrid",
    "Barcelona",
    "Amsterdam",
    "Vienna",
    "Prague",
    "Budapest",
];

/// Generates randomized trip offers that fit the search budget.
///
/// The generator holds no state; randomness comes from the caller so a
/// seeded source reproduces the same itineraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockItineraryGenerator;

impl MockItineraryGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate<R: Rng + ?Sized>(&self, params: &SearchParams, rng: &mut R) -> Vec<TripOffer> {
        let candidates: Vec<&str> = match params.destination() {
            Some(destination) => vec![destination],
            None => ANYWHERE_DESTINATIONS.to_vec(),
        };

        let travelers = params.travelers.max(1);
        let mut offers = Vec::new();

        for destination in candidates {
            let base_price = rng.gen_range(200..1000) as f64;
            let total_price = base_price * travelers as f64;

            if total_price > params.budget {
                continue;
            }

            offers.push(TripOffer {
                destination_name: destination.to_string(),
                total_price,
                price_per_traveler: base_price,
                transport: mock_transport(&params.origin_city, destination, base_price, rng),
                accommodation: mock_accommodation(destination, rng),
                trip_duration_days: params.trip_days(),
            });
        }

        offers.truncate(MAX_MOCK_RESULTS);
        offers
    }
}

fn mock_transport<R: Rng + ?Sized>(
    from: &str,
    to: &str,
    price_per_traveler: f64,
    rng: &mut R,
) -> TransportOffer {
    let mode = *TransportMode::ALL.choose(rng).unwrap_or(&TransportMode::Flight);

    let hours = match mode {
        TransportMode::Flight => rng.gen_range(1..4),
        TransportMode::Train => rng.gen_range(3..11),
        TransportMode::Bus => rng.gen_range(8..20),
    };
    let duration_minutes = hours * 60 + rng.gen_range(0..60);

    let carrier = carriers(mode)
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string();

    TransportOffer {
        mode,
        departure_leg: mock_leg(from, to, rng),
        return_leg: mock_leg(to, from, rng),
        duration_minutes,
        carrier,
        price_per_traveler,
    }
}

// Departures between 06:00 and 17:30 on the hour or half hour, arriving two hours later
fn mock_leg<R: Rng + ?Sized>(from: &str, to: &str, rng: &mut R) -> Leg {
    let hour = rng.gen_range(6..18);
    let minute = if rng.gen_bool(0.5) { 0 } else { 30 };
    let departs_at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);

    Leg {
        from: from.to_string(),
        to: to.to_string(),
        departs_at,
        arrives_at: departs_at + Duration::hours(2),
    }
}

fn mock_accommodation<R: Rng + ?Sized>(city: &str, rng: &mut R) -> AccommodationOffer {
    let category = *AccommodationCategory::ALL
        .choose(rng)
        .unwrap_or(&AccommodationCategory::Hotel);

    let rating = (rng.gen_range(3.0..=5.0_f64) * 10.0).round() / 10.0;
    let name = name_templates(category)
        .choose(rng)
        .map(|template| template.replace("{}", city))
        .unwrap_or_else(|| city.to_string());

    AccommodationOffer {
        category,
        name,
        rating,
        star_class: rng.gen_range(3..=5),
        review_count: rng.gen_range(50..550),
        amenities: amenities(category).iter().map(|a| a.to_string()).collect(),
        price: 0.0,
    }
}

fn carriers(mode: TransportMode) -> &'static [&'static str] {
    match mode {
        TransportMode::Flight => &["ITA Airways", "Ryanair", "EasyJet", "Lufthansa"],
        TransportMode::Train => &["Trenitalia", "Italo", "SNCF", "Deutsche Bahn"],
        TransportMode::Bus => &["FlixBus", "Eurolines", "Megabus", "MarinoBus"],
    }
}

fn name_templates(category: AccommodationCategory) -> &'static [&'static str] {
    match category {
        AccommodationCategory::Hotel => &["Hotel {} Center", "Grand Hotel {}", "{} Palace Hotel"],
        AccommodationCategory::BnB => &["B&B Casa {}", "{} Home B&B", "Cozy {} B&B"],
        AccommodationCategory::Apartment => {
            &["{} City Apartment", "Modern {} Flat", "{} Central Apt"]
        }
        AccommodationCategory::Hostel => &["{} Hostel", "Backpackers {}", "Youth Hostel {}"],
    }
}

fn amenities(category: AccommodationCategory) -> &'static [&'static str] {
    match category {
        AccommodationCategory::Hotel => &["Free WiFi", "Breakfast included", "Parking", "Gym"],
        AccommodationCategory::BnB => &["Free WiFi", "Breakfast included", "Garden", "Terrace"],
        AccommodationCategory::Apartment => {
            &["Free WiFi", "Equipped kitchen", "Washing machine", "Balcony"]
        }
        AccommodationCategory::Hostel => {
            &["Free WiFi", "Shared kitchen", "Laundry", "Common area"]
        }
    }
}
