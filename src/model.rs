// Search request and trip offer data structures

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Origin city is required")]
    MissingOrigin,

    #[error("Destination city is required unless searching anywhere")]
    MissingDestination,

    #[error("Return date {return_date} must be after departure date {departure_date}")]
    InvalidDateRange {
        departure_date: NaiveDate,
        return_date: NaiveDate,
    },

    #[error("At least one traveler is required")]
    NoTravelers,

    #[error("Budget {budget} is below the minimum of {minimum}")]
    BudgetTooLow { budget: f64, minimum: f64 },
}

/// A search as submitted by the user.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub origin_city: String,
    #[serde(default)]
    pub destination_city: Option<String>,
    #[serde(default)]
    pub anywhere: bool,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub travelers: u32,
    pub budget: f64,
}

impl SearchParams {
    /// Destination to search for, `None` for an anywhere search.
    pub fn destination(&self) -> Option<&str> {
        if self.anywhere {
            return None;
        }
        self.destination_city.as_deref().map(str::trim)
    }

    pub fn trip_days(&self) -> u32 {
        self.return_date
            .signed_duration_since(self.departure_date)
            .num_days()
            .max(1) as u32
    }

    pub fn validate(&self, min_budget: f64) -> Result<(), ValidationError> {
        if self.origin_city.trim().is_empty() {
            return Err(ValidationError::MissingOrigin);
        }

        if !self.anywhere && self.destination().map_or(true, str::is_empty) {
            return Err(ValidationError::MissingDestination);
        }

        if self.return_date <= self.departure_date {
            return Err(ValidationError::InvalidDateRange {
                departure_date: self.departure_date,
                return_date: self.return_date,
            });
        }

        if self.travelers == 0 {
            return Err(ValidationError::NoTravelers);
        }

        // NaN budgets fail this comparison too
        if !(self.budget > 0.0 && self.budget >= min_budget) {
            return Err(ValidationError::BudgetTooLow {
                budget: self.budget,
                minimum: min_budget,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TransportMode {
    Flight,
    Train,
    Bus,
}

impl TransportMode {
    pub const ALL: [TransportMode; 3] = [TransportMode::Flight, TransportMode::Train, TransportMode::Bus];
}

/// One direction of travel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Leg {
    pub from: String,
    pub to: String,
    pub departs_at: NaiveTime,
    pub arrives_at: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransportOffer {
    pub mode: TransportMode,
    pub departure_leg: Leg,
    pub return_leg: Leg,
    pub duration_minutes: u32,
    pub carrier: String,
    pub price_per_traveler: f64,
}

impl TransportOffer {
    /// Duration as shown to the user, e.g. `2h 15min`.
    pub fn duration_label(&self) -> String {
        format!("{}h {}min", self.duration_minutes / 60, self.duration_minutes % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AccommodationCategory {
    Hotel,
    BnB,
    Apartment,
    Hostel,
}

impl AccommodationCategory {
    pub const ALL: [AccommodationCategory; 4] = [
        AccommodationCategory::Hotel,
        AccommodationCategory::BnB,
        AccommodationCategory::Apartment,
        AccommodationCategory::Hostel,
    ];
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AccommodationOffer {
    pub category: AccommodationCategory,
    pub name: String,
    pub rating: f64,
    pub star_class: u8,
    pub review_count: u32,
    pub amenities: Vec<String>,
    pub price: f64,
}

/// A transport offer paired with an accommodation offer, priced for the
/// whole party.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TripOffer {
    pub destination_name: String,
    pub total_price: f64,
    pub price_per_traveler: f64,
    pub transport: TransportOffer,
    pub accommodation: AccommodationOffer,
    pub trip_duration_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Duration,
    Rating,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown sort key: {0}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" => Ok(SortKey::Price),
            "duration" => Ok(SortKey::Duration),
            "rating" => Ok(SortKey::Rating),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Price => "price",
            SortKey::Duration => "duration",
            SortKey::Rating => "rating",
        };
        f.write_str(name)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_search_params_from_form_json() {
        let json = r#"{
            "originCity": "Roma",
            "destinationCity": "Parigi",
            "departureDate": "2025-06-01",
            "returnDate": "2025-06-08",
            "travelers": 2,
            "budget": 1000
        }"#;

        let params: SearchParams = serde_json::from_str(json).unwrap();
        assert!(!params.anywhere);
        assert_eq!(params.destination(), Some("Parigi"));
        assert_eq!(params.trip_days(), 7);
        assert!(params.validate(100.0).is_ok());
    }

    #[test]
    fn test_anywhere_ignores_destination() {
        let mut params = rome_anywhere(2, 1000.0);
        params.destination_city = Some("Parigi".to_string());
        assert_eq!(params.destination(), None);
        assert!(params.validate(100.0).is_ok());
    }

    #[test]
    fn test_missing_destination() {
        let mut params = rome_anywhere(2, 1000.0);
        params.anywhere = false;
        params.destination_city = Some("   ".to_string());
        assert_eq!(params.validate(100.0), Err(ValidationError::MissingDestination));
    }

    #[test_case("2025-06-08", "2025-06-01"; "return before departure")]
    #[test_case("2025-06-01", "2025-06-01"; "same day")]
    fn test_invalid_date_range(departure: &str, return_date: &str) {
        let mut params = rome_anywhere(2, 1000.0);
        params.departure_date = date(departure);
        params.return_date = date(return_date);
        assert!(matches!(
            params.validate(100.0),
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test_case(0, 1000.0, ValidationError::NoTravelers; "no travelers")]
    #[test_case(2, 50.0, ValidationError::BudgetTooLow { budget: 50.0, minimum: 100.0 }; "budget below minimum")]
    fn test_rejected_params(travelers: u32, budget: f64, expected: ValidationError) {
        let params = rome_anywhere(travelers, budget);
        assert_eq!(params.validate(100.0), Err(expected));
    }

    #[test]
    fn test_blank_origin_is_rejected() {
        let mut params = rome_anywhere(2, 1000.0);
        params.origin_city = " ".to_string();
        assert_eq!(params.validate(100.0), Err(ValidationError::MissingOrigin));
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("price".parse::<SortKey>(), Ok(SortKey::Price));
        assert_eq!(" Rating".parse::<SortKey>(), Ok(SortKey::Rating));
        assert_eq!(SortKey::Duration.to_string(), "duration");
        assert_eq!(
            "stars".parse::<SortKey>(),
            Err(UnknownSortKey("stars".to_string()))
        );
        assert_eq!(
            UnknownSortKey("stars".to_string()).to_string(),
            "Unknown sort key: stars"
        );
    }

    #[test]
    fn test_duration_label() {
        let trip = trip("Paris", 500.0, 7, 4.0);
        assert_eq!(trip.transport.duration_label(), "2h 0min");
    }
}
