// Result ordering for the sort-by control

use std::cmp::Ordering;

use crate::model::{SortKey, TripOffer};

/// Returns a sorted copy of `offers`. The sort is stable: price and duration
/// ascending, rating descending.
pub fn rank(offers: &[TripOffer], key: SortKey) -> Vec<TripOffer> {
    let mut ranked = offers.to_vec();
    ranked.sort_by(|a, b| compare(a, b, key));
    ranked
}

fn compare(a: &TripOffer, b: &TripOffer, key: SortKey) -> Ordering {
    match key {
        SortKey::Price => a.total_price.total_cmp(&b.total_price),
        SortKey::Duration => a.trip_duration_days.cmp(&b.trip_duration_days),
        SortKey::Rating => b.accommodation.rating.total_cmp(&a.accommodation.rating),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::trip;
    use test_case::test_case;

    fn offers() -> Vec<TripOffer> {
        vec![
            trip("Paris", 640.0, 7, 3.8),
            trip("Vienna", 420.0, 5, 4.6),
            trip("Madrid", 640.0, 3, 4.6),
            trip("Prague", 380.0, 7, 4.1),
        ]
    }

    fn names(offers: &[TripOffer]) -> Vec<&str> {
        offers.iter().map(|o| o.destination_name.as_str()).collect()
    }

    #[test_case(SortKey::Price, vec!["Prague", "Vienna", "Paris", "Madrid"]; "price ascending, ties keep order")]
    #[test_case(SortKey::Duration, vec!["Madrid", "Vienna", "Paris", "Prague"]; "duration ascending")]
    #[test_case(SortKey::Rating, vec!["Vienna", "Madrid", "Prague", "Paris"]; "rating descending")]
    fn test_rank(key: SortKey, expected: Vec<&str>) {
        let input = offers();
        let ranked = rank(&input, key);
        assert_eq!(names(&ranked), expected);
    }

    #[test]
    fn test_input_is_left_untouched() {
        let input = offers();
        let before = input.clone();

        let _ = rank(&input, SortKey::Price);
        let _ = rank(&input, SortKey::Rating);

        assert_eq!(input, before);
    }

    #[test]
    fn test_ordering_properties() {
        let input = offers();

        let by_price = rank(&input, SortKey::Price);
        assert!(by_price
            .windows(2)
            .all(|w| w[0].total_price <= w[1].total_price));

        let by_rating = rank(&input, SortKey::Rating);
        assert!(by_rating
            .windows(2)
            .all(|w| w[0].accommodation.rating >= w[1].accommodation.rating));
    }

    #[test]
    fn test_empty_list() {
        assert!(rank(&[], SortKey::Duration).is_empty());
    }
}
