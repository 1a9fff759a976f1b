//! Listing identifier generation

use rand::Rng;

/// Number of digits in a listing identifier
pub const LISTING_ID_LEN: usize = 9;

/// Source of candidate listing identifiers
///
/// Candidates are not guaranteed to be free; the listing service checks each
/// one against the store and asks for another on collision.
pub trait ListingIdGenerator: Send + Sync {
    fn next_candidate(&self) -> String;
}

/// Uniformly random fixed-length decimal strings, leading zeros included
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDigits;

impl ListingIdGenerator for RandomDigits {
    fn next_candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..LISTING_ID_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Whether `id` has the shape of a generated listing identifier
pub fn is_listing_id(id: &str) -> bool {
    id.len() == LISTING_ID_LEN && id.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_candidates_are_nine_digits() {
        let generator = RandomDigits;
        for _ in 0..1_000 {
            let id = generator.next_candidate();
            assert!(is_listing_id(&id), "unexpected candidate {id}");
        }
    }

    #[test]
    fn test_candidates_vary() {
        let generator = RandomDigits;
        let seen: HashSet<String> = (0..100).map(|_| generator.next_candidate()).collect();
        assert!(seen.len() > 90);
    }

    #[test]
    fn test_is_listing_id() {
        assert!(is_listing_id("000000042"));
        assert!(!is_listing_id("12345678"));
        assert!(!is_listing_id("1234567890"));
        assert!(!is_listing_id("12345678a"));
    }
}
