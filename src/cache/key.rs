//! Cache key construction for content listings

use crate::models::ContentType;

/// Build the composite key for one page of a category listing.
///
/// Keys are opaque to the cache; this only guarantees that distinct
/// (category, type, page) triples never collide.
pub fn listing_key(category: &str, content_type: ContentType, page: u32) -> String {
    format!("{}|{}|{}", category.trim(), content_type, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_key_deterministic() {
        let key1 = listing_key("popular", ContentType::Movie, 1);
        let key2 = listing_key("popular", ContentType::Movie, 1);

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_listing_key_different_pages() {
        let key1 = listing_key("popular", ContentType::Movie, 1);
        let key2 = listing_key("popular", ContentType::Movie, 2);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_listing_key_different_types() {
        let key1 = listing_key("popular", ContentType::Movie, 1);
        let key2 = listing_key("popular", ContentType::Tv, 1);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_listing_key_trims_category() {
        assert_eq!(
            listing_key("  hot ", ContentType::Record, 3),
            listing_key("hot", ContentType::Record, 3)
        );
    }
}
