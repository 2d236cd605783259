//! Listing records and the request bodies that create, update and filter them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Availability, Category, ListingId, Price};

/// A vehicle listing as returned by the marketplace API.
///
/// Records are never patched locally: lists holding them are replaced
/// wholesale whenever they are fetched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing_id: ListingId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw category string; unknown categories are kept rather than rejected.
    #[serde(default)]
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub city: String,
    /// Image URLs in display order; the first one is the cover image.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Seller's display name.
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ListingRecord {
    /// The category, if it is one the client knows about.
    #[must_use]
    pub fn known_category(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    /// The cover image, if the listing has any images.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub fn is_sold(&self) -> bool {
        self.availability == Availability::Sold
    }
}

/// Body of `POST /listings/create`.
///
/// Only produced by [`crate::validation::ListingForm::validate`], so every
/// field already satisfies the listing schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub price: Price,
    pub city: String,
    pub images: Vec<Url>,
}

/// Partial body of `PUT /listings/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Url>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
}

impl ListingUpdate {
    /// True when the update would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.city.is_none()
            && self.images.is_none()
            && self.availability.is_none()
    }
}

/// Query filters for `GET /listings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilters {
    pub category: Option<Category>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub availability: Option<Availability>,
    pub search: Option<String>,
}

impl ListingFilters {
    /// Query-string pairs for the filters that are set, in a stable order.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            pairs.push(("city", city.to_owned()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        if let Some(availability) = self.availability {
            pairs.push(("availability", availability.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tolerates_sparse_payload() {
        let json = r#"{"listing_id": 7, "title": "Swift VXi 2019", "price": 450000}"#;
        let record: ListingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.listing_id, ListingId::new("7"));
        assert!(record.images.is_empty());
        assert_eq!(record.availability, Availability::Available);
        assert_eq!(record.cover_image(), None);
        assert_eq!(record.known_category(), None);
    }

    #[test]
    fn test_record_full_payload() {
        let json = r#"{
            "listing_id": "a1",
            "title": "Royal Enfield Classic 350",
            "description": "Single owner, serviced on time",
            "category": "bikes",
            "price": 145000,
            "city": "Pune",
            "images": ["https://img.example.com/1.jpg", "https://img.example.com/2.jpg"],
            "availability": "sold",
            "created_at": "2024-03-01T10:00:00Z",
            "full_name": "Asha Rao"
        }"#;
        let record: ListingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.known_category(), Some(Category::Bikes));
        assert_eq!(record.cover_image(), Some("https://img.example.com/1.jpg"));
        assert!(record.is_sold());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = ListingUpdate {
            availability: Some(Availability::Sold),
            ..ListingUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"availability": "sold"})
        );
        assert!(ListingUpdate::default().is_empty());
    }

    #[test]
    fn test_filters_query_pairs() {
        let filters = ListingFilters {
            category: Some(Category::Suv),
            city: Some("  ".to_owned()),
            min_price: Some(100_000),
            search: Some("creta".to_owned()),
            ..ListingFilters::default()
        };
        assert_eq!(
            filters.to_query_pairs(),
            vec![
                ("category", "suv".to_owned()),
                ("minPrice", "100000".to_owned()),
                ("search", "creta".to_owned()),
            ]
        );
        assert!(ListingFilters::default().to_query_pairs().is_empty());
    }
}
