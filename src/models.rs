use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum star rating a review needs to be stored
pub const MIN_PUBLISHED_RATING: i32 = 4;

/// A shop review as returned by the review API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub shop_id: Option<i64>,
    #[serde(default)]
    pub listing_id: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub buyer_user_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: i32,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub image_url_fullxfull: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub create_timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_timestamp: i64,
}

/// One page of the shop reviews listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<Review>,
}

impl Review {
    /// Quality filter: rated 4+ and carrying either text or a photo
    pub fn is_publishable(&self) -> bool {
        self.rating >= MIN_PUBLISHED_RATING
            && (has_content(&self.review) || has_content(&self.image_url_fullxfull))
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.create_timestamp, 0)
    }
}

fn has_content(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep only the reviews that pass the quality filter, preserving order
pub fn publishable(reviews: &[Review]) -> Vec<&Review> {
    reviews.iter().filter(|r| r.is_publishable()).collect()
}

/// A review in the shape existing readers of the collection expect.
///
/// Field names differ from the API's. Empty values are left out of the
/// document entirely rather than written as zero or "".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredReview {
    #[serde(rename = "shopid", default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<i64>,
    #[serde(rename = "listingid", default, skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<i64>,
    #[serde(rename = "transactionid", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    #[serde(rename = "buyerid", default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "imageurl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "created", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(rename = "updated", default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
}

impl From<&Review> for StoredReview {
    fn from(r: &Review) -> Self {
        Self {
            shop_id: r.shop_id.filter(|&v| v != 0),
            listing_id: r.listing_id.filter(|&v| v != 0),
            transaction_id: r.transaction_id.filter(|&v| v != 0),
            buyer_id: r.buyer_user_id.filter(|&v| v != 0),
            rating: Some(r.rating).filter(|&v| v != 0),
            review: r.review.clone().filter(|s| !s.is_empty()),
            language: r.language.clone().filter(|s| !s.is_empty()),
            image_url: r.image_url_fullxfull.clone().filter(|s| !s.is_empty()),
            created: Some(r.create_timestamp).filter(|&v| v != 0),
            updated: Some(r.update_timestamp).filter(|&v| v != 0),
        }
    }
}
