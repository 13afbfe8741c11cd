use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::validation::ValidationErrors;

/// Product review document. Created once per submission, no edit path.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    pub rating: u8,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub helpful: i32,
    pub created_at: BsonDateTime,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    pub rating: u8,
    pub comment: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub helpful: i32,
    pub created_at: i64,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            product_id: review.product_id,
            user_id: review.user_id,
            user_name: review.user_name,
            user_photo: review.user_photo,
            rating: review.rating,
            comment: review.comment,
            images: review.images,
            helpful: review.helpful,
            created_at: review.created_at.timestamp_millis() / 1000,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.product_id.is_empty() {
            errors.add("product_id", "Product ID is required");
        }
        if !(1..=5).contains(&self.rating) {
            errors.add("rating", "Rating must be between 1 and 5");
        }
        if self.comment.len() < 10 {
            errors.add("comment", "Review must be at least 10 characters");
        } else if self.comment.len() > 1000 {
            errors.add("comment", "Review cannot exceed 1000 characters");
        }
        if self.images.len() > 5 {
            errors.add("images", "Maximum 5 images allowed");
        }
        errors.into_result()
    }
}

/// Reviews for one product plus the aggregate the product page shows.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductReviews {
    pub reviews: Vec<ReviewResponse>,
    pub average_rating: f64,
    pub total_reviews: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateReviewRequest {
        CreateReviewRequest {
            product_id: "64b000000000000000000001".into(),
            rating: 4,
            comment: "Germination rate was excellent.".into(),
            images: vec![],
        }
    }

    #[test]
    fn test_review_valid() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_review_rating_bounds() {
        for bad in [0u8, 6] {
            let mut r = request();
            r.rating = bad;
            let errors = r.validate().unwrap_err();
            assert_eq!(errors.errors[0].field, "rating");
        }
    }

    #[test]
    fn test_review_comment_length() {
        let mut r = request();
        r.comment = "too short".into();
        assert!(r.validate().is_err());
    }
}
