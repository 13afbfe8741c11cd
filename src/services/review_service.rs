use crate::{
    database::MongoDB,
    models::{CreateReviewRequest, ProductReviews, Review, ReviewResponse},
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime};

const COLLECTION: &str = "reviews";

/// Mean of the given ratings, 0 for an empty slice.
pub fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64
}

pub async fn create_review(
    db: &MongoDB,
    user_id: &str,
    user_name: &str,
    user_photo: Option<String>,
    request: &CreateReviewRequest,
) -> Result<Review, AppError> {
    let mut review = Review {
        id: None,
        product_id: request.product_id.clone(),
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        user_photo,
        rating: request.rating,
        comment: request.comment.clone(),
        images: request.images.clone(),
        helpful: 0,
        created_at: BsonDateTime::now(),
    };

    let inserted = db
        .collection::<Review>(COLLECTION)
        .insert_one(&review)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to add review: {}", e)))?;

    if let Bson::ObjectId(oid) = inserted.inserted_id {
        review.id = Some(oid);
    }

    log::info!("⭐ Review added for product {} by {}", review.product_id, user_id);
    Ok(review)
}

/// All reviews for one product, newest first, with the aggregate the product
/// page shows. The average is computed at read time rather than stored.
pub async fn get_product_reviews(db: &MongoDB, product_id: &str) -> Result<ProductReviews, AppError> {
    let collection = db.collection::<Review>(COLLECTION);

    let mut cursor = collection
        .find(doc! { "product_id": product_id })
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let mut reviews = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(review) => reviews.push(review),
            Err(e) => log::error!("❌ Skipping unreadable review document: {}", e),
        }
    }

    let ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();
    let average = average_rating(&ratings);

    Ok(ProductReviews {
        total_reviews: reviews.len(),
        average_rating: average,
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rating_empty_is_zero() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn test_average_rating_mean() {
        assert_eq!(average_rating(&[5]), 5.0);
        assert_eq!(average_rating(&[4, 2]), 3.0);
        assert!((average_rating(&[5, 4, 4]) - 4.333333).abs() < 1e-5);
    }
}
