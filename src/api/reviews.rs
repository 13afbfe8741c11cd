use actix_web::{web, HttpResponse};

use crate::api::{error_response, validation_response};
use crate::database::MongoDB;
use crate::models::{CreateReviewRequest, ProductReviews, ReviewResponse};
use crate::services::auth_service::Claims;
use crate::services::review_service;

#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    tag = "Reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review added successfully", body = ReviewResponse),
        (status = 400, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_review(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<CreateReviewRequest>,
) -> HttpResponse {
    log::info!("⭐ POST /reviews - user: {}, product: {}", user.sub, request.product_id);

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match review_service::create_review(&db, &user.sub, &user.name, None, &request).await {
        Ok(review) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "data": ReviewResponse::from(review),
            "message": "Review added successfully"
        })),
        Err(e) => {
            log::error!("❌ Review creation failed for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews/product/{id}",
    tag = "Reviews",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reviews with average rating", body = ProductReviews)
    )
)]
pub async fn get_product_reviews(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("⭐ GET /reviews/product/{}", product_id);

    match review_service::get_product_reviews(&db, &product_id).await {
        Ok(reviews) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": reviews
        })),
        Err(e) => {
            log::error!("❌ Failed to fetch reviews for {}: {}", product_id, e);
            error_response(e)
        }
    }
}
