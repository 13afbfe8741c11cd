use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::validation::ValidationErrors;

/// Quantity-break price for bulk buyers.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct BulkPricing {
    pub min_quantity: u32,
    pub price: f64,
}

/// Catalog product document, owned by a supplier.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bulk_pricing: Vec<BulkPricing>,
    pub description: String,
    pub images: Vec<String>,
    pub supplier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: i32,
    pub stock: i32,
    pub unit: String,
    #[serde(default)]
    pub is_organic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

/// Flat projection for list/detail responses: `_id` rendered as a hex string.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bulk_pricing: Vec<BulkPricing>,
    pub description: String,
    pub images: Vec<String>,
    pub supplier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    pub rating: f64,
    pub review_count: i32,
    pub stock: i32,
    pub unit: String,
    pub is_organic: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: product.name,
            category: product.category,
            price: product.price,
            bulk_pricing: product.bulk_pricing,
            description: product.description,
            images: product.images,
            supplier_id: product.supplier_id,
            supplier_name: product.supplier_name,
            rating: product.rating,
            review_count: product.review_count,
            stock: product.stock,
            unit: product.unit,
            is_organic: product.is_organic,
            tags: product.tags,
        }
    }
}

pub const SORT_OPTIONS: [&str; 4] = ["price_asc", "price_desc", "rating", "newest"];

/// Catalog listing filters, all optional. Equality filters and sorting run in
/// the database; price range and text search are applied as post-filters.
#[derive(Debug, Deserialize, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub is_organic: Option<bool>,
    pub search: Option<String>,
    pub supplier_id: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductFilter {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref sort_by) = self.sort_by {
            if !SORT_OPTIONS.contains(&sort_by.as_str()) {
                errors.add("sort_by", "Sort must be one of: price_asc, price_desc, rating, newest");
            }
        }
        if let Some(limit) = self.limit {
            if !(1..=100).contains(&limit) {
                errors.add("limit", "Limit must be between 1 and 100");
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                errors.add("offset", "Offset cannot be negative");
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                errors.add("min_price", "Minimum price cannot exceed maximum price");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub bulk_pricing: Vec<BulkPricing>,
    pub description: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub unit: String,
    #[serde(default)]
    pub is_organic: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().len() < 3 {
            errors.add("name", "Product name must be at least 3 characters");
        } else if self.name.len() > 200 {
            errors.add("name", "Product name cannot exceed 200 characters");
        }
        if self.category.is_empty() {
            errors.add("category", "Category is required");
        }
        if self.price < 0.0 {
            errors.add("price", "Price must be positive");
        }
        if self.description.len() < 10 {
            errors.add("description", "Description must be at least 10 characters");
        } else if self.description.len() > 2000 {
            errors.add("description", "Description cannot exceed 2000 characters");
        }
        if self.images.is_empty() {
            errors.add("images", "At least one image is required");
        } else if self.images.len() > 10 {
            errors.add("images", "Maximum 10 images allowed");
        }
        if self.stock < 0 {
            errors.add("stock", "Stock cannot be negative");
        }
        if self.unit.is_empty() {
            errors.add("unit", "Unit is required");
        }
        for (index, tier) in self.bulk_pricing.iter().enumerate() {
            if tier.min_quantity < 1 {
                errors.add(
                    &format!("bulk_pricing[{}].min_quantity", index),
                    "Minimum quantity must be at least 1",
                );
            }
            if tier.price < 0.0 {
                errors.add(&format!("bulk_pricing[{}].price", index), "Price must be positive");
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Heirloom Tomato Seeds".into(),
            category: "seeds".into(),
            price: 12.5,
            bulk_pricing: vec![BulkPricing { min_quantity: 10, price: 10.0 }],
            description: "Open-pollinated heirloom tomato seeds.".into(),
            images: vec!["https://img.example/seeds.jpg".into()],
            stock: 40,
            unit: "pack".into(),
            is_organic: true,
            tags: vec!["seeds".into()],
        }
    }

    #[test]
    fn test_create_product_valid() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_create_product_requires_image() {
        let mut r = request();
        r.images.clear();
        let errors = r.validate().unwrap_err();
        assert_eq!(errors.errors[0].field, "images");
    }

    #[test]
    fn test_create_product_rejects_bad_bulk_tier() {
        let mut r = request();
        r.bulk_pricing = vec![BulkPricing { min_quantity: 0, price: -1.0 }];
        let errors = r.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.errors[0].field.starts_with("bulk_pricing[0]"));
    }

    #[test]
    fn test_filter_rejects_unknown_sort() {
        let filter = ProductFilter { sort_by: Some("cheapest".into()), ..Default::default() };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_filter_rejects_inverted_price_range() {
        let filter = ProductFilter {
            min_price: Some(50.0),
            max_price: Some(10.0),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }
}
