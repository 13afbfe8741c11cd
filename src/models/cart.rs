use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::validation::ValidationErrors;

pub const MAX_ITEM_QUANTITY: u32 = 1000;

/// One line item. Name, image, price and supplier are snapshotted from the
/// product at add time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub price: f64,
    pub quantity: u32,
    pub supplier_id: String,
}

/// Shopping cart document, one per user. Invariants: every item has
/// `quantity >= 1`, and `product_id` is unique within `items`. `revision` is
/// the optimistic-concurrency token every mutation compares-and-swaps on.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cart {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub revision: i64,
    pub updated_at: BsonDateTime,
}

impl Cart {
    pub fn empty(user_id: &str) -> Self {
        Cart {
            id: None,
            user_id: user_id.to_string(),
            items: Vec::new(),
            revision: 0,
            updated_at: BsonDateTime::now(),
        }
    }
}

/// Cart plus its derived totals, the shape every cart endpoint returns.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CartView {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_fee: f64,
    pub total: f64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: u32,
}

impl AddToCartRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.product_id.is_empty() {
            errors.add("product_id", "Product ID is required");
        }
        if self.quantity < 1 {
            errors.add("quantity", "Quantity must be at least 1");
        } else if self.quantity > MAX_ITEM_QUANTITY {
            errors.add("quantity", "Quantity cannot exceed 1000");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCartItemRequest {
    pub product_id: String,
    /// 0 removes the line item.
    pub quantity: u32,
}

impl UpdateCartItemRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.product_id.is_empty() {
            errors.add("product_id", "Product ID is required");
        }
        if self.quantity > MAX_ITEM_QUANTITY {
            errors.add("quantity", "Quantity cannot exceed 1000");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct CartDeleteQuery {
    pub product_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_bounds() {
        let zero = AddToCartRequest { product_id: "p1".into(), quantity: 0 };
        assert!(zero.validate().is_err());

        let too_many = AddToCartRequest { product_id: "p1".into(), quantity: 1001 };
        assert!(too_many.validate().is_err());

        let ok = AddToCartRequest { product_id: "p1".into(), quantity: 1000 };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_update_request_allows_zero() {
        let remove = UpdateCartItemRequest { product_id: "p1".into(), quantity: 0 };
        assert!(remove.validate().is_ok());
    }

    #[test]
    fn test_empty_cart_shape() {
        let cart = Cart::empty("u1");
        assert_eq!(cart.user_id, "u1");
        assert!(cart.items.is_empty());
        assert_eq!(cart.revision, 0);
    }
}
