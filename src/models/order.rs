use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::cart::CartItem;
use crate::utils::validation::ValidationErrors;

/// Order lifecycle states. Transitions are driven by the status-update
/// endpoint; only enum membership is enforced.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    BankTransfer,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct DeliveryInfo {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DeliveryInfo {
    pub fn validate(&self, errors: &mut ValidationErrors) {
        if self.full_name.trim().len() < 2 {
            errors.add("delivery_info.full_name", "Full name must be at least 2 characters");
        } else if self.full_name.len() > 100 {
            errors.add("delivery_info.full_name", "Full name cannot exceed 100 characters");
        }
        if self.phone.len() < 10 {
            errors.add("delivery_info.phone", "Phone number must be at least 10 digits");
        }
        if self.address.len() < 5 {
            errors.add("delivery_info.address", "Address must be at least 5 characters");
        } else if self.address.len() > 200 {
            errors.add("delivery_info.address", "Address cannot exceed 200 characters");
        }
        if self.city.len() < 2 {
            errors.add("delivery_info.city", "City is required");
        }
        if self.state.len() < 2 {
            errors.add("delivery_info.state", "State is required");
        }
        if self.zip_code.len() < 5 {
            errors.add("delivery_info.zip_code", "Zip code must be at least 5 characters");
        }
        if self.country.len() < 2 {
            errors.add("delivery_info.country", "Country is required");
        }
        if let Some(ref notes) = self.notes {
            if notes.len() > 500 {
                errors.add("delivery_info.notes", "Notes cannot exceed 500 characters");
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Immutable checkout snapshot of a cart.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub delivery_info: DeliveryInfo,
    pub payment_info: PaymentInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub price: f64,
    pub quantity: u32,
    pub supplier_id: String,
    #[serde(default)]
    pub supplier_name: String,
}

impl From<CartItem> for OrderItem {
    fn from(item: CartItem) -> Self {
        OrderItem {
            product_id: item.product_id,
            product_name: item.product_name,
            product_image: item.product_image,
            price: item.price,
            quantity: item.quantity,
            supplier_id: item.supplier_id,
            supplier_name: String::new(),
        }
    }
}

/// Flat projection with the `_id` rendered as a hex string.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub delivery_info: DeliveryInfo,
    pub payment_info: PaymentInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: order.user_id,
            user_name: order.user_name,
            user_email: order.user_email,
            items: order.items,
            status: order.status,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping_fee: order.shipping_fee,
            total: order.total,
            delivery_info: order.delivery_info,
            payment_info: order.payment_info,
            tracking_number: order.tracking_number,
            created_at: order.created_at.timestamp_millis() / 1000,
            updated_at: order.updated_at.timestamp_millis() / 1000,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    pub delivery_info: DeliveryInfo,
    pub payment_info: CreateOrderPayment,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderPayment {
    pub method: String,
    pub transaction_id: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.delivery_info.validate(&mut errors);
        if self.parsed_method().is_none() {
            errors.add("payment_info.method", "Payment method must be one of: card, cash, bank_transfer");
        }
        errors.into_result()
    }

    pub fn parsed_method(&self) -> Option<PaymentMethod> {
        match self.payment_info.method.as_str() {
            "card" => Some(PaymentMethod::Card),
            "cash" => Some(PaymentMethod::Cash),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub tracking_number: Option<String>,
}

impl UpdateOrderStatusRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if OrderStatus::parse(&self.status).is_none() {
            errors.add(
                "status",
                "Status must be one of: pending, confirmed, processing, shipped, delivered, cancelled",
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> DeliveryInfo {
        DeliveryInfo {
            full_name: "Maria Santos".into(),
            phone: "5511999990000".into(),
            address: "Rural Road 42, Plot 7".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62704".into(),
            country: "US".into(),
            notes: None,
        }
    }

    #[test]
    fn test_create_order_valid() {
        let request = CreateOrderRequest {
            delivery_info: delivery(),
            payment_info: CreateOrderPayment { method: "cash".into(), transaction_id: None },
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.parsed_method(), Some(PaymentMethod::Cash));
    }

    #[test]
    fn test_create_order_rejects_bad_method() {
        let request = CreateOrderRequest {
            delivery_info: delivery(),
            payment_info: CreateOrderPayment { method: "crypto".into(), transaction_id: None },
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors[0].field, "payment_info.method");
    }

    #[test]
    fn test_create_order_collects_delivery_errors() {
        let mut info = delivery();
        info.full_name = "X".into();
        info.phone = "123".into();
        let request = CreateOrderRequest {
            delivery_info: info,
            payment_info: CreateOrderPayment { method: "card".into(), transaction_id: None },
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 2);
    }

    #[test]
    fn test_status_enum_membership() {
        for status in ["pending", "confirmed", "processing", "shipped", "delivered", "cancelled"] {
            assert_eq!(OrderStatus::parse(status).unwrap().to_string(), status);
        }
        assert!(OrderStatus::parse("returned").is_none());

        let request = UpdateOrderStatusRequest { status: "returned".into(), tracking_number: None };
        assert!(request.validate().is_err());
    }
}
