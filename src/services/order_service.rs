use crate::{
    database::MongoDB,
    models::{
        Cart, CreateOrderRequest, Order, OrderItem, OrderStatus, PaymentInfo, PaymentStatus,
        UserRole,
    },
    services::cart_service,
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

const COLLECTION: &str = "orders";

/// Snapshot the caller's cart into an immutable order and clear the cart.
/// Both writes run inside one client-session transaction: if anything fails
/// the transaction aborts and the user keeps the cart.
pub async fn create_order(
    db: &MongoDB,
    user_id: &str,
    user_name: &str,
    user_email: &str,
    request: &CreateOrderRequest,
) -> Result<Order, AppError> {
    let cart = cart_service::load_cart(db, user_id)
        .await?
        .filter(|cart| !cart.items.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Cart is empty".to_string()))?;

    let totals = cart_service::compute_totals(&cart.items);
    let method = request
        .parsed_method()
        .ok_or_else(|| AppError::InvalidRequest("Invalid payment method".to_string()))?;

    let now = BsonDateTime::now();
    let mut order = Order {
        id: None,
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        user_email: user_email.to_string(),
        items: cart.items.iter().cloned().map(OrderItem::from).collect(),
        status: OrderStatus::Pending,
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping_fee: totals.shipping_fee,
        total: totals.total,
        delivery_info: request.delivery_info.clone(),
        payment_info: PaymentInfo {
            method,
            status: PaymentStatus::Pending,
            transaction_id: request.payment_info.transaction_id.clone(),
        },
        tracking_number: None,
        created_at: now,
        updated_at: now,
    };

    let mut session = db
        .client()
        .start_session()
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to start session: {}", e)))?;

    session
        .start_transaction()
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to start transaction: {}", e)))?;

    let orders = db.collection::<Order>(COLLECTION);
    let carts = db.collection::<Cart>("carts");

    let commit = async {
        let inserted = orders
            .insert_one(&order)
            .session(&mut session)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create order: {}", e)))?;

        carts
            .delete_one(doc! { "user_id": user_id })
            .session(&mut session)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to clear cart: {}", e)))?;

        session
            .commit_transaction()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit order: {}", e)))?;

        Ok::<_, AppError>(inserted.inserted_id.as_object_id())
    }
    .await;

    match commit {
        Ok(inserted_id) => {
            order.id = inserted_id;
            log::info!("🧾 Order created for user {} (total {:.2})", user_id, order.total);
            Ok(order)
        }
        Err(e) => {
            let _ = session.abort_transaction().await;
            Err(e)
        }
    }
}

/// The caller's orders, newest first.
pub async fn get_user_orders(db: &MongoDB, user_id: &str) -> Result<Vec<Order>, AppError> {
    let collection = db.collection::<Order>(COLLECTION);

    let mut cursor = collection
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let mut orders = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(order) => orders.push(order),
            Err(e) => log::error!("❌ Skipping unreadable order document: {}", e),
        }
    }
    Ok(orders)
}

/// Every order in the system, newest first. Admin dashboards only.
pub async fn get_all_orders(db: &MongoDB) -> Result<Vec<Order>, AppError> {
    let collection = db.collection::<Order>(COLLECTION);

    let mut cursor = collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let mut orders = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(order) => orders.push(order),
            Err(e) => log::error!("❌ Skipping unreadable order document: {}", e),
        }
    }
    Ok(orders)
}

/// One order. Owners read their own; admins read any.
pub async fn get_order(
    db: &MongoDB,
    order_id: &str,
    requester_id: &str,
    requester_role: UserRole,
) -> Result<Order, AppError> {
    let object_id = ObjectId::parse_str(order_id)
        .map_err(|_| AppError::InvalidRequest("Invalid order ID".to_string()))?;

    let order = db
        .collection::<Order>(COLLECTION)
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if order.user_id != requester_id && requester_role != UserRole::Admin {
        // Existence is not leaked to strangers
        return Err(AppError::NotFound("Order not found".to_string()));
    }

    Ok(order)
}

/// Move an order to a new lifecycle state. Admins may set any status;
/// suppliers only on orders carrying their items. Membership in the status
/// enum is the only transition check.
pub async fn update_status(
    db: &MongoDB,
    order_id: &str,
    requester_id: &str,
    requester_role: UserRole,
    status: OrderStatus,
    tracking_number: Option<String>,
) -> Result<Order, AppError> {
    let object_id = ObjectId::parse_str(order_id)
        .map_err(|_| AppError::InvalidRequest("Invalid order ID".to_string()))?;

    let collection = db.collection::<Order>(COLLECTION);

    let order = collection
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let allowed = match requester_role {
        UserRole::Admin => true,
        UserRole::Supplier => order.items.iter().any(|item| item.supplier_id == requester_id),
        UserRole::Farmer => false,
    };
    if !allowed {
        return Err(AppError::Forbidden(
            "Not allowed to update this order".to_string(),
        ));
    }

    let mut update = doc! {
        "status": mongodb::bson::to_bson(&status)
            .map_err(|e| AppError::DatabaseError(e.to_string()))?,
        "updated_at": BsonDateTime::now(),
    };
    if let Some(ref tracking) = tracking_number {
        update.insert("tracking_number", tracking.as_str());
    }

    collection
        .update_one(doc! { "_id": object_id }, doc! { "$set": update })
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update order: {}", e)))?;

    collection
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, CreateOrderPayment, DeliveryInfo};

    fn cart_items() -> Vec<CartItem> {
        vec![
            CartItem {
                product_id: "p1".into(),
                product_name: "Seeds".into(),
                product_image: "https://img.example/1.jpg".into(),
                price: 10.0,
                quantity: 2,
                supplier_id: "s1".into(),
            },
            CartItem {
                product_id: "p2".into(),
                product_name: "Fertilizer".into(),
                product_image: "https://img.example/2.jpg".into(),
                price: 5.0,
                quantity: 1,
                supplier_id: "s2".into(),
            },
        ]
    }

    #[test]
    fn test_order_items_mirror_cart() {
        let items: Vec<OrderItem> = cart_items().into_iter().map(OrderItem::from).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, "p1");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, 10.0);
        assert_eq!(items[1].supplier_id, "s2");
        assert!(items[1].supplier_name.is_empty());
    }

    #[test]
    fn test_order_totals_mirror_cart_totals() {
        let items = cart_items();
        let totals = cart_service::compute_totals(&items);
        assert_eq!(totals.subtotal, 25.00);
        assert_eq!(totals.tax, 2.50);
        assert_eq!(totals.shipping_fee, 10.00);
        assert_eq!(totals.total, 37.50);
    }

    #[test]
    fn test_create_order_request_round_trip() {
        let request = CreateOrderRequest {
            delivery_info: DeliveryInfo {
                full_name: "Maria Santos".into(),
                phone: "5511999990000".into(),
                address: "Rural Road 42".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zip_code: "62704".into(),
                country: "US".into(),
                notes: Some("Leave at the gate".into()),
            },
            payment_info: CreateOrderPayment { method: "bank_transfer".into(), transaction_id: None },
        };
        assert!(request.validate().is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB (replica set) to be running
    async fn test_checkout_clears_cart() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/agrimarket_test".to_string());
        let db = MongoDB::new(&uri).await.expect("connect");

        let user_id = "order-test-user";
        let carts = db.collection::<Cart>("carts");
        let mut cart = Cart::empty(user_id);
        cart.items = cart_items();
        carts
            .replace_one(doc! { "user_id": user_id }, &cart)
            .upsert(true)
            .await
            .expect("seed cart");

        let request = CreateOrderRequest {
            delivery_info: DeliveryInfo {
                full_name: "Maria Santos".into(),
                phone: "5511999990000".into(),
                address: "Rural Road 42".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zip_code: "62704".into(),
                country: "US".into(),
                notes: None,
            },
            payment_info: CreateOrderPayment { method: "cash".into(), transaction_id: None },
        };

        let order = create_order(&db, user_id, "Maria", "maria@farm.example", &request)
            .await
            .expect("create order");
        assert_eq!(order.total, 37.50);
        assert_eq!(order.items.len(), 2);

        let remaining = carts.find_one(doc! { "user_id": user_id }).await.expect("query");
        assert!(remaining.is_none());
    }
}
