use crate::{
    database::MongoDB,
    models::{AddToCartRequest, Cart, CartItem, CartView, Product, UpdateCartItemRequest},
    utils::error::AppError,
};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

const COLLECTION: &str = "carts";

/// Attempts before a concurrent-modification error is surfaced. Every retry
/// re-reads the cart, so losing the race never loses the caller's change.
const MAX_CAS_RETRIES: usize = 3;

pub const TAX_RATE: f64 = 0.10;
pub const FLAT_SHIPPING_FEE: f64 = 10.0;

#[derive(Debug, PartialEq)]
pub struct CartTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_fee: f64,
    pub total: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// subtotal = Σ price×quantity, tax = 10%, flat shipping when non-empty.
/// The total is derived before rounding so the 2-decimal identity
/// `total = subtotal + tax + shipping_fee` holds.
pub fn compute_totals(items: &[CartItem]) -> CartTotals {
    let subtotal: f64 = items.iter().map(|item| item.price * f64::from(item.quantity)).sum();
    let tax = subtotal * TAX_RATE;
    let shipping_fee = if items.is_empty() { 0.0 } else { FLAT_SHIPPING_FEE };
    let total = subtotal + tax + shipping_fee;
    CartTotals {
        subtotal: round2(subtotal),
        tax: round2(tax),
        shipping_fee,
        total: round2(total),
    }
}

/// Merge-on-add: an existing line item for the same product gains the new
/// quantity, otherwise the item is appended. Keeps `product_id` unique.
pub fn merge_item(items: &mut Vec<CartItem>, new_item: CartItem) {
    match items.iter_mut().find(|item| item.product_id == new_item.product_id) {
        Some(existing) => existing.quantity += new_item.quantity,
        None => items.push(new_item),
    }
}

/// Set a line item's quantity; 0 removes it. Returns false when the product
/// is not in the cart.
pub fn apply_quantity(items: &mut Vec<CartItem>, product_id: &str, quantity: u32) -> bool {
    let Some(index) = items.iter().position(|item| item.product_id == product_id) else {
        return false;
    };
    if quantity == 0 {
        items.remove(index);
    } else {
        items[index].quantity = quantity;
    }
    true
}

pub fn view(cart: &Cart) -> CartView {
    let totals = compute_totals(&cart.items);
    CartView {
        user_id: cart.user_id.clone(),
        items: cart.items.clone(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping_fee: totals.shipping_fee,
        total: totals.total,
    }
}

pub async fn load_cart(db: &MongoDB, user_id: &str) -> Result<Option<Cart>, AppError> {
    db.collection::<Cart>(COLLECTION)
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
}

/// The caller's cart, or the empty-cart shape when none has been written yet.
pub async fn get_cart(db: &MongoDB, user_id: &str) -> Result<Cart, AppError> {
    Ok(load_cart(db, user_id).await?.unwrap_or_else(|| Cart::empty(user_id)))
}

/// Read-modify-write under optimistic concurrency: the write is filtered on
/// the revision that was read, and a lost race re-reads and reapplies.
async fn mutate_cart<F>(db: &MongoDB, user_id: &str, mutate: F) -> Result<Cart, AppError>
where
    F: Fn(&mut Vec<CartItem>) -> Result<(), AppError>,
{
    let collection = db.collection::<Cart>(COLLECTION);

    for _ in 0..MAX_CAS_RETRIES {
        let existing = load_cart(db, user_id).await?;

        match existing {
            Some(mut cart) => {
                let read_revision = cart.revision;
                mutate(&mut cart.items)?;
                cart.revision = read_revision + 1;
                cart.updated_at = BsonDateTime::now();

                let result = collection
                    .update_one(
                        doc! { "user_id": user_id, "revision": read_revision },
                        doc! { "$set": {
                            "items": mongodb::bson::to_bson(&cart.items)
                                .map_err(|e| AppError::DatabaseError(e.to_string()))?,
                            "revision": cart.revision,
                            "updated_at": cart.updated_at,
                        }},
                    )
                    .await
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;

                if result.modified_count == 1 {
                    return Ok(cart);
                }
                // Revision moved under us; retry against the fresh document
            }
            None => {
                let mut cart = Cart::empty(user_id);
                mutate(&mut cart.items)?;

                match collection.insert_one(&cart).await {
                    Ok(_) => return Ok(cart),
                    // Unique index on user_id: a concurrent first-write won;
                    // loop to update the cart it created
                    Err(e) if e.to_string().contains("E11000") => continue,
                    Err(e) => return Err(AppError::DatabaseError(e.to_string())),
                }
            }
        }
    }

    Err(AppError::Conflict(
        "Cart was modified concurrently. Please retry.".to_string(),
    ))
}

/// Add a product to the cart, snapshotting its name, first image, price and
/// supplier at add time.
pub async fn add_item(db: &MongoDB, user_id: &str, request: &AddToCartRequest) -> Result<Cart, AppError> {
    let product_oid = ObjectId::parse_str(&request.product_id)
        .map_err(|_| AppError::InvalidRequest("Invalid product ID".to_string()))?;

    let product = db
        .collection::<Product>("products")
        .find_one(doc! { "_id": product_oid })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let new_item = CartItem {
        product_id: request.product_id.clone(),
        product_name: product.name.clone(),
        product_image: product.images.first().cloned().unwrap_or_default(),
        price: product.price,
        quantity: request.quantity,
        supplier_id: product.supplier_id.clone(),
    };

    mutate_cart(db, user_id, move |items| {
        merge_item(items, new_item.clone());
        Ok(())
    })
    .await
}

/// Replace a line item's quantity; 0 removes the item.
pub async fn update_item(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateCartItemRequest,
) -> Result<Cart, AppError> {
    if load_cart(db, user_id).await?.is_none() {
        return Err(AppError::NotFound("Cart not found".to_string()));
    }

    let product_id = request.product_id.clone();
    let quantity = request.quantity;
    mutate_cart(db, user_id, move |items| {
        if apply_quantity(items, &product_id, quantity) {
            Ok(())
        } else {
            Err(AppError::NotFound("Item not found in cart".to_string()))
        }
    })
    .await
}

/// Drop one product from the cart. Removing an absent product is a no-op,
/// matching the filter semantics of the delete route.
pub async fn remove_item(db: &MongoDB, user_id: &str, product_id: &str) -> Result<Cart, AppError> {
    if load_cart(db, user_id).await?.is_none() {
        return Err(AppError::NotFound("Cart not found".to_string()));
    }

    let product_id = product_id.to_string();
    mutate_cart(db, user_id, move |items| {
        items.retain(|item| item.product_id != product_id);
        Ok(())
    })
    .await
}

/// Reset the cart to `items: []`. The document survives (a cleared cart is
/// still a cart), and the revision still advances.
pub async fn clear_cart(db: &MongoDB, user_id: &str) -> Result<(), AppError> {
    db.collection::<Cart>(COLLECTION)
        .update_one(
            doc! { "user_id": user_id },
            doc! {
                "$set": { "items": [], "updated_at": BsonDateTime::now() },
                "$inc": { "revision": 1 },
            },
        )
        .upsert(true)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, price: f64, quantity: u32) -> CartItem {
        CartItem {
            product_id: product_id.into(),
            product_name: format!("Product {}", product_id),
            product_image: "https://img.example/p.jpg".into(),
            price,
            quantity,
            supplier_id: "s1".into(),
        }
    }

    #[test]
    fn test_totals_worked_example() {
        // [{price:10, qty:2},{price:5, qty:1}] => 25.00 / 2.50 / 10.00 / 37.50
        let items = vec![item("p1", 10.0, 2), item("p2", 5.0, 1)];
        let totals = compute_totals(&items);
        assert_eq!(totals.subtotal, 25.00);
        assert_eq!(totals.tax, 2.50);
        assert_eq!(totals.shipping_fee, 10.00);
        assert_eq!(totals.total, 37.50);
    }

    #[test]
    fn test_totals_identity_holds_at_two_decimals() {
        let items = vec![item("p1", 3.33, 3), item("p2", 0.07, 13)];
        let totals = compute_totals(&items);
        let expected = round2(totals.subtotal + totals.subtotal * TAX_RATE + totals.shipping_fee);
        assert!((totals.total - expected).abs() < 0.005);
    }

    #[test]
    fn test_totals_empty_cart_all_zero() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.shipping_fee, 0.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_merge_same_product_sums_quantities() {
        let mut items = Vec::new();
        merge_item(&mut items, item("p1", 10.0, 2));
        merge_item(&mut items, item("p1", 10.0, 3));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn test_merge_keeps_product_ids_unique() {
        let mut items = Vec::new();
        merge_item(&mut items, item("p1", 10.0, 1));
        merge_item(&mut items, item("p2", 4.0, 1));
        merge_item(&mut items, item("p1", 10.0, 1));
        let mut ids: Vec<&str> = items.iter().map(|i| i.product_id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), items.len());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_quantity_zero_removes_item() {
        let mut items = vec![item("p1", 10.0, 2), item("p2", 4.0, 1)];
        assert!(apply_quantity(&mut items, "p1", 0));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p2");

        // Emptying the cart leaves items = []
        assert!(apply_quantity(&mut items, "p2", 0));
        assert!(items.is_empty());
    }

    #[test]
    fn test_quantity_update_replaces_value() {
        let mut items = vec![item("p1", 10.0, 2)];
        assert!(apply_quantity(&mut items, "p1", 7));
        assert_eq!(items[0].quantity, 7);
    }

    #[test]
    fn test_quantity_unknown_product_reports_missing() {
        let mut items = vec![item("p1", 10.0, 2)];
        assert!(!apply_quantity(&mut items, "p9", 3));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_view_carries_totals() {
        let mut cart = Cart::empty("u1");
        cart.items = vec![item("p1", 10.0, 2), item("p2", 5.0, 1)];
        let view = view(&cart);
        assert_eq!(view.total, 37.50);
        assert_eq!(view.items.len(), 2);
    }
}
