use crate::{
    database::MongoDB,
    models::{CreateProductRequest, Product, ProductFilter},
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime};

const COLLECTION: &str = "products";

/// Translate the equality filters into the database query. Price range and
/// text search are post-filters (see `post_filter`), matching the split the
/// catalog has always had.
fn build_query(filter: &ProductFilter) -> mongodb::bson::Document {
    let mut query = doc! {};
    if let Some(ref category) = filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(is_organic) = filter.is_organic {
        query.insert("is_organic", is_organic);
    }
    if let Some(ref supplier_id) = filter.supplier_id {
        query.insert("supplier_id", supplier_id.as_str());
    }
    query
}

fn build_sort(filter: &ProductFilter) -> Option<mongodb::bson::Document> {
    match filter.sort_by.as_deref() {
        Some("price_asc") => Some(doc! { "price": 1 }),
        Some("price_desc") => Some(doc! { "price": -1 }),
        Some("rating") => Some(doc! { "rating": -1 }),
        Some("newest") => Some(doc! { "created_at": -1 }),
        _ => None,
    }
}

/// Price-range and case-insensitive name/description search, applied in
/// order-preserving passes over the query result.
pub fn post_filter(products: Vec<Product>, filter: &ProductFilter) -> Vec<Product> {
    let mut filtered = products;
    if let Some(min_price) = filter.min_price {
        filtered.retain(|p| p.price >= min_price);
    }
    if let Some(max_price) = filter.max_price {
        filtered.retain(|p| p.price <= max_price);
    }
    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        filtered.retain(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        });
    }
    filtered
}

/// Apply pagination after post-filtering so page boundaries line up with
/// what the caller actually sees.
pub fn paginate(products: Vec<Product>, filter: &ProductFilter) -> Vec<Product> {
    let offset = filter.offset.unwrap_or(0).max(0) as usize;
    let limit = filter.limit.unwrap_or(20).clamp(1, 100) as usize;
    products.into_iter().skip(offset).take(limit).collect()
}

pub async fn list_products(db: &MongoDB, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
    let collection = db.collection::<Product>(COLLECTION);

    let mut find = collection.find(build_query(filter));
    if let Some(sort) = build_sort(filter) {
        find = find.sort(sort);
    }

    let mut cursor = find
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let mut products = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(product) => products.push(product),
            Err(e) => log::error!("❌ Skipping unreadable product document: {}", e),
        }
    }

    Ok(paginate(post_filter(products, filter), filter))
}

pub async fn get_product(db: &MongoDB, product_id: &str) -> Result<Product, AppError> {
    let object_id = ObjectId::parse_str(product_id)
        .map_err(|_| AppError::InvalidRequest("Invalid product ID".to_string()))?;

    db.collection::<Product>(COLLECTION)
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Create a catalog entry for the calling supplier. Rating starts at zero;
/// the product page aggregates review ratings at read time.
pub async fn create_product(
    db: &MongoDB,
    supplier_id: &str,
    supplier_name: &str,
    request: &CreateProductRequest,
) -> Result<Product, AppError> {
    let now = BsonDateTime::now();
    let mut product = Product {
        id: None,
        name: request.name.clone(),
        category: request.category.clone(),
        price: request.price,
        bulk_pricing: request.bulk_pricing.clone(),
        description: request.description.clone(),
        images: request.images.clone(),
        supplier_id: supplier_id.to_string(),
        supplier_name: Some(supplier_name.to_string()),
        rating: 0.0,
        review_count: 0,
        stock: request.stock,
        unit: request.unit.clone(),
        is_organic: request.is_organic,
        tags: request.tags.clone(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let inserted = db
        .collection::<Product>(COLLECTION)
        .insert_one(&product)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create product: {}", e)))?;

    if let Bson::ObjectId(oid) = inserted.inserted_id {
        product.id = Some(oid);
    }

    log::info!("🌱 Product created by supplier {}: {}", supplier_id, product.name);
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, category: &str, price: f64) -> Product {
        Product {
            id: None,
            name: name.into(),
            category: category.into(),
            price,
            bulk_pricing: vec![],
            description: format!("{} from a local supplier", name),
            images: vec!["https://img.example/p.jpg".into()],
            supplier_id: "s1".into(),
            supplier_name: None,
            rating: 4.0,
            review_count: 3,
            stock: 10,
            unit: "unit".into(),
            is_organic: false,
            tags: vec![],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_post_filter_price_range() {
        let products = vec![
            product("Seeds A", "seeds", 5.0),
            product("Seeds B", "seeds", 15.0),
            product("Seeds C", "seeds", 25.0),
        ];
        let filter = ProductFilter {
            min_price: Some(10.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        let result = post_filter(products, &filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Seeds B");
    }

    #[test]
    fn test_post_filter_search_matches_name_and_description() {
        let mut tool = product("Steel Hoe", "equipment", 30.0);
        tool.description = "Long-handled weeding tool".into();
        let products = vec![product("Tomato Seeds", "seeds", 5.0), tool];

        let by_name = post_filter(
            products.clone(),
            &ProductFilter { search: Some("tomato".into()), ..Default::default() },
        );
        assert_eq!(by_name.len(), 1);

        let by_description = post_filter(
            products,
            &ProductFilter { search: Some("WEEDING".into()), ..Default::default() },
        );
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].name, "Steel Hoe");
    }

    #[test]
    fn test_post_filter_preserves_sorted_order() {
        // Sorted price_asc by the query; post-filters must not reorder
        let products = vec![
            product("A", "seeds", 1.0),
            product("B", "seeds", 2.0),
            product("C", "seeds", 3.0),
            product("D", "seeds", 4.0),
        ];
        let filter = ProductFilter { min_price: Some(2.0), ..Default::default() };
        let result = post_filter(products, &filter);
        let prices: Vec<f64> = result.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![2.0, 3.0, 4.0]);
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_paginate_defaults_and_bounds() {
        let products: Vec<Product> =
            (0..30).map(|i| product(&format!("P{}", i), "seeds", i as f64)).collect();

        let default_page = paginate(products.clone(), &ProductFilter::default());
        assert_eq!(default_page.len(), 20);

        let second_page = paginate(
            products,
            &ProductFilter { limit: Some(10), offset: Some(25), ..Default::default() },
        );
        assert_eq!(second_page.len(), 5);
        assert_eq!(second_page[0].name, "P25");
    }

    #[test]
    fn test_build_query_only_includes_set_filters() {
        let filter = ProductFilter {
            category: Some("seeds".into()),
            is_organic: Some(true),
            ..Default::default()
        };
        let query = build_query(&filter);
        assert_eq!(query.get_str("category").unwrap(), "seeds");
        assert!(query.get_bool("is_organic").unwrap());
        assert!(!query.contains_key("supplier_id"));
    }

    #[test]
    fn test_build_sort_variants() {
        let sort = |name: &str| {
            build_sort(&ProductFilter { sort_by: Some(name.into()), ..Default::default() })
        };
        assert_eq!(sort("price_asc").unwrap().get_i32("price").unwrap(), 1);
        assert_eq!(sort("price_desc").unwrap().get_i32("price").unwrap(), -1);
        assert_eq!(sort("rating").unwrap().get_i32("rating").unwrap(), -1);
        assert_eq!(sort("newest").unwrap().get_i32("created_at").unwrap(), -1);
        assert!(build_sort(&ProductFilter::default()).is_none());
    }
}
