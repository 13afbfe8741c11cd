use crate::database::MongoDB;
use crate::models::{BulkPricing, Product};
use mongodb::bson::{doc, DateTime as BsonDateTime};

/// Seed a starter catalog so a fresh database has something to browse.
/// Only runs when the products collection is empty.
pub async fn seed_sample_products(db: &MongoDB) {
    let collection = db.collection::<Product>("products");

    let count = collection.count_documents(doc! {}).await.unwrap_or(0);

    if count > 0 {
        log::info!("🌱 Product catalog: {} products already in DB — skipping seed", count);
        return;
    }

    log::info!("🌱 Product catalog empty — seeding sample products...");

    let products = build_sample_products();

    match collection.insert_many(&products).await {
        Ok(result) => {
            log::info!("   ✅ Inserted {} sample products", result.inserted_ids.len());
        }
        Err(e) => {
            log::error!("   ❌ Failed to seed sample products: {}", e);
        }
    }
}

fn build_sample_products() -> Vec<Product> {
    let now = BsonDateTime::now();
    let product = |name: &str,
                   category: &str,
                   price: f64,
                   bulk_pricing: Vec<BulkPricing>,
                   description: &str,
                   image: &str,
                   supplier_id: &str,
                   supplier_name: &str,
                   rating: f64,
                   review_count: i32,
                   stock: i32,
                   unit: &str,
                   is_organic: bool,
                   tags: &[&str]| Product {
        id: None,
        name: name.into(),
        category: category.into(),
        price,
        bulk_pricing,
        description: description.into(),
        images: vec![image.into()],
        supplier_id: supplier_id.into(),
        supplier_name: Some(supplier_name.into()),
        rating,
        review_count,
        stock,
        unit: unit.into(),
        is_organic,
        tags: tags.iter().map(|t| (*t).into()).collect(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    vec![
        product(
            "Premium Organic Seeds Collection",
            "seeds",
            49.99,
            vec![],
            "High-quality organic seeds for various vegetables including tomatoes, peppers, and lettuce. Perfect for home gardens and small farms.",
            "https://images.unsplash.com/photo-1610832958506-aa56368176cf?w=800&q=80",
            "sample-supplier-1",
            "Organic Seeds Co",
            4.8,
            24,
            150,
            "pack",
            true,
            &["organic", "vegetables", "seeds"],
        ),
        product(
            "Bio-Organic Fertilizer 50kg",
            "fertilizers",
            89.99,
            vec![
                BulkPricing { min_quantity: 5, price: 84.99 },
                BulkPricing { min_quantity: 10, price: 79.99 },
            ],
            "Premium organic fertilizer made from natural ingredients. Enriches soil and promotes healthy plant growth.",
            "https://images.unsplash.com/photo-1628352081506-83c43123ed6d?w=800&q=80",
            "sample-supplier-2",
            "Natural Fertilizers",
            4.7,
            18,
            200,
            "bag",
            true,
            &["organic", "fertilizer", "soil"],
        ),
        product(
            "Smart Irrigation System",
            "equipment",
            499.99,
            vec![],
            "Automated irrigation system with smart sensors and mobile app control. Save water and optimize crop growth.",
            "https://images.unsplash.com/photo-1563514227147-6d2ff665a6a0?w=800&q=80",
            "sample-supplier-3",
            "Farm Equipment Pro",
            4.9,
            12,
            45,
            "unit",
            false,
            &["equipment", "irrigation", "smart"],
        ),
        product(
            "Fresh Organic Vegetables Box",
            "produce",
            29.99,
            vec![],
            "Weekly box of fresh organic vegetables directly from local farms. Includes seasonal varieties.",
            "https://images.unsplash.com/photo-1595855709915-bd989963c635?w=800&q=80",
            "sample-supplier-1",
            "Green Valley Farms",
            4.6,
            45,
            100,
            "box",
            true,
            &["organic", "vegetables", "fresh"],
        ),
    ]
}
