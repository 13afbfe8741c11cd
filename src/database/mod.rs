use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool tuning
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("agrimarket");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes every query path relies on. The unique ones double
    /// as invariants: one account per email, one cart and one pending OTP per
    /// user, single-use reset tokens.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = IndexOptions::builder().unique(true).build();

        let users = self.database().collection::<mongodb::bson::Document>("users");
        let users_email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique.clone())
            .build();
        match users.create_index(users_email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let carts = self.database().collection::<mongodb::bson::Document>("carts");
        let carts_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(unique.clone())
            .build();
        match carts.create_index(carts_user_index).await {
            Ok(_) => log::info!("   ✅ Index created: carts(user_id) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let products = self.database().collection::<mongodb::bson::Document>("products");
        let products_category_index = IndexModel::builder()
            .keys(doc! { "category": 1 })
            .build();
        match products.create_index(products_category_index).await {
            Ok(_) => log::info!("   ✅ Index created: products(category)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let products_supplier_index = IndexModel::builder()
            .keys(doc! { "supplier_id": 1 })
            .build();
        match products.create_index(products_supplier_index).await {
            Ok(_) => log::info!("   ✅ Index created: products(supplier_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let orders = self.database().collection::<mongodb::bson::Document>("orders");
        let orders_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();
        match orders.create_index(orders_user_index).await {
            Ok(_) => log::info!("   ✅ Index created: orders(user_id, created_at)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let reviews = self.database().collection::<mongodb::bson::Document>("reviews");
        let reviews_product_index = IndexModel::builder()
            .keys(doc! { "product_id": 1, "created_at": -1 })
            .build();
        match reviews.create_index(reviews_product_index).await {
            Ok(_) => log::info!("   ✅ Index created: reviews(product_id, created_at)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let otp_codes = self.database().collection::<mongodb::bson::Document>("otp_codes");
        let otp_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(unique.clone())
            .build();
        match otp_codes.create_index(otp_user_index).await {
            Ok(_) => log::info!("   ✅ Index created: otp_codes(user_id) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let resets = self.database().collection::<mongodb::bson::Document>("password_resets");
        let resets_token_index = IndexModel::builder()
            .keys(doc! { "token": 1 })
            .options(unique)
            .build();
        match resets.create_index(resets_token_index).await {
            Ok(_) => log::info!("   ✅ Index created: password_resets(token) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
