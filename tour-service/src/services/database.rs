use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};

use super::store::{
    BookingFilter, Page, PackageCounter, PackageFilter, PackageSort, SortOrder, StoreError,
    TourStore,
};
use crate::models::{Booking, BookingStatus, PackageStatus, PaymentStatus, Role, TourPackage, User};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            backend(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for tour-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        self.users().create_index(email_index, None).await.map_err(|e| {
            tracing::error!("Failed to create email index on users collection: {}", e);
            backend(e)
        })?;
        tracing::info!("Created unique index on users.email");

        let listing_index = IndexModel::builder()
            .keys(doc! { "status": 1, "available": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("public_listing".to_string())
                    .build(),
            )
            .build();
        self.packages()
            .create_index(listing_index, None)
            .await
            .map_err(backend)?;

        let vendor_index = IndexModel::builder()
            .keys(doc! { "vendor_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("vendor_lookup".to_string())
                    .build(),
            )
            .build();
        self.packages()
            .create_index(vendor_index, None)
            .await
            .map_err(backend)?;
        tracing::info!("Created indexes on packages");

        for (name, key) in [
            ("user_lookup", "user_id"),
            ("vendor_lookup", "vendor_id"),
            ("package_lookup", "package_id"),
        ] {
            let index = IndexModel::builder()
                .keys(doc! { key: 1, "created_at": -1 })
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build();
            self.bookings()
                .create_index(index, None)
                .await
                .map_err(backend)?;
        }
        tracing::info!("Created indexes on bookings");

        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn packages(&self) -> Collection<TourPackage> {
        self.db.collection("packages")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.db.collection("bookings")
    }
}

fn backend(err: mongodb::error::Error) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err))
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY_CODE
    )
}

/// Escapes regex metacharacters so user input is matched literally.
fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn contains_ci(value: &str) -> Document {
    doc! { "$regex": escape_regex(value), "$options": "i" }
}

fn package_query(filter: &PackageFilter) -> Document {
    let mut query = Document::new();
    if let Some(vendor_id) = &filter.vendor_id {
        query.insert("vendor_id", vendor_id.as_str());
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(available) = filter.available {
        query.insert("available", available);
    }
    if let Some(featured) = filter.featured {
        query.insert("featured", featured);
    }
    if let Some(destination) = &filter.destination {
        query.insert("destination", contains_ci(destination));
    }
    if let Some(search) = &filter.search {
        query.insert(
            "$or",
            vec![
                doc! { "title": contains_ci(search) },
                doc! { "description": contains_ci(search) },
                doc! { "destination": contains_ci(search) },
            ],
        );
    }
    let mut price = Document::new();
    if let Some(min) = filter.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = filter.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        query.insert("price", price);
    }
    query
}

fn booking_query(filter: &BookingFilter) -> Document {
    let mut query = Document::new();
    if let Some(user_id) = &filter.user_id {
        query.insert("user_id", user_id.as_str());
    }
    if let Some(vendor_id) = &filter.vendor_id {
        query.insert("vendor_id", vendor_id.as_str());
    }
    if let Some(package_id) = &filter.package_id {
        query.insert("package_id", package_id.as_str());
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    query
}

fn role_query(role: Option<Role>) -> Document {
    match role {
        Some(role) => doc! { "role": role.as_str() },
        None => Document::new(),
    }
}

fn newest_first(page: Page) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": 1 })
        .skip(page.skip)
        .limit(page.limit)
        .build()
}

#[async_trait]
impl TourStore for MongoStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                backend(e)
            })?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users().insert_one(user, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::DuplicateKey("email".to_string())
            } else {
                backend(e)
            }
        })?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.users()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(backend)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.users()
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(backend)
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let vendor_profile = mongodb::bson::to_bson(&user.vendor_profile)
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?;
        let update = doc! {
            "$set": {
                "name": &user.name,
                "role": user.role.as_str(),
                "active": user.active,
                "vendor_profile": vendor_profile,
            }
        };
        let result = self
            .users()
            .update_one(doc! { "_id": &user.id }, update, None)
            .await
            .map_err(backend)?;
        Ok(result.matched_count == 1)
    }

    async fn record_login(&self, id: &str, at: mongodb::bson::DateTime) -> Result<(), StoreError> {
        self.users()
            .update_one(doc! { "_id": id }, doc! { "$set": { "last_login": at } }, None)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_users(&self, role: Option<Role>, page: Page) -> Result<Vec<User>, StoreError> {
        self.users()
            .find(role_query(role), newest_first(page))
            .await
            .map_err(backend)?
            .try_collect()
            .await
            .map_err(backend)
    }

    async fn count_users(&self, role: Option<Role>) -> Result<u64, StoreError> {
        self.users()
            .count_documents(role_query(role), None)
            .await
            .map_err(backend)
    }

    async fn insert_package(&self, package: &TourPackage) -> Result<(), StoreError> {
        self.packages()
            .insert_one(package, None)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_package(&self, id: &str) -> Result<Option<TourPackage>, StoreError> {
        self.packages()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(backend)
    }

    async fn update_package_if(
        &self,
        package: &TourPackage,
        expected: PackageStatus,
    ) -> Result<bool, StoreError> {
        let itinerary = mongodb::bson::to_bson(&package.itinerary)
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?;
        let update = doc! {
            "$set": {
                "title": &package.title,
                "description": &package.description,
                "destination": &package.destination,
                "duration": &package.duration,
                "price": package.price,
                "images": package.images.clone(),
                "included": package.included.clone(),
                "itinerary": itinerary,
                "available": package.available,
                "featured": package.featured,
                "status": package.status.as_str(),
                "updated_at": mongodb::bson::DateTime::from_chrono(package.updated_at),
                "expiry_date": package.expiry_date,
            }
        };
        let result = self
            .packages()
            .update_one(
                doc! { "_id": &package.id, "status": expected.as_str() },
                update,
                None,
            )
            .await
            .map_err(backend)?;
        Ok(result.matched_count == 1)
    }

    async fn delete_package(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .packages()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(backend)?;
        Ok(result.deleted_count == 1)
    }

    async fn increment_package_counter(
        &self,
        id: &str,
        counter: PackageCounter,
        by: i64,
    ) -> Result<(), StoreError> {
        let field = match counter {
            PackageCounter::Views => "views",
            PackageCounter::Bookings => "bookings_count",
        };
        self.packages()
            .update_one(doc! { "_id": id }, doc! { "$inc": { field: by } }, None)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_packages(
        &self,
        filter: &PackageFilter,
        sort: PackageSort,
        page: Page,
    ) -> Result<Vec<TourPackage>, StoreError> {
        let direction = match sort.order {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        let options = FindOptions::builder()
            .sort(doc! { sort.field.column(): direction, "_id": 1 })
            .skip(page.skip)
            .limit(page.limit)
            .build();

        self.packages()
            .find(package_query(filter), options)
            .await
            .map_err(backend)?
            .try_collect()
            .await
            .map_err(backend)
    }

    async fn count_packages(&self, filter: &PackageFilter) -> Result<u64, StoreError> {
        self.packages()
            .count_documents(package_query(filter), None)
            .await
            .map_err(backend)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        self.bookings()
            .insert_one(booking, None)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        self.bookings()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(backend)
    }

    async fn update_booking_if(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
        expected_payment: PaymentStatus,
    ) -> Result<bool, StoreError> {
        let result = self
            .bookings()
            .replace_one(
                doc! {
                    "_id": &booking.id,
                    "status": expected_status.as_str(),
                    "payment_status": expected_payment.as_str(),
                },
                booking,
                None,
            )
            .await
            .map_err(backend)?;
        Ok(result.matched_count == 1)
    }

    async fn find_bookings(
        &self,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        self.bookings()
            .find(booking_query(filter), newest_first(page))
            .await
            .map_err(backend)?
            .try_collect()
            .await
            .map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_metacharacters_are_escaped() {
        assert_eq!(escape_regex("a.b*(c)"), "a\\.b\\*\\(c\\)");
        assert_eq!(escape_regex("Goa"), "Goa");
    }

    #[test]
    fn public_listing_query_combines_filters() {
        let filter = PackageFilter {
            status: Some(PackageStatus::Approved),
            available: Some(true),
            min_price: Some(100.0),
            search: Some("beach".to_string()),
            ..Default::default()
        };

        let query = package_query(&filter);

        assert_eq!(query.get_str("status").unwrap(), "approved");
        assert!(query.get_bool("available").unwrap());
        assert_eq!(query.get_document("price").unwrap().get_f64("$gte").unwrap(), 100.0);
        assert_eq!(query.get_array("$or").unwrap().len(), 3);
    }
}
