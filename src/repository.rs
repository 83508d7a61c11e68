use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::{CountOptions, FindOptions},
    Collection, Database,
};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::models::{Product, ProductFields};

const COLLECTION: &str = "products";

/// Restricts which products a listing returns. Every listing is ordered by
/// name ascending, ties by insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Raw category code; codes outside the enumeration simply match nothing.
    pub category: Option<String>,
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Only products with a quantity above zero.
    pub in_stock: bool,
}

impl ProductFilter {
    pub fn in_stock() -> Self {
        ProductFilter {
            in_stock: true,
            ..Default::default()
        }
    }

    pub fn category(mut self, code: impl Into<String>) -> Self {
        self.category = Some(code.into());
        self
    }

    pub fn name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.in_stock && !product.in_stock() {
            return false;
        }
        if let Some(code) = &self.category {
            if product.category.code() != code {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !product.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    fn to_document(&self) -> Document {
        let mut filter = doc! {};
        if self.in_stock {
            filter.insert("quantity", doc! { "$gt": 0 });
        }
        if let Some(code) = &self.category {
            filter.insert("category", code.as_str());
        }
        if let Some(needle) = &self.name_contains {
            filter.insert("name", doc! { "$regex": regex::escape(needle), "$options": "i" });
        }
        filter
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, fields: ProductFields) -> Result<Product>;

    async fn get(&self, id: ObjectId) -> Result<Option<Product>>;

    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>>;

    async fn exists(&self, filter: ProductFilter) -> Result<bool>;

    /// Overwrites every field of the stored product. `None` if it no longer exists.
    async fn replace(&self, id: ObjectId, fields: ProductFields) -> Result<Option<Product>>;

    /// Returns whether a product was actually removed.
    async fn delete(&self, id: ObjectId) -> Result<bool>;
}

pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(database: &Database) -> Self {
        MongoProductRepository {
            collection: database.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    async fn create(&self, fields: ProductFields) -> Result<Product> {
        let product = Product::new(fields);

        debug!("Creating new product: {:?}", product);

        self.collection.insert_one(&product, None).await.map_err(|e| {
            error!("Failed to create product: {}", e);
            e
        })?;

        info!("Product created successfully with ID: {}", product.id);
        Ok(product)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Product>> {
        debug!("Fetching product with ID: {}", id);

        let product = self.collection.find_one(doc! { "_id": id }, None).await.map_err(|e| {
            error!("Failed to fetch product {}: {}", id, e);
            e
        })?;
        Ok(product)
    }

    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        debug!("Fetching products matching {:?}", filter);

        let options = FindOptions::builder().sort(doc! { "name": 1, "_id": 1 }).build();
        let cursor = self
            .collection
            .find(filter.to_document(), options)
            .await
            .map_err(|e| {
                error!("Failed to fetch products: {}", e);
                e
            })?;

        let products: Vec<Product> = cursor.try_collect().await.map_err(|e| {
            error!("Error while iterating products: {}", e);
            e
        })?;

        debug!("Retrieved {} products", products.len());
        Ok(products)
    }

    async fn exists(&self, filter: ProductFilter) -> Result<bool> {
        let options = CountOptions::builder().limit(1).build();
        let count = self
            .collection
            .count_documents(filter.to_document(), options)
            .await
            .map_err(|e| {
                error!("Failed to count products: {}", e);
                e
            })?;
        Ok(count > 0)
    }

    async fn replace(&self, id: ObjectId, fields: ProductFields) -> Result<Option<Product>> {
        let mut product = Product::new(fields);
        product.id = id;

        debug!("Replacing product {}: {:?}", id, product);

        let result = self
            .collection
            .replace_one(doc! { "_id": id }, &product, None)
            .await
            .map_err(|e| {
                error!("Failed to update product {}: {}", id, e);
                e
            })?;

        if result.matched_count == 0 {
            debug!("Product not found for update: {}", id);
            Ok(None)
        } else {
            info!("Product updated successfully: {}", id);
            Ok(Some(product))
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        debug!("Deleting product: {}", id);

        let result = self.collection.delete_one(doc! { "_id": id }, None).await.map_err(|e| {
            error!("Failed to delete product {}: {}", id, e);
            e
        })?;

        if result.deleted_count == 0 {
            debug!("Product not found for deletion: {}", id);
            Ok(false)
        } else {
            info!("Product deleted successfully: {}", id);
            Ok(true)
        }
    }
}

/// Process-local store, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, fields: ProductFields) -> Result<Product> {
        let product = Product::new(fields);
        self.products.write().await.push(product.clone());
        info!("Product created successfully with ID: {}", product.id);
        Ok(product)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut result: Vec<Product> = products.iter().filter(|p| filter.matches(p)).cloned().collect();
        // stable: equal names keep insertion order
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn exists(&self, filter: ProductFilter) -> Result<bool> {
        let products = self.products.read().await;
        Ok(products.iter().any(|p| filter.matches(p)))
    }

    async fn replace(&self, id: ObjectId, fields: ProductFields) -> Result<Option<Product>> {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                product.replace_fields(fields);
                info!("Product updated successfully: {}", id);
                Ok(Some(product.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        let deleted = products.len() < before;
        if deleted {
            info!("Product deleted successfully: {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use rust_decimal::Decimal;

    fn fields(name: &str, category: Category, quantity: u32) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            description: format!("{name} description"),
            image: None,
            category,
            quantity,
            price: Decimal::new(999, 2),
        }
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn list_orders_by_name_then_insertion() {
        let repo = InMemoryProductRepository::new();
        let first = repo.create(fields("Widget", Category::Tools, 1)).await.unwrap();
        repo.create(fields("Anvil", Category::Tools, 1)).await.unwrap();
        let second = repo.create(fields("Widget", Category::Other, 1)).await.unwrap();

        let all = repo.list(ProductFilter::default()).await.unwrap();
        assert_eq!(names(&all), ["Anvil", "Widget", "Widget"]);
        assert_eq!(all[1].id, first.id);
        assert_eq!(all[2].id, second.id);
    }

    #[tokio::test]
    async fn filters_combine() {
        let repo = InMemoryProductRepository::new();
        repo.create(fields("Hammer", Category::Tools, 3)).await.unwrap();
        repo.create(fields("Claw hammer", Category::Tools, 0)).await.unwrap();
        repo.create(fields("HAMMER pants", Category::Clothing, 2)).await.unwrap();

        let found = repo
            .list(ProductFilter::in_stock().name_contains("hammer"))
            .await
            .unwrap();
        assert_eq!(names(&found), ["HAMMER pants", "Hammer"]);

        let tools = repo.list(ProductFilter::default().category("TOOLS")).await.unwrap();
        assert_eq!(names(&tools), ["Claw hammer", "Hammer"]);

        assert!(repo.exists(ProductFilter::in_stock().category("CLOTHING")).await.unwrap());
        assert!(!repo.exists(ProductFilter::in_stock().category("FOOD")).await.unwrap());
        assert!(repo
            .list(ProductFilter::default().category("UNKNOWN_CODE"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn replace_and_delete_report_missing_products() {
        let repo = InMemoryProductRepository::new();
        let product = repo.create(fields("Widget", Category::Tools, 5)).await.unwrap();

        let updated = repo
            .replace(product.id, fields("Gadget", Category::Other, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, product.id);
        assert_eq!(repo.get(product.id).await.unwrap(), Some(updated));

        assert!(repo.delete(product.id).await.unwrap());
        assert!(!repo.delete(product.id).await.unwrap());
        assert_eq!(repo.get(product.id).await.unwrap(), None);
        assert_eq!(
            repo.replace(product.id, fields("Gone", Category::Other, 1)).await.unwrap(),
            None
        );
    }

    #[test]
    fn mongo_filter_document_escapes_search() {
        let filter = ProductFilter::in_stock().category("TOOLS").name_contains("a.b");
        assert_eq!(
            filter.to_document(),
            doc! {
                "quantity": { "$gt": 0 },
                "category": "TOOLS",
                "name": { "$regex": "a\\.b", "$options": "i" },
            }
        );
        assert_eq!(ProductFilter::default().to_document(), doc! {});
    }
}
