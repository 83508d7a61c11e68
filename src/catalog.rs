use tracing::debug;

use crate::error::Result;
use crate::models::{Category, CategoryChoice, Product};
use crate::repository::{ProductFilter, ProductRepository};

/// Categories that currently have at least one in-stock product, in
/// enumeration order. Independent of any search in progress.
pub async fn categories_with_products(repo: &dyn ProductRepository) -> Result<Vec<CategoryChoice>> {
    let mut categories = Vec::new();
    for category in Category::ALL {
        if repo.exists(ProductFilter::in_stock().category(category.code())).await? {
            categories.push(CategoryChoice::from(category));
        }
    }
    Ok(categories)
}

/// In-stock products, narrowed to names containing `query` when one is given.
pub async fn in_stock_products(repo: &dyn ProductRepository, query: Option<&str>) -> Result<Vec<Product>> {
    let filter = match query {
        Some(needle) => ProductFilter::in_stock().name_contains(needle),
        None => ProductFilter::in_stock(),
    };
    let products = repo.list(filter).await?;
    debug!(query = ?query, count = products.len(), "Listed in-stock products");
    Ok(products)
}

/// Every product filed under `code`, regardless of stock. Unknown codes give
/// an empty list.
pub async fn products_in_category(repo: &dyn ProductRepository, code: &str) -> Result<Vec<Product>> {
    repo.list(ProductFilter::default().category(code)).await
}
