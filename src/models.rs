use std::fmt;

use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed set of product categories. The code is what gets stored and what
/// appears in URLs; the label is for display only.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Electronics,
    Clothing,
    Food,
    Books,
    Tools,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Clothing,
        Category::Food,
        Category::Books,
        Category::Tools,
        Category::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Category::Electronics => "ELECTRONICS",
            Category::Clothing => "CLOTHING",
            Category::Food => "FOOD",
            Category::Books => "BOOKS",
            Category::Tools => "TOOLS",
            Category::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Food => "Food",
            Category::Books => "Books",
            Category::Tools => "Tools",
            Category::Other => "Other",
        }
    }

    pub fn from_code(code: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Every category as a `(code, label)` pair, in declaration order.
    pub fn choices() -> Vec<CategoryChoice> {
        Category::ALL.into_iter().map(CategoryChoice::from).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CategoryChoice {
    pub code: &'static str,
    pub label: &'static str,
}

impl From<Category> for CategoryChoice {
    fn from(category: Category) -> Self {
        CategoryChoice {
            code: category.code(),
            label: category.label(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category: Category,
    pub quantity: u32,
    pub price: Decimal,
}

impl Product {
    pub fn new(fields: ProductFields) -> Self {
        Product {
            id: ObjectId::new(),
            name: fields.name,
            description: fields.description,
            image: fields.image,
            category: fields.category,
            quantity: fields.quantity,
            price: fields.price,
        }
    }

    /// Overwrites every mutable field from the validated input.
    pub fn replace_fields(&mut self, fields: ProductFields) {
        let ProductFields {
            name,
            description,
            image,
            category,
            quantity,
            price,
        } = fields;
        self.name = name;
        self.description = description;
        self.image = image;
        self.category = category;
        self.quantity = quantity;
        self.price = price;
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    pub fn detail_url(&self) -> String {
        format!("/products/{}", self.id.to_hex())
    }

    pub fn view(&self) -> ProductView {
        ProductView {
            id: self.id.to_hex(),
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            category: self.category.into(),
            quantity: self.quantity,
            price: self.price.to_string(),
            in_stock: self.in_stock(),
        }
    }
}

/// Validated product input, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category: Category,
    pub quantity: u32,
    pub price: Decimal,
}

/// Template-facing shape of a product.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category: CategoryChoice,
    pub quantity: u32,
    pub price: String,
    pub in_stock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn widget() -> ProductFields {
        ProductFields {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            image: None,
            category: Category::Tools,
            quantity: 5,
            price: Decimal::from_str("9.99").unwrap(),
        }
    }

    #[test]
    fn codes_round_trip_and_labels_differ() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
            assert_ne!(category.code(), category.label());
        }
        assert_eq!(Category::from_code("tools"), None);
        assert_eq!(Category::from_code("UNKNOWN_CODE"), None);
    }

    #[test]
    fn choices_keep_declaration_order() {
        let codes: Vec<&str> = Category::choices().iter().map(|c| c.code).collect();
        assert_eq!(codes, ["ELECTRONICS", "CLOTHING", "FOOD", "BOOKS", "TOOLS", "OTHER"]);
    }

    #[test]
    fn category_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Category::Tools).unwrap(), "\"TOOLS\"");
        let parsed: Category = serde_json::from_str("\"ELECTRONICS\"").unwrap();
        assert_eq!(parsed, Category::Electronics);
        assert_eq!(Category::Food.to_string(), "FOOD");
    }

    #[test]
    fn replace_fields_overwrites_everything() {
        let mut product = Product::new(ProductFields {
            image: Some("media/widget.png".to_string()),
            ..widget()
        });
        let id = product.id;

        product.replace_fields(ProductFields {
            name: "Gadget".to_string(),
            description: "Different".to_string(),
            image: None,
            category: Category::Other,
            quantity: 0,
            price: Decimal::ZERO,
        });

        assert_eq!(product.id, id);
        assert_eq!(product.name, "Gadget");
        assert_eq!(product.image, None);
        assert_eq!(product.category, Category::Other);
        assert!(!product.in_stock());
    }

    #[test]
    fn view_exposes_hex_id_and_price_text() {
        let product = Product::new(widget());
        let view = product.view();
        assert_eq!(view.id, product.id.to_hex());
        assert_eq!(view.price, "9.99");
        assert_eq!(view.category.label, "Tools");
        assert_eq!(product.detail_url(), format!("/products/{}", view.id));
    }
}
