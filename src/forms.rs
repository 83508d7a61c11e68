//! Request-scoped form input.
//!
//! Raw fields arrive as text exactly as submitted. Validation turns a
//! [`ProductForm`] into [`ProductFields`] or a [`FieldErrors`] report listing
//! every problem at once; nothing is persisted from an invalid form.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{Category, Product, ProductFields};

const REQUIRED: &str = "This field is required.";
const PRICE_DECIMAL_PLACES: u32 = 2;
const PRICE_WHOLE_DIGITS: u32 = 8;

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn absorb(&mut self, report: &ValidationErrors) {
        for (field, errors) in report.field_errors() {
            for error in errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                self.add(field, message);
            }
        }
    }
}

/// A form bound to submitted (or initial) values plus any errors, as handed
/// to templates.
#[derive(Debug, Serialize)]
pub struct FormState<F> {
    pub values: F,
    pub errors: FieldErrors,
}

impl<F: Default> FormState<F> {
    pub fn empty() -> Self {
        FormState {
            values: F::default(),
            errors: FieldErrors::default(),
        }
    }
}

fn validate_category_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() || Category::from_code(code).is_some() {
        return Ok(());
    }
    let mut error = ValidationError::new("invalid_choice");
    error.message = Some(Cow::from(format!(
        "Select a valid choice. {} is not one of the available choices.",
        code
    )));
    Err(error)
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProductForm {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub name: String,
    #[validate(length(max = 2000, message = "Ensure this value has at most 2000 characters."))]
    pub description: String,
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub image: String,
    #[validate(custom = "validate_category_code")]
    pub category: String,
    pub quantity: String,
    pub price: String,
}

impl ProductForm {
    /// Decodes an urlencoded body. Anything that does not decode is treated
    /// as an empty submission, which then fails validation field by field.
    pub fn from_urlencoded(body: &[u8]) -> ProductForm {
        serde_urlencoded::from_bytes(body).unwrap_or_else(|e| {
            debug!("Undecodable product form body: {}", e);
            ProductForm::default()
        })
    }

    fn trimmed(&self) -> ProductForm {
        ProductForm {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            category: self.category.trim().to_string(),
            quantity: self.quantity.trim().to_string(),
            price: self.price.trim().to_string(),
        }
    }

    /// Checks every field and produces the typed field set, or all errors found.
    pub fn validate(&self) -> Result<ProductFields, FieldErrors> {
        let form = self.trimmed();
        let mut errors = FieldErrors::default();

        if let Err(report) = <Self as Validate>::validate(&form) {
            errors.absorb(&report);
        }

        if form.name.is_empty() {
            errors.add("name", REQUIRED);
        }
        if form.description.is_empty() {
            errors.add("description", REQUIRED);
        }

        let category = if form.category.is_empty() {
            errors.add("category", REQUIRED);
            None
        } else {
            Category::from_code(&form.category)
        };

        let quantity = parse_quantity(&form.quantity).map_err(|m| errors.add("quantity", m)).ok();
        let price = parse_price(&form.price).map_err(|m| errors.add("price", m)).ok();

        match (category, quantity, price) {
            (Some(category), Some(quantity), Some(price)) if errors.is_empty() => Ok(ProductFields {
                name: form.name,
                description: form.description,
                image: (!form.image.is_empty()).then_some(form.image),
                category,
                quantity,
                price,
            }),
            _ => Err(errors),
        }
    }

    pub fn with_errors(self, errors: FieldErrors) -> FormState<ProductForm> {
        FormState { values: self, errors }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        ProductForm {
            name: product.name.clone(),
            description: product.description.clone(),
            image: product.image.clone().unwrap_or_default(),
            category: product.category.code().to_string(),
            quantity: product.quantity.to_string(),
            price: product.price.to_string(),
        }
    }
}

fn parse_quantity(raw: &str) -> Result<u32, String> {
    if raw.is_empty() {
        return Err(REQUIRED.to_string());
    }
    let value: i64 = raw.parse().map_err(|_| "Enter a whole number.".to_string())?;
    if value < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    u32::try_from(value).map_err(|_| format!("Ensure this value is less than or equal to {}.", u32::MAX))
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    if raw.is_empty() {
        return Err(REQUIRED.to_string());
    }
    let value = Decimal::from_str(raw).map_err(|_| "Enter a number.".to_string())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    if value.scale() > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            PRICE_DECIMAL_PLACES
        ));
    }
    if value.trunc() >= Decimal::from(10u64.pow(PRICE_WHOLE_DIGITS)) {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            PRICE_WHOLE_DIGITS
        ));
    }
    Ok(value)
}

/// The index page's search box.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchForm {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub name: String,
}

impl SearchForm {
    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if let Err(report) = Validate::validate(self) {
            errors.absorb(&report);
        }
        errors
    }

    /// The name filter to apply, if the form is valid and not blank.
    pub fn query(&self) -> Option<&str> {
        if !self.errors().is_empty() {
            return None;
        }
        let needle = self.name.trim();
        (!needle.is_empty()).then_some(needle)
    }

    pub fn into_state(self) -> FormState<SearchForm> {
        let errors = self.errors();
        FormState { values: self, errors }
    }
}
