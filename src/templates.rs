//! Server-rendered pages.
//!
//! All templates are compiled into the binary and registered once at start-up.
//! Handlers pass a serialisable context and get HTML back; every interpolated
//! value is HTML-escaped by handlebars.

use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, Result};

pub const INDEX: &str = "index";
pub const PRODUCTS_BY_CATEGORY: &str = "products_by_category";
pub const PRODUCT_CREATE: &str = "product_create";
pub const PRODUCT_DETAIL: &str = "product_detail";
pub const PRODUCT_UPDATE: &str = "product_update";
pub const PRODUCT_DELETE: &str = "product_delete";

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        for (name, source) in PARTIALS {
            handlebars
                .register_partial(name, *source)
                .map_err(|e| AppError::Template(format!("Failed to register partial {}: {}", name, e)))?;
        }
        for (name, source) in PAGES {
            handlebars
                .register_template_string(name, *source)
                .map_err(|e| AppError::Template(format!("Failed to register {}: {}", name, e)))?;
        }

        Ok(Self { handlebars })
    }

    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(template = template_name, "Rendering page");
        self.handlebars
            .render(template_name, context)
            .map_err(|e| AppError::Template(e.to_string()))
    }
}

const PARTIALS: &[(&str, &str)] = &[
    ("header", HEADER),
    ("footer", FOOTER),
    ("product_fields", PRODUCT_FIELDS),
];

const PAGES: &[(&str, &str)] = &[
    (INDEX, INDEX_TEMPLATE),
    (PRODUCTS_BY_CATEGORY, PRODUCTS_BY_CATEGORY_TEMPLATE),
    (PRODUCT_CREATE, PRODUCT_CREATE_TEMPLATE),
    (PRODUCT_DETAIL, PRODUCT_DETAIL_TEMPLATE),
    (PRODUCT_UPDATE, PRODUCT_UPDATE_TEMPLATE),
    (PRODUCT_DELETE, PRODUCT_DELETE_TEMPLATE),
];

const HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{title}} | Market</title>
</head>
<body>
<header>
  <a href="/">Market</a>
  <a href="/products/add">Add product</a>
</header>
<main>
"#;

const FOOTER: &str = r#"</main>
</body>
</html>
"#;

const PRODUCT_FIELDS: &str = r#"<p>
  <label for="id_name">Name</label>
  <input type="text" name="name" id="id_name" maxlength="100" value="{{form.values.name}}">
  {{#each form.errors.name}}<span class="error">{{this}}</span>{{/each}}
</p>
<p>
  <label for="id_description">Description</label>
  <textarea name="description" id="id_description">{{form.values.description}}</textarea>
  {{#each form.errors.description}}<span class="error">{{this}}</span>{{/each}}
</p>
<p>
  <label for="id_image">Image</label>
  <input type="text" name="image" id="id_image" maxlength="255" value="{{form.values.image}}">
  {{#each form.errors.image}}<span class="error">{{this}}</span>{{/each}}
</p>
<p>
  <label for="id_category">Category</label>
  <select name="category" id="id_category">
    <option value="">---------</option>
    {{#each categories}}
    <option value="{{code}}"{{#if (eq code ../form.values.category)}} selected{{/if}}>{{label}}</option>
    {{/each}}
  </select>
  {{#each form.errors.category}}<span class="error">{{this}}</span>{{/each}}
</p>
<p>
  <label for="id_quantity">Quantity</label>
  <input type="number" name="quantity" id="id_quantity" min="0" value="{{form.values.quantity}}">
  {{#each form.errors.quantity}}<span class="error">{{this}}</span>{{/each}}
</p>
<p>
  <label for="id_price">Price</label>
  <input type="number" name="price" id="id_price" step="0.01" min="0" value="{{form.values.price}}">
  {{#each form.errors.price}}<span class="error">{{this}}</span>{{/each}}
</p>
"#;

const INDEX_TEMPLATE: &str = r#"{{> header title="Products"}}
<nav>
  <ul>
  {{#each categories}}
    <li><a href="/category/{{code}}">{{label}}</a></li>
  {{/each}}
  </ul>
</nav>
<form method="get" action="/">
  <input type="text" name="name" value="{{form.values.name}}" placeholder="Search by name">
  <button type="submit">Search</button>
</form>
<section class="products">
{{#each products}}
  <article>
    {{#if image}}<img src="{{image}}" alt="{{name}}">{{/if}}
    <h2><a href="/products/{{id}}">{{name}}</a></h2>
    <p>{{category.label}} | {{price}}</p>
  </article>
{{else}}
  <p>No products found.</p>
{{/each}}
</section>
{{> footer}}
"#;

const PRODUCTS_BY_CATEGORY_TEMPLATE: &str = r#"{{> header title=category_code}}
<nav>
  <ul>
  {{#each categories}}
    <li><a href="/category/{{code}}"{{#if (eq code ../category_code)}} class="active"{{/if}}>{{label}}</a></li>
  {{/each}}
  </ul>
</nav>
<section class="products">
{{#each products}}
  <article>
    <h2><a href="/products/{{id}}">{{name}}</a></h2>
    <p>{{price}} | {{quantity}} in stock</p>
  </article>
{{else}}
  <p>No products in this category.</p>
{{/each}}
</section>
{{> footer}}
"#;

const PRODUCT_CREATE_TEMPLATE: &str = r#"{{> header title="Add product"}}
<h1>Add product</h1>
<form method="post" action="/products/add">
{{> product_fields}}
  <button type="submit">Create</button>
</form>
{{> footer}}
"#;

const PRODUCT_DETAIL_TEMPLATE: &str = r#"{{> header title=product.name}}
<nav>
  <ul>
  {{#each categories}}
    <li><a href="/category/{{code}}">{{label}}</a></li>
  {{/each}}
  </ul>
</nav>
<article class="product">
  <h1>{{product.name}}</h1>
  {{#if product.image}}<img src="{{product.image}}" alt="{{product.name}}">{{/if}}
  <p class="description">{{product.description}}</p>
  <dl>
    <dt>Category</dt><dd class="category">{{product.category.label}}</dd>
    <dt>Quantity</dt><dd class="quantity">{{product.quantity}}</dd>
    <dt>Price</dt><dd class="price">{{product.price}}</dd>
  </dl>
  <a href="/products/{{product.id}}/update">Edit</a>
  <a href="/products/{{product.id}}/delete">Delete</a>
</article>
{{> footer}}
"#;

const PRODUCT_UPDATE_TEMPLATE: &str = r#"{{> header title="Edit product"}}
<h1>Edit {{product.name}}</h1>
<form method="post" action="/products/{{product.id}}/update">
{{> product_fields}}
  <button type="submit">Save</button>
</form>
<a href="/products/{{product.id}}">Cancel</a>
{{> footer}}
"#;

const PRODUCT_DELETE_TEMPLATE: &str = r#"{{> header title="Delete product"}}
<h1>Delete {{product.name}}?</h1>
<p>This cannot be undone.</p>
<form method="post" action="/products/{{product.id}}/delete">
  <button type="submit">Yes, delete</button>
</form>
<a href="/products/{{product.id}}">Cancel</a>
{{> footer}}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{FormState, ProductForm};
    use crate::models::Category;
    use serde_json::json;

    #[test]
    fn all_pages_register() {
        let engine = TemplateEngine::new().unwrap();
        for (name, _) in PAGES {
            assert!(engine.render(name, &json!({})).is_ok(), "{name} renders with empty context");
        }
    }

    #[test]
    fn values_are_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine
            .render(
                PRODUCT_DETAIL,
                &json!({ "product": { "id": "1", "name": "<b>Bold</b>", "category": { "label": "Tools" } } }),
            )
            .unwrap();
        assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt;"));
        assert!(!html.contains("<b>Bold</b>"));
    }

    #[test]
    fn form_renders_selected_category_and_errors() {
        let engine = TemplateEngine::new().unwrap();
        let raw = ProductForm {
            category: "TOOLS".to_string(),
            ..Default::default()
        };
        let errors = raw.validate().unwrap_err();
        let html = engine
            .render(
                PRODUCT_CREATE,
                &json!({ "form": raw.with_errors(errors), "categories": Category::choices() }),
            )
            .unwrap();
        assert!(html.contains(r#"<option value="TOOLS" selected>Tools</option>"#));
        assert!(html.contains("This field is required."));

        let empty = engine
            .render(
                PRODUCT_CREATE,
                &json!({ "form": FormState::<ProductForm>::empty(), "categories": Category::choices() }),
            )
            .unwrap();
        assert!(!empty.contains("selected"));
        assert!(!empty.contains("class=\"error\""));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let engine = TemplateEngine::new().unwrap();
        assert!(matches!(engine.render("missing", &json!({})), Err(AppError::Template(_))));
    }
}
