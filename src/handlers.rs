use actix_web::{http::header, web, HttpRequest, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::catalog;
use crate::error::{AppError, Result};
use crate::forms::{FormState, ProductForm, SearchForm};
use crate::models::{Category, Product, ProductView};
use crate::state::AppState;
use crate::templates;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(Product::view).collect()
}

/// Looks the product up before anything else happens in a request. Malformed
/// ids are indistinguishable from missing ones.
async fn load_product(state: &AppState, id: &str) -> Result<Product> {
    let object_id = ObjectId::parse_str(id).map_err(|_| {
        debug!("Invalid product ID format: {}", id);
        AppError::product_not_found(id)
    })?;

    match state.products.get(object_id).await? {
        Some(product) => Ok(product),
        None => {
            debug!("Product not found: {}", id);
            Err(AppError::product_not_found(id))
        }
    }
}

#[instrument(name = "handler::index", skip(state, req))]
pub async fn index(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    // a query string that does not even parse counts as an invalid search
    let form = web::Query::<SearchForm>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();

    let categories = catalog::categories_with_products(state.products.as_ref()).await?;
    let products = catalog::in_stock_products(state.products.as_ref(), form.query()).await?;

    info!("Listing {} products", products.len());
    let page = state.templates.render(
        templates::INDEX,
        &json!({
            "products": views(&products),
            "form": form.into_state(),
            "categories": categories,
        }),
    )?;
    Ok(html(page))
}

#[instrument(name = "handler::category", skip(state, path), fields(category_code = %path.as_ref()))]
pub async fn category(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let category_code = path.into_inner();
    let products = catalog::products_in_category(state.products.as_ref(), &category_code).await?;

    debug!("Category {} has {} products", category_code, products.len());
    let page = state.templates.render(
        templates::PRODUCTS_BY_CATEGORY,
        &json!({
            "products": views(&products),
            "category_code": category_code,
            "categories": Category::choices(),
        }),
    )?;
    Ok(html(page))
}

fn render_create(state: &AppState, form: FormState<ProductForm>) -> Result<HttpResponse> {
    let page = state.templates.render(
        templates::PRODUCT_CREATE,
        &json!({ "form": form, "categories": Category::choices() }),
    )?;
    Ok(html(page))
}

pub async fn create_form(state: web::Data<AppState>) -> Result<HttpResponse> {
    render_create(&state, FormState::empty())
}

#[instrument(name = "handler::create", skip(state, body))]
pub async fn create(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let form = ProductForm::from_urlencoded(&body);

    match form.validate() {
        Ok(fields) => {
            let product = state.products.create(fields).await?;
            info!(category = %product.category, "Product created successfully with ID: {}", product.id);
            Ok(redirect(&product.detail_url()))
        }
        Err(errors) => {
            debug!("Rejected product submission: {:?}", errors);
            render_create(&state, form.with_errors(errors))
        }
    }
}

#[instrument(name = "handler::detail", skip(state, path), fields(product_id = %path.as_ref()))]
pub async fn detail(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let product = load_product(&state, &path).await?;

    let page = state.templates.render(
        templates::PRODUCT_DETAIL,
        &json!({ "product": product.view(), "categories": Category::choices() }),
    )?;
    Ok(html(page))
}

fn render_update(state: &AppState, product: &Product, form: FormState<ProductForm>) -> Result<HttpResponse> {
    let page = state.templates.render(
        templates::PRODUCT_UPDATE,
        &json!({
            "form": form,
            "product": product.view(),
            "categories": Category::choices(),
        }),
    )?;
    Ok(html(page))
}

#[instrument(name = "handler::update_form", skip(state, path), fields(product_id = %path.as_ref()))]
pub async fn update_form(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let product = load_product(&state, &path).await?;
    let initial = ProductForm::from(&product).with_errors(Default::default());
    render_update(&state, &product, initial)
}

#[instrument(name = "handler::update", skip(state, path, body), fields(product_id = %path.as_ref()))]
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    // the body is only decoded once the product is known to exist
    let product = load_product(&state, &path).await?;
    let form = ProductForm::from_urlencoded(&body);

    match form.validate() {
        Ok(fields) => {
            let updated = state
                .products
                .replace(product.id, fields)
                .await?
                .ok_or_else(|| AppError::product_not_found(&path))?;
            info!("Product updated successfully: {}", updated.id);
            Ok(redirect(&updated.detail_url()))
        }
        Err(errors) => {
            debug!("Rejected update for {}: {:?}", product.id, errors);
            render_update(&state, &product, form.with_errors(errors))
        }
    }
}

#[instrument(name = "handler::delete_confirm", skip(state, path), fields(product_id = %path.as_ref()))]
pub async fn delete_confirm(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let product = load_product(&state, &path).await?;
    let page = state
        .templates
        .render(templates::PRODUCT_DELETE, &json!({ "product": product.view() }))?;
    Ok(html(page))
}

#[instrument(name = "handler::delete", skip(state, path), fields(product_id = %path.as_ref()))]
pub async fn delete(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let product = load_product(&state, &path).await?;

    if !state.products.delete(product.id).await? {
        return Err(AppError::product_not_found(&path));
    }

    info!("Product deleted successfully: {}", product.id);
    Ok(redirect("/"))
}
