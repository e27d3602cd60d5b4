use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::SearchError;
use crate::models::{ContactRequest, ItemRecord, ItemSearchParams};
use crate::routes::AppState;

/// Configure all item routes
///
/// Fixed paths are registered before `/items/{id}` so they win the match.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/items/search", web::get().to(search_items))
        .route("/items/search/condition", web::get().to(item_conditions))
        .route("/items/low_priced", web::get().to(low_priced_items))
        .route("/items/buy/{id}", web::post().to(buy_item))
        .route("/items/{id}", web::get().to(get_item))
        .route("/items", web::post().to(import_items));
}

/// Faceted item search
///
/// GET /api/v1/items/search?priceRangeId=1&kind=...&features=a,b&page=0&perPage=20
async fn search_items(
    state: web::Data<AppState>,
    query: web::Query<ItemSearchParams>,
) -> Result<HttpResponse, SearchError> {
    let response = state.engine.search_items(&query).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn item_conditions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.item_conditions())
}

async fn low_priced_items(state: web::Data<AppState>) -> Result<HttpResponse, SearchError> {
    let response = state.engine.lowest_priced_items().await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn get_item(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, SearchError> {
    let item = state.engine.item_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// Buy one unit of an item
///
/// POST /api/v1/items/buy/{id}
///
/// Request body:
/// ```json
/// { "email": "buyer@example.com" }
/// ```
async fn buy_item(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<ContactRequest>,
) -> Result<HttpResponse, SearchError> {
    req.validate()
        .map_err(|errors| SearchError::Validation(errors.to_string()))?;

    let response = state.engine.purchase_item(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Bulk import of item rows (JSON array)
async fn import_items(
    state: web::Data<AppState>,
    req: web::Json<Vec<ItemRecord>>,
) -> Result<HttpResponse, SearchError> {
    let response = state.engine.import_items(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}
