use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::SearchError;
use crate::models::{ContactRequest, CoordinatesRequest, PropertyRecord, PropertySearchParams};
use crate::routes::AppState;

/// Configure all property routes, including recommendations
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/properties/search", web::get().to(search_properties))
        .route("/properties/search/condition", web::get().to(property_conditions))
        .route("/properties/low_priced", web::get().to(low_priced_properties))
        .route("/properties/nazotte", web::post().to(search_polygon))
        .route("/properties/req_doc/{id}", web::post().to(request_document))
        .route("/properties/{id}", web::get().to(get_property))
        .route("/properties", web::post().to(import_properties))
        .route("/recommended_property/{item_id}", web::get().to(recommend_for_item));
}

async fn search_properties(
    state: web::Data<AppState>,
    query: web::Query<PropertySearchParams>,
) -> Result<HttpResponse, SearchError> {
    let response = state.engine.search_properties(&query).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn property_conditions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.property_conditions())
}

async fn low_priced_properties(state: web::Data<AppState>) -> Result<HttpResponse, SearchError> {
    let response = state.engine.lowest_priced_properties().await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Properties inside a polygon drawn on the map
///
/// POST /api/v1/properties/nazotte
///
/// Request body:
/// ```json
/// { "coordinates": [ { "latitude": 35.6, "longitude": 139.7 }, ... ] }
/// ```
async fn search_polygon(
    state: web::Data<AppState>,
    req: web::Json<CoordinatesRequest>,
) -> Result<HttpResponse, SearchError> {
    let response = state.engine.search_polygon(&req.coordinates).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn request_document(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<ContactRequest>,
) -> Result<HttpResponse, SearchError> {
    req.validate()
        .map_err(|errors| SearchError::Validation(errors.to_string()))?;

    state.engine.request_document(path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

async fn get_property(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, SearchError> {
    let property = state.engine.property_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(property))
}

async fn import_properties(
    state: web::Data<AppState>,
    req: web::Json<Vec<PropertyRecord>>,
) -> Result<HttpResponse, SearchError> {
    let response = state.engine.import_properties(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Properties whose door an item fits through
///
/// GET /api/v1/recommended_property/{item_id}
async fn recommend_for_item(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, SearchError> {
    let response = state.engine.recommend_for_item(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
