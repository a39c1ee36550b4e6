use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::db::catalog::ExperienceRepository;
use crate::error::ApiError;

/// `GET /api/experiences/{slug}`: catalog lookup across both collections,
/// tagging the result with which kind it came from.
pub async fn get_experience(
    catalog: web::Data<Arc<dyn ExperienceRepository>>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    match catalog.find_by_slug(&slug).await? {
        Some((kind, experience)) => Ok(HttpResponse::Ok().json(json!({
            "type": kind,
            "experience": experience,
        }))),
        None => Err(ApiError::NotFound("experience")),
    }
}
