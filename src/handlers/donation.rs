use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{dto::NewDonationDto, errors::ApiError, service, AppState};

#[post("")]
pub async fn create(dto: web::Json<NewDonationDto>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let donation = service::donation::create(dto.into_inner(), state.get_ref()).await?;
    Ok(HttpResponse::Created().json(donation))
}

#[get("/invitation/{id}")]
pub async fn get_by_invitation(id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let donations = service::ledger::list_donations(state.store.as_ref(), id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(donations))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(create).service(get_by_invitation);
}
