use actix_web::{post, web, HttpResponse};
use log::info;

use crate::{
    dto::{LoginUserRequest, NewUserDto},
    errors::ApiError,
    service, AppState,
};

#[post("/register")]
pub async fn register(dto: web::Json<NewUserDto>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let response = service::user::create(dto.into_inner(), state.get_ref()).await?;
    info!("RESPONSE /USERS/REGISTER: {}", response.user.id);
    Ok(HttpResponse::Ok().json(response))
}

#[post("/login")]
pub async fn login(dto: web::Json<LoginUserRequest>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let response = service::user::login(dto.into_inner(), state.get_ref()).await?;
    info!("RESPONSE /USERS/LOGIN: {}", response.user.id);
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login);
}
