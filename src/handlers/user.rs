use actix_web::{web, HttpResponse};

use crate::{
    errors::ApiError,
    service::{self, auth::{AuthMiddleware, UserAuthData}},
    AppState,
};

pub async fn me(user_auth_data: UserAuthData, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = service::user::get_by_id(user_auth_data.user_id, state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn config(cfg: &mut web::ServiceConfig, auth: AuthMiddleware) {
    cfg.service(
        web::resource("/me")
            .wrap(auth)
            .route(web::get().to(me)),
    );
}
