use actix_web::{get, post, web, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::{
    dto::{NewInvitationDto, RsvpDto},
    errors::ApiError,
    service::{self, auth::{AuthMiddleware, UserAuthData}},
    AppState,
};

pub async fn create(
    user_auth_data: UserAuthData,
    dto: web::Json<NewInvitationDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let invitation = service::invitation::create(&user_auth_data, dto.into_inner(), state.get_ref()).await?;
    Ok(HttpResponse::Created().json(invitation))
}

#[get("/user/{user_id}")]
pub async fn get_by_owner(user_id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let invitations = service::invitation::get_by_owner(user_id.into_inner(), state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(invitations))
}

#[get("/{id}")]
pub async fn get_by_id(id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let details = service::invitation::get_details(id.into_inner(), state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(details))
}

#[post("/{id}/rsvp")]
pub async fn rsvp(
    id: web::Path<Uuid>,
    dto: web::Json<RsvpDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let invitation = service::invitation::rsvp(id, dto.into_inner(), state.get_ref()).await?;
    info!("RESPONSE /INVITATIONS/{}/RSVP: {} entries", id, invitation.rsvps.len());
    Ok(HttpResponse::Ok().json(invitation))
}

pub fn config(cfg: &mut web::ServiceConfig, auth: AuthMiddleware) {
    cfg.service(
        web::resource("")
            .wrap(auth)
            .route(web::post().to(create)),
    )
    .service(get_by_owner)
    .service(get_by_id)
    .service(rsvp);
}
