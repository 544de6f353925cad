use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::current_actor;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::handlers::{DecisionForm, ReponseForm};
use crate::models::demande;
use crate::models::user::Role;
use crate::workflow;
use crate::workflow::demande::DemandeInput;

#[derive(Debug, Deserialize)]
pub struct AssignForm {
    pub transporteur_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AttributeForm {
    pub don_id: i64,
}

/// POST /demandes
pub async fn create(
    pool: web::Data<DbPool>,
    sess: Session,
    form: web::Form<DemandeInput>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let dem = workflow::demande::submit(&conn, &actor, &form)?;
    Ok(HttpResponse::Created().json(dem))
}

/// GET /demandes — the caller's own requests.
pub async fn list_mine(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let demandes = demande::find_by_demandeur(&conn, actor.id)?;
    Ok(HttpResponse::Ok().json(demandes))
}

/// GET /demandes/{id}
pub async fn detail(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    let dem = demande::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    let allowed = dem.demandeur_id == actor.id
        || actor.role == Role::Membre
        || dem.transporteur_id == Some(actor.id);
    if !allowed {
        return Err(AppError::PermissionDenied(
            "Vous n'avez pas accès à cette demande".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(dem))
}

/// GET /demandes/{id}/related-stock — stock in the desired category, for a
/// member servicing the demande.
pub async fn related_stock(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    actor.require(Role::Membre)?;
    let conn = pool.get()?;
    let dons = workflow::stock::related_stock(&conn, path.into_inner())?;
    Ok(HttpResponse::Ok().json(dons))
}

/// POST /demandes/{id}/validate
pub async fn validate(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<DecisionForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let decision = form.into_inner().into_decision()?;
    let conn = pool.get()?;
    let dem = workflow::demande::validate(&conn, &actor, path.into_inner(), &decision)?;
    Ok(HttpResponse::Ok().json(dem))
}

/// POST /demandes/{id}/assign
pub async fn assign(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<AssignForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let dem = workflow::demande::assign_transporteur(
        &conn,
        &actor,
        path.into_inner(),
        form.transporteur_id,
    )?;
    Ok(HttpResponse::Ok().json(dem))
}

/// POST /demandes/{id}/respond
pub async fn respond(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<ReponseForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let reponse = form.into_inner().into_reponse()?;
    let conn = pool.get()?;
    let dem = workflow::demande::transporteur_respond(&conn, &actor, path.into_inner(), &reponse)?;
    Ok(HttpResponse::Ok().json(dem))
}

/// POST /demandes/{id}/start
pub async fn start(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let dem = workflow::demande::start_delivery(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(dem))
}

/// POST /demandes/{id}/complete
pub async fn complete(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let dem = workflow::demande::complete_delivery(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(dem))
}

/// POST /demandes/{id}/attribute
pub async fn attribute(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<AttributeForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let dem = workflow::demande::attribute_don(&conn, &actor, path.into_inner(), form.don_id)?;
    Ok(HttpResponse::Ok().json(dem))
}

/// POST /demandes/{id}/confirm-reception
pub async fn confirm_reception(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let outcome = workflow::demande::confirm_reception(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /demandes/{id}/cancel
pub async fn cancel(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let dem = workflow::demande::cancel(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(dem))
}
