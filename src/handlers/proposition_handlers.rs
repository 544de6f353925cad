use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::current_actor;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::handlers::{DecisionForm, ReponseForm};
use crate::models::proposition;
use crate::models::user::Role;
use crate::workflow;
use crate::workflow::proposition::PropositionInput;

#[derive(Debug, Deserialize)]
pub struct AssignForm {
    pub transporteur_id: i64,
}

/// POST /propositions
pub async fn create(
    pool: web::Data<DbPool>,
    sess: Session,
    form: web::Form<PropositionInput>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let prop = workflow::proposition::submit(&conn, &actor, &form)?;
    Ok(HttpResponse::Created().json(prop))
}

/// GET /propositions — the caller's own offers.
pub async fn list_mine(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let props = proposition::find_by_donateur(&conn, actor.id)?;
    Ok(HttpResponse::Ok().json(props))
}

/// GET /propositions/{id}
/// Visible to the owning donor, members, and the assigned transporter.
pub async fn detail(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    let prop = proposition::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    let allowed = prop.donateur_id == actor.id
        || actor.role == Role::Membre
        || prop.transporteur_id == Some(actor.id);
    if !allowed {
        return Err(AppError::PermissionDenied(
            "Vous n'avez pas accès à cette proposition".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/validate
pub async fn validate(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<DecisionForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let decision = form.into_inner().into_decision()?;
    let conn = pool.get()?;
    let prop = workflow::proposition::validate(&conn, &actor, path.into_inner(), &decision)?;
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/assign
pub async fn assign(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<AssignForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let prop = workflow::proposition::assign_transporteur(
        &conn,
        &actor,
        path.into_inner(),
        form.transporteur_id,
    )?;
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/respond
pub async fn respond(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
    form: web::Form<ReponseForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let reponse = form.into_inner().into_reponse()?;
    let conn = pool.get()?;
    let prop =
        workflow::proposition::transporteur_respond(&conn, &actor, path.into_inner(), &reponse)?;
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/confirm-handoff
pub async fn confirm_handoff(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let prop = workflow::proposition::confirm_handoff(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/confirm-receipt
pub async fn confirm_receipt(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let prop = workflow::proposition::confirm_receipt(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/convert — create the stock entry.
pub async fn convert(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let don = workflow::proposition::convert_to_stock(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Created().json(don))
}

/// POST /propositions/{id}/complete
pub async fn complete(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let prop = workflow::proposition::complete(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(prop))
}

/// POST /propositions/{id}/cancel
pub async fn cancel(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let prop = workflow::proposition::cancel(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(prop))
}
