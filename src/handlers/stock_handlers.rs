use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::current_actor;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::don;
use crate::models::user::Role;
use crate::workflow;

/// GET /stock — full inventory, members only.
pub async fn list(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    actor.require(Role::Membre)?;
    let conn = pool.get()?;
    let dons = don::list_all(&conn)?;
    Ok(HttpResponse::Ok().json(dons))
}

/// POST /stock/{id}/release — mark a don as given once the attributed
/// demande's reception is confirmed.
pub async fn release(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let don = workflow::stock::release_from_stock(&conn, &actor, path.into_inner())?;
    Ok(HttpResponse::Ok().json(don))
}
