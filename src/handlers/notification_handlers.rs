use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::current_actor;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::notification;

/// GET /notifications — the caller's inbox, newest first.
pub async fn list(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let notifications = notification::find_by_destinataire(&conn, actor.id)?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    let notif = notification::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    if notif.destinataire_id != actor.id {
        return Err(AppError::PermissionDenied(
            "Cette notification ne vous est pas destinée".to_string(),
        ));
    }

    notification::mark_read(&conn, id)?;
    let notif = notification::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(notif))
}
