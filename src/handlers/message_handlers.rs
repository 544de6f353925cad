use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use crate::auth::session::current_actor;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::{message, user};

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub destinataire_id: i64,
    pub texte: String,
}

/// POST /messages
pub async fn create(
    pool: web::Data<DbPool>,
    sess: Session,
    form: web::Form<MessageForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let texte = form.texte.trim();
    if texte.is_empty() {
        return Err(AppError::Validation(vec![
            "Le texte du message est requis".to_string(),
        ]));
    }

    let conn = pool.get()?;
    if user::find_by_id(&conn, form.destinataire_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    let id = message::create(&conn, actor.id, form.destinataire_id, texte)?;
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// GET /messages/thread/{user_id} — conversation with another account.
pub async fn thread(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    let conn = pool.get()?;
    let messages = message::thread(&conn, actor.id, path.into_inner())?;
    Ok(HttpResponse::Ok().json(messages))
}
