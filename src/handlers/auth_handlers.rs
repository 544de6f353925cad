use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{password, session};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::{self, NewUser, Role, UserPublic};

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub adresse: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /register
/// Participant self-registration; members, transporters and admins are
/// created by an admin. Logs the new account in.
pub async fn register(
    pool: web::Data<DbPool>,
    sess: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let mut errors = Vec::new();
    let username = form.username.trim().to_string();
    if username.is_empty() {
        errors.push("Le nom d'utilisateur est requis".to_string());
    }
    if form.password.len() < 8 {
        errors.push("Le mot de passe doit compter au moins 8 caractères".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let conn = pool.get()?;
    let hash = password::hash_password(&form.password)?;
    let id = user::create(
        &conn,
        &NewUser {
            username: username.clone(),
            password: hash,
            email: form.email.unwrap_or_default(),
            role: Role::Participant,
            phone: form.phone.unwrap_or_default(),
            adresse: form.adresse.unwrap_or_default(),
            vehicule: String::new(),
        },
    )?;

    session::log_in(&sess, id, &username, Role::Participant)?;
    log::info!("New participant account #{id} ({username})");
    Ok(HttpResponse::Created().json(json!({ "id": id, "username": username })))
}

/// POST /login
pub async fn login(
    pool: web::Data<DbPool>,
    sess: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let user = user::find_by_username(&conn, form.username.trim())?;

    let user = match user {
        Some(u) if password::verify_password(&form.password, &u.password)? => u,
        // Same answer whether the account exists or the password is wrong.
        _ => {
            return Err(AppError::PermissionDenied(
                "Identifiants invalides".to_string(),
            ));
        }
    };

    session::log_in(&sess, user.id, &user.username, user.role)?;
    Ok(HttpResponse::Ok().json(UserPublic::from(user)))
}

/// POST /logout
pub async fn logout(sess: Session) -> HttpResponse {
    sess.purge();
    HttpResponse::Ok().json(json!({ "ok": true }))
}
