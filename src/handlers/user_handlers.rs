use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use crate::auth::password;
use crate::auth::session::current_actor;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::{self, NewUser, Role};
use crate::models::{category, demande, don, proposition};
use crate::models::demande::DemandeStatut;
use crate::models::proposition::PropositionStatut;
use crate::workflow;

#[derive(Debug, Deserialize)]
pub struct AdminCreateForm {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub role: String,
    pub phone: Option<String>,
    pub adresse: Option<String>,
    pub vehicule: Option<String>,
}

/// POST /admin/users
/// An admin provisions membre, transporteur and admin accounts.
pub async fn admin_create_user(
    pool: web::Data<DbPool>,
    sess: Session,
    form: web::Form<AdminCreateForm>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    actor.require(Role::Admin)?;

    let form = form.into_inner();
    let role = Role::from_str(&form.role)
        .filter(|r| *r != Role::Participant)
        .ok_or_else(|| {
            AppError::Validation(vec![format!("Rôle invalide: {}", form.role)])
        })?;

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
            role,
            phone: form.phone.unwrap_or_default(),
            adresse: form.adresse.unwrap_or_default(),
            vehicule: form.vehicule.unwrap_or_default(),
        },
    )?;

    log::info!("Admin #{} created {} account #{id} ({username})", actor.id, role.as_str());
    Ok(HttpResponse::Created().json(json!({ "id": id, "username": username, "role": role })))
}

/// GET /api/users/{id} — minimal lookup for collaborators (chat, lists).
pub async fn get_user(
    pool: web::Data<DbPool>,
    sess: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    current_actor(&sess)?;
    let conn = pool.get()?;
    let user = user::find_by_id(&conn, path.into_inner())?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(json!({
        "id": user.id,
        "username": user.username,
        "role": user.role,
    })))
}

/// GET /transporteurs/disponibles — assignment candidates, members only.
pub async fn transporteurs_disponibles(
    pool: web::Data<DbPool>,
    sess: Session,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    actor.require(Role::Membre)?;
    let conn = pool.get()?;
    let transporteurs = workflow::stock::available_transporteurs(&conn)?;
    Ok(HttpResponse::Ok().json(transporteurs))
}

/// GET /missions — the transporter's assigned propositions and demandes.
pub async fn missions(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    actor.require(Role::Transporteur)?;
    let conn = pool.get()?;
    let propositions = proposition::find_by_transporteur(&conn, actor.id)?;
    let demandes = demande::find_by_transporteur(&conn, actor.id)?;
    Ok(HttpResponse::Ok().json(json!({
        "propositions": propositions,
        "demandes": demandes,
    })))
}

/// GET /admin/overview — the member work queue: records awaiting
/// validation plus the current stock.
pub async fn overview(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    let actor = current_actor(&sess)?;
    actor.require(Role::Membre)?;
    let conn = pool.get()?;

    let propositions = proposition::find_by_statut(&conn, PropositionStatut::EnAttente)?;
    let demandes = demande::find_by_statut(&conn, DemandeStatut::EnAttente)?;
    let dons = don::list_all(&conn)?;
    let transporteurs = workflow::stock::available_transporteurs(&conn)?;

    Ok(HttpResponse::Ok().json(json!({
        "propositions_en_attente": propositions,
        "demandes_en_attente": demandes,
        "stock": dons,
        "transporteurs_disponibles": transporteurs,
    })))
}

/// GET /categories
pub async fn categories(pool: web::Data<DbPool>, sess: Session) -> Result<HttpResponse, AppError> {
    current_actor(&sess)?;
    let conn = pool.get()?;
    let cats = category::list_all(&conn)?;
    Ok(HttpResponse::Ok().json(cats))
}
