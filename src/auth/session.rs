use actix_session::Session;

use crate::errors::AppError;
use crate::models::user::Role;
use crate::workflow::Actor;

/// Store the authenticated user's claims on the session. The role is an
/// explicit claim so authorization never has to re-query the user row.
pub fn log_in(session: &Session, user_id: i64, username: &str, role: Role) -> Result<(), AppError> {
    session
        .insert("user_id", user_id)
        .and_then(|_| session.insert("username", username))
        .and_then(|_| session.insert("role", role.as_str()))
        .map_err(|e| AppError::Session(e.to_string()))
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

/// Build the acting identity from session claims. Fails with a session
/// error when the claims are missing or unreadable.
pub fn current_actor(session: &Session) -> Result<Actor, AppError> {
    let id = get_user_id(session).ok_or_else(|| AppError::Session("Not logged in".to_string()))?;
    let role = session
        .get::<String>("role")
        .map_err(|e| AppError::Session(e.to_string()))?
        .and_then(|r| Role::from_str(&r))
        .ok_or_else(|| AppError::Session("No role claim in session".to_string()))?;
    Ok(Actor { id, role })
}
