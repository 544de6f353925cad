//! Matching queries and stock removal.
//!
//! Matching is deliberately simple: availability-flag filtering for
//! transporters, category equality for stock, natural store order. No
//! scoring and no capacity reservation — first match wins, which is fine
//! at the volumes this system runs at.

use rusqlite::Connection;

use crate::errors::AppError;
use crate::models::demande;
use crate::models::don::{self, Don};
use crate::models::user::{self, Role, UserPublic};
use crate::workflow::{Actor, today};

/// Transporters currently open to new missions.
pub fn available_transporteurs(conn: &Connection) -> Result<Vec<UserPublic>, AppError> {
    user::available_transporteurs(conn)
}

/// Stock a member can propose for a demande: same category, still in
/// storage.
pub fn related_stock(conn: &Connection, demande_id: i64) -> Result<Vec<Don>, AppError> {
    let dem = demande::find_by_id(conn, demande_id)?.ok_or(AppError::NotFound)?;
    don::find_available_by_categorie(conn, dem.categorie_id)
}

/// A member releases a don from stock once the attributed demande's
/// requester has confirmed reception. The don leaves inventory as given.
pub fn release_from_stock(conn: &Connection, actor: &Actor, don_id: i64) -> Result<Don, AppError> {
    actor.require(Role::Membre)?;
    let don = don::find_by_id(conn, don_id)?.ok_or(AppError::NotFound)?;

    if demande::find_confirmed_by_don(conn, don_id)?.is_none() {
        return Err(AppError::Conflict(
            "Le bénéficiaire n'a pas encore confirmé la réception".to_string(),
        ));
    }

    don::set_donne(conn, don.id, &today())?;
    don::find_by_id(conn, don.id)?.ok_or(AppError::NotFound)
}
