//! Status state machines for the two donation pipelines.
//!
//! Every operation is a synchronous read-modify-write by a single caller:
//! load the record, check the caller's capability and the record's status,
//! apply one update, return the fresh row. Notification writes that hang
//! off a transition are fire-and-forget — a failed insert is logged and
//! never aborts the transition itself.

use rusqlite::Connection;

use crate::errors::AppError;
use crate::models::notification::{self, NotificationSujet};
use crate::models::user::Role;

pub mod demande;
pub mod proposition;
pub mod stock;

/// The authenticated caller: identity plus the explicit role claim taken
/// from the session. Capability checks are matches on the claim.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "Cette action est réservée au rôle {}",
                role.as_str()
            )))
        }
    }
}

/// A member's validation decision on a submitted record.
#[derive(Debug, Clone)]
pub enum Decision {
    Approuver,
    Refuser { raison: String },
}

/// A transporter's answer to an assigned mission.
#[derive(Debug, Clone)]
pub enum ReponseTransporteur {
    Accepter,
    Refuser { raison: String },
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

/// Create a notification without letting a storage failure propagate into
/// the transition that triggered it.
pub(crate) fn notify(
    conn: &Connection,
    destinataire_id: i64,
    sujet: NotificationSujet,
    titre: &str,
    message: &str,
) {
    if let Err(e) = notification::create(conn, destinataire_id, sujet, titre, message) {
        log::warn!("Notification to user {destinataire_id} not recorded: {e}");
    }
}
