use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::errors::AppError;

/// What a notification is about. Always exactly one of the two workflows —
/// never both, never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum NotificationSujet {
    Proposition(i64),
    Demande(i64),
}

impl NotificationSujet {
    pub fn type_str(self) -> &'static str {
        match self {
            NotificationSujet::Proposition(_) => "proposition",
            NotificationSujet::Demande(_) => "demande",
        }
    }

    pub fn sujet_id(self) -> i64 {
        match self {
            NotificationSujet::Proposition(id) => id,
            NotificationSujet::Demande(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub destinataire_id: i64,
    pub sujet: NotificationSujet,
    pub titre: String,
    pub message: String,
    pub lu: bool,
    pub date_creation: String,
}

const SELECT_NOTIFICATION: &str = "\
    SELECT id, destinataire_id, sujet_type, sujet_id, titre, message, lu, date_creation \
    FROM notifications";

fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
    let sujet_type: String = row.get("sujet_type")?;
    let sujet_id: i64 = row.get("sujet_id")?;
    let sujet = match sujet_type.as_str() {
        "demande" => NotificationSujet::Demande(sujet_id),
        _ => NotificationSujet::Proposition(sujet_id),
    };
    Ok(Notification {
        id: row.get("id")?,
        destinataire_id: row.get("destinataire_id")?,
        sujet,
        titre: row.get("titre")?,
        message: row.get("message")?,
        lu: row.get("lu")?,
        date_creation: row.get("date_creation")?,
    })
}

pub fn create(
    conn: &Connection,
    destinataire_id: i64,
    sujet: NotificationSujet,
    titre: &str,
    message: &str,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO notifications (destinataire_id, sujet_type, sujet_id, titre, message) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            destinataire_id,
            sujet.type_str(),
            sujet.sujet_id(),
            titre,
            message,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_destinataire(
    conn: &Connection,
    destinataire_id: i64,
) -> Result<Vec<Notification>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_NOTIFICATION} WHERE destinataire_id = ?1 ORDER BY date_creation DESC, id DESC"
    ))?;
    let notifications = stmt
        .query_map(params![destinataire_id], row_to_notification)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notifications)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Notification>, AppError> {
    let notification = conn
        .query_row(
            &format!("{SELECT_NOTIFICATION} WHERE id = ?1"),
            params![id],
            row_to_notification,
        )
        .optional()?;
    Ok(notification)
}

pub fn mark_read(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute("UPDATE notifications SET lu = 1 WHERE id = ?1", params![id])?;
    Ok(())
}
