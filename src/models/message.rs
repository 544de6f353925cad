use rusqlite::{Connection, params};
use serde::Serialize;

use crate::errors::AppError;

/// One chat message between two accounts. The messaging collaborator only
/// persists and lists; it carries no workflow semantics.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: i64,
    pub expediteur_id: i64,
    pub destinataire_id: i64,
    pub texte: String,
    pub date_envoi: String,
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get("id")?,
        expediteur_id: row.get("expediteur_id")?,
        destinataire_id: row.get("destinataire_id")?,
        texte: row.get("texte")?,
        date_envoi: row.get("date_envoi")?,
    })
}

pub fn create(
    conn: &Connection,
    expediteur_id: i64,
    destinataire_id: i64,
    texte: &str,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO messages (expediteur_id, destinataire_id, texte) VALUES (?1, ?2, ?3)",
        params![expediteur_id, destinataire_id, texte],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Conversation between two accounts, oldest first, both directions.
pub fn thread(conn: &Connection, a: i64, b: i64) -> Result<Vec<Message>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, expediteur_id, destinataire_id, texte, date_envoi FROM messages \
         WHERE (expediteur_id = ?1 AND destinataire_id = ?2) \
            OR (expediteur_id = ?2 AND destinataire_id = ?1) \
         ORDER BY date_envoi, id",
    )?;
    let messages = stmt
        .query_map(params![a, b], row_to_message)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}
