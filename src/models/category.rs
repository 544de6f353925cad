use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::errors::AppError;

/// Item category, self-referencing tree via `parent_id`. Demandes are
/// matched to stock by category equality.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub nom: String,
    pub description: String,
    pub parent_id: Option<i64>,
}

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        nom: row.get("nom")?,
        description: row.get("description")?,
        parent_id: row.get("parent_id")?,
    })
}

pub fn create(
    conn: &Connection,
    nom: &str,
    description: &str,
    parent_id: Option<i64>,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO categories (nom, description, parent_id) VALUES (?1, ?2, ?3)",
        params![nom, description, parent_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Category>, AppError> {
    let cat = conn
        .query_row(
            "SELECT id, nom, description, parent_id FROM categories WHERE id = ?1",
            params![id],
            row_to_category,
        )
        .optional()?;
    Ok(cat)
}

pub fn list_all(conn: &Connection) -> Result<Vec<Category>, AppError> {
    let mut stmt =
        conn.prepare("SELECT id, nom, description, parent_id FROM categories ORDER BY nom")?;
    let cats = stmt
        .query_map([], row_to_category)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cats)
}
