use chrono::{Datelike, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::proposition::{Etat, Proposition};

/// Inventory status of a stocked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonStatut {
    EnStock,
    GardeMeuble,
    EnDepotVente,
    Reserve,
    Donne,
    Vendu,
    Perime,
}

impl DonStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            DonStatut::EnStock => "en_stock",
            DonStatut::GardeMeuble => "garde_meuble",
            DonStatut::EnDepotVente => "en_depot_vente",
            DonStatut::Reserve => "reserve",
            DonStatut::Donne => "donne",
            DonStatut::Vendu => "vendu",
            DonStatut::Perime => "perime",
        }
    }

    pub fn from_str(s: &str) -> Option<DonStatut> {
        match s {
            "en_stock" => Some(DonStatut::EnStock),
            "garde_meuble" => Some(DonStatut::GardeMeuble),
            "en_depot_vente" => Some(DonStatut::EnDepotVente),
            "reserve" => Some(DonStatut::Reserve),
            "donne" => Some(DonStatut::Donne),
            "vendu" => Some(DonStatut::Vendu),
            "perime" => Some(DonStatut::Perime),
            _ => None,
        }
    }
}

/// A stocked, inventory-tracked item derived from a fulfilled proposition.
/// Exactly one don per proposition.
#[derive(Debug, Clone, Serialize)]
pub struct Don {
    pub id: i64,
    pub proposition_id: i64,
    pub reference: String,
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub quantite: i64,
    pub description: String,
    pub etat: Etat,
    pub statut: DonStatut,
    pub lieu_stockage: String,
    pub valeur_estimee: Option<f64>,
    pub prix_vente: Option<f64>,
    pub date_vente: Option<String>,
    pub acheteur: String,
    pub date_don: Option<String>,
    pub date_entree_stock: String,
}

const SELECT_DON: &str = "\
    SELECT id, proposition_id, reference, categorie_id, type_materiel, quantite, description, \
           etat, statut, lieu_stockage, valeur_estimee, prix_vente, date_vente, acheteur, \
           date_don, date_entree_stock \
    FROM dons";

fn row_to_don(row: &rusqlite::Row) -> rusqlite::Result<Don> {
    let etat: String = row.get("etat")?;
    let statut: String = row.get("statut")?;
    Ok(Don {
        id: row.get("id")?,
        proposition_id: row.get("proposition_id")?,
        reference: row.get("reference")?,
        categorie_id: row.get("categorie_id")?,
        type_materiel: row.get("type_materiel")?,
        quantite: row.get("quantite")?,
        description: row.get("description")?,
        etat: Etat::from_str(&etat).unwrap_or(Etat::BonEtat),
        statut: DonStatut::from_str(&statut).unwrap_or(DonStatut::EnStock),
        lieu_stockage: row.get("lieu_stockage")?,
        valeur_estimee: row.get("valeur_estimee")?,
        prix_vente: row.get("prix_vente")?,
        date_vente: row.get("date_vente")?,
        acheteur: row.get("acheteur")?,
        date_don: row.get("date_don")?,
        date_entree_stock: row.get("date_entree_stock")?,
    })
}

/// Format the unique human-readable reference from an allocated id and the
/// current year, e.g. `DON-2026-000042`.
fn format_reference(year: i32, id: i64) -> String {
    format!("DON-{}-{:06}", year, id)
}

/// Reserve the next row id. The id is allocated before the insert so the
/// reference can be written in the same statement as the row itself.
fn allocate_id(conn: &Connection) -> Result<i64, AppError> {
    let id: i64 = conn.query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM dons", [], |row| {
        row.get(0)
    })?;
    Ok(id)
}

/// Create the stock entry for a completed proposition, copying its
/// descriptive fields. Single write: id and reference are known up front.
pub fn create_from_proposition(
    conn: &Connection,
    proposition: &Proposition,
    lieu_stockage: &str,
) -> Result<Don, AppError> {
    let id = allocate_id(conn)?;
    let reference = format_reference(Utc::now().year(), id);
    conn.execute(
        "INSERT INTO dons (id, proposition_id, reference, categorie_id, type_materiel, \
         quantite, description, etat, lieu_stockage) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            proposition.id,
            reference,
            proposition.categorie_id,
            proposition.type_materiel,
            proposition.quantite,
            proposition.description,
            proposition.etat.as_str(),
            lieu_stockage,
        ],
    )?;
    find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Don>, AppError> {
    let don = conn
        .query_row(
            &format!("{SELECT_DON} WHERE id = ?1"),
            params![id],
            row_to_don,
        )
        .optional()?;
    Ok(don)
}

pub fn find_by_proposition(conn: &Connection, proposition_id: i64) -> Result<Option<Don>, AppError> {
    let don = conn
        .query_row(
            &format!("{SELECT_DON} WHERE proposition_id = ?1"),
            params![proposition_id],
            row_to_don,
        )
        .optional()?;
    Ok(don)
}

pub fn list_all(conn: &Connection) -> Result<Vec<Don>, AppError> {
    let mut stmt = conn.prepare(&format!("{SELECT_DON} ORDER BY date_entree_stock DESC"))?;
    let dons = stmt.query_map([], row_to_don)?.collect::<Result<Vec<_>, _>>()?;
    Ok(dons)
}

/// Stock matching a desired category, in natural store order. Only items
/// still sitting in storage qualify; reserved or released items don't.
pub fn find_available_by_categorie(
    conn: &Connection,
    categorie_id: Option<i64>,
) -> Result<Vec<Don>, AppError> {
    let available = "statut IN ('en_stock', 'garde_meuble', 'en_depot_vente')";
    let mut dons = Vec::new();
    match categorie_id {
        Some(cat) => {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_DON} WHERE categorie_id = ?1 AND {available}"
            ))?;
            let rows = stmt.query_map(params![cat], row_to_don)?;
            for don in rows {
                dons.push(don?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_DON} WHERE categorie_id IS NULL AND {available}"
            ))?;
            let rows = stmt.query_map([], row_to_don)?;
            for don in rows {
                dons.push(don?);
            }
        }
    }
    Ok(dons)
}

pub fn set_statut(conn: &Connection, id: i64, statut: DonStatut) -> Result<(), AppError> {
    conn.execute(
        "UPDATE dons SET statut = ?1 WHERE id = ?2",
        params![statut.as_str(), id],
    )?;
    Ok(())
}

/// Release from stock: the item leaves inventory as a completed donation.
pub fn set_donne(conn: &Connection, id: i64, date: &str) -> Result<(), AppError> {
    conn.execute(
        "UPDATE dons SET statut = 'donne', date_don = ?1 WHERE id = ?2",
        params![date, id],
    )?;
    Ok(())
}
