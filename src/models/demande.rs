use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgence {
    Faible,
    Moyenne,
    Haute,
    Urgente,
}

impl Urgence {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgence::Faible => "faible",
            Urgence::Moyenne => "moyenne",
            Urgence::Haute => "haute",
            Urgence::Urgente => "urgente",
        }
    }

    pub fn from_str(s: &str) -> Option<Urgence> {
        match s {
            "faible" => Some(Urgence::Faible),
            "moyenne" => Some(Urgence::Moyenne),
            "haute" => Some(Urgence::Haute),
            "urgente" => Some(Urgence::Urgente),
            _ => None,
        }
    }
}

/// Lifecycle status of a demande. A transporter refusal cycles the record
/// back to `Validee` so the member can assign someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandeStatut {
    EnAttente,
    EnCours,
    Validee,
    Refusee,
    EnLivraison,
    Terminee,
    Annulee,
}

impl DemandeStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            DemandeStatut::EnAttente => "en_attente",
            DemandeStatut::EnCours => "en_cours",
            DemandeStatut::Validee => "validee",
            DemandeStatut::Refusee => "refusee",
            DemandeStatut::EnLivraison => "en_livraison",
            DemandeStatut::Terminee => "terminee",
            DemandeStatut::Annulee => "annulee",
        }
    }

    pub fn from_str(s: &str) -> Option<DemandeStatut> {
        match s {
            "en_attente" => Some(DemandeStatut::EnAttente),
            "en_cours" => Some(DemandeStatut::EnCours),
            "validee" => Some(DemandeStatut::Validee),
            "refusee" => Some(DemandeStatut::Refusee),
            "en_livraison" => Some(DemandeStatut::EnLivraison),
            "terminee" => Some(DemandeStatut::Terminee),
            "annulee" => Some(DemandeStatut::Annulee),
            _ => None,
        }
    }
}

/// A participant's request for an item, from submission to delivery and
/// reception confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct Demande {
    pub id: i64,
    pub demandeur_id: i64,
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub description_besoin: String,
    pub quantite_desiree: i64,
    pub urgence: Urgence,
    pub statut: DemandeStatut,
    pub membre_validateur_id: Option<i64>,
    pub date_validation: Option<String>,
    pub raison_refus: String,
    pub adresse_livraison: String,
    pub ville: String,
    pub code_postal: String,
    pub don_id: Option<i64>,
    pub date_attribution: Option<String>,
    pub transporteur_id: Option<i64>,
    pub transporteur_confirme: bool,
    pub transporteur_date_reponse: Option<String>,
    pub transporteur_raison_refus: String,
    pub date_livraison: Option<String>,
    pub reception_confirmee: bool,
    pub date_demande: String,
}

pub struct NewDemande {
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub description_besoin: String,
    pub quantite_desiree: i64,
    pub urgence: Urgence,
    pub adresse_livraison: String,
    pub ville: String,
    pub code_postal: String,
}

const SELECT_DEMANDE: &str = "\
    SELECT id, demandeur_id, categorie_id, type_materiel, description_besoin, \
           quantite_desiree, urgence, statut, membre_validateur_id, date_validation, \
           raison_refus, adresse_livraison, ville, code_postal, don_id, date_attribution, \
           transporteur_id, transporteur_confirme, transporteur_date_reponse, \
           transporteur_raison_refus, date_livraison, reception_confirmee, date_demande \
    FROM demandes";

fn row_to_demande(row: &rusqlite::Row) -> rusqlite::Result<Demande> {
    let urgence: String = row.get("urgence")?;
    let statut: String = row.get("statut")?;
    Ok(Demande {
        id: row.get("id")?,
        demandeur_id: row.get("demandeur_id")?,
        categorie_id: row.get("categorie_id")?,
        type_materiel: row.get("type_materiel")?,
        description_besoin: row.get("description_besoin")?,
        quantite_desiree: row.get("quantite_desiree")?,
        urgence: Urgence::from_str(&urgence).unwrap_or(Urgence::Moyenne),
        statut: DemandeStatut::from_str(&statut).unwrap_or(DemandeStatut::EnAttente),
        membre_validateur_id: row.get("membre_validateur_id")?,
        date_validation: row.get("date_validation")?,
        raison_refus: row.get("raison_refus")?,
        adresse_livraison: row.get("adresse_livraison")?,
        ville: row.get("ville")?,
        code_postal: row.get("code_postal")?,
        don_id: row.get("don_id")?,
        date_attribution: row.get("date_attribution")?,
        transporteur_id: row.get("transporteur_id")?,
        transporteur_confirme: row.get("transporteur_confirme")?,
        transporteur_date_reponse: row.get("transporteur_date_reponse")?,
        transporteur_raison_refus: row.get("transporteur_raison_refus")?,
        date_livraison: row.get("date_livraison")?,
        reception_confirmee: row.get("reception_confirmee")?,
        date_demande: row.get("date_demande")?,
    })
}

pub fn insert(conn: &Connection, demandeur_id: i64, d: &NewDemande) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO demandes (demandeur_id, categorie_id, type_materiel, description_besoin, \
         quantite_desiree, urgence, adresse_livraison, ville, code_postal) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            demandeur_id,
            d.categorie_id,
            d.type_materiel,
            d.description_besoin,
            d.quantite_desiree,
            d.urgence.as_str(),
            d.adresse_livraison,
            d.ville,
            d.code_postal,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Demande>, AppError> {
    let demande = conn
        .query_row(
            &format!("{SELECT_DEMANDE} WHERE id = ?1"),
            params![id],
            row_to_demande,
        )
        .optional()?;
    Ok(demande)
}

pub fn find_by_demandeur(conn: &Connection, demandeur_id: i64) -> Result<Vec<Demande>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DEMANDE} WHERE demandeur_id = ?1 ORDER BY date_demande DESC"
    ))?;
    let demandes = stmt
        .query_map(params![demandeur_id], row_to_demande)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(demandes)
}

pub fn find_by_transporteur(
    conn: &Connection,
    transporteur_id: i64,
) -> Result<Vec<Demande>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DEMANDE} WHERE transporteur_id = ?1 AND statut != 'annulee' \
         ORDER BY date_demande DESC"
    ))?;
    let demandes = stmt
        .query_map(params![transporteur_id], row_to_demande)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(demandes)
}

pub fn find_by_statut(conn: &Connection, statut: DemandeStatut) -> Result<Vec<Demande>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DEMANDE} WHERE statut = ?1 ORDER BY \
         CASE urgence WHEN 'urgente' THEN 0 WHEN 'haute' THEN 1 WHEN 'moyenne' THEN 2 ELSE 3 END, \
         date_demande DESC"
    ))?;
    let demandes = stmt
        .query_map(params![statut.as_str()], row_to_demande)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(demandes)
}

/// Live demande currently holding an attribution of the given don, if any.
/// `exclude_id` skips the demande being attributed itself.
pub fn find_attribution_of_don(
    conn: &Connection,
    don_id: i64,
    exclude_id: i64,
) -> Result<Option<Demande>, AppError> {
    let demande = conn
        .query_row(
            &format!(
                "{SELECT_DEMANDE} WHERE don_id = ?1 AND id != ?2 \
                 AND statut NOT IN ('refusee', 'annulee') LIMIT 1"
            ),
            params![don_id, exclude_id],
            row_to_demande,
        )
        .optional()?;
    Ok(demande)
}

/// Demande entitled to release the don from stock: attribution + confirmed
/// reception by the requester.
pub fn find_confirmed_by_don(conn: &Connection, don_id: i64) -> Result<Option<Demande>, AppError> {
    let demande = conn
        .query_row(
            &format!("{SELECT_DEMANDE} WHERE don_id = ?1 AND reception_confirmee = 1 LIMIT 1"),
            params![don_id],
            row_to_demande,
        )
        .optional()?;
    Ok(demande)
}

pub fn set_validation(
    conn: &Connection,
    id: i64,
    statut: DemandeStatut,
    membre_id: i64,
    date: &str,
    raison: &str,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET statut = ?1, membre_validateur_id = ?2, date_validation = ?3, \
         raison_refus = ?4 WHERE id = ?5",
        params![statut.as_str(), membre_id, date, raison, id],
    )?;
    Ok(())
}

/// Assign the delivery transporter, clearing any previous response.
pub fn set_transporteur(conn: &Connection, id: i64, transporteur_id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET transporteur_id = ?1, transporteur_confirme = 0, \
         transporteur_date_reponse = NULL, transporteur_raison_refus = '' WHERE id = ?2",
        params![transporteur_id, id],
    )?;
    Ok(())
}

pub fn set_transporteur_accepte(conn: &Connection, id: i64, date: &str) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET transporteur_confirme = 1, transporteur_date_reponse = ?1, \
         statut = 'en_cours' WHERE id = ?2",
        params![date, id],
    )?;
    Ok(())
}

/// Refusal reverts the demande to `validee` and frees the slot for a new
/// assignment; the reason and response time are kept.
pub fn set_transporteur_refus(
    conn: &Connection,
    id: i64,
    raison: &str,
    date: &str,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET transporteur_id = NULL, transporteur_confirme = 0, \
         transporteur_raison_refus = ?1, transporteur_date_reponse = ?2, statut = 'validee' \
         WHERE id = ?3",
        params![raison, date, id],
    )?;
    Ok(())
}

pub fn set_statut(conn: &Connection, id: i64, statut: DemandeStatut) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET statut = ?1 WHERE id = ?2",
        params![statut.as_str(), id],
    )?;
    Ok(())
}

pub fn set_livraison_terminee(conn: &Connection, id: i64, date: &str) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET statut = 'terminee', date_livraison = ?1 WHERE id = ?2",
        params![date, id],
    )?;
    Ok(())
}

pub fn set_attribution(conn: &Connection, id: i64, don_id: i64, date: &str) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET don_id = ?1, date_attribution = ?2 WHERE id = ?3",
        params![don_id, date, id],
    )?;
    Ok(())
}

pub fn set_reception_confirmee(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE demandes SET reception_confirmee = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}
