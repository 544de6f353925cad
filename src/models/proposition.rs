use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Physical condition of an offered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Etat {
    Neuf,
    BonEtat,
    EtatMoyen,
    AReparer,
}

impl Etat {
    pub fn as_str(self) -> &'static str {
        match self {
            Etat::Neuf => "neuf",
            Etat::BonEtat => "bon_etat",
            Etat::EtatMoyen => "etat_moyen",
            Etat::AReparer => "a_reparer",
        }
    }

    pub fn from_str(s: &str) -> Option<Etat> {
        match s {
            "neuf" => Some(Etat::Neuf),
            "bon_etat" => Some(Etat::BonEtat),
            "etat_moyen" => Some(Etat::EtatMoyen),
            "a_reparer" => Some(Etat::AReparer),
            _ => None,
        }
    }
}

/// Main lifecycle status of a proposition. `Refusee` and `Annulee` and
/// `Terminee` are terminal; `Ramassee` refines `Validee` once the assigned
/// transporter has confirmed receipt of the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropositionStatut {
    EnAttente,
    Validee,
    Refusee,
    Annulee,
    Ramassee,
    Terminee,
}

impl PropositionStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            PropositionStatut::EnAttente => "en_attente",
            PropositionStatut::Validee => "validee",
            PropositionStatut::Refusee => "refusee",
            PropositionStatut::Annulee => "annulee",
            PropositionStatut::Ramassee => "ramassee",
            PropositionStatut::Terminee => "terminee",
        }
    }

    pub fn from_str(s: &str) -> Option<PropositionStatut> {
        match s {
            "en_attente" => Some(PropositionStatut::EnAttente),
            "validee" => Some(PropositionStatut::Validee),
            "refusee" => Some(PropositionStatut::Refusee),
            "annulee" => Some(PropositionStatut::Annulee),
            "ramassee" => Some(PropositionStatut::Ramassee),
            "terminee" => Some(PropositionStatut::Terminee),
            _ => None,
        }
    }
}

/// Orthogonal sub-state of the transporter mission. Only meaningful once a
/// transporter is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransporteurStatut {
    EnAttente,
    Acceptee,
    Refusee,
}

impl TransporteurStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            TransporteurStatut::EnAttente => "en_attente",
            TransporteurStatut::Acceptee => "acceptee",
            TransporteurStatut::Refusee => "refusee",
        }
    }

    pub fn from_str(s: &str) -> Option<TransporteurStatut> {
        match s {
            "en_attente" => Some(TransporteurStatut::EnAttente),
            "acceptee" => Some(TransporteurStatut::Acceptee),
            "refusee" => Some(TransporteurStatut::Refusee),
            _ => None,
        }
    }
}

/// A donor's offer of a physical item, from submission to pickup.
#[derive(Debug, Clone, Serialize)]
pub struct Proposition {
    pub id: i64,
    pub donateur_id: i64,
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub quantite: i64,
    pub description: String,
    pub etat: Etat,
    pub adresse_ramassage: String,
    pub ville: String,
    pub code_postal: String,
    pub disponibilite_ramassage: String,
    pub statut: PropositionStatut,
    pub transporteur_id: Option<i64>,
    pub transporteur_statut: TransporteurStatut,
    pub raison_refus_transporteur: String,
    pub membre_validateur_id: Option<i64>,
    pub date_validation: Option<String>,
    pub raison_refus: String,
    pub remise_confirmee: bool,
    pub reception_confirmee: bool,
    pub date_proposition: String,
}

/// Validated field set for an insert; built by the workflow layer.
pub struct NewProposition {
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub quantite: i64,
    pub description: String,
    pub etat: Etat,
    pub adresse_ramassage: String,
    pub ville: String,
    pub code_postal: String,
    pub disponibilite_ramassage: String,
}

const SELECT_PROPOSITION: &str = "\
    SELECT id, donateur_id, categorie_id, type_materiel, quantite, description, etat, \
           adresse_ramassage, ville, code_postal, disponibilite_ramassage, statut, \
           transporteur_id, transporteur_statut, raison_refus_transporteur, \
           membre_validateur_id, date_validation, raison_refus, \
           remise_confirmee, reception_confirmee, date_proposition \
    FROM propositions";

fn row_to_proposition(row: &rusqlite::Row) -> rusqlite::Result<Proposition> {
    let etat: String = row.get("etat")?;
    let statut: String = row.get("statut")?;
    let transporteur_statut: String = row.get("transporteur_statut")?;
    Ok(Proposition {
        id: row.get("id")?,
        donateur_id: row.get("donateur_id")?,
        categorie_id: row.get("categorie_id")?,
        type_materiel: row.get("type_materiel")?,
        quantite: row.get("quantite")?,
        description: row.get("description")?,
        etat: Etat::from_str(&etat).unwrap_or(Etat::BonEtat),
        adresse_ramassage: row.get("adresse_ramassage")?,
        ville: row.get("ville")?,
        code_postal: row.get("code_postal")?,
        disponibilite_ramassage: row.get("disponibilite_ramassage")?,
        statut: PropositionStatut::from_str(&statut).unwrap_or(PropositionStatut::EnAttente),
        transporteur_id: row.get("transporteur_id")?,
        transporteur_statut: TransporteurStatut::from_str(&transporteur_statut)
            .unwrap_or(TransporteurStatut::EnAttente),
        raison_refus_transporteur: row.get("raison_refus_transporteur")?,
        membre_validateur_id: row.get("membre_validateur_id")?,
        date_validation: row.get("date_validation")?,
        raison_refus: row.get("raison_refus")?,
        remise_confirmee: row.get("remise_confirmee")?,
        reception_confirmee: row.get("reception_confirmee")?,
        date_proposition: row.get("date_proposition")?,
    })
}

pub fn insert(conn: &Connection, donateur_id: i64, p: &NewProposition) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO propositions (donateur_id, categorie_id, type_materiel, quantite, \
         description, etat, adresse_ramassage, ville, code_postal, disponibilite_ramassage) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            donateur_id,
            p.categorie_id,
            p.type_materiel,
            p.quantite,
            p.description,
            p.etat.as_str(),
            p.adresse_ramassage,
            p.ville,
            p.code_postal,
            p.disponibilite_ramassage,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Proposition>, AppError> {
    let prop = conn
        .query_row(
            &format!("{SELECT_PROPOSITION} WHERE id = ?1"),
            params![id],
            row_to_proposition,
        )
        .optional()?;
    Ok(prop)
}

pub fn find_by_donateur(conn: &Connection, donateur_id: i64) -> Result<Vec<Proposition>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_PROPOSITION} WHERE donateur_id = ?1 ORDER BY date_proposition DESC"
    ))?;
    let props = stmt
        .query_map(params![donateur_id], row_to_proposition)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(props)
}

/// Missions assigned to a transporter, most recent first.
pub fn find_by_transporteur(
    conn: &Connection,
    transporteur_id: i64,
) -> Result<Vec<Proposition>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_PROPOSITION} WHERE transporteur_id = ?1 ORDER BY date_proposition DESC"
    ))?;
    let props = stmt
        .query_map(params![transporteur_id], row_to_proposition)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(props)
}

pub fn find_by_statut(
    conn: &Connection,
    statut: PropositionStatut,
) -> Result<Vec<Proposition>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_PROPOSITION} WHERE statut = ?1 ORDER BY date_proposition DESC"
    ))?;
    let props = stmt
        .query_map(params![statut.as_str()], row_to_proposition)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(props)
}

/// Record the member's decision. `raison` is empty on approval.
pub fn set_validation(
    conn: &Connection,
    id: i64,
    statut: PropositionStatut,
    membre_id: i64,
    date: &str,
    raison: &str,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET statut = ?1, membre_validateur_id = ?2, date_validation = ?3, \
         raison_refus = ?4 WHERE id = ?5",
        params![statut.as_str(), membre_id, date, raison, id],
    )?;
    Ok(())
}

/// Assign a transporter; the mission sub-state resets to pending and any
/// previous refusal reason is cleared.
pub fn set_transporteur(conn: &Connection, id: i64, transporteur_id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET transporteur_id = ?1, transporteur_statut = 'en_attente', \
         raison_refus_transporteur = '' WHERE id = ?2",
        params![transporteur_id, id],
    )?;
    Ok(())
}

pub fn set_transporteur_accepte(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET transporteur_statut = 'acceptee' WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

/// A refusal clears the assignment so the member can pick someone else;
/// the reason is kept for the record.
pub fn clear_transporteur_refus(conn: &Connection, id: i64, raison: &str) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET transporteur_id = NULL, transporteur_statut = 'en_attente', \
         raison_refus_transporteur = ?1 WHERE id = ?2",
        params![raison, id],
    )?;
    Ok(())
}

pub fn set_remise_confirmee(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET remise_confirmee = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

/// Receipt by the transporter marks the proposition as picked up.
pub fn set_reception_confirmee(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET reception_confirmee = 1, statut = 'ramassee' WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn set_statut(conn: &Connection, id: i64, statut: PropositionStatut) -> Result<(), AppError> {
    conn.execute(
        "UPDATE propositions SET statut = ?1 WHERE id = ?2",
        params![statut.as_str(), id],
    )?;
    Ok(())
}
