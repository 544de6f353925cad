//! State machine for donation requests.
//!
//! en_attente → validee | refusee, then validee → en_cours (transporter
//! accepts) → en_livraison → terminee. A transporter refusal cycles the
//! record back to validee with the assignment cleared. Reception
//! confirmation by the requester refines terminee and is idempotent.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::category;
use crate::models::demande::{self, Demande, DemandeStatut, NewDemande, Urgence};
use crate::models::don::{self, DonStatut};
use crate::models::notification::NotificationSujet;
use crate::models::user::{self, Role};
use crate::workflow::{Actor, Decision, ReponseTransporteur, notify, now, today};

/// Raw submission fields, straight from the form.
#[derive(Debug, Clone, Deserialize)]
pub struct DemandeInput {
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub description_besoin: String,
    pub quantite_desiree: Option<i64>,
    pub urgence: Option<String>,
    pub adresse_livraison: String,
    pub ville: String,
    pub code_postal: String,
}

/// Result of a reception confirmation. `deja_confirmee` flags the
/// idempotent second call, which is informational rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct ReceptionOutcome {
    pub demande: Demande,
    pub deja_confirmee: bool,
}

fn load(conn: &Connection, id: i64) -> Result<Demande, AppError> {
    demande::find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

pub fn submit(conn: &Connection, actor: &Actor, input: &DemandeInput) -> Result<Demande, AppError> {
    actor.require(Role::Participant)?;

    let mut errors = Vec::new();

    let type_materiel = input.type_materiel.trim();
    if type_materiel.is_empty() {
        errors.push("Le type de matériel est requis".to_string());
    }
    let description = input.description_besoin.trim();
    if description.is_empty() {
        errors.push("La description du besoin est requise".to_string());
    }
    let adresse = input.adresse_livraison.trim();
    if adresse.is_empty() {
        errors.push("L'adresse de livraison est requise".to_string());
    }
    let ville = input.ville.trim();
    if ville.is_empty() {
        errors.push("La ville est requise".to_string());
    }
    let code_postal = input.code_postal.trim();
    if code_postal.is_empty() {
        errors.push("Le code postal est requis".to_string());
    }

    let quantite = input.quantite_desiree.unwrap_or(1);
    if quantite < 1 {
        errors.push("La quantité désirée doit être au moins 1".to_string());
    }

    let urgence = match input.urgence.as_deref().map(str::trim) {
        None | Some("") => Urgence::Moyenne,
        Some(s) => match Urgence::from_str(s) {
            Some(u) => u,
            None => {
                errors.push(format!("Niveau d'urgence inconnu: {s}"));
                Urgence::Moyenne
            }
        },
    };

    if let Some(cat_id) = input.categorie_id {
        if category::find_by_id(conn, cat_id)?.is_none() {
            errors.push("Catégorie inconnue".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id = demande::insert(
        conn,
        actor.id,
        &NewDemande {
            categorie_id: input.categorie_id,
            type_materiel: type_materiel.to_string(),
            description_besoin: description.to_string(),
            quantite_desiree: quantite,
            urgence,
            adresse_livraison: adresse.to_string(),
            ville: ville.to_string(),
            code_postal: code_postal.to_string(),
        },
    )?;
    load(conn, id)
}

/// A member approves or refuses a pending request. Refusal is terminal and
/// requires a reason.
pub fn validate(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    decision: &Decision,
) -> Result<Demande, AppError> {
    actor.require(Role::Membre)?;
    let dem = load(conn, id)?;

    if dem.statut != DemandeStatut::EnAttente {
        return Err(AppError::Precondition(format!(
            "La demande #{id} n'est plus en attente de validation"
        )));
    }

    match decision {
        Decision::Approuver => {
            demande::set_validation(conn, id, DemandeStatut::Validee, actor.id, &now(), "")?;
        }
        Decision::Refuser { raison } => {
            let raison = raison.trim();
            if raison.is_empty() {
                return Err(AppError::Validation(vec![
                    "Une raison de refus est requise".to_string(),
                ]));
            }
            demande::set_validation(conn, id, DemandeStatut::Refusee, actor.id, &now(), raison)?;
        }
    }
    load(conn, id)
}

/// A member assigns the delivery to an available transporter.
pub fn assign_transporteur(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    transporteur_id: i64,
) -> Result<Demande, AppError> {
    actor.require(Role::Membre)?;
    let dem = load(conn, id)?;

    if dem.statut != DemandeStatut::Validee {
        return Err(AppError::Precondition(format!(
            "La demande #{id} doit être validée avant l'assignation d'un transporteur"
        )));
    }

    let transporteur = user::find_by_id(conn, transporteur_id)?
        .filter(|u| u.role == Role::Transporteur && u.disponible)
        .ok_or_else(|| {
            AppError::Validation(vec![
                "L'utilisateur choisi n'est pas un transporteur disponible".to_string(),
            ])
        })?;

    demande::set_transporteur(conn, id, transporteur.id)?;
    notify(
        conn,
        transporteur.id,
        NotificationSujet::Demande(id),
        &format!("Nouvelle mission: demande #{id}"),
        "Vous avez été assigné pour transporter ce don. Veuillez accepter ou refuser la mission.",
    );
    load(conn, id)
}

/// The assigned transporter answers the delivery mission. Acceptance moves
/// the demande into en_cours; refusal reverts it to validee so the member
/// can assign someone else.
pub fn transporteur_respond(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    reponse: &ReponseTransporteur,
) -> Result<Demande, AppError> {
    actor.require(Role::Transporteur)?;
    let dem = load(conn, id)?;

    let assigned = dem.transporteur_id.ok_or_else(|| {
        AppError::Precondition(format!("Aucun transporteur n'est assigné à la demande #{id}"))
    })?;
    if assigned != actor.id {
        return Err(AppError::PermissionDenied(
            "Vous n'êtes pas le transporteur assigné à cette mission".to_string(),
        ));
    }
    if dem.statut != DemandeStatut::Validee {
        return Err(AppError::Precondition(format!(
            "La mission de la demande #{id} ne peut plus être acceptée ou refusée"
        )));
    }

    match reponse {
        ReponseTransporteur::Accepter => {
            demande::set_transporteur_accepte(conn, id, &now())?;
        }
        ReponseTransporteur::Refuser { raison } => {
            demande::set_transporteur_refus(conn, id, raison.trim(), &now())?;
        }
    }
    load(conn, id)
}

/// The transporter starts the delivery run.
pub fn start_delivery(conn: &Connection, actor: &Actor, id: i64) -> Result<Demande, AppError> {
    actor.require(Role::Transporteur)?;
    let dem = load(conn, id)?;

    if dem.transporteur_id != Some(actor.id) {
        return Err(AppError::PermissionDenied(
            "Vous n'êtes pas le transporteur assigné à cette mission".to_string(),
        ));
    }
    if dem.statut != DemandeStatut::EnCours {
        return Err(AppError::Precondition(format!(
            "La livraison de la demande #{id} ne peut pas démarrer depuis son statut actuel"
        )));
    }

    demande::set_statut(conn, id, DemandeStatut::EnLivraison)?;
    load(conn, id)
}

/// The transporter completes the delivery; the delivery date is stamped.
pub fn complete_delivery(conn: &Connection, actor: &Actor, id: i64) -> Result<Demande, AppError> {
    actor.require(Role::Transporteur)?;
    let dem = load(conn, id)?;

    if dem.transporteur_id != Some(actor.id) {
        return Err(AppError::PermissionDenied(
            "Vous n'êtes pas le transporteur assigné à cette mission".to_string(),
        ));
    }
    if dem.statut != DemandeStatut::EnLivraison {
        return Err(AppError::Precondition(format!(
            "La demande #{id} n'est pas en cours de livraison"
        )));
    }

    demande::set_livraison_terminee(conn, id, &today())?;
    load(conn, id)
}

/// A member earmarks a stocked don for this demande. The don must match
/// the desired category and must not already be promised to another live
/// demande; it is marked reserved. The demande statut is unchanged.
pub fn attribute_don(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    don_id: i64,
) -> Result<Demande, AppError> {
    actor.require(Role::Membre)?;
    let dem = load(conn, id)?;

    if matches!(
        dem.statut,
        DemandeStatut::EnAttente | DemandeStatut::Refusee | DemandeStatut::Annulee
    ) {
        return Err(AppError::Precondition(format!(
            "La demande #{id} n'est pas validée"
        )));
    }

    let don = don::find_by_id(conn, don_id)?.ok_or(AppError::NotFound)?;
    if don.categorie_id != dem.categorie_id {
        return Err(AppError::Precondition(
            "Le don ne correspond pas à la catégorie recherchée".to_string(),
        ));
    }
    if !matches!(
        don.statut,
        DonStatut::EnStock | DonStatut::GardeMeuble | DonStatut::EnDepotVente
    ) {
        return Err(AppError::Conflict(format!(
            "Le don {} n'est pas disponible en stock",
            don.reference
        )));
    }
    if let Some(autre) = demande::find_attribution_of_don(conn, don_id, id)? {
        return Err(AppError::Conflict(format!(
            "Le don {} est déjà attribué à la demande #{}",
            don.reference, autre.id
        )));
    }

    demande::set_attribution(conn, id, don_id, &now())?;
    don::set_statut(conn, don_id, DonStatut::Reserve)?;
    load(conn, id)
}

/// The requester confirms reception of the delivered items. Only valid on
/// a completed demande; calling it again is a no-op with a signal.
pub fn confirm_reception(
    conn: &Connection,
    actor: &Actor,
    id: i64,
) -> Result<ReceptionOutcome, AppError> {
    actor.require(Role::Participant)?;
    let dem = load(conn, id)?;

    if dem.demandeur_id != actor.id {
        return Err(AppError::PermissionDenied(
            "Seul le demandeur peut confirmer la réception".to_string(),
        ));
    }
    if dem.statut != DemandeStatut::Terminee {
        return Err(AppError::Precondition(format!(
            "La demande #{id} n'est pas encore prête pour la confirmation de réception"
        )));
    }

    if dem.reception_confirmee {
        return Ok(ReceptionOutcome {
            demande: dem,
            deja_confirmee: true,
        });
    }

    demande::set_reception_confirmee(conn, id)?;
    Ok(ReceptionOutcome {
        demande: load(conn, id)?,
        deja_confirmee: false,
    })
}

/// The requester withdraws a demande that no transporter has taken on yet.
pub fn cancel(conn: &Connection, actor: &Actor, id: i64) -> Result<Demande, AppError> {
    actor.require(Role::Participant)?;
    let dem = load(conn, id)?;

    if dem.demandeur_id != actor.id {
        return Err(AppError::PermissionDenied(
            "Seul le demandeur peut annuler sa demande".to_string(),
        ));
    }
    if !matches!(dem.statut, DemandeStatut::EnAttente | DemandeStatut::Validee) {
        return Err(AppError::Precondition(format!(
            "La demande #{id} ne peut plus être annulée"
        )));
    }

    demande::set_statut(conn, id, DemandeStatut::Annulee)?;
    load(conn, id)
}
