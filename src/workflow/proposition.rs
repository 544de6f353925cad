//! State machine for donation offers.
//!
//! Main statuses: en_attente → validee | refusee, then validee → ramassee
//! (transporter receipt) → terminee, or validee → annulee. The transporter
//! mission runs as an orthogonal sub-state (en_attente → acceptee |
//! refusee); a refusal clears the assignment so the member can reassign.

use rusqlite::Connection;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::category;
use crate::models::don::{self, Don};
use crate::models::notification::NotificationSujet;
use crate::models::proposition::{self, Etat, NewProposition, Proposition, PropositionStatut};
use crate::models::user::{self, Role};
use crate::workflow::{Actor, Decision, ReponseTransporteur, notify, now};

/// Default storage location for converted stock entries.
const LIEU_STOCKAGE_DEFAUT: &str = "Entrepôt principal";

/// Raw submission fields, straight from the form.
#[derive(Debug, Clone, Deserialize)]
pub struct PropositionInput {
    pub categorie_id: Option<i64>,
    pub type_materiel: String,
    pub quantite: Option<i64>,
    pub description: String,
    pub etat: Option<String>,
    pub adresse_ramassage: String,
    pub ville: String,
    pub code_postal: String,
    pub disponibilite_ramassage: String,
}

fn load(conn: &Connection, id: i64) -> Result<Proposition, AppError> {
    proposition::find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

/// A donor submits a new offer. Every descriptive field except the
/// category and quantity is required; the quantity defaults to 1.
pub fn submit(
    conn: &Connection,
    actor: &Actor,
    input: &PropositionInput,
) -> Result<Proposition, AppError> {
    actor.require(Role::Participant)?;

    let mut errors = Vec::new();

    let type_materiel = input.type_materiel.trim();
    if type_materiel.is_empty() {
        errors.push("Le type de matériel est requis".to_string());
    }
    let description = input.description.trim();
    if description.is_empty() {
        errors.push("La description est requise".to_string());
    }
    let adresse = input.adresse_ramassage.trim();
    if adresse.is_empty() {
        errors.push("L'adresse de ramassage est requise".to_string());
    }
    let ville = input.ville.trim();
    if ville.is_empty() {
        errors.push("La ville est requise".to_string());
    }
    let code_postal = input.code_postal.trim();
    if code_postal.is_empty() {
        errors.push("Le code postal est requis".to_string());
    }
    let disponibilite = input.disponibilite_ramassage.trim();
    if disponibilite.is_empty() {
        errors.push("Les disponibilités de ramassage sont requises".to_string());
    }

    let quantite = input.quantite.unwrap_or(1);
    if quantite < 1 {
        errors.push("La quantité doit être au moins 1".to_string());
    }

    let etat = match input.etat.as_deref().map(str::trim) {
        None | Some("") => Etat::BonEtat,
        Some(s) => match Etat::from_str(s) {
            Some(e) => e,
            None => {
                errors.push(format!("État inconnu: {s}"));
                Etat::BonEtat
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

    let id = proposition::insert(
        conn,
        actor.id,
        &NewProposition {
            categorie_id: input.categorie_id,
            type_materiel: type_materiel.to_string(),
            quantite,
            description: description.to_string(),
            etat,
            adresse_ramassage: adresse.to_string(),
            ville: ville.to_string(),
            code_postal: code_postal.to_string(),
            disponibilite_ramassage: disponibilite.to_string(),
        },
    )?;
    load(conn, id)
}

/// A member approves or refuses a pending offer. Refusal is terminal and
/// requires a reason.
pub fn validate(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    decision: &Decision,
) -> Result<Proposition, AppError> {
    actor.require(Role::Membre)?;
    let prop = load(conn, id)?;

    if prop.statut != PropositionStatut::EnAttente {
        return Err(AppError::Precondition(format!(
            "La proposition #{id} n'est plus en attente de validation"
        )));
    }

    match decision {
        Decision::Approuver => {
            proposition::set_validation(conn, id, PropositionStatut::Validee, actor.id, &now(), "")?;
        }
        Decision::Refuser { raison } => {
            let raison = raison.trim();
            if raison.is_empty() {
                return Err(AppError::Validation(vec![
                    "Une raison de refus est requise".to_string(),
                ]));
            }
            proposition::set_validation(
                conn,
                id,
                PropositionStatut::Refusee,
                actor.id,
                &now(),
                raison,
            )?;
        }
    }
    load(conn, id)
}

/// A member assigns a pickup mission to an available transporter. The
/// transporter is notified and must accept or refuse.
pub fn assign_transporteur(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    transporteur_id: i64,
) -> Result<Proposition, AppError> {
    actor.require(Role::Membre)?;
    let prop = load(conn, id)?;

    if prop.statut != PropositionStatut::Validee {
        return Err(AppError::Precondition(format!(
            "La proposition #{id} doit être validée avant l'assignation d'un transporteur"
        )));
    }

    let transporteur = user::find_by_id(conn, transporteur_id)?
        .filter(|u| u.role == Role::Transporteur && u.disponible)
        .ok_or_else(|| {
            AppError::Validation(vec![
                "L'utilisateur choisi n'est pas un transporteur disponible".to_string(),
            ])
        })?;

    proposition::set_transporteur(conn, id, transporteur.id)?;
    notify(
        conn,
        transporteur.id,
        NotificationSujet::Proposition(id),
        &format!("Nouvelle mission: Proposition #{id}"),
        "Vous avez été assigné pour ramasser ce don. Veuillez accepter ou refuser la mission.",
    );
    load(conn, id)
}

/// The assigned transporter answers the pickup mission. A refusal records
/// the reason, clears the assignment and warns the validating member so the
/// offer can be reassigned.
pub fn transporteur_respond(
    conn: &Connection,
    actor: &Actor,
    id: i64,
    reponse: &ReponseTransporteur,
) -> Result<Proposition, AppError> {
    actor.require(Role::Transporteur)?;
    let prop = load(conn, id)?;

    let assigned = prop.transporteur_id.ok_or_else(|| {
        AppError::Precondition(format!("Aucun transporteur n'est assigné à la proposition #{id}"))
    })?;
    if assigned != actor.id {
        return Err(AppError::PermissionDenied(
            "Vous n'êtes pas le transporteur assigné à cette mission".to_string(),
        ));
    }
    if prop.statut != PropositionStatut::Validee {
        return Err(AppError::Precondition(format!(
            "La mission de la proposition #{id} ne peut plus être modifiée"
        )));
    }

    match reponse {
        ReponseTransporteur::Accepter => {
            proposition::set_transporteur_accepte(conn, id)?;
        }
        ReponseTransporteur::Refuser { raison } => {
            proposition::clear_transporteur_refus(conn, id, raison.trim())?;
            if let Some(membre_id) = prop.membre_validateur_id {
                notify(
                    conn,
                    membre_id,
                    NotificationSujet::Proposition(id),
                    &format!("Mission refusée: Proposition #{id}"),
                    "Le transporteur a refusé la mission. Veuillez assigner un autre transporteur.",
                );
            }
        }
    }
    load(conn, id)
}

/// The donor confirms the items were handed to the transporter. The
/// validating member is notified that the don can enter stock.
pub fn confirm_handoff(conn: &Connection, actor: &Actor, id: i64) -> Result<Proposition, AppError> {
    actor.require(Role::Participant)?;
    let prop = load(conn, id)?;

    if prop.donateur_id != actor.id {
        return Err(AppError::PermissionDenied(
            "Seul le donateur peut confirmer la remise".to_string(),
        ));
    }
    if prop.statut != PropositionStatut::Validee || prop.transporteur_id.is_none() {
        return Err(AppError::Precondition(format!(
            "La proposition #{id} n'est pas prête pour la remise"
        )));
    }

    proposition::set_remise_confirmee(conn, id)?;
    if let Some(membre_id) = prop.membre_validateur_id {
        notify(
            conn,
            membre_id,
            NotificationSujet::Proposition(id),
            &format!("Remise confirmée: Proposition #{id}"),
            "Le donateur a confirmé la remise au transporteur. Vous pouvez ajouter ce don au stock.",
        );
    }
    load(conn, id)
}

/// The assigned transporter confirms having received the items from the
/// donor; the proposition is then marked picked up.
pub fn confirm_receipt(conn: &Connection, actor: &Actor, id: i64) -> Result<Proposition, AppError> {
    actor.require(Role::Transporteur)?;
    let prop = load(conn, id)?;

    if prop.transporteur_id != Some(actor.id) {
        return Err(AppError::PermissionDenied(
            "Vous n'êtes pas le transporteur assigné à cette mission".to_string(),
        ));
    }
    if !prop.remise_confirmee {
        return Err(AppError::Precondition(
            "Le donateur n'a pas encore confirmé la remise".to_string(),
        ));
    }

    proposition::set_reception_confirmee(conn, id)?;
    load(conn, id)
}

/// A member converts a handed-off proposition into a stock entry. At most
/// one don ever exists per proposition; a second call is a conflict.
pub fn convert_to_stock(conn: &Connection, actor: &Actor, id: i64) -> Result<Don, AppError> {
    actor.require(Role::Membre)?;
    let prop = load(conn, id)?;

    if !prop.remise_confirmee {
        return Err(AppError::Precondition(
            "Le donateur n'a pas encore confirmé la remise au transporteur".to_string(),
        ));
    }
    if don::find_by_proposition(conn, id)?.is_some() {
        return Err(AppError::Conflict(format!(
            "La proposition #{id} est déjà en stock"
        )));
    }

    don::create_from_proposition(conn, &prop, LIEU_STOCKAGE_DEFAUT)
}

/// Close the offer. Allowed for a member or the assigned transporter, once
/// the donor has confirmed the handoff.
pub fn complete(conn: &Connection, actor: &Actor, id: i64) -> Result<Proposition, AppError> {
    let prop = load(conn, id)?;

    let allowed = match actor.role {
        Role::Membre => true,
        Role::Transporteur => prop.transporteur_id == Some(actor.id),
        _ => false,
    };
    if !allowed {
        return Err(AppError::PermissionDenied(
            "Seul un membre ou le transporteur assigné peut terminer la mission".to_string(),
        ));
    }

    if !prop.remise_confirmee {
        return Err(AppError::Precondition(
            "La remise au transporteur n'a pas encore été confirmée".to_string(),
        ));
    }
    if !matches!(
        prop.statut,
        PropositionStatut::Validee | PropositionStatut::Ramassee
    ) {
        return Err(AppError::Precondition(format!(
            "La proposition #{id} ne peut pas être terminée depuis son statut actuel"
        )));
    }

    proposition::set_statut(conn, id, PropositionStatut::Terminee)?;
    load(conn, id)
}

/// The donor withdraws a validated offer before handing anything over.
pub fn cancel(conn: &Connection, actor: &Actor, id: i64) -> Result<Proposition, AppError> {
    actor.require(Role::Participant)?;
    let prop = load(conn, id)?;

    if prop.donateur_id != actor.id {
        return Err(AppError::PermissionDenied(
            "Seul le donateur peut annuler sa proposition".to_string(),
        ));
    }
    if prop.statut != PropositionStatut::Validee || prop.remise_confirmee {
        return Err(AppError::Precondition(format!(
            "La proposition #{id} ne peut plus être annulée"
        )));
    }

    proposition::set_statut(conn, id, PropositionStatut::Annulee)?;
    load(conn, id)
}
