//! Integration tests for the demande (donation request) workflow.

mod common;

use common::{demande_input, seed_user, setup_test_db};
use entraide::errors::AppError;
use entraide::models::demande::{DemandeStatut, Urgence};
use entraide::models::user::Role;
use entraide::workflow::demande;
use entraide::workflow::{Decision, ReponseTransporteur};

#[test]
fn test_submit_creates_pending_demande() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    assert_eq!(dem.statut, DemandeStatut::EnAttente);
    assert_eq!(dem.demandeur_id, requester.id);
    assert_eq!(dem.urgence, Urgence::Haute);
    println!("[PASS] test_submit_creates_pending_demande");
}

#[test]
fn test_submit_defaults() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);

    let mut input = demande_input(None);
    input.quantite_desiree = None;
    input.urgence = None;
    let dem = demande::submit(&conn, &requester, &input).unwrap();
    assert_eq!(dem.quantite_desiree, 1);
    assert_eq!(dem.urgence, Urgence::Moyenne);
    println!("[PASS] test_submit_defaults");
}

#[test]
fn test_submit_missing_fields() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);

    let mut input = demande_input(None);
    input.description_besoin = String::new();
    input.code_postal = "".to_string();
    match demande::submit(&conn, &requester, &input) {
        Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("Expected validation error, got {other:?}"),
    }
    println!("[PASS] test_submit_missing_fields");
}

#[test]
fn test_refused_demande_rejects_assignment() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    let refuse = Decision::Refuser {
        raison: "hors périmètre".to_string(),
    };
    let dem = demande::validate(&conn, &membre, dem.id, &refuse).unwrap();
    assert_eq!(dem.statut, DemandeStatut::Refusee);
    assert_eq!(dem.raison_refus, "hors périmètre");

    assert!(matches!(
        demande::assign_transporteur(&conn, &membre, dem.id, t.id),
        Err(AppError::Precondition(_))
    ));
    println!("[PASS] test_refused_demande_rejects_assignment");
}

#[test]
fn test_transporter_accept_starts_processing() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t.id).unwrap();

    let dem = demande::transporteur_respond(&conn, &t, dem.id, &ReponseTransporteur::Accepter)
        .unwrap();
    assert_eq!(dem.statut, DemandeStatut::EnCours);
    assert!(dem.transporteur_confirme);
    assert!(dem.transporteur_date_reponse.is_some());
    println!("[PASS] test_transporter_accept_starts_processing");
}

#[test]
fn test_transporter_refusal_reverts_to_validated() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t1 = seed_user(&conn, "tom", Role::Transporteur);
    let t2 = seed_user(&conn, "tim", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t1.id).unwrap();

    let refus = ReponseTransporteur::Refuser {
        raison: "véhicule indisponible".to_string(),
    };
    let dem = demande::transporteur_respond(&conn, &t1, dem.id, &refus).unwrap();
    assert_eq!(dem.statut, DemandeStatut::Validee);
    assert_eq!(dem.transporteur_id, None);
    assert!(!dem.transporteur_confirme);
    assert_eq!(dem.transporteur_raison_refus, "véhicule indisponible");

    // Reassignment works after the refusal cycle
    let dem = demande::assign_transporteur(&conn, &membre, dem.id, t2.id).unwrap();
    assert_eq!(dem.transporteur_id, Some(t2.id));
    assert_eq!(dem.transporteur_raison_refus, "");
    println!("[PASS] test_transporter_refusal_reverts_to_validated");
}

#[test]
fn test_delivery_runs_in_order() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t.id).unwrap();

    // Cannot start before accepting, cannot complete before starting
    assert!(matches!(
        demande::start_delivery(&conn, &t, dem.id),
        Err(AppError::Precondition(_))
    ));
    demande::transporteur_respond(&conn, &t, dem.id, &ReponseTransporteur::Accepter).unwrap();
    assert!(matches!(
        demande::complete_delivery(&conn, &t, dem.id),
        Err(AppError::Precondition(_))
    ));

    let dem = demande::start_delivery(&conn, &t, dem.id).unwrap();
    assert_eq!(dem.statut, DemandeStatut::EnLivraison);

    let dem = demande::complete_delivery(&conn, &t, dem.id).unwrap();
    assert_eq!(dem.statut, DemandeStatut::Terminee);
    assert!(dem.date_livraison.is_some());
    println!("[PASS] test_delivery_runs_in_order");
}

#[test]
fn test_confirm_reception_requires_completed() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();

    assert!(matches!(
        demande::confirm_reception(&conn, &requester, dem.id),
        Err(AppError::Precondition(_))
    ));
    println!("[PASS] test_confirm_reception_requires_completed");
}

#[test]
fn test_confirm_reception_is_idempotent() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t.id).unwrap();
    demande::transporteur_respond(&conn, &t, dem.id, &ReponseTransporteur::Accepter).unwrap();
    demande::start_delivery(&conn, &t, dem.id).unwrap();
    demande::complete_delivery(&conn, &t, dem.id).unwrap();

    let first = demande::confirm_reception(&conn, &requester, dem.id).unwrap();
    assert!(first.demande.reception_confirmee);
    assert!(!first.deja_confirmee);

    // Second call: no error, flag stays set, informational signal
    let second = demande::confirm_reception(&conn, &requester, dem.id).unwrap();
    assert!(second.demande.reception_confirmee);
    assert!(second.deja_confirmee);
    println!("[PASS] test_confirm_reception_is_idempotent");
}

#[test]
fn test_only_requester_confirms_reception() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let other = seed_user(&conn, "bob", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t.id).unwrap();
    demande::transporteur_respond(&conn, &t, dem.id, &ReponseTransporteur::Accepter).unwrap();
    demande::start_delivery(&conn, &t, dem.id).unwrap();
    demande::complete_delivery(&conn, &t, dem.id).unwrap();

    assert!(matches!(
        demande::confirm_reception(&conn, &other, dem.id),
        Err(AppError::PermissionDenied(_))
    ));
    println!("[PASS] test_only_requester_confirms_reception");
}

#[test]
fn test_cancel_before_transport_only() {
    let (_dir, conn) = setup_test_db();
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let dem = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    let dem = demande::cancel(&conn, &requester, dem.id).unwrap();
    assert_eq!(dem.statut, DemandeStatut::Annulee);

    let dem2 = demande::submit(&conn, &requester, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem2.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem2.id, t.id).unwrap();
    demande::transporteur_respond(&conn, &t, dem2.id, &ReponseTransporteur::Accepter).unwrap();

    assert!(matches!(
        demande::cancel(&conn, &requester, dem2.id),
        Err(AppError::Precondition(_))
    ));
    println!("[PASS] test_cancel_before_transport_only");
}
