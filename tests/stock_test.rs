//! Integration tests for stock entries, matching and release.

mod common;

use common::{demande_input, proposition_input, seed_categorie, seed_user, setup_test_db};
use entraide::errors::AppError;
use entraide::models::don::{self, Don, DonStatut};
use entraide::models::user::Role;
use entraide::workflow::{Actor, Decision, ReponseTransporteur, demande, proposition, stock};
use regex::Regex;
use rusqlite::Connection;

/// Drive a proposition through the full pickup pipeline and into stock.
fn make_don(
    conn: &Connection,
    donor: &Actor,
    membre: &Actor,
    transporteur: &Actor,
    categorie_id: Option<i64>,
) -> Don {
    let prop = proposition::submit(conn, donor, &proposition_input(categorie_id)).unwrap();
    proposition::validate(conn, membre, prop.id, &Decision::Approuver).unwrap();
    proposition::assign_transporteur(conn, membre, prop.id, transporteur.id).unwrap();
    proposition::transporteur_respond(conn, transporteur, prop.id, &ReponseTransporteur::Accepter)
        .unwrap();
    proposition::confirm_handoff(conn, donor, prop.id).unwrap();
    proposition::confirm_receipt(conn, transporteur, prop.id).unwrap();
    proposition::convert_to_stock(conn, membre, prop.id).unwrap()
}

#[test]
fn test_reference_format_and_uniqueness() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let d1 = make_don(&conn, &donor, &membre, &t, None);
    let d2 = make_don(&conn, &donor, &membre, &t, None);

    let pattern = Regex::new(r"^DON-\d{4}-\d{6}$").unwrap();
    assert!(pattern.is_match(&d1.reference), "bad reference {}", d1.reference);
    assert!(pattern.is_match(&d2.reference), "bad reference {}", d2.reference);
    assert_ne!(d1.reference, d2.reference);

    let year = chrono::Datelike::year(&chrono::Utc::now());
    assert!(d1.reference.starts_with(&format!("DON-{year}-")));
    println!("[PASS] test_reference_format_and_uniqueness");
}

#[test]
fn test_attribution_checks_category() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);
    let mobilier = seed_categorie(&conn, "Mobilier");
    let informatique = seed_categorie(&conn, "Informatique");

    let don = make_don(&conn, &donor, &membre, &t, Some(mobilier));

    let dem = demande::submit(&conn, &requester, &demande_input(Some(informatique))).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();

    // Wrong category
    assert!(matches!(
        demande::attribute_don(&conn, &membre, dem.id, don.id),
        Err(AppError::Precondition(_))
    ));

    let dem2 = demande::submit(&conn, &requester, &demande_input(Some(mobilier))).unwrap();
    demande::validate(&conn, &membre, dem2.id, &Decision::Approuver).unwrap();
    let dem2 = demande::attribute_don(&conn, &membre, dem2.id, don.id).unwrap();
    assert_eq!(dem2.don_id, Some(don.id));
    assert!(dem2.date_attribution.is_some());
    // Attribution alone does not advance the demande
    assert_eq!(dem2.statut, entraide::models::demande::DemandeStatut::Validee);

    // The don is now held for that demande
    let don = don::find_by_id(&conn, don.id).unwrap().unwrap();
    assert_eq!(don.statut, DonStatut::Reserve);
    println!("[PASS] test_attribution_checks_category");
}

#[test]
fn test_don_serves_at_most_one_demande() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);
    let mobilier = seed_categorie(&conn, "Mobilier");

    let don = make_don(&conn, &donor, &membre, &t, Some(mobilier));

    let dem1 = demande::submit(&conn, &requester, &demande_input(Some(mobilier))).unwrap();
    demande::validate(&conn, &membre, dem1.id, &Decision::Approuver).unwrap();
    demande::attribute_don(&conn, &membre, dem1.id, don.id).unwrap();

    let dem2 = demande::submit(&conn, &requester, &demande_input(Some(mobilier))).unwrap();
    demande::validate(&conn, &membre, dem2.id, &Decision::Approuver).unwrap();
    assert!(matches!(
        demande::attribute_don(&conn, &membre, dem2.id, don.id),
        Err(AppError::Conflict(_))
    ));
    println!("[PASS] test_don_serves_at_most_one_demande");
}

#[test]
fn test_related_stock_filters_by_category() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);
    let mobilier = seed_categorie(&conn, "Mobilier");
    let informatique = seed_categorie(&conn, "Informatique");

    let d1 = make_don(&conn, &donor, &membre, &t, Some(mobilier));
    let _d2 = make_don(&conn, &donor, &membre, &t, Some(informatique));

    let dem = demande::submit(&conn, &requester, &demande_input(Some(mobilier))).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();

    let related = stock::related_stock(&conn, dem.id).unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, d1.id);
    println!("[PASS] test_related_stock_filters_by_category");
}

#[test]
fn test_available_transporteurs_honors_flag() {
    let (_dir, conn) = setup_test_db();
    let t1 = seed_user(&conn, "tom", Role::Transporteur);
    let t2 = seed_user(&conn, "tim", Role::Transporteur);
    seed_user(&conn, "marc", Role::Membre);

    conn.execute(
        "UPDATE users SET disponible = 0 WHERE id = ?1",
        rusqlite::params![t2.id],
    )
    .unwrap();

    let available = stock::available_transporteurs(&conn).unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, t1.id);
    println!("[PASS] test_available_transporteurs_honors_flag");
}

#[test]
fn test_unavailable_transporter_cannot_be_assigned() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);
    conn.execute(
        "UPDATE users SET disponible = 0 WHERE id = ?1",
        rusqlite::params![t.id],
    )
    .unwrap();

    let prop = proposition::submit(&conn, &donor, &proposition_input(None)).unwrap();
    proposition::validate(&conn, &membre, prop.id, &Decision::Approuver).unwrap();
    assert!(matches!(
        proposition::assign_transporteur(&conn, &membre, prop.id, t.id),
        Err(AppError::Validation(_))
    ));
    println!("[PASS] test_unavailable_transporter_cannot_be_assigned");
}

#[test]
fn test_release_requires_confirmed_reception() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);
    let mobilier = seed_categorie(&conn, "Mobilier");

    let don = make_don(&conn, &donor, &membre, &t, Some(mobilier));

    let dem = demande::submit(&conn, &requester, &demande_input(Some(mobilier))).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::attribute_don(&conn, &membre, dem.id, don.id).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t.id).unwrap();
    demande::transporteur_respond(&conn, &t, dem.id, &ReponseTransporteur::Accepter).unwrap();
    demande::start_delivery(&conn, &t, dem.id).unwrap();
    demande::complete_delivery(&conn, &t, dem.id).unwrap();

    // Delivered but not yet acknowledged by the requester
    assert!(matches!(
        stock::release_from_stock(&conn, &membre, don.id),
        Err(AppError::Conflict(_))
    ));

    demande::confirm_reception(&conn, &requester, dem.id).unwrap();
    let don = stock::release_from_stock(&conn, &membre, don.id).unwrap();
    assert_eq!(don.statut, DonStatut::Donne);
    assert!(don.date_don.is_some());
    println!("[PASS] test_release_requires_confirmed_reception");
}
