//! End-to-end run of both pipelines: an offered item travels into stock,
//! gets attributed to a request, is delivered, acknowledged, and finally
//! released from inventory.

mod common;

use common::{demande_input, proposition_input, seed_categorie, seed_user, setup_test_db};
use entraide::models::demande::DemandeStatut;
use entraide::models::don::{self, DonStatut};
use entraide::models::proposition::PropositionStatut;
use entraide::models::user::Role;
use entraide::workflow::{Decision, ReponseTransporteur, demande, proposition, stock};

#[test]
fn test_donation_reaches_the_recipient() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let requester = seed_user(&conn, "nina", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let transporteur = seed_user(&conn, "tom", Role::Transporteur);
    let mobilier = seed_categorie(&conn, "Mobilier");

    // Supply side: offer → validation → pickup → stock
    let prop = proposition::submit(&conn, &donor, &proposition_input(Some(mobilier))).unwrap();
    proposition::validate(&conn, &membre, prop.id, &Decision::Approuver).unwrap();
    proposition::assign_transporteur(&conn, &membre, prop.id, transporteur.id).unwrap();
    proposition::transporteur_respond(&conn, &transporteur, prop.id, &ReponseTransporteur::Accepter)
        .unwrap();
    proposition::confirm_handoff(&conn, &donor, prop.id).unwrap();
    proposition::confirm_receipt(&conn, &transporteur, prop.id).unwrap();
    let don = proposition::convert_to_stock(&conn, &membre, prop.id).unwrap();
    let prop = proposition::complete(&conn, &membre, prop.id).unwrap();
    assert_eq!(prop.statut, PropositionStatut::Terminee);
    assert_eq!(don.statut, DonStatut::EnStock);

    // Demand side: request → validation → matching → delivery
    let dem = demande::submit(&conn, &requester, &demande_input(Some(mobilier))).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();

    let candidates = stock::related_stock(&conn, dem.id).unwrap();
    assert_eq!(candidates.len(), 1);
    demande::attribute_don(&conn, &membre, dem.id, candidates[0].id).unwrap();

    demande::assign_transporteur(&conn, &membre, dem.id, transporteur.id).unwrap();
    demande::transporteur_respond(&conn, &transporteur, dem.id, &ReponseTransporteur::Accepter)
        .unwrap();
    demande::start_delivery(&conn, &transporteur, dem.id).unwrap();
    let dem = demande::complete_delivery(&conn, &transporteur, dem.id).unwrap();
    assert_eq!(dem.statut, DemandeStatut::Terminee);

    // Recipient acknowledges; the don leaves inventory
    let outcome = demande::confirm_reception(&conn, &requester, dem.id).unwrap();
    assert!(outcome.demande.reception_confirmee);

    let don = stock::release_from_stock(&conn, &membre, don.id).unwrap();
    assert_eq!(don.statut, DonStatut::Donne);

    // The proposition's stock entry is the one that reached the requester
    let by_prop = don::find_by_proposition(&conn, prop.id).unwrap().unwrap();
    assert_eq!(by_prop.id, don.id);
    println!("[PASS] test_donation_reaches_the_recipient");
}
