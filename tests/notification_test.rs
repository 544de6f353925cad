//! Integration tests for the notification relay.

mod common;

use common::{demande_input, proposition_input, seed_user, setup_test_db};
use entraide::models::notification::{self, NotificationSujet};
use entraide::models::user::Role;
use entraide::workflow::{Decision, ReponseTransporteur, demande, proposition};

#[test]
fn test_assignment_notifies_the_transporter() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let prop = proposition::submit(&conn, &donor, &proposition_input(None)).unwrap();
    proposition::validate(&conn, &membre, prop.id, &Decision::Approuver).unwrap();
    proposition::assign_transporteur(&conn, &membre, prop.id, t.id).unwrap();

    let inbox = notification::find_by_destinataire(&conn, t.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sujet, NotificationSujet::Proposition(prop.id));
    assert!(!inbox[0].lu);

    let dem = demande::submit(&conn, &donor, &demande_input(None)).unwrap();
    demande::validate(&conn, &membre, dem.id, &Decision::Approuver).unwrap();
    demande::assign_transporteur(&conn, &membre, dem.id, t.id).unwrap();

    let inbox = notification::find_by_destinataire(&conn, t.id).unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(
        inbox
            .iter()
            .any(|n| n.sujet == NotificationSujet::Demande(dem.id))
    );
    println!("[PASS] test_assignment_notifies_the_transporter");
}

#[test]
fn test_handoff_notifies_the_validating_member() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let prop = proposition::submit(&conn, &donor, &proposition_input(None)).unwrap();
    proposition::validate(&conn, &membre, prop.id, &Decision::Approuver).unwrap();
    proposition::assign_transporteur(&conn, &membre, prop.id, t.id).unwrap();
    proposition::confirm_handoff(&conn, &donor, prop.id).unwrap();

    let inbox = notification::find_by_destinataire(&conn, membre.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sujet, NotificationSujet::Proposition(prop.id));
    println!("[PASS] test_handoff_notifies_the_validating_member");
}

#[test]
fn test_pickup_refusal_warns_the_member() {
    let (_dir, conn) = setup_test_db();
    let donor = seed_user(&conn, "alice", Role::Participant);
    let membre = seed_user(&conn, "marc", Role::Membre);
    let t = seed_user(&conn, "tom", Role::Transporteur);

    let prop = proposition::submit(&conn, &donor, &proposition_input(None)).unwrap();
    proposition::validate(&conn, &membre, prop.id, &Decision::Approuver).unwrap();
    proposition::assign_transporteur(&conn, &membre, prop.id, t.id).unwrap();
    let refus = ReponseTransporteur::Refuser {
        raison: "panne".to_string(),
    };
    proposition::transporteur_respond(&conn, &t, prop.id, &refus).unwrap();

    let inbox = notification::find_by_destinataire(&conn, membre.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sujet, NotificationSujet::Proposition(prop.id));
    println!("[PASS] test_pickup_refusal_warns_the_member");
}

#[test]
fn test_mark_read() {
    let (_dir, conn) = setup_test_db();
    let membre = seed_user(&conn, "marc", Role::Membre);

    let id = notification::create(
        &conn,
        membre.id,
        NotificationSujet::Demande(1),
        "Titre",
        "Corps",
    )
    .unwrap();

    notification::mark_read(&conn, id).unwrap();
    let notif = notification::find_by_id(&conn, id).unwrap().unwrap();
    assert!(notif.lu);
    println!("[PASS] test_mark_read");
}
