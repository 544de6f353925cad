//! Shared test infrastructure for workflow-layer tests.
//!
//! `setup_test_db()` creates a temporary SQLite database with the full
//! schema; the seed helpers create accounts for each role and baseline
//! submission inputs the individual tests tweak.

#![allow(dead_code)]

use rusqlite::Connection;
use tempfile::TempDir;

use entraide::auth::password;
use entraide::db::MIGRATIONS;
use entraide::models::category;
use entraide::models::user::{self, NewUser, Role};
use entraide::workflow::Actor;
use entraide::workflow::demande::DemandeInput;
use entraide::workflow::proposition::PropositionInput;

/// Returns (TempDir, Connection); the TempDir must stay alive for the
/// Connection to remain valid.
pub fn setup_test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let conn = Connection::open(&db_path).expect("Failed to open test DB");

    conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL;")
        .expect("Failed to set pragmas");
    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");

    (dir, conn)
}

/// Create an account with the given role and return it as an acting
/// identity for workflow calls.
pub fn seed_user(conn: &Connection, username: &str, role: Role) -> Actor {
    let vehicule = if role == Role::Transporteur {
        "Fourgon 12m3".to_string()
    } else {
        String::new()
    };
    let id = user::create(
        conn,
        &NewUser {
            username: username.to_string(),
            password: password::hash_password("motdepasse").unwrap(),
            email: format!("{username}@test.local"),
            role,
            phone: String::new(),
            adresse: String::new(),
            vehicule,
        },
    )
    .unwrap();
    Actor { id, role }
}

pub fn seed_categorie(conn: &Connection, nom: &str) -> i64 {
    category::create(conn, nom, "", None).unwrap()
}

/// A complete, valid proposition submission.
pub fn proposition_input(categorie_id: Option<i64>) -> PropositionInput {
    PropositionInput {
        categorie_id,
        type_materiel: "chaise".to_string(),
        quantite: Some(2),
        description: "Deux chaises en bois, solides".to_string(),
        etat: Some("bon_etat".to_string()),
        adresse_ramassage: "12 rue des Lilas".to_string(),
        ville: "Lyon".to_string(),
        code_postal: "69003".to_string(),
        disponibilite_ramassage: "Samedi matin".to_string(),
    }
}

/// A complete, valid demande submission.
pub fn demande_input(categorie_id: Option<i64>) -> DemandeInput {
    DemandeInput {
        categorie_id,
        type_materiel: "chaise".to_string(),
        description_besoin: "Besoin de chaises pour un studio".to_string(),
        quantite_desiree: Some(1),
        urgence: Some("haute".to_string()),
        adresse_livraison: "5 avenue Berthelot".to_string(),
        ville: "Lyon".to_string(),
        code_postal: "69007".to_string(),
    }
}
