use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Capability profile of an account. Exactly one per user; authorization
/// is a match on this tag, never a probe for related profile rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Participant,
    Membre,
    Transporteur,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Membre => "membre",
            Role::Transporteur => "transporteur",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Role> {
        match s {
            "participant" => Some(Role::Participant),
            "membre" => Some(Role::Membre),
            "transporteur" => Some(Role::Transporteur),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Internal user struct for authentication — includes the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub adresse: String,
    pub vehicule: String,
    pub disponible: bool,
    pub created_at: String,
}

/// Safe projection for API responses — no password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub adresse: String,
    pub vehicule: String,
    pub disponible: bool,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        UserPublic {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            phone: u.phone,
            adresse: u.adresse,
            vehicule: u.vehicule,
            disponible: u.disponible,
        }
    }
}

pub struct NewUser {
    pub username: String,
    /// Already hashed — never a clear-text password.
    pub password: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub adresse: String,
    pub vehicule: String,
}

const SELECT_USER: &str = "\
    SELECT id, username, password, email, role, phone, adresse, vehicule, disponible, created_at \
    FROM users";

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password: row.get("password")?,
        email: row.get("email")?,
        role: Role::from_str(&role).unwrap_or(Role::Participant),
        phone: row.get("phone")?,
        adresse: row.get("adresse")?,
        vehicule: row.get("vehicule")?,
        disponible: row.get("disponible")?,
        created_at: row.get("created_at")?,
    })
}

pub fn create(conn: &Connection, user: &NewUser) -> Result<i64, AppError> {
    let result = conn.execute(
        "INSERT INTO users (username, password, email, role, phone, adresse, vehicule) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.username,
            user.password,
            user.email,
            user.role.as_str(),
            user.phone,
            user.adresse,
            user.vehicule,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AppError::Conflict(
                "Ce nom d'utilisateur est déjà utilisé".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            &format!("{SELECT_USER} WHERE id = ?1"),
            params![id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            &format!("{SELECT_USER} WHERE username = ?1"),
            params![username],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

/// Transporters whose availability flag is set, ready for assignment.
pub fn available_transporteurs(conn: &Connection) -> Result<Vec<UserPublic>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_USER} WHERE role = 'transporteur' AND disponible = 1 ORDER BY username"
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users.into_iter().map(UserPublic::from).collect())
}
