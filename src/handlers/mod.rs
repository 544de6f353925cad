pub mod auth_handlers;
pub mod demande_handlers;
pub mod message_handlers;
pub mod notification_handlers;
pub mod proposition_handlers;
pub mod stock_handlers;
pub mod user_handlers;

use serde::Deserialize;

use crate::errors::AppError;
use crate::workflow::{Decision, ReponseTransporteur};

/// Member decision form: `{action: approve|refuse, raison?}`.
#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    pub action: String,
    pub raison: Option<String>,
}

impl DecisionForm {
    pub fn into_decision(self) -> Result<Decision, AppError> {
        match self.action.as_str() {
            "approve" => Ok(Decision::Approuver),
            "refuse" => Ok(Decision::Refuser {
                raison: self.raison.unwrap_or_default(),
            }),
            other => Err(AppError::Validation(vec![format!(
                "Action non reconnue: {other}"
            )])),
        }
    }
}

/// Transporter response form: `{action: accept|refuse, raison?}`.
#[derive(Debug, Deserialize)]
pub struct ReponseForm {
    pub action: String,
    pub raison: Option<String>,
}

impl ReponseForm {
    pub fn into_reponse(self) -> Result<ReponseTransporteur, AppError> {
        match self.action.as_str() {
            "accept" => Ok(ReponseTransporteur::Accepter),
            "refuse" => Ok(ReponseTransporteur::Refuser {
                raison: self.raison.unwrap_or_default(),
            }),
            other => Err(AppError::Validation(vec![format!(
                "Action non reconnue: {other}"
            )])),
        }
    }
}
