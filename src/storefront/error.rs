use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;

use crate::net::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Everything that can go wrong talking to the storefront. None of these
/// reach the visitor: checkout falls back to the cart URL and the inventory
/// counter keeps its last value.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("storefront responded with status {0}")]
    Status(u16),
    #[error("could not parse storefront response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("storefront API error: {0}")]
    Api(String),
    #[error("cart creation rejected: {}", format_user_errors(.0))]
    UserErrors(Vec<UserError>),
    #[error("storefront response is missing {0}")]
    MissingField(&'static str),
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|err| match &err.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), err.message),
            _ => err.message.clone(),
        })
        .join("; ")
}
