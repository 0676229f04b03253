use log::info;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Incorrect key")]
    IncorrectKey,
}

/// In-memory session flag behind the password page. Nothing is persisted; a
/// reload starts unauthenticated.
#[derive(Clone, Debug)]
pub struct PasswordGate {
    secret: Option<String>,
    authenticated: bool,
}

impl PasswordGate {
    pub fn new(secret: Option<String>) -> PasswordGate {
        PasswordGate {
            secret: secret.filter(|x| !x.is_empty()),
            authenticated: false,
        }
    }

    /// Without a configured secret there is nothing to gate.
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn login(&mut self, attempt: &str) -> Result<(), AuthError> {
        match &self.secret {
            Some(secret) if secret == attempt => {
                if !self.authenticated {
                    info!("Password accepted");
                }
                self.authenticated = true;
                Ok(())
            }
            _ => Err(AuthError::IncorrectKey),
        }
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
    }
}
