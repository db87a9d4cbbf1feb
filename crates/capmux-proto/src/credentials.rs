//! Credential material for remote command execution.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Credentials for authenticating a remote session.
///
/// Exactly one kind of material is required: a password or a private key
/// file. Validation happens before any network I/O is attempted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    password: Option<String>,
    key_file: Option<PathBuf>,
}

impl Credentials {
    /// Password-based credentials.
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            key_file: None,
        }
    }

    /// Key-file-based credentials.
    pub fn key_file(path: impl Into<PathBuf>) -> Self {
        Self {
            password: None,
            key_file: Some(path.into()),
        }
    }

    /// Fails with [`Error::AuthenticationFailure`] when neither a password
    /// nor key material is present.
    pub fn validate(&self) -> Result<()> {
        if self.password.is_none() && self.key_file.is_none() {
            return Err(Error::AuthenticationFailure(
                "neither password nor key file provided".into(),
            ));
        }
        Ok(())
    }

    /// The password, if this is password material.
    pub fn password_material(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The private key path, if this is key material.
    pub fn key_material(&self) -> Option<&PathBuf> {
        self.key_file.as_ref()
    }
}

// Manual Debug so a password never lands in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_material() {
        let empty = Credentials::default();
        let err = empty.validate().unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailure(_)));

        assert!(Credentials::password("hunter2").validate().is_ok());
        assert!(Credentials::key_file("/tmp/id_rsa").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::password("hunter2");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
