// common/src/validation.rs
use crate::models::api::{Credentials, RegisterRequest};
use crate::utils::is_valid_address;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Form-level problems. These never reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter both email and password")]
    MissingCredentials,
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid wallet address")]
    InvalidWalletAddress,
}

/// Raw input of the login form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(self) -> Result<Credentials, ValidationError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Credentials {
            email: email.to_string(),
            password: self.password,
        })
    }
}

/// Raw input of the registration form
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub wallet_address: Option<String>,
}

impl RegisterForm {
    /// Checks run in the order the form reports them
    pub fn validate(self) -> Result<RegisterRequest, ValidationError> {
        let name = self.name.trim();
        let email = self.email.trim();

        if name.is_empty()
            || email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        // An empty wallet field means "no wallet"
        let wallet_address = self
            .wallet_address
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty());
        if let Some(address) = &wallet_address {
            if !is_valid_address(address) {
                return Err(ValidationError::InvalidWalletAddress);
            }
        }

        Ok(RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: self.password,
            wallet_address,
        })
    }
}

/// Loose `local@domain.tld` check, same strictness as an `type="email"` input
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            name: "Test User".into(),
            email: "test@example.com".into(),
            password: "password123".into(),
            confirm_password: "password123".into(),
            wallet_address: None,
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let err = LoginForm { email: "".into(), password: "password123".into() }
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter both email and password");

        let err = LoginForm { email: "test@example.com".into(), password: "".into() }
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingCredentials);
    }

    #[test]
    fn login_rejects_malformed_email() {
        let err = LoginForm { email: "not-an-email".into(), password: "password123".into() }
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail);
    }

    #[test]
    fn login_trims_email() {
        let credentials = LoginForm { email: "  test@example.com ".into(), password: "password123".into() }
            .validate()
            .unwrap();
        assert_eq!(credentials.email, "test@example.com");
    }

    #[test]
    fn register_checks_in_order() {
        let mut form = register_form();
        form.name = String::new();
        assert_eq!(form.validate().unwrap_err(), ValidationError::MissingFields);

        let mut form = register_form();
        form.confirm_password = "different123".into();
        assert_eq!(form.validate().unwrap_err().to_string(), "Passwords do not match");

        let mut form = register_form();
        form.password = "short".into();
        form.confirm_password = "short".into();
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Password must be at least 8 characters long"
        );
    }

    #[test]
    fn register_wallet_is_optional_but_checked() {
        let mut form = register_form();
        form.wallet_address = Some("   ".into());
        assert_eq!(form.validate().unwrap().wallet_address, None);

        let mut form = register_form();
        form.wallet_address = Some("0x123".into());
        assert_eq!(form.validate().unwrap_err(), ValidationError::InvalidWalletAddress);

        let mut form = register_form();
        form.wallet_address = Some("0x71C7656EC7ab88b098defB751B7401B5f6d8976F".into());
        assert!(form.validate().unwrap().wallet_address.is_some());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b.co."));
    }
}
