//! Admin credential checks.
//!
//! There is exactly one admin identity, configured through the environment.
//! Nothing here issues or validates sessions; the server gate only looks for
//! the presence of [`SESSION_COOKIE_NAME`].

use subtle::ConstantTimeEq;

use crate::app_config::AdminCredentials;

/// Cookie whose presence marks a signed-in admin.
pub const SESSION_COOKIE_NAME: &str = "zee_admin";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns `true` when `email`/`password` match the configured admin pair.
///
/// Emails are compared trimmed and case-insensitively. Passwords must match
/// byte-for-byte and are compared in constant time. Unconfigured auth, an
/// empty email, or an empty password never match.
#[must_use]
pub fn verify_admin_credentials(
    admin: Option<&AdminCredentials>,
    email: &str,
    password: &str,
) -> bool {
    let Some(admin) = admin else {
        return false;
    };

    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return false;
    }

    let email_ok = email == normalize_email(&admin.email);
    let password_ok: bool = password.as_bytes().ct_eq(admin.password.as_bytes()).into();
    email_ok && password_ok
}

/// Returns `true` when `email` is the configured owner address allowed to
/// request credential recovery.
#[must_use]
pub fn is_owner_email(owner_email: Option<&str>, email: &str) -> bool {
    let email = normalize_email(email);
    match owner_email {
        Some(owner) if !email.is_empty() => email == normalize_email(owner),
        _ => false,
    }
}
