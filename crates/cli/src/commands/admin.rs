//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Password as a flag
//! dokan-cli admin create -e owner@dokan.com.bd -n "Owner" --password '...'
//!
//! # Password from the environment
//! DOKAN_ADMIN_PASSWORD='...' dokan-cli admin create -e owner@dokan.com.bd -n "Owner" -r super_admin
//!
//! # Password from stdin
//! printf '%s\n' "$PASSWORD" | dokan-cli admin reset-password -e owner@dokan.com.bd
//!
//! dokan-cli admin list
//! ```

use tokio::io::{AsyncBufReadExt, BufReader};

use dokan_admin::auth::{hash_password, validate_new_password};
use dokan_core::{AdminRole, Email};
use dokan_shared::config::get_optional_env;
use dokan_shared::db::{AdminUserRepository, RepositoryError};

use super::{CommandError, connect};

/// Environment variable checked for the password before stdin.
const PASSWORD_ENV: &str = "DOKAN_ADMIN_PASSWORD";

/// Take the new password from the flag, `DOKAN_ADMIN_PASSWORD` or the first
/// line of stdin, in that order, and check its length.
async fn read_password(flag: Option<String>) -> Result<String, CommandError> {
    let password = if let Some(password) = flag.or_else(|| get_optional_env(PASSWORD_ENV)) {
        password
    } else {
        tracing::info!("Reading password from stdin...");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };

    validate_new_password(&password).map_err(|e| CommandError::Invalid(e.to_string()))?;
    Ok(password)
}

fn parse_email(email: &str) -> Result<Email, CommandError> {
    Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))
}

/// Create an admin account.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken or the
/// database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let role: AdminRole = role.parse().map_err(|_| {
        CommandError::Invalid(format!(
            "Invalid role: {role}. Valid roles: super_admin, admin"
        ))
    })?;
    if name.trim().is_empty() {
        return Err(CommandError::Invalid("Name is required".to_string()));
    }

    let password = read_password(password).await?;
    let hash = hash_password(&password).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let pool = connect().await?;
    let user = AdminUserRepository::new(&pool)
        .create(&email, name, role, &hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CommandError::Invalid(format!(
                "Admin user already exists with email: {email}"
            )),
            other => other.into(),
        })?;

    tracing::info!(
        "Admin user created. ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Replace an admin's password.
///
/// # Errors
///
/// Returns an error if no admin has this email or the database is
/// unreachable.
pub async fn reset_password(email: &str, password: Option<String>) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let password = read_password(password).await?;
    let hash = hash_password(&password).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let pool = connect().await?;
    let repo = AdminUserRepository::new(&pool);
    let login = repo
        .get_login(&email)
        .await?
        .ok_or_else(|| CommandError::Invalid(format!("No admin user with email: {email}")))?;

    repo.update_password(login.user.id, &hash).await?;
    tracing::info!("Password updated for {}", login.user.email);
    Ok(())
}

/// Log every admin account.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = AdminUserRepository::new(&pool).list().await?;

    if users.is_empty() {
        tracing::info!("No admin users. Create one with: dokan-cli admin create");
        return Ok(());
    }
    for user in users {
        tracing::info!(
            "{:>4}  {:<11}  {}  ({})",
            user.id.as_i32(),
            user.role.as_str(),
            user.email,
            user.name
        );
    }
    Ok(())
}
