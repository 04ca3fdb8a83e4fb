//! Customer profile.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use dokan_core::PhoneNumber;
use dokan_shared::db::CustomerRepository;
use dokan_shared::models::{Customer, ProfileUpdate};

use crate::error::{AppError, Result};
use crate::middleware::RequireCustomer;
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 100;
const MAX_ADDRESS_CHARS: usize = 500;

/// `PUT /api/profile` body.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ProfileRequest {
    fn validate(self) -> Result<ProfileUpdate> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "Name must be at most {MAX_NAME_CHARS} characters"
            )));
        }

        let phone = self
            .phone
            .filter(|p| !p.trim().is_empty())
            .map(|p| PhoneNumber::parse(&p))
            .transpose()
            .map_err(|e| AppError::BadRequest(format!("Invalid phone number: {e}")))?;

        let address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if address
            .as_ref()
            .is_some_and(|a| a.chars().count() > MAX_ADDRESS_CHARS)
        {
            return Err(AppError::BadRequest(format!(
                "Address must be at most {MAX_ADDRESS_CHARS} characters"
            )));
        }

        Ok(ProfileUpdate {
            name,
            phone,
            address,
        })
    }
}

/// The signed-in customer's profile.
///
/// # Route
///
/// `GET /api/profile`
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Json<Customer>> {
    CustomerRepository::new(state.pool())
        .get(customer.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}

/// Update name, phone and address.
///
/// # Route
///
/// `PUT /api/profile`
#[instrument(skip(state, customer, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<Customer>> {
    let update = body.validate()?;
    let updated = CustomerRepository::new(state.pool())
        .update_profile(customer.id, &update)
        .await?;
    tracing::info!(customer_id = %customer.id, "Profile updated");
    Ok(Json(updated))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(name: &str, phone: Option<&str>) -> ProfileRequest {
        ProfileRequest {
            name: name.to_string(),
            phone: phone.map(str::to_string),
            address: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let update = request(" Fatema ", Some("+880 1711-223344")).validate().unwrap();
        assert_eq!(update.name, "Fatema");
        assert_eq!(update.phone.unwrap().as_str(), "01711223344");
        assert_eq!(update.address, None);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(request("", None).validate().is_err());
        assert!(request("Fatema", Some("12345")).validate().is_err());
        assert!(request(&"x".repeat(101), None).validate().is_err());
        // Blank phone clears it rather than failing.
        assert!(request("Fatema", Some(" ")).validate().unwrap().phone.is_none());
    }
}
