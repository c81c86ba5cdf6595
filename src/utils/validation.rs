//! Validation utilities

use crate::normalize::FieldMapping;
use crate::types::*;

/// Validate that a tenant identifier is valid
pub fn validate_tenant_id(tenant: &str) -> ReconcileResult<()> {
    if tenant.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Tenant ID cannot be empty".to_string(),
        ));
    }

    if tenant.len() > 50 {
        return Err(ReconcileError::Validation(
            "Tenant ID cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !tenant
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ReconcileError::Validation(
            "Tenant ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a field mapping is usable
pub fn validate_field_mapping(mapping: &FieldMapping) -> ReconcileResult<()> {
    for (role, field) in [
        ("date", &mapping.date),
        ("description", &mapping.description),
        ("amount", &mapping.amount),
    ] {
        if field.trim().is_empty() {
            return Err(ReconcileError::Validation(format!(
                "Field mapping for '{}' cannot be empty",
                role
            )));
        }
    }

    if let Some(ref contra) = mapping.contra_amount {
        if contra.trim().is_empty() {
            return Err(ReconcileError::Validation(
                "Contra amount field mapping cannot be empty".to_string(),
            ));
        }
        if contra == &mapping.amount {
            return Err(ReconcileError::Validation(
                "Contra amount field must differ from the amount field".to_string(),
            ));
        }
    }

    Ok(())
}
