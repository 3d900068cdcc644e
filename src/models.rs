use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::db_storage::Document;

/// Collection holding submitted leads.
pub const LEAD_COLLECTION: &str = "lead";

/// Default page size for `GET /api/leads`.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Raw create-lead request body.
///
/// Every field is optional on the wire so that a missing `name` or `email`
/// is reported through the same structured validation error as any other
/// constraint failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct LeadPayload {
    /// Applicant full name
    #[validate(required, length(min = 2, max = 100))]
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,

    /// Applicant email
    #[validate(required, email)]
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,

    /// WhatsApp or phone number
    #[validate(length(max = 32))]
    pub phone: Option<String>,

    /// Beginner, Intermediate, Advanced
    pub experience_level: Option<String>,

    /// What the applicant wants to achieve
    #[validate(length(max = 1000))]
    pub goals: Option<String>,

    /// Interested ad platforms
    pub platforms: Option<Vec<String>>,

    /// IANA timezone, e.g. Africa/Cairo (not checked against the tz database)
    #[validate(length(max = 64))]
    pub timezone: Option<String>,

    /// Preferred session times in the applicant's local timezone
    pub preferred_times: Option<Vec<String>>,

    /// Applicant consents to be contacted. Defaults to true when omitted.
    pub consent: Option<bool>,
}

impl LeadPayload {
    /// Validates the payload and produces an immutable [`Lead`].
    pub fn into_lead(self) -> Result<Lead, ValidationErrors> {
        self.validate()?;

        let name = self.name.ok_or_else(|| required("name"))?;
        let email = self.email.ok_or_else(|| required("email"))?;

        if self.consent.is_none() {
            tracing::info!("consent not supplied for lead, defaulting to true");
        }

        Ok(Lead {
            name,
            email,
            phone: self.phone,
            experience_level: self.experience_level,
            goals: self.goals,
            platforms: self.platforms.unwrap_or_default(),
            timezone: self.timezone,
            preferred_times: self.preferred_times.unwrap_or_default(),
            consent: self.consent.unwrap_or(true),
        })
    }
}

fn required(field: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new("required"));
    errors
}

/// A validated application record, as persisted in the `lead` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub experience_level: Option<String>,
    pub goals: Option<String>,
    pub platforms: Vec<String>,
    pub timezone: Option<String>,
    pub preferred_times: Vec<String>,
    pub consent: bool,
}

/// Response for a successful `POST /api/leads`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeadCreated {
    pub ok: bool,
    /// Identifier assigned by the document store
    pub id: String,
}

/// Query parameters for `GET /api/leads`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeadsQuery {
    /// Maximum number of leads to return (default 50)
    pub limit: Option<i64>,
}

/// Response for `GET /api/leads`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeadsPage {
    pub ok: bool,
    /// Stored leads, newest first, each with a string `id`
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<Document>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Diagnostic snapshot returned by `GET /test`.
#[derive(Debug, Serialize, ToSchema)]
pub struct Diagnostics {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// A message, or a list of `{field, code, message}` for validation failures
    #[schema(value_type = Object)]
    pub detail: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, email: &str) -> LeadPayload {
        LeadPayload {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_payload_gets_defaults() {
        let lead = payload("Ada", "ada@example.com").into_lead().unwrap();
        assert_eq!(lead.name, "Ada");
        assert!(lead.platforms.is_empty());
        assert!(lead.preferred_times.is_empty());
        assert!(lead.consent);
    }

    #[test]
    fn test_explicit_consent_is_kept() {
        let mut p = payload("Ada", "ada@example.com");
        p.consent = Some(false);
        assert!(!p.into_lead().unwrap().consent);
    }

    #[test]
    fn test_missing_name_and_email_are_reported() {
        let errors = LeadPayload::default().into_lead().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(payload("A", "ada@example.com").into_lead().is_err());
        assert!(payload("Al", "ada@example.com").into_lead().is_ok());
        assert!(payload(&"x".repeat(100), "ada@example.com").into_lead().is_ok());
        assert!(payload(&"x".repeat(101), "ada@example.com").into_lead().is_err());
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let errors = payload("Ada", "not-an-email").into_lead().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_optional_field_limits() {
        let mut p = payload("Ada", "ada@example.com");
        p.phone = Some("1".repeat(33));
        p.goals = Some("g".repeat(1001));
        p.timezone = Some("t".repeat(65));
        let errors = p.into_lead().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("goals"));
        assert!(fields.contains_key("timezone"));
    }

    #[test]
    fn test_null_lists_become_empty() {
        let p: LeadPayload = serde_json::from_value(serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "platforms": null,
            "preferred_times": ["Mon 18:00"]
        }))
        .unwrap();
        let lead = p.into_lead().unwrap();
        assert!(lead.platforms.is_empty());
        assert_eq!(lead.preferred_times, vec!["Mon 18:00".to_string()]);
    }
}
