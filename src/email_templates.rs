//! Plain-text emails sent when a lead is captured.

use crate::models::Lead;

const PROGRAM_NAME: &str = "1:1 Media Buying Program";
const CONFIRMATION_SUBJECT: &str = "Thanks for applying — Hesham Hamdy 1:1 Program";
const PLACEHOLDER: &str = "-";

/// Subject and body of one outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER)
}

/// Entries are joined as given; only an empty result becomes the placeholder.
fn join_or_dash(values: &[String]) -> String {
    let joined = values.join(", ");
    if joined.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        joined
    }
}

/// Summary sent to the admin inbox.
pub fn admin_summary(lead: &Lead, lead_id: &str) -> EmailContent {
    let body = format!(
        "New lead submitted for {program}\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Experience: {experience}\n\
         Goals: {goals}\n\
         Platforms: {platforms}\n\
         Timezone: {timezone}\n\
         Preferred Times: {times}\n\
         Consent: {consent}\n\
         ID: {id}\n",
        program = PROGRAM_NAME,
        name = lead.name,
        email = lead.email,
        phone = or_dash(lead.phone.as_deref()),
        experience = or_dash(lead.experience_level.as_deref()),
        goals = or_dash(lead.goals.as_deref()),
        platforms = join_or_dash(&lead.platforms),
        timezone = or_dash(lead.timezone.as_deref()),
        times = join_or_dash(&lead.preferred_times),
        consent = if lead.consent { "Yes" } else { "No" },
        id = lead_id,
    );

    EmailContent {
        subject: format!("New Lead: {}", lead.name),
        body,
    }
}

/// Confirmation sent to the applicant.
pub fn applicant_confirmation(lead: &Lead) -> EmailContent {
    let body = format!(
        "Hi {name},\n\n\
         Thanks for applying to the one-to-one Media Buying program. \
         I've received your details and will get back to you shortly to schedule the first session.\n\n\
         Your selections:\n\
         - Experience: {experience}\n\
         - Platforms: {platforms}\n\
         - Preferred Times: {times}\n\
         - Timezone: {timezone}\n\n\
         If you need to update anything, just reply to this email.\n\n\
         — Hesham",
        name = lead.name,
        experience = or_dash(lead.experience_level.as_deref()),
        platforms = join_or_dash(&lead.platforms),
        times = join_or_dash(&lead.preferred_times),
        timezone = or_dash(lead.timezone.as_deref()),
    );

    EmailContent {
        subject: CONFIRMATION_SUBJECT.to_string(),
        body,
    }
}
