use crate::models::job::EducationLevel;
use bincode::{Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Workflow stage of an application. Mutated only by HR/admin via the status
/// endpoint; applicants never change it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Encode, Decode)]
pub enum Status {
    Pending,
    Reviewed,
    NextStep,
    Rejected,
    Hired,
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "pending" => Ok(Status::Pending),
            "reviewed" => Ok(Status::Reviewed),
            "nextstep" => Ok(Status::NextStep),
            "rejected" => Ok(Status::Rejected),
            "hired" => Ok(Status::Hired),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "Pending",
            Status::Reviewed => "Reviewed",
            Status::NextStep => "NextStep",
            Status::Rejected => "Rejected",
            Status::Hired => "Hired",
        };
        write!(f, "{}", s)
    }
}

/// One entry of the append-only status audit trail.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct StatusChange {
    pub status: Status,
    pub note: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub submitted_at: DateTime<Utc>,
    pub status: Status,
    #[serde(skip_serializing)]
    #[schema(value_type = String)]
    pub resume: Vec<u8>,
    pub education: EducationLevel,
    pub experience_years: u32,
    pub profile_summary: String,
    pub prior_employer: Option<String>,
    pub prior_role: Option<String>,
    pub history: Vec<StatusChange>,
}

/// Listing row joined with job and applicant names, for the HR dashboard's
/// grouped-by-job rendering.
#[derive(Debug, Serialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: String,
    pub job_id: String,
    pub job_name: String,
    pub applicant_id: String,
    pub applicant_name: String,
    pub status: Status,
    pub submitted_at: DateTime<Utc>,
    pub education: EducationLevel,
    pub experience_years: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_tolerates_spacing_and_case() {
        assert_eq!(Status::from_str("pending").unwrap(), Status::Pending);
        assert_eq!(Status::from_str("Next Step").unwrap(), Status::NextStep);
        assert_eq!(Status::from_str("HIRED").unwrap(), Status::Hired);
        assert!(Status::from_str("archived").is_err());
    }
}
