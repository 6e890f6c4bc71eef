use bincode::{Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Encode, Decode)]
pub enum Role {
    Applicant,
    #[serde(rename = "HR")]
    Hr,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applicant" => Ok(Role::Applicant),
            "hr" => Ok(Role::Hr),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Applicant => write!(f, "Applicant"),
            Role::Hr => write!(f, "HR"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    #[schema(value_type = Option<String>)]
    pub image: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub role: Role,  // Role the token was issued for
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!(Role::from_str("HR").unwrap(), Role::Hr);
        assert_eq!(Role::from_str("applicant").unwrap(), Role::Applicant);
        assert_eq!(Role::from_str(" Admin ").unwrap(), Role::Admin);
        assert!(Role::from_str("manager").is_err());
    }

    #[test]
    fn test_role_serializes_as_wire_name() {
        assert_eq!(serde_json::to_string(&Role::Hr).unwrap(), "\"HR\"");
        assert_eq!(
            serde_json::to_string(&Role::Applicant).unwrap(),
            "\"Applicant\""
        );
    }
}
