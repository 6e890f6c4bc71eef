use bincode::{Decode, Encode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Ordered lowest-to-highest so screening can compare an applicant's level
/// against a job's minimum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema, Encode,
    Decode,
)]
pub enum EducationLevel {
    None,
    HighSchool,
    Diploma,
    Bachelor,
    Master,
    Doctorate,
}

impl FromStr for EducationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "" | "none" => Ok(EducationLevel::None),
            "highschool" | "secondary" => Ok(EducationLevel::HighSchool),
            "diploma" | "associate" => Ok(EducationLevel::Diploma),
            "bachelor" | "bachelors" | "degree" => Ok(EducationLevel::Bachelor),
            "master" | "masters" => Ok(EducationLevel::Master),
            "doctorate" | "phd" => Ok(EducationLevel::Doctorate),
            other => Err(format!("Unknown education level: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub name: String,
    pub position_type: String,
    pub location: String,
    pub min_education: EducationLevel,
    pub min_experience: u32,
    pub description: String,
    pub contact_info: String,
    pub salary_range: String,
    pub close_date: NaiveDate,
    pub hr_id: String,
    pub category: String,
    pub keywords: Vec<String>,
}

/// Client-supplied job fields; id and owner are assigned server-side.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub name: String,
    pub position_type: String,
    pub location: String,
    #[serde(default)]
    pub min_education: EducationLevel,
    #[serde(default)]
    pub min_experience: u32,
    #[serde(default)]
    pub description: String,
    pub contact_info: String,
    #[serde(default)]
    pub salary_range: String,
    pub close_date: NaiveDate,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for EducationLevel {
    fn default() -> Self {
        EducationLevel::None
    }
}

impl JobPayload {
    /// All of name, position type, location, contact info must be non-empty;
    /// the close date is enforced by the date type itself.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("name", &self.name),
            ("positionType", &self.position_type),
            ("location", &self.location),
            ("contactInfo", &self.contact_info),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("Field '{}' is required", field));
            }
        }
        Ok(())
    }

    pub fn into_job(self, id: String, hr_id: String) -> Job {
        Job {
            id,
            name: self.name,
            position_type: self.position_type,
            location: self.location,
            min_education: self.min_education,
            min_experience: self.min_experience,
            description: self.description,
            contact_info: self.contact_info,
            salary_range: self.salary_range,
            close_date: self.close_date,
            hr_id,
            category: self.category,
            keywords: self.keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_ordering() {
        assert!(EducationLevel::Master > EducationLevel::Bachelor);
        assert!(EducationLevel::HighSchool < EducationLevel::Diploma);
        assert!(EducationLevel::None < EducationLevel::HighSchool);
    }

    #[test]
    fn test_education_parse_variants() {
        assert_eq!(
            EducationLevel::from_str("High School").unwrap(),
            EducationLevel::HighSchool
        );
        assert_eq!(
            EducationLevel::from_str("bachelors").unwrap(),
            EducationLevel::Bachelor
        );
        assert_eq!(
            EducationLevel::from_str("PhD").unwrap(),
            EducationLevel::Doctorate
        );
        assert!(EducationLevel::from_str("bootcamp").is_err());
    }

    fn payload() -> JobPayload {
        JobPayload {
            name: "Backend Engineer".to_string(),
            position_type: "Full-time".to_string(),
            location: "Remote".to_string(),
            min_education: EducationLevel::Bachelor,
            min_experience: 2,
            description: "Build services".to_string(),
            contact_info: "hr@example.com".to_string(),
            salary_range: "80k-100k".to_string(),
            close_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            category: "Engineering".to_string(),
            keywords: vec!["rust".to_string()],
        }
    }

    #[test]
    fn test_payload_validation_requires_core_fields() {
        assert!(payload().validate().is_ok());

        let mut missing = payload();
        missing.location = "  ".to_string();
        let err = missing.validate().unwrap_err();
        assert!(err.contains("location"));
    }
}
