use crate::db::user_repository::StoredUser;
use crate::db::{Database, APPLICATIONS, JOBS, USERS};
use crate::models::application::{Application, ApplicationSummary, Status, StatusChange};
use crate::models::job::EducationLevel;
use bincode::{Decode, Encode};
use redb::ReadableTable;
use tracing::info;

#[derive(Debug, Encode, Decode)]
pub struct StoredStatusChange {
    pub status: Status,
    pub note: String,
    pub changed_at: i64,
}

#[derive(Debug, Encode, Decode)]
pub struct StoredApplication {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub submitted_at: i64,
    pub status: Status,
    pub resume: Vec<u8>,
    pub education: EducationLevel,
    pub experience_years: u32,
    pub profile_summary: String,
    pub prior_employer: Option<String>,
    pub prior_role: Option<String>,
    pub history: Vec<StoredStatusChange>,
}

impl From<Application> for StoredApplication {
    fn from(app: Application) -> Self {
        StoredApplication {
            id: app.id,
            job_id: app.job_id,
            applicant_id: app.applicant_id,
            submitted_at: app.submitted_at.timestamp(),
            status: app.status,
            resume: app.resume,
            education: app.education,
            experience_years: app.experience_years,
            profile_summary: app.profile_summary,
            prior_employer: app.prior_employer,
            prior_role: app.prior_role,
            history: app
                .history
                .into_iter()
                .map(|change| StoredStatusChange {
                    status: change.status,
                    note: change.note,
                    changed_at: change.changed_at.timestamp(),
                })
                .collect(),
        }
    }
}

impl From<StoredApplication> for Application {
    fn from(stored: StoredApplication) -> Self {
        Application {
            id: stored.id,
            job_id: stored.job_id,
            applicant_id: stored.applicant_id,
            submitted_at: chrono::DateTime::from_timestamp(stored.submitted_at, 0)
                .unwrap_or_else(chrono::Utc::now),
            status: stored.status,
            resume: stored.resume,
            education: stored.education,
            experience_years: stored.experience_years,
            profile_summary: stored.profile_summary,
            prior_employer: stored.prior_employer,
            prior_role: stored.prior_role,
            history: stored
                .history
                .into_iter()
                .map(|change| StatusChange {
                    status: change.status,
                    note: change.note,
                    changed_at: chrono::DateTime::from_timestamp(change.changed_at, 0)
                        .unwrap_or_else(chrono::Utc::now),
                })
                .collect(),
        }
    }
}

fn decode_application(data: &[u8]) -> Result<Application, String> {
    let (stored, _): (StoredApplication, usize) =
        bincode::decode_from_slice(data, bincode::config::standard())
            .map_err(|e| format!("Failed to decode application: {}", e))?;
    Ok(Application::from(stored))
}

fn encode_application(app: &Application) -> Result<Vec<u8>, String> {
    let stored = StoredApplication::from(app.clone());
    bincode::encode_to_vec(&stored, bincode::config::standard())
        .map_err(|e| format!("Failed to encode application: {}", e))
}

pub struct ApplicationRepository {
    db: Database,
}

impl ApplicationRepository {
    pub fn new(db: Database) -> Self {
        ApplicationRepository { db }
    }

    pub async fn create(&self, app: Application) -> Result<Application, String> {
        let encoded = encode_application(&app)?;
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        {
            let mut applications = txn
                .open_table(APPLICATIONS)
                .map_err(|e| format!("Failed to open applications table: {}", e))?;
            applications
                .insert(app.id.as_str(), encoded.as_slice())
                .map_err(|e| format!("Failed to insert application: {}", e))?;
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit application insert: {}", e))?;

        info!(
            application_id = %app.id,
            job_id = %app.job_id,
            applicant_id = %app.applicant_id,
            "Application created in database"
        );

        Ok(app)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Application>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let applications = txn
            .open_table(APPLICATIONS)
            .map_err(|e| format!("Failed to open applications table: {}", e))?;

        match applications
            .get(id)
            .map_err(|e| format!("Failed to get application: {}", e))?
        {
            Some(data) => Ok(Some(decode_application(data.value())?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_job(&self, job_id: &str) -> Result<Vec<Application>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let applications = txn
            .open_table(APPLICATIONS)
            .map_err(|e| format!("Failed to open applications table: {}", e))?;

        let mut result = Vec::new();
        for entry in applications.iter().map_err(|e| e.to_string())? {
            let (_, data) = entry.map_err(|e| e.to_string())?;
            let app = decode_application(data.value())?;
            if app.job_id == job_id {
                result.push(app);
            }
        }
        Ok(result)
    }

    /// All applications joined with job name and applicant name. A deleted job
    /// leaves its applications in place; their job name renders as removed.
    pub async fn list_summaries(&self, job_id: Option<&str>) -> Result<Vec<ApplicationSummary>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let applications = txn
            .open_table(APPLICATIONS)
            .map_err(|e| format!("Failed to open applications table: {}", e))?;
        let jobs = txn
            .open_table(JOBS)
            .map_err(|e| format!("Failed to open jobs table: {}", e))?;
        let users = txn
            .open_table(USERS)
            .map_err(|e| format!("Failed to open users table: {}", e))?;

        let mut result = Vec::new();
        for entry in applications.iter().map_err(|e| e.to_string())? {
            let (_, data) = entry.map_err(|e| e.to_string())?;
            let app = decode_application(data.value())?;
            if let Some(job_id) = job_id {
                if app.job_id != job_id {
                    continue;
                }
            }

            let job_name = match jobs
                .get(app.job_id.as_str())
                .map_err(|e| e.to_string())?
            {
                Some(job_data) => {
                    let (stored, _): (crate::db::job_repository::StoredJob, usize) =
                        bincode::decode_from_slice(job_data.value(), bincode::config::standard())
                            .map_err(|e| format!("Failed to decode job: {}", e))?;
                    stored.name
                }
                None => "(removed)".to_string(),
            };
            let applicant_name = match users
                .get(app.applicant_id.as_str())
                .map_err(|e| e.to_string())?
            {
                Some(user_data) => {
                    let (stored, _): (StoredUser, usize) =
                        bincode::decode_from_slice(user_data.value(), bincode::config::standard())
                            .map_err(|e| format!("Failed to decode user: {}", e))?;
                    stored.name
                }
                None => "(unknown)".to_string(),
            };

            result.push(ApplicationSummary {
                id: app.id,
                job_id: app.job_id,
                job_name,
                applicant_id: app.applicant_id,
                applicant_name,
                status: app.status,
                submitted_at: app.submitted_at,
                education: app.education,
                experience_years: app.experience_years,
            });
        }
        Ok(result)
    }

    /// Writes the new status and appends an audit entry in one transaction.
    pub async fn update_status(
        &self,
        id: &str,
        status: Status,
        note: &str,
    ) -> Result<Application, String> {
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        let updated;
        {
            let mut applications = txn
                .open_table(APPLICATIONS)
                .map_err(|e| format!("Failed to open applications table: {}", e))?;

            let mut app = match applications
                .get(id)
                .map_err(|e| format!("Failed to get application: {}", e))?
            {
                Some(data) => decode_application(data.value())?,
                None => return Err("Application not found".to_string()),
            };

            app.status = status;
            app.history.push(StatusChange {
                status,
                note: note.to_string(),
                changed_at: chrono::Utc::now(),
            });

            let encoded = encode_application(&app)?;
            applications
                .insert(id, encoded.as_slice())
                .map_err(|e| format!("Failed to update application: {}", e))?;
            updated = app;
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit status update: {}", e))?;

        info!(application_id = %id, status = %status, "Application status updated");

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::job_repository::JobRepository;
    use crate::db::user_repository::UserRepository;
    use crate::models::job::Job;
    use crate::models::user::{Role, User};
    use chrono::{NaiveDate, Utc};

    fn test_application(job_id: &str, applicant_id: &str) -> Application {
        Application {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            applicant_id: applicant_id.to_string(),
            submitted_at: Utc::now(),
            status: Status::Pending,
            resume: b"%PDF-1.4 resume bytes".to_vec(),
            education: EducationLevel::Bachelor,
            experience_years: 3,
            profile_summary: "Rust developer with API experience".to_string(),
            prior_employer: Some("Acme".to_string()),
            prior_role: Some("Developer".to_string()),
            history: vec![],
        }
    }

    fn test_job(id: &str, name: &str) -> Job {
        Job {
            id: id.to_string(),
            name: name.to_string(),
            position_type: "Full-time".to_string(),
            location: "Remote".to_string(),
            min_education: EducationLevel::None,
            min_experience: 0,
            description: String::new(),
            contact_info: "hr@example.com".to_string(),
            salary_range: String::new(),
            close_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            hr_id: "hr-1".to_string(),
            category: String::new(),
            keywords: vec![],
        }
    }

    fn test_user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            phone: id.to_string(),
            role: Role::Applicant,
            password_hash: "hash".to_string(),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_application() {
        let db = Database::in_memory().unwrap();
        let repo = ApplicationRepository::new(db);
        let app = test_application("job-1", "user-1");

        repo.create(app.clone()).await.unwrap();

        let retrieved = repo.get_by_id(&app.id).await.unwrap().unwrap();
        assert_eq!(retrieved.status, Status::Pending);
        assert_eq!(retrieved.resume, app.resume);
        assert!(retrieved.history.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_job_filters() {
        let db = Database::in_memory().unwrap();
        let repo = ApplicationRepository::new(db);
        repo.create(test_application("job-1", "user-1")).await.unwrap();
        repo.create(test_application("job-1", "user-2")).await.unwrap();
        repo.create(test_application("job-2", "user-3")).await.unwrap();

        assert_eq!(repo.list_for_job("job-1").await.unwrap().len(), 2);
        assert_eq!(repo.list_for_job("job-2").await.unwrap().len(), 1);
        assert!(repo.list_for_job("job-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summaries_join_names() {
        let db = Database::in_memory().unwrap();
        let jobs = JobRepository::new(db.clone());
        let users = UserRepository::new(db.clone());
        let repo = ApplicationRepository::new(db);

        jobs.create(test_job("job-1", "Backend Engineer")).await.unwrap();
        users.create(test_user("user-1", "Ada")).await.unwrap();
        repo.create(test_application("job-1", "user-1")).await.unwrap();

        let summaries = repo.list_summaries(None).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].job_name, "Backend Engineer");
        assert_eq!(summaries[0].applicant_name, "Ada");
    }

    #[tokio::test]
    async fn test_summaries_survive_job_delete() {
        let db = Database::in_memory().unwrap();
        let jobs = JobRepository::new(db.clone());
        let repo = ApplicationRepository::new(db);

        jobs.create(test_job("job-1", "Backend Engineer")).await.unwrap();
        repo.create(test_application("job-1", "user-1")).await.unwrap();
        jobs.delete("job-1").await.unwrap();

        let summaries = repo.list_summaries(Some("job-1")).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].job_name, "(removed)");
    }

    #[tokio::test]
    async fn test_update_status_appends_audit_entry() {
        let db = Database::in_memory().unwrap();
        let repo = ApplicationRepository::new(db);
        let app = test_application("job-1", "user-1");
        repo.create(app.clone()).await.unwrap();

        repo.update_status(&app.id, Status::Reviewed, "Looks promising")
            .await
            .unwrap();
        let updated = repo
            .update_status(&app.id, Status::NextStep, "Phone screen")
            .await
            .unwrap();

        assert_eq!(updated.status, Status::NextStep);
        assert_eq!(updated.history.len(), 2);
        assert_eq!(updated.history[0].status, Status::Reviewed);
        assert_eq!(updated.history[1].note, "Phone screen");
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let db = Database::in_memory().unwrap();
        let repo = ApplicationRepository::new(db);

        let result = repo.update_status("missing", Status::Hired, "").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not found"));
    }
}
