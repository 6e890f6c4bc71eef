use crate::db::{Database, JOBS};
use crate::models::job::{EducationLevel, Job};
use bincode::{Decode, Encode};
use chrono::NaiveDate;
use redb::ReadableTable;
use tracing::info;

#[derive(Debug, Encode, Decode)]
pub struct StoredJob {
    pub id: String,
    pub name: String,
    pub position_type: String,
    pub location: String,
    pub min_education: EducationLevel,
    pub min_experience: u32,
    pub description: String,
    pub contact_info: String,
    pub salary_range: String,
    pub close_date: String, // ISO date
    pub hr_id: String,
    pub category: String,
    pub keywords: Vec<String>,
}

impl From<Job> for StoredJob {
    fn from(job: Job) -> Self {
        StoredJob {
            id: job.id,
            name: job.name,
            position_type: job.position_type,
            location: job.location,
            min_education: job.min_education,
            min_experience: job.min_experience,
            description: job.description,
            contact_info: job.contact_info,
            salary_range: job.salary_range,
            close_date: job.close_date.to_string(),
            hr_id: job.hr_id,
            category: job.category,
            keywords: job.keywords,
        }
    }
}

impl From<StoredJob> for Job {
    fn from(stored: StoredJob) -> Self {
        Job {
            id: stored.id,
            name: stored.name,
            position_type: stored.position_type,
            location: stored.location,
            min_education: stored.min_education,
            min_experience: stored.min_experience,
            description: stored.description,
            contact_info: stored.contact_info,
            salary_range: stored.salary_range,
            close_date: NaiveDate::parse_from_str(&stored.close_date, "%Y-%m-%d")
                .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
            hr_id: stored.hr_id,
            category: stored.category,
            keywords: stored.keywords,
        }
    }
}

fn decode_job(data: &[u8]) -> Result<Job, String> {
    let (stored, _): (StoredJob, usize) =
        bincode::decode_from_slice(data, bincode::config::standard())
            .map_err(|e| format!("Failed to decode job: {}", e))?;
    Ok(Job::from(stored))
}

fn encode_job(job: &Job) -> Result<Vec<u8>, String> {
    let stored = StoredJob::from(job.clone());
    bincode::encode_to_vec(&stored, bincode::config::standard())
        .map_err(|e| format!("Failed to encode job: {}", e))
}

pub struct JobRepository {
    db: Database,
}

impl JobRepository {
    pub fn new(db: Database) -> Self {
        JobRepository { db }
    }

    pub async fn create(&self, job: Job) -> Result<Job, String> {
        let encoded = encode_job(&job)?;
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        {
            let mut jobs = txn
                .open_table(JOBS)
                .map_err(|e| format!("Failed to open jobs table: {}", e))?;
            jobs.insert(job.id.as_str(), encoded.as_slice())
                .map_err(|e| format!("Failed to insert job: {}", e))?;
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit job insert: {}", e))?;

        info!(job_id = %job.id, hr_id = %job.hr_id, "Job created in database");

        Ok(job)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Job>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let jobs = txn
            .open_table(JOBS)
            .map_err(|e| format!("Failed to open jobs table: {}", e))?;

        match jobs.get(id).map_err(|e| format!("Failed to get job: {}", e))? {
            Some(data) => Ok(Some(decode_job(data.value())?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<Job>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let jobs = txn
            .open_table(JOBS)
            .map_err(|e| format!("Failed to open jobs table: {}", e))?;

        let mut result = Vec::new();
        for entry in jobs.iter().map_err(|e| e.to_string())? {
            let (_, data) = entry.map_err(|e| e.to_string())?;
            result.push(decode_job(data.value())?);
        }
        Ok(result)
    }

    pub async fn list_for_hr(&self, hr_id: &str) -> Result<Vec<Job>, String> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|job| job.hr_id == hr_id)
            .collect())
    }

    /// Full replacement of every mutable field; the payload overwrites the
    /// stored row wholesale.
    pub async fn update(&self, job: Job) -> Result<Job, String> {
        let encoded = encode_job(&job)?;
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        {
            let mut jobs = txn
                .open_table(JOBS)
                .map_err(|e| format!("Failed to open jobs table: {}", e))?;
            if jobs
                .get(job.id.as_str())
                .map_err(|e| e.to_string())?
                .is_none()
            {
                return Err("Job not found".to_string());
            }
            jobs.insert(job.id.as_str(), encoded.as_slice())
                .map_err(|e| format!("Failed to update job: {}", e))?;
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit job update: {}", e))?;

        info!(job_id = %job.id, "Job updated in database");

        Ok(job)
    }

    /// Permanent removal. Applications referencing the job are left in place.
    pub async fn delete(&self, id: &str) -> Result<bool, String> {
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut jobs = txn
                .open_table(JOBS)
                .map_err(|e| format!("Failed to open jobs table: {}", e))?;
            removed = jobs
                .remove(id)
                .map_err(|e| format!("Failed to delete job: {}", e))?
                .is_some();
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit job delete: {}", e))?;

        if removed {
            info!(job_id = %id, "Job deleted from database");
        }
        Ok(removed)
    }
}
