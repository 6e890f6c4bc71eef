use crate::db::{Database, USERS, USERS_BY_EMAIL, USERS_BY_PHONE};
use crate::models::user::{Role, User};
use bincode::{Decode, Encode};
use redb::ReadableTable;
use tracing::info;

#[derive(Debug, Encode, Decode)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub password_hash: String,
    pub image: Option<Vec<u8>>,
    pub created_at: i64, // Store as timestamp
}

impl From<User> for StoredUser {
    fn from(user: User) -> Self {
        StoredUser {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            password_hash: user.password_hash,
            image: user.image,
            created_at: user.created_at.timestamp(),
        }
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        User {
            id: stored.id,
            name: stored.name,
            email: stored.email,
            phone: stored.phone,
            role: stored.role,
            password_hash: stored.password_hash,
            image: stored.image,
            created_at: chrono::DateTime::from_timestamp(stored.created_at, 0)
                .unwrap_or_else(chrono::Utc::now),
        }
    }
}

fn decode_user(data: &[u8]) -> Result<User, String> {
    let (stored, _): (StoredUser, usize) =
        bincode::decode_from_slice(data, bincode::config::standard())
            .map_err(|e| format!("Failed to decode user: {}", e))?;
    Ok(User::from(stored))
}

pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        UserRepository { db }
    }

    /// Inserts a user. The email/phone uniqueness check and the insert commit
    /// in one write transaction; write transactions serialize, so two
    /// concurrent signups with the same email cannot both pass the check.
    pub async fn create(&self, user: User) -> Result<User, String> {
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        {
            let mut users = txn
                .open_table(USERS)
                .map_err(|e| format!("Failed to open users table: {}", e))?;
            let mut by_email = txn
                .open_table(USERS_BY_EMAIL)
                .map_err(|e| format!("Failed to open email index: {}", e))?;
            let mut by_phone = txn
                .open_table(USERS_BY_PHONE)
                .map_err(|e| format!("Failed to open phone index: {}", e))?;

            let email_taken = by_email
                .get(user.email.as_str())
                .map_err(|e| e.to_string())?
                .is_some();
            let phone_taken = by_phone
                .get(user.phone.as_str())
                .map_err(|e| e.to_string())?
                .is_some();
            if email_taken || phone_taken {
                return Err("Email or phone already exists".to_string());
            }

            let stored = StoredUser::from(user.clone());
            let encoded = bincode::encode_to_vec(&stored, bincode::config::standard())
                .map_err(|e| format!("Failed to encode user: {}", e))?;

            users
                .insert(user.id.as_str(), encoded.as_slice())
                .map_err(|e| format!("Failed to insert user: {}", e))?;
            by_email
                .insert(user.email.as_str(), user.id.as_str())
                .map_err(|e| format!("Failed to update email index: {}", e))?;
            by_phone
                .insert(user.phone.as_str(), user.id.as_str())
                .map_err(|e| format!("Failed to update phone index: {}", e))?;
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit user insert: {}", e))?;

        info!(user_id = %user.id, email = %user.email, "User created in database");

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let users = txn
            .open_table(USERS)
            .map_err(|e| format!("Failed to open users table: {}", e))?;

        match users.get(id).map_err(|e| format!("Failed to get user: {}", e))? {
            Some(data) => Ok(Some(decode_user(data.value())?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let by_email = txn
            .open_table(USERS_BY_EMAIL)
            .map_err(|e| format!("Failed to open email index: {}", e))?;

        let user_id = match by_email
            .get(email)
            .map_err(|e| format!("Failed to get email index: {}", e))?
        {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        drop(by_email);

        let users = txn
            .open_table(USERS)
            .map_err(|e| format!("Failed to open users table: {}", e))?;
        match users
            .get(user_id.as_str())
            .map_err(|e| format!("Failed to get user: {}", e))?
        {
            Some(data) => Ok(Some(decode_user(data.value())?)),
            None => Ok(None),
        }
    }

    /// Full scan; used for notification broadcasts to a role.
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let users = txn
            .open_table(USERS)
            .map_err(|e| format!("Failed to open users table: {}", e))?;

        let mut result = Vec::new();
        for entry in users.iter().map_err(|e| e.to_string())? {
            let (_, data) = entry.map_err(|e| e.to_string())?;
            let user = decode_user(data.value())?;
            if user.role == role {
                result.push(user);
            }
        }
        Ok(result)
    }
}
