use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store with the same uniqueness rules as the
/// `users` table (unique email, unique non-null phone).
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reject `user` if another record already holds its email or phone.
fn check_unique(users: &HashMap<UserId, User>, user: &User) -> Result<(), UserError> {
    for other in users.values().filter(|other| other.id != user.id) {
        if other.email == user.email {
            return Err(UserError::AlreadyExists(user.email.to_string()));
        }

        if let (Some(phone), Some(other_phone)) = (&user.phone, &other.phone) {
            if phone == other_phone {
                return Err(UserError::DuplicatePhone(phone.to_string()));
            }
        }
    }

    Ok(())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.id) {
            return Err(UserError::DatabaseError(format!(
                "duplicate primary key {}",
                user.id
            )));
        }
        check_unique(&users, &user)?;

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id.to_string()));
        }
        check_unique(&users, &user)?;

        users.insert(user.id, user.clone());
        Ok(user)
    }
}
