use async_trait::async_trait;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for credential flows and profile operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new account and issue its first token.
    ///
    /// # Returns
    /// Created user and a bearer token for it
    ///
    /// # Errors
    /// * `AlreadyExists` - Email is already registered
    /// * `DuplicatePhone` - Phone number is already registered
    /// * `Password` - Hashing failed
    /// * `Token` - Token could not be issued
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Session, UserError>;

    /// Exchange email and password for a token.
    ///
    /// # Errors
    /// * `NotFoundByEmail` - No account with this email
    /// * `InvalidCredentials` - Password does not match
    /// * `Token` - Token could not be issued
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, command: LoginCommand) -> Result<Session, UserError>;

    /// Retrieve the stored record of an authenticated user.
    ///
    /// # Errors
    /// * `NotFound` - User no longer exists
    /// * `DatabaseError` - Database operation failed
    async fn get_profile(&self, id: &UserId) -> Result<User, UserError>;

    /// Apply a partial profile update and reissue the token, since the
    /// embedded claims may have changed.
    ///
    /// # Errors
    /// * `NotFound` - User no longer exists
    /// * `AlreadyExists` - New email belongs to another account
    /// * `DuplicatePhone` - New phone belongs to another account
    /// * `Token` - Token could not be issued
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<Session, UserError>;

    /// Replace the stored credential after checking the current one.
    ///
    /// # Errors
    /// * `NotFound` - User no longer exists
    /// * `IncorrectPassword` - Current password does not match
    /// * `Password` - Hashing or verification failed
    /// * `DatabaseError` - Database operation failed
    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `AlreadyExists` - Email is already registered
    /// * `DuplicatePhone` - Phone number is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by normalized email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Update existing user in storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `AlreadyExists` - New email is already registered
    /// * `DuplicatePhone` - New phone number is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;
}
