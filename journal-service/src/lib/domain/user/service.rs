use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::DEFAULT_IMAGE;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for credential flows.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    async fn find_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    fn session(&self, user: User) -> Result<Session, UserError> {
        let token = self.authenticator.issue_token(&user.to_claims())?;
        Ok(Session { user, token })
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<Session, UserError> {
        if self
            .repository
            .find_by_email(&command.email)
            .await?
            .is_some()
        {
            return Err(UserError::AlreadyExists(command.email.to_string()));
        }

        let password_hash = self
            .authenticator
            .hash_password(command.password.expose())?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: command.name,
            email: command.email,
            phone: command.phone,
            password_hash,
            image: command.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        self.session(created_user)
    }

    async fn login(&self, command: LoginCommand) -> Result<Session, UserError> {
        let user = self
            .repository
            .find_by_email(&command.email)
            .await?
            .ok_or_else(|| UserError::NotFoundByEmail(command.email.to_string()))?;

        let result = self
            .authenticator
            .authenticate(
                command.password.expose(),
                &user.password_hash,
                &user.to_claims(),
            )
            .map_err(|e| {
                if matches!(e, auth::AuthenticationError::InvalidCredentials) {
                    tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
                }
                UserError::from(e)
            })?;

        Ok(Session {
            user,
            token: result.access_token,
        })
    }

    async fn get_profile(&self, id: &UserId) -> Result<User, UserError> {
        self.find_user(id).await
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<Session, UserError> {
        let mut user = self.find_user(id).await?;

        if let Some(new_email) = command.email {
            if new_email != user.email {
                if let Some(owner) = self.repository.find_by_email(&new_email).await? {
                    if owner.id != user.id {
                        return Err(UserError::AlreadyExists(new_email.to_string()));
                    }
                }
            }
            user.email = new_email;
        }

        if let Some(new_name) = command.name {
            user.name = new_name;
        }

        if let Some(new_phone) = command.phone {
            user.phone = Some(new_phone);
        }

        if let Some(new_image) = command.image {
            user.image = new_image;
        }

        user.updated_at = Utc::now();

        let updated_user = self.repository.update(user).await?;
        tracing::info!(user_id = %updated_user.id, "Profile updated");

        self.session(updated_user)
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        let mut user = self.find_user(id).await?;

        let matches = self
            .authenticator
            .verify_password(command.current_password.expose(), &user.password_hash)?;
        if !matches {
            tracing::info!(user_id = %user.id, "Password change rejected: current password mismatch");
            return Err(UserError::IncorrectPassword);
        }

        user.password_hash = self
            .authenticator
            .hash_password(command.new_password.expose())?;
        user.updated_at = Utc::now();

        self.repository.update(user).await?;
        tracing::info!(user_id = %id, "Password changed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::DisplayName;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::Password;
    use crate::domain::user::models::PhoneNumber;
    use crate::test_support::authenticator;

    // Define mocks in the test module using mockall
    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
        }
    }

    fn password(value: &str) -> Password {
        Password::new(value.to_string()).unwrap()
    }

    fn email(value: &str) -> EmailAddress {
        EmailAddress::new(value.to_string()).unwrap()
    }

    fn stored_user(authenticator: &Authenticator, plaintext: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            name: DisplayName::new("Alice".to_string()).unwrap(),
            email: email("a@x.com"),
            phone: None,
            password_hash: authenticator.hash_password(plaintext).unwrap(),
            image: DEFAULT_IMAGE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn register_command() -> RegisterCommand {
        RegisterCommand {
            name: DisplayName::new("Alice".to_string()).unwrap(),
            email: email("A@X.com"),
            password: password("p1"),
            phone: Some(PhoneNumber::new("5551234567".to_string()).unwrap()),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .withf(|email| email.as_str() == "a@x.com")
            .times(1)
            .returning(|_| Ok(None));

        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "a@x.com"
                    && user.image == DEFAULT_IMAGE
                    && user.password_hash.starts_with("$argon2id$")
                    && user.password_hash != "p1"
            })
            .times(1)
            .returning(|user| Ok(user));

        let authenticator = authenticator();
        let service = UserService::new(Arc::new(repository), authenticator.clone());

        let session = service.register(register_command()).await.unwrap();

        assert_eq!(session.user.name.as_str(), "Alice");
        let claims = authenticator.verify_token(&session.token).unwrap();
        assert_eq!(claims, session.user.to_claims());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let existing = stored_user(&authenticator, "p1");

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service.register(register_command()).await;
        assert!(matches!(result, Err(UserError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_race_on_unique_email() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_find_by_email().returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|user| Err(UserError::AlreadyExists(user.email.to_string())));

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command()).await;
        assert!(matches!(result, Err(UserError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "p1");
        let user_id = user.id;

        repository
            .expect_find_by_email()
            .withf(|email| email.as_str() == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), authenticator.clone());

        let session = service
            .login(LoginCommand {
                email: email("a@x.com"),
                password: password("p1"),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, user_id);
        let claims = authenticator.verify_token(&session.token).unwrap();
        assert_eq!(claims.id, user_id.to_string());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "p1");

        repository
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service
            .login(LoginCommand {
                email: email("a@x.com"),
                password: password("p2"),
            })
            .await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service
            .login(LoginCommand {
                email: email("nobody@x.com"),
                password: password("p1"),
            })
            .await;
        assert!(matches!(result, Err(UserError::NotFoundByEmail(_))));
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service.get_profile(&UserId::new()).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_profile_reissues_token() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "p1");
        let user_id = user.id;

        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_find_by_email()
            .withf(|email| email.as_str() == "new@x.com")
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_update()
            .withf(|user| user.name.as_str() == "Alicia" && user.email.as_str() == "new@x.com")
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository), authenticator.clone());

        let command = UpdateProfileCommand {
            name: Some(DisplayName::new("Alicia".to_string()).unwrap()),
            email: Some(email("new@x.com")),
            ..Default::default()
        };

        let session = service.update_profile(&user_id, command).await.unwrap();

        let claims = authenticator.verify_token(&session.token).unwrap();
        assert_eq!(claims.name, "Alicia");
        assert_eq!(claims.email, "new@x.com");
    }

    #[tokio::test]
    async fn test_update_profile_email_taken() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "p1");
        let user_id = user.id;
        let other = stored_user(&authenticator, "p2");

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_find_by_email()
            .returning(move |_| Ok(Some(other.clone())));
        repository.expect_update().times(0);

        let service = UserService::new(Arc::new(repository), authenticator);

        let command = UpdateProfileCommand {
            email: Some(email("taken@x.com")),
            ..Default::default()
        };

        let result = service.update_profile(&user_id, command).await;
        assert!(matches!(result, Err(UserError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "p1");
        let user_id = user.id;
        let old_hash = user.password_hash.clone();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let verifier = authenticator.clone();
        repository
            .expect_update()
            .withf(move |user| {
                user.password_hash != old_hash
                    && verifier
                        .verify_password("p2", &user.password_hash)
                        .unwrap_or(false)
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository), authenticator);

        let command = ChangePasswordCommand {
            current_password: password("p1"),
            new_password: password("p2"),
        };

        assert!(service.change_password(&user_id, command).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "p1");
        let user_id = user.id;

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update().times(0);

        let service = UserService::new(Arc::new(repository), authenticator);

        let command = ChangePasswordCommand {
            current_password: password("wrong"),
            new_password: password("p2"),
        };

        let result = service.change_password(&user_id, command).await;
        assert!(matches!(result, Err(UserError::IncorrectPassword)));
    }

    #[tokio::test]
    async fn test_register_without_keys_fails() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));
        repository.expect_create().returning(|user| Ok(user));

        let service = UserService::new(
            Arc::new(repository),
            crate::test_support::keyless_authenticator(),
        );

        let result = service.register(register_command()).await;
        assert!(matches!(
            result,
            Err(UserError::Token(auth::JwtError::KeyUnavailable))
        ));
    }
}
