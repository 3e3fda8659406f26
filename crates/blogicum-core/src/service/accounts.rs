use uuid::Uuid;

use super::BlogService;
use crate::domain::{NewAccount, ProfileChanges, User};
use crate::error::{DomainError, FieldErrors};
use crate::policy::Viewer;
use crate::ports::BaseRepository;

impl BlogService {
    /// Create an account. Username and email must both be free.
    pub async fn register(
        &self,
        account: NewAccount,
        password_hash: String,
    ) -> Result<User, DomainError> {
        self.check_identity_free(&account.username, &account.email, None)
            .await?;

        let user = self
            .repos
            .users
            .insert(User::new(account, password_hash))
            .await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Make sure a staff account named `account.username` exists.
    ///
    /// An existing user with that name is promoted and keeps its password;
    /// otherwise a new staff account is created with `password_hash`.
    pub async fn ensure_staff_account(
        &self,
        account: NewAccount,
        password_hash: String,
    ) -> Result<User, DomainError> {
        if let Some(mut user) = self.repos.users.find_by_username(&account.username).await? {
            if user.is_staff {
                return Ok(user);
            }
            user.is_staff = true;
            let user = self.repos.users.update(user).await?;
            tracing::info!(user_id = %user.id, "Existing user promoted to staff");
            return Ok(user);
        }

        self.check_identity_free(&account.username, &account.email, None)
            .await?;

        let user = self
            .repos
            .users
            .insert(User::staff(account, password_hash))
            .await?;
        tracing::info!(user_id = %user.id, "Staff account created");
        Ok(user)
    }

    /// Look a user up for a login attempt.
    pub async fn find_login(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self.repos.users.find_by_username(username).await?)
    }

    pub async fn current_user(&self, viewer: &Viewer) -> Result<User, DomainError> {
        let user_id = viewer.require()?;
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    /// Edit the viewer's own profile.
    pub async fn update_profile(
        &self,
        viewer: &Viewer,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let mut user = self.current_user(viewer).await?;
        self.check_identity_free(&changes.username, &changes.email, Some(user.id))
            .await?;

        user.apply_profile(changes);
        let user = self.repos.users.update(user).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Username and email uniqueness, ignoring the user `except`.
    async fn check_identity_free(
        &self,
        username: &str,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), DomainError> {
        let taken_by_other = |user: Option<User>| user.is_some_and(|u| Some(u.id) != except);
        let mut errors = FieldErrors::new();

        if taken_by_other(self.repos.users.find_by_username(username).await?) {
            errors.add("username", "This username is already taken.");
        }
        if taken_by_other(self.repos.users.find_by_email(email).await?) {
            errors.add("email", "This email is already in use.");
        }

        errors.into_result()
    }
}
