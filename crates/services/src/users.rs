//! # UserService
//!
//! Account management: registration, authentication, profile updates,
//! and the two password flows. Creation is an explicit factory that
//! fails on invalid input; callers decide what to log.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use domains::validation::{validate_email, validate_password, validate_profile};
use domains::{
    DomainError, Identity, Notifier, PasswordHasher, Result, Role, UserRepo, ValidationErrors,
};

/// Length of a generated reset password.
const RESET_PASSWORD_CHARS: usize = 12;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn Notifier>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            hasher,
            notifier,
        }
    }

    /// Self-service registration; always lands on the `user` role.
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity> {
        self.create(email, password, Role::User).await
    }

    /// Creates an account with an explicit role. No identity exists
    /// without a password; the email is normalized to lowercase and must
    /// be free (case-insensitively).
    pub async fn create(&self, email: &str, password: &str, role: Role) -> Result<Identity> {
        let mut errors = ValidationErrors::new();
        let email = match validate_email(email) {
            Ok(email) => email,
            Err(message) => {
                errors.push("email", message);
                String::new()
            }
        };
        if let Err(message) = validate_password(password) {
            errors.push("password", message);
        }
        errors.into_result()?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("email is already registered".into()));
        }

        let now = Utc::now();
        let user = Identity {
            id: Uuid::now_v7(),
            email,
            password_hash: self.hasher.hash(password)?,
            role,
            is_active: true,
            phone: None,
            telegram: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(&user).await?;
        Ok(user)
    }

    /// Credential check. The same rejection covers unknown emails, bad
    /// passwords, and disabled accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity> {
        let email = validate_email(email)
            .map_err(|_| DomainError::unauthorized("invalid email or password"))?;
        match self.users.find_by_email(&email).await? {
            Some(user) if self.hasher.verify(password, &user.password_hash) => {
                if user.is_active {
                    Ok(user)
                } else {
                    Err(DomainError::unauthorized("invalid email or password"))
                }
            }
            _ => Err(DomainError::unauthorized("invalid email or password")),
        }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Identity>> {
        self.users.find(id).await
    }

    /// Updates the optional contact fields of a profile.
    pub async fn update_profile(
        &self,
        who: &Identity,
        phone: Option<&str>,
        telegram: Option<&str>,
    ) -> Result<Identity> {
        let (phone, telegram) = validate_profile(phone, telegram)?;
        let user = Identity {
            phone,
            telegram,
            updated_at: Utc::now(),
            ..who.clone()
        };
        self.users.update(&user).await?;
        Ok(user)
    }

    /// Replaces the password after verifying the old one.
    pub async fn change_password(&self, who: &Identity, old: &str, new: &str) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if !self.hasher.verify(old, &who.password_hash) {
            errors.push("old_password", "is incorrect");
        }
        if let Err(message) = validate_password(new) {
            errors.push("new_password", message);
        }
        errors.into_result()?;

        let user = Identity {
            password_hash: self.hasher.hash(new)?,
            updated_at: Utc::now(),
            ..who.clone()
        };
        self.users.update(&user).await?;
        tracing::info!(user = %user.id, "password changed");
        Ok(())
    }

    /// Generates a fresh random password, stores its hash, and mails it
    /// to the account. Unlike the view notice, a delivery failure here
    /// surfaces: the caller must know the password never arrived.
    pub async fn reset_password(&self, who: &Identity) -> Result<()> {
        let password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RESET_PASSWORD_CHARS)
            .map(char::from)
            .collect();

        let user = Identity {
            password_hash: self.hasher.hash(&password)?,
            updated_at: Utc::now(),
            ..who.clone()
        };
        self.users.update(&user).await?;
        tracing::info!(user = %user.id, "password reset");

        self.notifier
            .send(
                "Your new password",
                &format!("Your new password: {password}"),
                &[user.email],
            )
            .await
    }

    /// The account roster; staff only.
    pub async fn list_users(&self, viewer: &Identity) -> Result<Vec<Identity>> {
        if !viewer.role.is_staff() {
            return Err(DomainError::unauthorized(
                "only moderators and admins may list accounts",
            ));
        }
        self.users.list().await
    }

    /// A single profile; staff, or the account itself.
    pub async fn get_user(&self, viewer: &Identity, id: Uuid) -> Result<Identity> {
        if !viewer.role.is_staff() && viewer.id != id {
            return Err(DomainError::unauthorized("you may not view this profile"));
        }
        self.users
            .find(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("identity", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn register_normalizes_and_defaults_to_user_role() {
        let fx = fixtures();
        let user = fx
            .accounts
            .register("  Jane@Example.COM ", "password123")
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_case_insensitively() {
        let fx = fixtures();
        fx.accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();
        let err = fx
            .accounts
            .register("JANE@example.com", "password456")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_registration_collects_both_fields() {
        let fx = fixtures();
        let err = fx.accounts.register("nope", "short").await.unwrap_err();
        match err {
            DomainError::Validation(v) => {
                assert!(v.contains_field("email"));
                assert!(v.contains_field("password"));
            }
            other => panic!("expected validation, got {other}"),
        }
    }

    #[tokio::test]
    async fn authenticate_accepts_case_variant_email() {
        let fx = fixtures();
        fx.accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();
        let user = fx
            .accounts
            .authenticate("Jane@Example.com", "password123")
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");

        let err = fx
            .accounts
            .authenticate("jane@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn disabled_accounts_cannot_authenticate() {
        let fx = fixtures();
        let user = fx
            .accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();
        // flip the account off out-of-band
        let disabled = Identity {
            is_active: false,
            ..user
        };
        fx.accounts.users.update(&disabled).await.unwrap();

        let err = fx
            .accounts
            .authenticate("jane@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn profile_update_keeps_credentials() {
        let fx = fixtures();
        let user = fx
            .accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();
        let updated = fx
            .accounts
            .update_profile(&user, Some("+123456"), Some("@jane"))
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+123456"));
        assert_eq!(updated.telegram.as_deref(), Some("@jane"));

        assert!(fx
            .accounts
            .authenticate("jane@example.com", "password123")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn change_password_requires_the_old_one() {
        let fx = fixtures();
        let user = fx
            .accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();

        let err = fx
            .accounts
            .change_password(&user, "wrong", "newpassword1")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        fx.accounts
            .change_password(&user, "password123", "newpassword1")
            .await
            .unwrap();
        assert!(fx
            .accounts
            .authenticate("jane@example.com", "newpassword1")
            .await
            .is_ok());
        assert!(fx
            .accounts
            .authenticate("jane@example.com", "password123")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn reset_password_mails_a_working_password() {
        let fx = fixtures();
        let user = fx
            .accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();
        fx.accounts.reset_password(&user).await.unwrap();

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["jane@example.com".to_string()]);
        let password = sent[0].body.rsplit(' ').next().unwrap().to_string();
        assert_eq!(password.len(), 12);
        assert!(fx
            .accounts
            .authenticate("jane@example.com", &password)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn reset_password_surfaces_delivery_failure() {
        let fx = fixtures();
        let user = fx
            .accounts
            .register("jane@example.com", "password123")
            .await
            .unwrap();
        fx.notifier.fail_all();
        assert!(fx.accounts.reset_password(&user).await.is_err());
    }

    #[tokio::test]
    async fn roster_is_staff_only_profiles_staff_or_self() {
        let fx = fixtures();
        let user = fx.user().await;
        let other = fx.user().await;
        let moderator = fx.staff(Role::Moderator).await;

        assert!(matches!(
            fx.accounts.list_users(&user).await.unwrap_err(),
            DomainError::Unauthorized(_)
        ));
        assert!(fx.accounts.list_users(&moderator).await.unwrap().len() >= 3);

        assert!(fx.accounts.get_user(&user, user.id).await.is_ok());
        assert!(fx.accounts.get_user(&moderator, user.id).await.is_ok());
        assert!(matches!(
            fx.accounts.get_user(&user, other.id).await.unwrap_err(),
            DomainError::Unauthorized(_)
        ));
    }
}
