//! User management service implementation.
//!
//! This module provides the `UserManagement` trait and the `UserService`
//! implementation backed by a [`Store`].

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gatekeeper_auth::{AuthError, Credentials, Principal, UserLookup};
use gatekeeper_core::UserId;
use gatekeeper_store::{Store, StoreError, User};

use crate::error::{Result, UserError};
use crate::types::{
    CreateUserRequest, UpdateUserRequest, UserView, UsersConfig, APPLICATION_SCOPE,
    MANAGE_USERS_SCOPE,
};

/// Trait defining the user management operations.
#[async_trait]
pub trait UserManagement: Send + Sync {
    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::BadParams` for a blank login or password and
    /// `UserError::AlreadyExists` if the login is taken.
    async fn create(&self, request: CreateUserRequest) -> Result<UserView>;

    /// Replace a user's login, attributes, scopes, and optionally password.
    ///
    /// # Errors
    ///
    /// Returns `UserError::BadParams` for a blank or malformed id or a blank
    /// login, and `UserError::NotFound` if the user doesn't exist.
    async fn update(&self, id: &str, request: UpdateUserRequest) -> Result<UserView>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the user doesn't exist.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the user doesn't exist.
    async fn get_by_id(&self, id: &str) -> Result<UserView>;

    /// List all users.
    async fn get_all(&self) -> Result<Vec<UserView>>;

    /// Verify a login and password.
    ///
    /// # Errors
    ///
    /// Returns `UserError::InvalidCredentials` for an unknown login or wrong password.
    async fn login(&self, login: &str, password: &str) -> Result<Principal>;
}

/// The user management service.
pub struct UserService<S: Store> {
    store: Arc<S>,
    config: UsersConfig,
}

impl<S: Store> UserService<S> {
    /// Create a new user service.
    #[must_use]
    pub fn new(store: Arc<S>, config: UsersConfig) -> Self {
        Self { store, config }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, UsersConfig::default())
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ensure the operator account from configuration exists.
    ///
    /// The account is granted the application and manage-users scopes. An
    /// existing account with the same login is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are blank or storage fails.
    pub async fn create_application_user(&self, login: &str, password: &str) -> Result<()> {
        let request = CreateUserRequest {
            login: login.to_string(),
            password: password.to_string(),
            scopes: vec![APPLICATION_SCOPE.to_string(), MANAGE_USERS_SCOPE.to_string()],
            ..CreateUserRequest::default()
        };

        match self.create_user(request).await {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, login = %user.login, "Created application user");
                Ok(())
            }
            Err(UserError::AlreadyExists(login)) => {
                tracing::info!(login = %login, "Application user already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .map_err(|e| UserError::Internal(e.to_string()))
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        let login = request.login.trim().to_string();
        if login.is_empty() {
            return Err(UserError::blank("login"));
        }
        if request.password.trim().is_empty() {
            return Err(UserError::blank("password"));
        }

        let user = User {
            user_id: UserId::generate(),
            login,
            password_hash: self.hash_password(request.password).await?,
            properties: request.properties,
            scopes: request.scopes,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.store.insert_user(&user).map_err(|e| match e {
            StoreError::AlreadyExists(_) => UserError::AlreadyExists(user.login.clone()),
            other => other.into(),
        })?;
        Ok(user)
    }

    fn get_existing(&self, id: &str) -> Result<User> {
        let user_id = parse_id(id)?;
        self.store
            .get_user(&user_id)?
            .ok_or(UserError::NotFound(user_id))
    }
}

fn parse_id(id: &str) -> Result<UserId> {
    if id.trim().is_empty() {
        return Err(UserError::blank("id"));
    }
    UserId::from_str(id).map_err(|_| UserError::BadParams(format!("id '{id}' is not a valid user id")))
}

#[async_trait]
impl<S: Store + 'static> UserManagement for UserService<S> {
    async fn create(&self, request: CreateUserRequest) -> Result<UserView> {
        let user = self.create_user(request).await?;

        tracing::info!(user_id = %user.user_id, login = %user.login, "Created user");

        Ok(user.into())
    }

    async fn update(&self, id: &str, request: UpdateUserRequest) -> Result<UserView> {
        let mut user = self.get_existing(id)?;

        let login = request.login.trim().to_string();
        if login.is_empty() {
            return Err(UserError::blank("login"));
        }
        if let Some(password) = request.password {
            if password.trim().is_empty() {
                return Err(UserError::blank("password"));
            }
            user.password_hash = self.hash_password(password).await?;
        }

        user.login = login;
        user.properties = request.properties;
        user.scopes = request.scopes;
        user.updated_at = Some(Utc::now());

        self.store.put_user(&user).map_err(|e| match e {
            StoreError::AlreadyExists(_) => UserError::AlreadyExists(user.login.clone()),
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.user_id, login = %user.login, "Updated user");

        Ok(user.into())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let user_id = parse_id(id)?;
        self.store.delete_user(&user_id).map_err(|e| match e {
            StoreError::NotFound => UserError::NotFound(user_id),
            other => other.into(),
        })?;

        tracing::info!(user_id = %user_id, "Deleted user");

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<UserView> {
        self.get_existing(id).map(Into::into)
    }

    async fn get_all(&self) -> Result<Vec<UserView>> {
        Ok(self
            .store
            .list_users()?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn login(&self, login: &str, password: &str) -> Result<Principal> {
        let user = self
            .store
            .get_user_by_login(login)?
            .ok_or(UserError::InvalidCredentials)?;

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .unwrap_or(false);

        if !verified {
            return Err(UserError::InvalidCredentials);
        }

        tracing::debug!(user_id = %user.user_id, "User logged in");

        Ok(Principal {
            id: user.user_id,
            login: user.login,
            scopes: user.scopes,
        })
    }
}

#[async_trait]
impl<S: Store + 'static> UserLookup for UserService<S> {
    async fn get_by_login(&self, login: &str) -> gatekeeper_auth::Result<Option<Credentials>> {
        let user = self
            .store
            .get_user_by_login(login)
            .map_err(|e| AuthError::Lookup(e.to_string()))?;

        Ok(user.map(|u| Credentials {
            principal: Principal {
                id: u.user_id,
                login: u.login,
                scopes: u.scopes,
            },
            password_hash: u.password_hash,
        }))
    }
}
