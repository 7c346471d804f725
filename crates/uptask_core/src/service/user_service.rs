//! Registration and sign-in use cases.
//!
//! # Invariants
//! - Empty login or password never reaches storage.
//! - Passwords are hashed before they cross the service boundary into SQL.
//! - Logs carry user ids only, never logins or passwords.

use crate::db::{Database, DbError};
use crate::events::{ChangeEvent, ChangeFeed};
use crate::model::user::{hash_password, verify_password, NewUser, User};
use crate::model::UserId;
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Message hosts show when a registration form is incomplete.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please fill all fields";

/// Service error for user use cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Login or password was empty; nothing was written.
    MissingCredentials,
    /// Another user already registered this login.
    LoginTaken,
    UserNotFound(UserId),
    Repo(RepoError),
}

impl UserServiceError {
    /// Short text suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredentials => MISSING_CREDENTIALS_MESSAGE.to_string(),
            Self::LoginTaken => "This login is already taken".to_string(),
            other => other.to_string(),
        }
    }
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "login and password must not be empty"),
            Self::LoginTaken => write!(f, "login is already registered"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate { entity: "user", .. } => Self::LoginTaken,
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(UserId(id)),
            RepoError::Validation(_) => Self::MissingCredentials,
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for UserServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// User registration/sign-in service.
#[derive(Clone, Copy)]
pub struct UserService<'a> {
    db: &'a Database,
    feed: &'a ChangeFeed,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database, feed: &'a ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Registers a user when both fields are non-empty.
    pub fn register_user(&self, login: &str, password: &str) -> Result<User, UserServiceError> {
        let request = NewUser::new(login, password);
        if request.validate().is_err() {
            warn!("event=user_register module=service status=rejected reason=missing_credentials");
            return Err(UserServiceError::MissingCredentials);
        }

        let password_hash = hash_password(&request.password);
        let created = self.db.transaction(|conn| {
            let repo = SqliteUserRepository::try_new(conn)?;
            repo.create_user(&request.login, &password_hash)
                .map_err(UserServiceError::from)
        });
        let user = match created {
            Ok(user) => user,
            Err(UserServiceError::LoginTaken) => {
                warn!("event=user_register module=service status=rejected reason=login_taken");
                return Err(UserServiceError::LoginTaken);
            }
            Err(err) => return Err(err),
        };

        info!(
            "event=user_register module=service status=ok user_id={}",
            user.id
        );
        self.feed
            .publish(ChangeEvent::UserRegistered { user_id: user.id });
        Ok(user)
    }

    /// Returns the user when the login exists and the password matches.
    pub fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let found = self.find_by_login(login)?;
        let user = found.filter(|user| verify_password(password, &user.password_hash));
        match &user {
            Some(user) => info!(
                "event=user_sign_in module=service status=ok user_id={}",
                user.id
            ),
            None => warn!("event=user_sign_in module=service status=rejected"),
        }
        Ok(user)
    }

    /// First (lowest id) user with this login.
    pub fn find_by_login(&self, login: &str) -> Result<Option<User>, UserServiceError> {
        self.db.read(|conn| {
            let repo = SqliteUserRepository::try_new(conn)?;
            repo.find_by_login(login).map_err(UserServiceError::from)
        })
    }

    pub fn get_user(&self, user_id: UserId) -> Result<Option<User>, UserServiceError> {
        self.db.read(|conn| {
            let repo = SqliteUserRepository::try_new(conn)?;
            repo.get_user(user_id).map_err(UserServiceError::from)
        })
    }
}
