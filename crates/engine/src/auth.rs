//! Sessions and the identity collaborator.
//!
//! Who the user is comes from an external [`IdentityProvider`]. The engine
//! only keeps the resulting [`Session`] in the `auth` collection so that a
//! guest session survives restarts.

use std::future::Future;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine,
    adapters::Adapter,
    store::{Collection, Record},
};

/// Key of the persisted session in the `auth` collection.
pub const SESSION_KEY: &str = "axi-budget-auth";

const GUEST_USERNAME: &str = "ゲストユーザー";

/// One row of the `auth` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthEntry {
    pub key: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    /// Informational only: guests see the same data as signed-in users.
    pub is_guest: bool,
}

impl User {
    fn guest(now: DateTime<Utc>) -> Self {
        Self {
            user_id: format!("guest-{}", now.timestamp_millis()),
            username: GUEST_USERNAME.to_string(),
            is_guest: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl Session {
    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn is_guest(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_guest)
    }
}

/// External sign-in capability (OAuth or similar).
pub trait IdentityProvider: Send + Sync {
    /// The user currently signed in with the provider, if any.
    fn current_user(&self) -> impl Future<Output = ResultEngine<Option<User>>> + Send;

    fn sign_in(&self) -> impl Future<Output = ResultEngine<User>> + Send;

    fn sign_out(&self) -> impl Future<Output = ResultEngine<()>> + Send;
}

/// Provider for offline use: nobody is ever signed in and only guest
/// sessions are possible.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalIdentity;

impl IdentityProvider for LocalIdentity {
    async fn current_user(&self) -> ResultEngine<Option<User>> {
        Ok(None)
    }

    async fn sign_in(&self) -> ResultEngine<User> {
        Err(EngineError::Identity(
            "no identity provider configured, continue as guest".to_string(),
        ))
    }

    async fn sign_out(&self) -> ResultEngine<()> {
        Ok(())
    }
}

/// Persists the current [`Session`] in the `auth` collection.
#[derive(Clone, Debug)]
pub struct SessionStore {
    adapter: Adapter<AuthEntry>,
}

impl SessionStore {
    pub fn new(adapter: Adapter<AuthEntry>) -> Self {
        Self { adapter }
    }

    pub async fn load(&self) -> ResultEngine<Option<Session>> {
        let Some(payload) = self.adapter.get_value(SESSION_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_value(payload)
            .map(Some)
            .map_err(|err| EngineError::InvalidRecord(format!("stored session: {err}")))
    }

    pub async fn save(&self, session: &Session) -> ResultEngine<()> {
        let payload = serde_json::to_value(session)
            .map_err(|err| EngineError::InvalidRecord(format!("session: {err}")))?;
        self.adapter.put_value(SESSION_KEY, payload).await
    }

    pub async fn clear(&self) -> ResultEngine<()> {
        self.adapter.delete(SESSION_KEY).await?;
        Ok(())
    }
}

/// Session lifecycle on top of an [`IdentityProvider`].
#[derive(Debug)]
pub struct AuthService<P> {
    provider: P,
    sessions: SessionStore,
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: P, sessions: SessionStore) -> Self {
        Self { provider, sessions }
    }

    /// Resolve the session at startup.
    ///
    /// A user signed in with the provider wins; otherwise a persisted guest
    /// session is restored. Provider failures are logged and treated as
    /// signed out.
    pub async fn initialize_auth(&self) -> ResultEngine<Session> {
        match self.provider.current_user().await {
            Ok(Some(user)) => {
                let session = Session::signed_in(user);
                self.sessions.save(&session).await?;
                return Ok(session);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("identity provider unavailable: {err}"),
        }

        match self.sessions.load().await {
            Ok(Some(session)) if session.is_guest() => Ok(session),
            Ok(_) => Ok(Session::signed_out()),
            Err(err) => {
                tracing::warn!("discarding unreadable session: {err}");
                self.sessions.clear().await?;
                Ok(Session::signed_out())
            }
        }
    }

    pub async fn sign_in_with_oauth(&self) -> ResultEngine<Session> {
        let user = self.provider.sign_in().await.inspect_err(|err| {
            tracing::error!("sign in failed: {err}");
        })?;
        let session = Session::signed_in(user);
        self.sessions.save(&session).await?;
        tracing::info!("signed in");
        Ok(session)
    }

    pub async fn sign_in_as_guest(&self) -> ResultEngine<Session> {
        let session = Session::signed_in(User::guest(Utc::now()));
        self.sessions.save(&session).await?;
        tracing::info!("continuing as guest");
        Ok(session)
    }

    pub async fn sign_out(&self) -> ResultEngine<Session> {
        self.provider.sign_out().await.inspect_err(|err| {
            tracing::error!("sign out failed: {err}");
        })?;
        self.sessions.clear().await?;
        Ok(Session::signed_out())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "auth")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub payload: Json,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The `auth` collection has no secondary indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthIndex {}

impl Record for AuthEntry {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Index = AuthIndex;

    const COLLECTION: Collection = Collection::Auth;

    fn key_column() -> Column {
        Column::Key
    }

    fn index_column(index: AuthIndex) -> Column {
        match index {}
    }

    fn key(&self) -> String {
        self.key.clone()
    }

    fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        Ok(ActiveModel {
            key: ActiveValue::Set(self.key.clone()),
            payload: ActiveValue::Set(self.payload.clone()),
            updated_at: ActiveValue::Set(self.updated_at),
        })
    }

    fn from_model(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            key: model.key,
            payload: model.payload,
            updated_at: model.updated_at,
        })
    }
}
