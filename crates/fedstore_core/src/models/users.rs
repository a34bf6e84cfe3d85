/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::exactly_one;
use crate::codec::{Json, OnFollowBehavior};
use crate::db::SqlTx;
use crate::error::Result;
use crate::sql_dialect::SqlDialect;
use crate::sql_params;
use fedstore_vocab::Actor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Privileges {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub instance_user: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub on_follow: OnFollowBehavior,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub hashpass: Vec<u8>,
    pub salt: Vec<u8>,
    pub actor: Actor,
    pub privileges: Privileges,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub actor: Actor,
    pub privileges: Privileges,
    pub preferences: Preferences,
}

/// Credentials for password checks. Kept apart from `User` so they are only
/// loaded when asked for.
#[derive(Clone, PartialEq)]
pub struct SensitiveUser {
    pub id: String,
    pub hashpass: Vec<u8>,
    pub salt: Vec<u8>,
}

impl std::fmt::Debug for SensitiveUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveUser").field("id", &self.id).finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Users {
    dialect: Arc<dyn SqlDialect>,
}

impl Users {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    /// Returns the generated user id.
    pub fn insert_user(&self, tx: &mut dyn SqlTx, user: &NewUser) -> Result<String> {
        let params = sql_params![
            user.email,
            user.hashpass,
            user.salt,
            user.actor,
            Json(&user.privileges),
            Json(&user.preferences),
        ];
        let rows = tx.query(self.dialect.insert_user(), &params)?;
        Ok(exactly_one(rows, "inserted user")?.get(0)?)
    }

    pub fn sensitive_user_by_email(&self, tx: &mut dyn SqlTx, email: &str) -> Result<SensitiveUser> {
        let rows = tx.query(self.dialect.sensitive_user_by_email(), &sql_params![email])?;
        let row = exactly_one(rows, "user by email")?;
        Ok(SensitiveUser {
            id: row.get(0)?,
            hashpass: row.get(1)?,
            salt: row.get(2)?,
        })
    }

    pub fn user_by_id(&self, tx: &mut dyn SqlTx, id: &str) -> Result<User> {
        let rows = tx.query(self.dialect.user_by_id(), &sql_params![id])?;
        let row = exactly_one(rows, &format!("user {id}"))?;
        let Json(privileges): Json<Privileges> = row.get(3)?;
        let Json(preferences): Json<Preferences> = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            actor: row.get(2)?,
            privileges,
            preferences,
        })
    }

    pub fn actor_id_for_outbox(&self, tx: &mut dyn SqlTx, outbox: &Url) -> Result<Url> {
        let rows = tx.query(self.dialect.outbox().actor_id, &sql_params![outbox])?;
        Ok(exactly_one(rows, &format!("actor for outbox {outbox}"))?.get(0)?)
    }

    pub fn actor_id_for_inbox(&self, tx: &mut dyn SqlTx, inbox: &Url) -> Result<Url> {
        let rows = tx.query(self.dialect.inbox().actor_id, &sql_params![inbox])?;
        Ok(exactly_one(rows, &format!("actor for inbox {inbox}"))?.get(0)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::testing;
    use crate::paths::{empty_inbox, empty_outbox};

    #[test]
    fn insert_and_load() {
        let (mut conn, m) = testing::sqlite();
        let new = fixtures::new_user("alice");
        let id = m.users.insert_user(&mut conn, &new).unwrap();
        assert!(!id.is_empty());

        let user = m.users.user_by_id(&mut conn, &id).unwrap();
        assert_eq!(user.email, new.email);
        assert_eq!(user.actor, new.actor);
        assert_eq!(user.preferences.on_follow, OnFollowBehavior::AlwaysAccept);

        let secret = m.users.sensitive_user_by_email(&mut conn, &new.email).unwrap();
        assert_eq!(secret.id, id);
        assert_eq!(secret.hashpass, vec![1, 2, 3]);
        assert!(!format!("{secret:?}").contains("hashpass"));

        assert!(matches!(
            m.users.user_by_id(&mut conn, "nobody"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn unknown_on_follow_reads_as_manual() {
        let prefs: Preferences =
            serde_json::from_value(serde_json::json!({"on_follow": "WHATEVER", "theme": "dark"})).unwrap();
        assert_eq!(prefs.on_follow, OnFollowBehavior::Manual);
        assert_eq!(prefs.extra.get("theme"), Some(&Value::from("dark")));
    }

    #[test]
    fn actor_for_collections() {
        let (mut conn, m) = testing::sqlite();
        let new = fixtures::new_user("carol");
        let actor = new.actor.id.clone();
        m.outboxes.create(&mut conn, &actor, &empty_outbox(&actor)).unwrap();
        m.inboxes.create(&mut conn, &actor, &empty_inbox(&actor)).unwrap();
        let outbox = new.actor.outbox.clone().unwrap();
        let inbox = new.actor.inbox.clone().unwrap();
        assert_eq!(m.users.actor_id_for_outbox(&mut conn, &outbox).unwrap(), actor);
        assert_eq!(m.users.actor_id_for_inbox(&mut conn, &inbox).unwrap(), actor);
    }
}
