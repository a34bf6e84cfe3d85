/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::{at_most_one, exactly_one};
use crate::codec::CodecError;
use crate::db::SqlTx;
use crate::error::{Result, StoreError};
use crate::sql_dialect::{ObjectDataSql, SqlDialect};
use crate::sql_params;
use fedstore_vocab::ActivityStreams;
use std::ops::Deref;
use std::sync::Arc;
use url::Url;

/// Documents keyed by their `id` IRI.
#[derive(Clone)]
pub struct ObjectData {
    dialect: Arc<dyn SqlDialect>,
    local: bool,
}

impl ObjectData {
    fn sql(&self) -> &'static ObjectDataSql {
        if self.local {
            self.dialect.local_data()
        } else {
            self.dialect.fed_data()
        }
    }

    fn what(&self, iri: &Url) -> String {
        let table = if self.local { "local" } else { "federated" };
        format!("{table} object {iri}")
    }

    pub fn create(&self, tx: &mut dyn SqlTx, doc: &ActivityStreams) -> Result<()> {
        if doc.id().is_none() {
            return Err(CodecError::MissingId.into());
        }
        tx.execute(self.sql().create, &sql_params![doc])?;
        Ok(())
    }

    pub fn update(&self, tx: &mut dyn SqlTx, iri: &Url, doc: &ActivityStreams) -> Result<()> {
        let changed = tx.execute(self.sql().update, &sql_params![iri, doc])?;
        if changed == 0 {
            return Err(StoreError::NotFound(self.what(iri)));
        }
        Ok(())
    }

    pub fn delete(&self, tx: &mut dyn SqlTx, iri: &Url) -> Result<()> {
        tx.execute(self.sql().delete, &sql_params![iri])?;
        Ok(())
    }

    pub fn get(&self, tx: &mut dyn SqlTx, iri: &Url) -> Result<ActivityStreams> {
        let rows = tx.query(self.sql().get, &sql_params![iri])?;
        Ok(exactly_one(rows, &self.what(iri))?.get(0)?)
    }

    pub fn find(&self, tx: &mut dyn SqlTx, iri: &Url) -> Result<Option<ActivityStreams>> {
        let rows = tx.query(self.sql().get, &sql_params![iri])?;
        match at_most_one(rows, &self.what(iri))? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

/// Documents fetched from other servers.
#[derive(Clone)]
pub struct FedData(ObjectData);

impl FedData {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self(ObjectData {
            dialect,
            local: false,
        })
    }
}

impl Deref for FedData {
    type Target = ObjectData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Documents authored on this server.
#[derive(Clone)]
pub struct LocalData(ObjectData);

impl LocalData {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self(ObjectData {
            dialect,
            local: true,
        })
    }
}

impl Deref for LocalData {
    type Target = ObjectData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;
    use serde_json::json;

    fn note(id: &str, content: &str) -> ActivityStreams {
        ActivityStreams::from_value(json!({"type": "Note", "id": id, "content": content})).unwrap()
    }

    #[test]
    fn create_get_update_delete() {
        let (mut conn, m) = testing::sqlite();
        let iri = Url::parse("https://b.example/notes/1").unwrap();
        m.fed_data.create(&mut conn, &note(iri.as_str(), "v1")).unwrap();
        assert_eq!(m.fed_data.get(&mut conn, &iri).unwrap(), note(iri.as_str(), "v1"));
        assert!(m.local_data.find(&mut conn, &iri).unwrap().is_none());

        m.fed_data.update(&mut conn, &iri, &note(iri.as_str(), "v2")).unwrap();
        assert_eq!(m.fed_data.get(&mut conn, &iri).unwrap(), note(iri.as_str(), "v2"));

        m.fed_data.delete(&mut conn, &iri).unwrap();
        assert!(matches!(m.fed_data.get(&mut conn, &iri), Err(StoreError::NotFound(_))));
        assert!(matches!(
            m.fed_data.update(&mut conn, &iri, &note(iri.as_str(), "v3")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn documents_need_an_id() {
        let (mut conn, m) = testing::sqlite();
        let anon = ActivityStreams::from_value(json!({"type": "Note", "content": "?"})).unwrap();
        assert!(matches!(
            m.local_data.create(&mut conn, &anon),
            Err(StoreError::Decode(CodecError::MissingId))
        ));
    }
}
