/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::exactly_one;
use crate::db::SqlTx;
use crate::error::Result;
use crate::sql_dialect::SqlDialect;
use crate::sql_params;
use std::sync::Arc;

/// Purpose tag of the key used to sign outgoing federation requests.
pub const HTTP_SIGNATURE_PURPOSE: &str = "http-signature";

/// PKCS#8 private keys, one per (user, purpose).
#[derive(Clone)]
pub struct PrivateKeys {
    dialect: Arc<dyn SqlDialect>,
}

impl PrivateKeys {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    pub fn create(&self, tx: &mut dyn SqlTx, user_id: &str, purpose: &str, pkcs8: &[u8]) -> Result<()> {
        tx.execute(self.dialect.create_private_key(), &sql_params![user_id, purpose, pkcs8])?;
        Ok(())
    }

    pub fn get_by_user_id(&self, tx: &mut dyn SqlTx, user_id: &str, purpose: &str) -> Result<Vec<u8>> {
        let rows = tx.query(
            self.dialect.get_private_key_by_user_id(),
            &sql_params![user_id, purpose],
        )?;
        Ok(exactly_one(rows, &format!("{purpose} key of user {user_id}"))?.get(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::error::StoreError;
    use crate::models::testing;
    use crate::models::users::fixtures;

    #[test]
    fn one_key_per_purpose() {
        let (mut conn, m) = testing::sqlite();
        let uid = m.users.insert_user(&mut conn, &fixtures::new_user("alice")).unwrap();
        m.private_keys
            .create(&mut conn, &uid, HTTP_SIGNATURE_PURPOSE, &[0x30, 0x82, 0x01])
            .unwrap();
        assert_eq!(
            m.private_keys.get_by_user_id(&mut conn, &uid, HTTP_SIGNATURE_PURPOSE).unwrap(),
            vec![0x30, 0x82, 0x01]
        );
        assert!(matches!(
            m.private_keys.create(&mut conn, &uid, HTTP_SIGNATURE_PURPOSE, &[1]),
            Err(StoreError::Database(DbError::UniqueViolation(_)))
        ));
        assert!(matches!(
            m.private_keys.get_by_user_id(&mut conn, &uid, "other"),
            Err(StoreError::NotFound(_))
        ));
    }
}
