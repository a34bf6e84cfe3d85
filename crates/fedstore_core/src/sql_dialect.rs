/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Statement text per canonical store operation.
//!
//! Placeholders are positional (`?N` for SQLite, `$N` for PostgreSQL). The
//! parameter order and the order of returned columns are documented on each
//! operation and are identical across engines; the store binds by position
//! and never inspects column names.

/// Statements for one ordered collection kind (inbox or outbox).
///
/// The header table keeps one row per actor; items live in a child table
/// whose id increases on every insert. Logical order is item id descending,
/// so index 0 is the most recently prepended item.
#[derive(Debug)]
pub struct CollectionSql {
    pub create_header_table: &'static str,
    pub create_items_table: &'static str,
    /// Params: actorIRI, serializedCollection. The collection IRI is taken
    /// from the document's `id`.
    pub insert: &'static str,
    /// Params: actorIRI, itemIRI. Returns: boolean.
    pub contains_for_actor: &'static str,
    /// Params: collectionIRI, itemIRI. Returns: boolean.
    pub contains: &'static str,
    /// Params: collectionIRI, min, max-1 (inclusive upper bound).
    /// Returns: serializedPage. No row when the collection does not exist.
    pub get_page: &'static str,
    /// Same contract as `get_page`, public items only.
    pub get_public_page: &'static str,
    /// Params: collectionIRI, n. Returns: serializedPage, startIndex.
    pub get_last_page: &'static str,
    /// Same contract as `get_last_page`, public items only.
    pub get_public_last_page: &'static str,
    /// Params: collectionIRI, itemIRI. Re-prepending a present item changes
    /// nothing.
    pub prepend_item: &'static str,
    /// Params: collectionIRI, itemIRI.
    pub delete_item: &'static str,
    /// Params: collectionIRI. Returns: actorIRI.
    pub actor_id: &'static str,
}

/// Statements for a keyed document table (federated or local data).
#[derive(Debug)]
pub struct ObjectDataSql {
    pub create_table: &'static str,
    /// Params: payload. The key is the payload's `id`.
    pub create: &'static str,
    /// Params: iri, payload.
    pub update: &'static str,
    /// Params: iri.
    pub delete: &'static str,
    /// Params: iri. Returns: payload.
    pub get: &'static str,
}

pub trait SqlDialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn create_users_table(&self) -> &'static str;
    fn create_delivery_attempts_table(&self) -> &'static str;
    fn create_private_keys_table(&self) -> &'static str;
    fn create_client_infos_table(&self) -> &'static str;
    fn create_token_infos_table(&self) -> &'static str;

    fn outbox(&self) -> &'static CollectionSql;
    fn inbox(&self) -> &'static CollectionSql;
    fn fed_data(&self) -> &'static ObjectDataSql;
    fn local_data(&self) -> &'static ObjectDataSql;

    /// Params: inboxIRI. Returns: outboxIRI of the same actor.
    fn outbox_for_inbox(&self) -> &'static str;

    /// Params: email, hashpass, salt, actor, privileges, preferences.
    /// Returns: id.
    fn insert_user(&self) -> &'static str;
    /// Params: email. Returns: id, hashpass, salt.
    fn sensitive_user_by_email(&self) -> &'static str;
    /// Params: id. Returns: id, email, actor, privileges, preferences.
    fn user_by_id(&self) -> &'static str;

    /// Params: fromActor, toActor, payload, state. Returns: id.
    fn insert_attempt(&self) -> &'static str;
    /// Params: id. Only a pending attempt changes.
    fn mark_successful_attempt(&self) -> &'static str;
    /// Params: id. Only a pending attempt changes.
    fn mark_failed_attempt(&self) -> &'static str;
    /// Params: id. Returns: state.
    fn attempt_state(&self) -> &'static str;
    /// Returns one row per present state: state, count.
    fn count_attempts_by_state(&self) -> &'static str;
    /// Params: fromActor, limit. Returns: id, toActor, payload (oldest first).
    fn failed_attempts_from(&self) -> &'static str;

    /// Params: userID, purpose, key.
    fn create_private_key(&self) -> &'static str;
    /// Params: userID, purpose. Returns: key.
    fn get_private_key_by_user_id(&self) -> &'static str;

    /// Params: secret, domain, userID. Returns: id.
    fn create_client_info(&self) -> &'static str;
    /// Params: id. Returns: id, secret, domain, userID.
    fn get_client_info_by_id(&self) -> &'static str;

    /// Params: the 13 token columns in order: clientID, userID, redirectURI,
    /// scope, code, codeCreated, codeExpires, access, accessCreated,
    /// accessExpires, refresh, refreshCreated, refreshExpires.
    fn create_token_info(&self) -> &'static str;
    /// Params: code.
    fn remove_token_info_by_code(&self) -> &'static str;
    /// Params: access.
    fn remove_token_info_by_access(&self) -> &'static str;
    /// Params: refresh.
    fn remove_token_info_by_refresh(&self) -> &'static str;
    /// Params: code. Returns: the 13 token columns.
    fn get_token_info_by_code(&self) -> &'static str;
    /// Params: access. Returns: the 13 token columns.
    fn get_token_info_by_access(&self) -> &'static str;
    /// Params: refresh. Returns: the 13 token columns.
    fn get_token_info_by_refresh(&self) -> &'static str;

    /// Table creation statements in dependency order.
    fn schema(&self) -> Vec<&'static str> {
        vec![
            self.create_users_table(),
            self.fed_data().create_table,
            self.local_data().create_table,
            self.outbox().create_header_table,
            self.outbox().create_items_table,
            self.inbox().create_header_table,
            self.inbox().create_items_table,
            self.create_delivery_attempts_table(),
            self.create_private_keys_table(),
            self.create_client_infos_table(),
            self.create_token_infos_table(),
        ]
    }
}

/// A parameterized statement with the number of positional parameters its
/// contract requires.
#[derive(Debug, Clone, Copy)]
pub struct Statement {
    pub name: &'static str,
    pub sql: &'static str,
    pub params: usize,
}

/// Every parameterized statement of a dialect, for placeholder checks.
pub fn catalog(d: &dyn SqlDialect) -> Vec<Statement> {
    let mut out = Vec::new();
    for c in [d.outbox(), d.inbox()] {
        out.extend([
            Statement { name: "insert", sql: c.insert, params: 2 },
            Statement { name: "contains_for_actor", sql: c.contains_for_actor, params: 2 },
            Statement { name: "contains", sql: c.contains, params: 2 },
            Statement { name: "get_page", sql: c.get_page, params: 3 },
            Statement { name: "get_public_page", sql: c.get_public_page, params: 3 },
            Statement { name: "get_last_page", sql: c.get_last_page, params: 2 },
            Statement { name: "get_public_last_page", sql: c.get_public_last_page, params: 2 },
            Statement { name: "prepend_item", sql: c.prepend_item, params: 2 },
            Statement { name: "delete_item", sql: c.delete_item, params: 2 },
            Statement { name: "actor_id", sql: c.actor_id, params: 1 },
        ]);
    }
    for o in [d.fed_data(), d.local_data()] {
        out.extend([
            Statement { name: "data_create", sql: o.create, params: 1 },
            Statement { name: "data_update", sql: o.update, params: 2 },
            Statement { name: "data_delete", sql: o.delete, params: 1 },
            Statement { name: "data_get", sql: o.get, params: 1 },
        ]);
    }
    out.extend([
        Statement { name: "outbox_for_inbox", sql: d.outbox_for_inbox(), params: 1 },
        Statement { name: "insert_user", sql: d.insert_user(), params: 6 },
        Statement { name: "sensitive_user_by_email", sql: d.sensitive_user_by_email(), params: 1 },
        Statement { name: "user_by_id", sql: d.user_by_id(), params: 1 },
        Statement { name: "insert_attempt", sql: d.insert_attempt(), params: 4 },
        Statement { name: "mark_successful_attempt", sql: d.mark_successful_attempt(), params: 1 },
        Statement { name: "mark_failed_attempt", sql: d.mark_failed_attempt(), params: 1 },
        Statement { name: "attempt_state", sql: d.attempt_state(), params: 1 },
        Statement { name: "count_attempts_by_state", sql: d.count_attempts_by_state(), params: 0 },
        Statement { name: "failed_attempts_from", sql: d.failed_attempts_from(), params: 2 },
        Statement { name: "create_private_key", sql: d.create_private_key(), params: 3 },
        Statement { name: "get_private_key_by_user_id", sql: d.get_private_key_by_user_id(), params: 2 },
        Statement { name: "create_client_info", sql: d.create_client_info(), params: 3 },
        Statement { name: "get_client_info_by_id", sql: d.get_client_info_by_id(), params: 1 },
        Statement { name: "create_token_info", sql: d.create_token_info(), params: 13 },
        Statement { name: "remove_token_info_by_code", sql: d.remove_token_info_by_code(), params: 1 },
        Statement { name: "remove_token_info_by_access", sql: d.remove_token_info_by_access(), params: 1 },
        Statement { name: "remove_token_info_by_refresh", sql: d.remove_token_info_by_refresh(), params: 1 },
        Statement { name: "get_token_info_by_code", sql: d.get_token_info_by_code(), params: 1 },
        Statement { name: "get_token_info_by_access", sql: d.get_token_info_by_access(), params: 1 },
        Statement { name: "get_token_info_by_refresh", sql: d.get_token_info_by_refresh(), params: 1 },
    ]);
    out
}

/// Positional placeholder indices used in `sql`, given the engine's prefix
/// character (`?` or `$`).
pub fn placeholders(sql: &str, prefix: char) -> Vec<usize> {
    let mut out = Vec::new();
    let mut chars = sql.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != prefix {
            continue;
        }
        let mut n = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            n.push(d);
            chars.next();
        }
        if let Ok(idx) = n.parse::<usize>() {
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
    }
    out.sort_unstable();
    out
}

#[cfg(test)]
pub(crate) fn assert_placeholder_shapes(d: &dyn SqlDialect, prefix: char) {
    for st in catalog(d) {
        let found = placeholders(st.sql, prefix);
        let expected: Vec<usize> = (1..=st.params).collect();
        assert_eq!(
            found, expected,
            "{} {}: placeholders {:?}, contract wants 1..={}",
            d.name(),
            st.name,
            found,
            st.params
        );
    }
    for ddl in d.schema() {
        assert!(placeholders(ddl, prefix).is_empty(), "ddl takes no params: {ddl}");
    }
}
