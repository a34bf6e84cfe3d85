/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! PostgreSQL statements. Documents live in `jsonb` columns; integer
//! parameters used in arithmetic are cast to `bigint` so that the bound
//! width matches what the store sends.

use crate::sql_dialect::{CollectionSql, ObjectDataSql, SqlDialect};

macro_rules! now_ms {
    () => {
        "(EXTRACT(EPOCH FROM clock_timestamp()) * 1000)::bigint"
    };
}

macro_rules! public_items {
    () => {
        concat!(
            "public_items AS (",
            "SELECT iri FROM fed_data ",
            "WHERE payload -> 'to' @> '\"https://www.w3.org/ns/activitystreams#Public\"'::jsonb ",
            "OR payload -> 'cc' @> '\"https://www.w3.org/ns/activitystreams#Public\"'::jsonb ",
            "UNION SELECT iri FROM local_data ",
            "WHERE payload -> 'to' @> '\"https://www.w3.org/ns/activitystreams#Public\"'::jsonb ",
            "OR payload -> 'cc' @> '\"https://www.w3.org/ns/activitystreams#Public\"'::jsonb), "
        )
    };
}

macro_rules! page {
    ($header:literal, $items:literal, $ctes:expr, $filter:expr) => {
        concat!(
            "WITH c AS (SELECT id FROM ", $header, " WHERE collection_iri = $1), ",
            $ctes,
            "w AS (SELECT i.id, i.item_iri FROM ", $items, " i JOIN c ON i.collection_id = c.id",
            $filter,
            " ORDER BY i.id DESC LIMIT GREATEST($3::bigint - $2::bigint + 1, 0) OFFSET $2::bigint) ",
            "SELECT jsonb_build_object('type', 'OrderedCollectionPage', 'totalItems', ",
            "(SELECT COUNT(*) FROM ", $items, " i JOIN c ON i.collection_id = c.id", $filter, "), ",
            "'orderedItems', (SELECT COALESCE(jsonb_agg(item_iri ORDER BY id DESC), '[]'::jsonb) FROM w)) ",
            "FROM c"
        )
    };
}

macro_rules! last_page {
    ($header:literal, $items:literal, $ctes:expr, $filter:expr) => {
        concat!(
            "WITH c AS (SELECT id FROM ", $header, " WHERE collection_iri = $1), ",
            $ctes,
            "s AS (SELECT GREATEST(COUNT(*) - $2::bigint, 0) AS start FROM ", $items,
            " i JOIN c ON i.collection_id = c.id", $filter, "), ",
            "w AS (SELECT i.id, i.item_iri FROM ", $items, " i JOIN c ON i.collection_id = c.id",
            $filter,
            " ORDER BY i.id DESC OFFSET (SELECT start FROM s)) ",
            "SELECT jsonb_build_object('type', 'OrderedCollectionPage', 'totalItems', ",
            "(SELECT COUNT(*) FROM ", $items, " i JOIN c ON i.collection_id = c.id", $filter, "), ",
            "'orderedItems', (SELECT COALESCE(jsonb_agg(item_iri ORDER BY id DESC), '[]'::jsonb) FROM w)), ",
            "(SELECT start FROM s) FROM c"
        )
    };
}

macro_rules! collection {
    ($header:literal, $items:literal) => {
        CollectionSql {
            create_header_table: concat!(
                "CREATE TABLE IF NOT EXISTS ", $header, " (",
                "id BIGSERIAL PRIMARY KEY, ",
                "actor_id TEXT NOT NULL UNIQUE, ",
                "collection_iri TEXT NOT NULL UNIQUE, ",
                "collection JSONB NOT NULL)"
            ),
            create_items_table: concat!(
                "CREATE TABLE IF NOT EXISTS ", $items, " (",
                "id BIGSERIAL PRIMARY KEY, ",
                "collection_id BIGINT NOT NULL REFERENCES ", $header, "(id) ON DELETE CASCADE, ",
                "item_iri TEXT NOT NULL, ",
                "UNIQUE (collection_id, item_iri))"
            ),
            insert: concat!(
                "INSERT INTO ", $header, " (actor_id, collection_iri, collection) ",
                "VALUES ($1, $2::jsonb ->> 'id', $2::jsonb)"
            ),
            contains_for_actor: concat!(
                "SELECT EXISTS (SELECT 1 FROM ", $items, " i JOIN ", $header,
                " c ON c.id = i.collection_id WHERE c.actor_id = $1 AND i.item_iri = $2)"
            ),
            contains: concat!(
                "SELECT EXISTS (SELECT 1 FROM ", $items, " i JOIN ", $header,
                " c ON c.id = i.collection_id WHERE c.collection_iri = $1 AND i.item_iri = $2)"
            ),
            get_page: page!($header, $items, "", ""),
            get_public_page: page!(
                $header,
                $items,
                public_items!(),
                " AND i.item_iri IN (SELECT iri FROM public_items)"
            ),
            get_last_page: last_page!($header, $items, "", ""),
            get_public_last_page: last_page!(
                $header,
                $items,
                public_items!(),
                " AND i.item_iri IN (SELECT iri FROM public_items)"
            ),
            prepend_item: concat!(
                "INSERT INTO ", $items, " (collection_id, item_iri) ",
                "SELECT id, $2::text FROM ", $header, " WHERE collection_iri = $1 ",
                "ON CONFLICT (collection_id, item_iri) DO NOTHING"
            ),
            delete_item: concat!(
                "DELETE FROM ", $items, " WHERE item_iri = $2 AND collection_id = ",
                "(SELECT id FROM ", $header, " WHERE collection_iri = $1)"
            ),
            actor_id: concat!("SELECT actor_id FROM ", $header, " WHERE collection_iri = $1"),
        }
    };
}

macro_rules! object_data {
    ($table:literal) => {
        ObjectDataSql {
            create_table: concat!(
                "CREATE TABLE IF NOT EXISTS ", $table, " (",
                "id BIGSERIAL PRIMARY KEY, ",
                "iri TEXT NOT NULL UNIQUE, ",
                "payload JSONB NOT NULL)"
            ),
            create: concat!(
                "INSERT INTO ", $table, " (iri, payload) VALUES ($1::jsonb ->> 'id', $1::jsonb)"
            ),
            update: concat!("UPDATE ", $table, " SET payload = $2::jsonb WHERE iri = $1"),
            delete: concat!("DELETE FROM ", $table, " WHERE iri = $1"),
            get: concat!("SELECT payload FROM ", $table, " WHERE iri = $1"),
        }
    };
}

macro_rules! token_columns {
    () => {
        "client_id, user_id, redirect_uri, scope, \
         code, code_created_ms, code_expires_ns, \
         access, access_created_ms, access_expires_ns, \
         refresh, refresh_created_ms, refresh_expires_ns"
    };
}

static OUTBOX: CollectionSql = collection!("outboxes", "outbox_items");
static INBOX: CollectionSql = collection!("inboxes", "inbox_items");
static FED_DATA: ObjectDataSql = object_data!("fed_data");
static LOCAL_DATA: ObjectDataSql = object_data!("local_data");

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn create_users_table(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS users (\
         id TEXT PRIMARY KEY DEFAULT gen_random_uuid()::text, \
         email TEXT NOT NULL UNIQUE, \
         hashpass BYTEA NOT NULL, \
         salt BYTEA NOT NULL, \
         actor JSONB NOT NULL, \
         privileges JSONB NOT NULL, \
         preferences JSONB NOT NULL)"
    }

    fn create_delivery_attempts_table(&self) -> &'static str {
        concat!(
            "CREATE TABLE IF NOT EXISTS delivery_attempts (",
            "id BIGSERIAL PRIMARY KEY, ",
            "from_actor TEXT NOT NULL, ",
            "to_actor TEXT NOT NULL, ",
            "payload JSONB NOT NULL, ",
            "state TEXT NOT NULL CHECK (state IN ('PENDING', 'SUCCEEDED', 'FAILED')), ",
            "created_at_ms BIGINT NOT NULL DEFAULT ",
            now_ms!(),
            ", ",
            "updated_at_ms BIGINT NULL)"
        )
    }

    fn create_private_keys_table(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS private_keys (\
         id BIGSERIAL PRIMARY KEY, \
         user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE, \
         purpose TEXT NOT NULL, \
         priv_key BYTEA NOT NULL, \
         UNIQUE (user_id, purpose))"
    }

    fn create_client_infos_table(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS client_infos (\
         id TEXT PRIMARY KEY DEFAULT gen_random_uuid()::text, \
         secret TEXT NOT NULL, \
         domain TEXT NOT NULL, \
         user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE)"
    }

    fn create_token_infos_table(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS token_infos (\
         id BIGSERIAL PRIMARY KEY, \
         client_id TEXT NOT NULL REFERENCES client_infos(id) ON DELETE CASCADE, \
         user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE, \
         redirect_uri TEXT NOT NULL, \
         scope TEXT NOT NULL, \
         code TEXT NULL, \
         code_created_ms BIGINT NULL, \
         code_expires_ns BIGINT NULL, \
         access TEXT NULL, \
         access_created_ms BIGINT NULL, \
         access_expires_ns BIGINT NULL, \
         refresh TEXT NULL, \
         refresh_created_ms BIGINT NULL, \
         refresh_expires_ns BIGINT NULL)"
    }

    fn outbox(&self) -> &'static CollectionSql {
        &OUTBOX
    }

    fn inbox(&self) -> &'static CollectionSql {
        &INBOX
    }

    fn fed_data(&self) -> &'static ObjectDataSql {
        &FED_DATA
    }

    fn local_data(&self) -> &'static ObjectDataSql {
        &LOCAL_DATA
    }

    fn outbox_for_inbox(&self) -> &'static str {
        "SELECT o.collection_iri FROM outboxes o \
         JOIN inboxes i ON i.actor_id = o.actor_id \
         WHERE i.collection_iri = $1"
    }

    fn insert_user(&self) -> &'static str {
        "INSERT INTO users (email, hashpass, salt, actor, privileges, preferences) \
         VALUES ($1, $2, $3, $4::jsonb, $5::jsonb, $6::jsonb) RETURNING id"
    }

    fn sensitive_user_by_email(&self) -> &'static str {
        "SELECT id, hashpass, salt FROM users WHERE email = $1"
    }

    fn user_by_id(&self) -> &'static str {
        "SELECT id, email, actor, privileges, preferences FROM users WHERE id = $1"
    }

    fn insert_attempt(&self) -> &'static str {
        "INSERT INTO delivery_attempts (from_actor, to_actor, payload, state) \
         VALUES ($1, $2, $3::jsonb, $4) RETURNING id"
    }

    fn mark_successful_attempt(&self) -> &'static str {
        concat!(
            "UPDATE delivery_attempts SET state = 'SUCCEEDED', updated_at_ms = ",
            now_ms!(),
            " WHERE id = $1 AND state = 'PENDING'"
        )
    }

    fn mark_failed_attempt(&self) -> &'static str {
        concat!(
            "UPDATE delivery_attempts SET state = 'FAILED', updated_at_ms = ",
            now_ms!(),
            " WHERE id = $1 AND state = 'PENDING'"
        )
    }

    fn attempt_state(&self) -> &'static str {
        "SELECT state FROM delivery_attempts WHERE id = $1"
    }

    fn count_attempts_by_state(&self) -> &'static str {
        "SELECT state, COUNT(*) FROM delivery_attempts GROUP BY state"
    }

    fn failed_attempts_from(&self) -> &'static str {
        "SELECT id, to_actor, payload FROM delivery_attempts \
         WHERE from_actor = $1 AND state = 'FAILED' ORDER BY id LIMIT $2"
    }

    fn create_private_key(&self) -> &'static str {
        "INSERT INTO private_keys (user_id, purpose, priv_key) VALUES ($1, $2, $3)"
    }

    fn get_private_key_by_user_id(&self) -> &'static str {
        "SELECT priv_key FROM private_keys WHERE user_id = $1 AND purpose = $2"
    }

    fn create_client_info(&self) -> &'static str {
        "INSERT INTO client_infos (secret, domain, user_id) VALUES ($1, $2, $3) RETURNING id"
    }

    fn get_client_info_by_id(&self) -> &'static str {
        "SELECT id, secret, domain, user_id FROM client_infos WHERE id = $1"
    }

    fn create_token_info(&self) -> &'static str {
        concat!(
            "INSERT INTO token_infos (",
            token_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        )
    }

    fn remove_token_info_by_code(&self) -> &'static str {
        "DELETE FROM token_infos WHERE code = $1"
    }

    fn remove_token_info_by_access(&self) -> &'static str {
        "DELETE FROM token_infos WHERE access = $1"
    }

    fn remove_token_info_by_refresh(&self) -> &'static str {
        "DELETE FROM token_infos WHERE refresh = $1"
    }

    fn get_token_info_by_code(&self) -> &'static str {
        concat!("SELECT ", token_columns!(), " FROM token_infos WHERE code = $1")
    }

    fn get_token_info_by_access(&self) -> &'static str {
        concat!("SELECT ", token_columns!(), " FROM token_infos WHERE access = $1")
    }

    fn get_token_info_by_refresh(&self) -> &'static str {
        concat!("SELECT ", token_columns!(), " FROM token_infos WHERE refresh = $1")
    }
}
