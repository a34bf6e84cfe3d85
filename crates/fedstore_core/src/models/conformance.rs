/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! One workload run against every engine, through `Database::transact`.
//!
//! The SQLite run always happens. The PostgreSQL run needs a disposable
//! database in `FEDSTORE_TEST_PG_URL` and is skipped without it. The whole
//! workload runs in one transaction that is rolled back at the end, so the
//! target database is left as it was found.

use super::private_keys::HTTP_SIGNATURE_PURPOSE;
use super::users::fixtures;
use super::*;
use crate::codec::{DeliveryState, NullDuration};
use crate::config::{DatabaseConfig, DbDriver, StoreConfig};
use crate::db::{Database, DbError};
use crate::delivery::queue_outbound;
use crate::error::StoreError;
use crate::paths::{empty_inbox, empty_outbox};
use fedstore_vocab::{ActivityStreams, PUBLIC_ADDRESS};
use serde_json::json;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

const PG_URL_VAR: &str = "FEDSTORE_TEST_PG_URL";

#[derive(Debug)]
enum Outcome {
    Finished,
    Failed(StoreError),
}

impl From<DbError> for Outcome {
    fn from(e: DbError) -> Self {
        Outcome::Failed(e.into())
    }
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn tag() -> String {
    format!(
        "{}x{}",
        std::process::id(),
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    )
}

fn doc(value: serde_json::Value) -> ActivityStreams {
    ActivityStreams::from_value(value).unwrap()
}

fn run(db: &Database) {
    let dialect = db.dialect();
    db.transact(|tx| provision_schema(tx, &*dialect)).unwrap();
    let models = Models::new(dialect);
    let tag = tag();

    let outcome: std::result::Result<(), Outcome> =
        db.transact(|tx| match workload(tx, &models, &tag) {
            Ok(()) => Err(Outcome::Finished),
            Err(e) => Err(Outcome::Failed(e)),
        });
    match outcome {
        Err(Outcome::Finished) => {}
        other => panic!("workload failed: {other:?}"),
    }

    let written = url(&format!("https://b.example/{tag}/i/1"));
    let left_behind = db.transact(|tx| models.fed_data.find(tx, &written)).unwrap();
    assert!(left_behind.is_none(), "rolled back rows are visible");
}

fn workload(tx: &mut dyn SqlTx, m: &Models, tag: &str) -> Result<()> {
    // users and keys
    let new = fixtures::new_user(&format!("alice{tag}"));
    let uid = m.users.insert_user(tx, &new)?;
    assert_eq!(m.users.user_by_id(tx, &uid)?.actor, new.actor);
    assert_eq!(m.users.sensitive_user_by_email(tx, &new.email)?.id, uid);
    assert!(matches!(m.users.user_by_id(tx, "nobody"), Err(StoreError::NotFound(_))));
    m.private_keys.create(tx, &uid, HTTP_SIGNATURE_PURPOSE, &[0x30, 0x82])?;
    assert_eq!(
        m.private_keys.get_by_user_id(tx, &uid, HTTP_SIGNATURE_PURPOSE)?,
        vec![0x30, 0x82]
    );

    // collections
    let actor = new.actor.id.clone();
    let outbox = empty_outbox(&actor);
    let inbox = empty_inbox(&actor);
    m.outboxes.create(tx, &actor, &outbox)?;
    m.inboxes.create(tx, &actor, &inbox)?;
    assert!(matches!(
        m.outboxes.create(tx, &actor, &empty_outbox(&actor)),
        Err(StoreError::DuplicateActor(_))
    ));
    assert_eq!(m.users.actor_id_for_outbox(tx, &outbox.id)?, actor);
    assert_eq!(m.users.actor_id_for_inbox(tx, &inbox.id)?, actor);
    assert_eq!(m.outboxes.outbox_for_inbox(tx, &inbox.id)?, outbox.id);

    let i1 = url(&format!("https://b.example/{tag}/i/1"));
    let i2 = url(&format!("https://b.example/{tag}/i/2"));
    m.fed_data.create(
        tx,
        &doc(json!({"type": "Create", "id": i1.as_str(), "to": [PUBLIC_ADDRESS]})),
    )?;
    m.fed_data.create(
        tx,
        &doc(json!({"type": "Follow", "id": i2.as_str(), "to": [actor.as_str()]})),
    )?;
    for (collection, iri) in [(&*m.outboxes, &outbox.id), (&*m.inboxes, &inbox.id)] {
        collection.prepend_item(tx, iri, &i1)?;
        collection.prepend_item(tx, iri, &i2)?;
        collection.prepend_item(tx, iri, &i1)?;

        let page = collection.get_page(tx, iri, 0, 1)?;
        assert_eq!(page.item_iris(), vec![i2.clone()]);
        assert_eq!(page.total_items, Some(2));
        let (last, start) = collection.get_last_page(tx, iri, 1)?;
        assert_eq!((last.item_iris(), start), (vec![i1.clone()], 1));

        let public = collection.get_public_page(tx, iri, 0, 10)?;
        assert_eq!(public.item_iris(), vec![i1.clone()]);
        let (public_last, start) = collection.get_public_last_page(tx, iri, 5)?;
        assert_eq!((public_last.item_iris(), start), (vec![i1.clone()], 0));

        assert!(collection.contains(tx, iri, &i2)?);
        assert!(collection.contains_for_actor(tx, &actor, &i2)?);
        assert!(collection.delete_item(tx, iri, &i2)?);
        assert!(!collection.contains(tx, iri, &i2)?);
    }
    let cfg = StoreConfig {
        page_size: 1,
        ..StoreConfig::default()
    };
    let linked = m.inboxes.linked_page(tx, &inbox.id, 0, &cfg)?;
    assert_eq!(linked.item_iris(), vec![i1.clone()]);
    assert_eq!(linked.next, None);

    // stored documents
    let note_iri = url(&format!("https://a.example/{tag}/notes/1"));
    m.local_data.create(tx, &doc(json!({"type": "Note", "id": note_iri.as_str()})))?;
    let edited = doc(json!({"type": "Note", "id": note_iri.as_str(), "content": "edited"}));
    m.local_data.update(tx, &note_iri, &edited)?;
    assert_eq!(m.local_data.get(tx, &note_iri)?, edited);
    m.local_data.delete(tx, &note_iri)?;
    assert!(m.local_data.find(tx, &note_iri)?.is_none());

    // delivery attempts
    let bob = format!("https://b.example/{tag}/users/bob");
    m.fed_data.create(
        tx,
        &doc(json!({"type": "Person", "id": bob, "inbox": format!("{bob}/inbox")})),
    )?;
    let followers = format!("https://a.example/{tag}/followers");
    m.local_data.create(
        tx,
        &doc(json!({"type": "OrderedCollection", "id": followers, "orderedItems": [bob]})),
    )?;
    let create = doc(json!({
        "type": "Create",
        "id": format!("https://a.example/{tag}/activities/1"),
        "to": followers
    }));
    let queued = queue_outbound(tx, m, &StoreConfig::default(), &actor, &create)?;
    assert_eq!(queued.len(), 1);
    let retry = m
        .delivery_attempts
        .insert_attempt(tx, &actor, &url(&format!("{bob}/inbox")), &create)?;
    assert_eq!(m.delivery_attempts.state(tx, queued[0])?, DeliveryState::Pending);
    m.delivery_attempts.mark_succeeded(tx, queued[0])?;
    assert!(matches!(
        m.delivery_attempts.mark_failed(tx, queued[0]),
        Err(StoreError::InvalidTransition { state: DeliveryState::Succeeded, .. })
    ));
    m.delivery_attempts.mark_failed(tx, retry)?;
    let failed = m.delivery_attempts.failed_from(tx, &actor, 10)?;
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, retry);
    assert_eq!(failed[0].payload, create);
    let stats = m.delivery_attempts.stats(tx)?;
    assert!(stats.succeeded >= 1 && stats.failed >= 1);

    // oauth
    let cid = m.client_infos.create(tx, "s3cret", "app.example", &uid)?;
    assert_eq!(m.client_infos.get_by_id(tx, &cid)?.user_id, uid);
    let created = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    let token = TokenInfo {
        client_id: cid,
        user_id: uid,
        redirect_uri: "https://app.example/cb".into(),
        scope: "read".into(),
        code: Some(format!("code{tag}")),
        code_created: Some(created),
        code_expires_in: Duration::from_secs(600).into(),
        access: Some(format!("access{tag}")),
        access_created: Some(created),
        access_expires_in: NullDuration(None),
        refresh: Some(format!("refresh{tag}")),
        refresh_created: Some(created),
        refresh_expires_in: Duration::from_secs(3_600).into(),
    };
    m.token_infos.create(tx, &token)?;
    assert_eq!(m.token_infos.get_by_code(tx, &format!("code{tag}"))?, token);
    assert_eq!(m.token_infos.get_by_access(tx, &format!("access{tag}"))?, token);
    assert_eq!(m.token_infos.get_by_refresh(tx, &format!("refresh{tag}"))?, token);
    m.token_infos.remove_by_refresh(tx, &format!("refresh{tag}"))?;
    assert!(matches!(
        m.token_infos.get_by_code(tx, &format!("code{tag}")),
        Err(StoreError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn sqlite_runs_the_shared_workload() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = DatabaseConfig {
        sqlite_path: dir.path().join("conformance.db"),
        ..DatabaseConfig::default()
    };
    run(&Database::open(&cfg).unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn postgres_runs_the_shared_workload() {
    let Ok(pg_url) = std::env::var(PG_URL_VAR) else {
        eprintln!("{PG_URL_VAR} not set, skipping postgres run");
        return;
    };
    let cfg = DatabaseConfig {
        driver: DbDriver::Postgres,
        url: Some(pg_url),
        ..DatabaseConfig::default()
    };
    run(&Database::open(&cfg).unwrap());
}
