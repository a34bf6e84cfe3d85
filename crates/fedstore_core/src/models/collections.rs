/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Inboxes and outboxes: newest-first ordered collections, paged by offset.

use super::{at_most_one, exactly_one};
use crate::config::StoreConfig;
use crate::db::{DbError, SqlTx};
use crate::error::{Result, StoreError};
use crate::paths::page_iri;
use crate::sql_dialect::{CollectionSql, SqlDialect};
use crate::sql_params;
use fedstore_vocab::{ActivityStreams, OrderedCollection, OrderedCollectionPage};
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Inbox,
    Outbox,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::Inbox => "inbox",
            Kind::Outbox => "outbox",
        }
    }
}

/// Operations shared by inboxes and outboxes.
#[derive(Clone)]
pub struct OrderedCollections {
    dialect: Arc<dyn SqlDialect>,
    kind: Kind,
}

impl OrderedCollections {
    fn sql(&self) -> &'static CollectionSql {
        match self.kind {
            Kind::Inbox => self.dialect.inbox(),
            Kind::Outbox => self.dialect.outbox(),
        }
    }

    /// Stores the collection header for `actor` and seeds any items it
    /// already lists, keeping their order.
    pub fn create(
        &self,
        tx: &mut dyn SqlTx,
        actor: &Url,
        collection: &OrderedCollection,
    ) -> Result<()> {
        // Checked up front: a failed insert aborts a postgres transaction.
        if let Some(owner) = self.owner(tx, &collection.id)? {
            if &owner != actor {
                return Err(StoreError::DuplicateCollection {
                    collection: collection.id.to_string(),
                    owner: owner.to_string(),
                });
            }
            return Err(StoreError::DuplicateActor(actor.to_string()));
        }
        let mut header = collection.clone();
        header.ordered_items = None;
        header.total_items = None;
        let params = sql_params![actor, ActivityStreams::OrderedCollection(header)];
        match tx.execute(self.sql().insert, &params) {
            Ok(_) => {}
            Err(DbError::UniqueViolation(_)) => {
                return Err(StoreError::DuplicateActor(actor.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        for item in collection.item_iris().iter().rev() {
            self.prepend_item(tx, &collection.id, item)?;
        }
        debug!(kind = self.kind.label(), actor = %actor, "collection created");
        Ok(())
    }

    pub fn contains(&self, tx: &mut dyn SqlTx, collection: &Url, item: &Url) -> Result<bool> {
        let rows = tx.query(self.sql().contains, &sql_params![collection, item])?;
        Ok(exactly_one(rows, "collection membership")?.get(0)?)
    }

    pub fn contains_for_actor(&self, tx: &mut dyn SqlTx, actor: &Url, item: &Url) -> Result<bool> {
        let rows = tx.query(self.sql().contains_for_actor, &sql_params![actor, item])?;
        Ok(exactly_one(rows, "collection membership")?.get(0)?)
    }

    /// Items at positions `[min, max)`, newest first.
    pub fn get_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        min: i64,
        max: i64,
    ) -> Result<OrderedCollectionPage> {
        self.page(tx, self.sql().get_page, collection, min, max)
    }

    /// Like `get_page`, counting only items addressed to the public collection.
    pub fn get_public_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        min: i64,
        max: i64,
    ) -> Result<OrderedCollectionPage> {
        self.page(tx, self.sql().get_public_page, collection, min, max)
    }

    /// The oldest `n` items and the offset the page starts at.
    pub fn get_last_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        n: i64,
    ) -> Result<(OrderedCollectionPage, u64)> {
        self.last_page(tx, self.sql().get_last_page, collection, n)
    }

    pub fn get_public_last_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        n: i64,
    ) -> Result<(OrderedCollectionPage, u64)> {
        self.last_page(tx, self.sql().get_public_last_page, collection, n)
    }

    /// Places `item` first. Prepending an item already present is a no-op.
    pub fn prepend_item(&self, tx: &mut dyn SqlTx, collection: &Url, item: &Url) -> Result<()> {
        let changed = tx.execute(self.sql().prepend_item, &sql_params![collection, item])?;
        if changed == 0 {
            self.require(tx, collection)?;
            debug!(collection = %collection, item = %item, "item already present");
        }
        Ok(())
    }

    /// Removes `item`; positions of the remaining items are unaffected.
    /// Returns whether the item was present.
    pub fn delete_item(&self, tx: &mut dyn SqlTx, collection: &Url, item: &Url) -> Result<bool> {
        let changed = tx.execute(self.sql().delete_item, &sql_params![collection, item])?;
        Ok(changed > 0)
    }

    /// A page of `cfg.page_size` items starting at `start`, with navigation
    /// links filled in.
    pub fn linked_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        start: u64,
        cfg: &StoreConfig,
    ) -> Result<OrderedCollectionPage> {
        self.linked(tx, self.sql().get_page, collection, start, cfg.page_size)
    }

    pub fn linked_public_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        start: u64,
        cfg: &StoreConfig,
    ) -> Result<OrderedCollectionPage> {
        self.linked(tx, self.sql().get_public_page, collection, start, cfg.page_size)
    }

    /// The oldest `cfg.page_size` items, linked like any other page.
    pub fn linked_last_page(
        &self,
        tx: &mut dyn SqlTx,
        collection: &Url,
        cfg: &StoreConfig,
    ) -> Result<OrderedCollectionPage> {
        let n = i64::from(cfg.page_size);
        let (mut page, start) = self.last_page(tx, self.sql().get_last_page, collection, n)?;
        link_page(&mut page, collection, start, u64::from(cfg.page_size));
        Ok(page)
    }

    fn linked(
        &self,
        tx: &mut dyn SqlTx,
        sql: &str,
        collection: &Url,
        start: u64,
        page_size: u32,
    ) -> Result<OrderedCollectionPage> {
        let min = i64::try_from(start).unwrap_or(i64::MAX);
        let max = min.saturating_add(i64::from(page_size));
        let mut page = self.page(tx, sql, collection, min, max)?;
        link_page(&mut page, collection, start, u64::from(page_size));
        Ok(page)
    }

    fn owner(&self, tx: &mut dyn SqlTx, collection: &Url) -> Result<Option<Url>> {
        let rows = tx.query(self.sql().actor_id, &sql_params![collection])?;
        match at_most_one(rows, self.kind.label())? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn require(&self, tx: &mut dyn SqlTx, collection: &Url) -> Result<()> {
        match self.owner(tx, collection)? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("{} {collection}", self.kind.label()))),
        }
    }

    fn page(
        &self,
        tx: &mut dyn SqlTx,
        sql: &str,
        collection: &Url,
        min: i64,
        max: i64,
    ) -> Result<OrderedCollectionPage> {
        if min < 0 || max <= min {
            return Err(StoreError::InvalidRange { min, max });
        }
        // The statement takes an inclusive upper bound.
        let rows = tx.query(sql, &sql_params![collection, min, max - 1])?;
        let what = format!("{} {collection}", self.kind.label());
        let mut page: OrderedCollectionPage = exactly_one(rows, &what)?.get(0)?;
        page.part_of = Some(collection.clone());
        Ok(page)
    }

    fn last_page(
        &self,
        tx: &mut dyn SqlTx,
        sql: &str,
        collection: &Url,
        n: i64,
    ) -> Result<(OrderedCollectionPage, u64)> {
        if n < 0 {
            return Err(StoreError::InvalidRange { min: 0, max: n });
        }
        let rows = tx.query(sql, &sql_params![collection, n])?;
        let what = format!("{} {collection}", self.kind.label());
        let row = exactly_one(rows, &what)?;
        let mut page: OrderedCollectionPage = row.get(0)?;
        let start: u64 = row.get(1)?;
        page.part_of = Some(collection.clone());
        page.start_index = Some(start);
        Ok((page, start))
    }
}

/// Fills `id`, `startIndex`, `prev` and `next` of a page fetched at offset
/// `start` with page size `n`. `next` is only set while items remain past
/// this page.
pub fn link_page(page: &mut OrderedCollectionPage, collection: &Url, start: u64, n: u64) {
    page.id = Some(page_iri(collection, start, n));
    page.part_of = Some(collection.clone());
    page.start_index = Some(start);
    page.prev = (start > 0).then(|| page_iri(collection, start.saturating_sub(n), n));
    let end = start + page.len() as u64;
    page.next = match page.total_items {
        Some(total) if end < total => Some(page_iri(collection, end, n)),
        _ => None,
    };
}

#[derive(Clone)]
pub struct Inboxes(OrderedCollections);

impl Inboxes {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self(OrderedCollections {
            dialect,
            kind: Kind::Inbox,
        })
    }
}

impl Deref for Inboxes {
    type Target = OrderedCollections;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Clone)]
pub struct Outboxes(OrderedCollections);

impl Outboxes {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self(OrderedCollections {
            dialect,
            kind: Kind::Outbox,
        })
    }

    /// The outbox of whoever owns `inbox`.
    pub fn outbox_for_inbox(&self, tx: &mut dyn SqlTx, inbox: &Url) -> Result<Url> {
        let rows = tx.query(self.0.dialect.outbox_for_inbox(), &sql_params![inbox])?;
        Ok(exactly_one(rows, "outbox for inbox")?.get(0)?)
    }
}

impl Deref for Outboxes {
    type Target = OrderedCollections;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;
    use crate::paths::{empty_inbox, empty_outbox, iri_for_actor_id, PathKind, Paths};
    use fedstore_vocab::PUBLIC_ADDRESS;
    use proptest::prelude::*;
    use rusqlite::Connection;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn setup() -> (Connection, crate::models::Models, Url, Url) {
        let (mut conn, models) = testing::sqlite();
        let paths = Paths::new("https", "a.example").unwrap();
        let actor = paths.user_iri_for(PathKind::User, "alice");
        let outbox = empty_outbox(&actor);
        models.outboxes.create(&mut conn, &actor, &outbox).unwrap();
        let inbox = empty_inbox(&actor);
        models.inboxes.create(&mut conn, &actor, &inbox).unwrap();
        (conn, models, actor, outbox.id)
    }

    #[test]
    fn prepend_then_page_and_last_page() {
        let (mut conn, m, _, outbox) = setup();
        let (i1, i2) = (url("https://a.example/i/1"), url("https://a.example/i/2"));
        m.outboxes.prepend_item(&mut conn, &outbox, &i1).unwrap();
        m.outboxes.prepend_item(&mut conn, &outbox, &i2).unwrap();

        let page = m.outboxes.get_page(&mut conn, &outbox, 0, 1).unwrap();
        assert_eq!(page.item_iris(), vec![i2.clone()]);
        assert_eq!(page.total_items, Some(2));
        assert_eq!(page.part_of.as_ref(), Some(&outbox));

        let (last, start) = m.outboxes.get_last_page(&mut conn, &outbox, 1).unwrap();
        assert_eq!(last.item_iris(), vec![i1]);
        assert_eq!(start, 1);

        let both = m.outboxes.get_page(&mut conn, &outbox, 0, 10).unwrap();
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn last_page_start_plus_len_is_total() {
        let (mut conn, m, _, outbox) = setup();
        for i in 0..7 {
            let item = url(&format!("https://a.example/i/{i}"));
            m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
        }
        for n in [0, 1, 3, 7, 20] {
            let (page, start) = m.outboxes.get_last_page(&mut conn, &outbox, n).unwrap();
            assert_eq!(start + page.len() as u64, 7, "n = {n}");
            assert_eq!(page.len() as i64, n.min(7));
        }
    }

    #[test]
    fn contains_tracks_prepend_and_delete() {
        let (mut conn, m, actor, outbox) = setup();
        let item = url("https://a.example/i/1");
        assert!(!m.outboxes.contains(&mut conn, &outbox, &item).unwrap());
        m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
        assert!(m.outboxes.contains(&mut conn, &outbox, &item).unwrap());
        assert!(m.outboxes.contains_for_actor(&mut conn, &actor, &item).unwrap());
        assert!(!m.inboxes.contains_for_actor(&mut conn, &actor, &item).unwrap());
        assert!(m.outboxes.delete_item(&mut conn, &outbox, &item).unwrap());
        assert!(!m.outboxes.contains(&mut conn, &outbox, &item).unwrap());
        assert!(!m.outboxes.delete_item(&mut conn, &outbox, &item).unwrap());
    }

    #[test]
    fn delete_keeps_relative_order() {
        let (mut conn, m, _, outbox) = setup();
        let items: Vec<Url> = (0..4).map(|i| url(&format!("https://a.example/i/{i}"))).collect();
        for it in &items {
            m.outboxes.prepend_item(&mut conn, &outbox, it).unwrap();
        }
        m.outboxes.delete_item(&mut conn, &outbox, &items[2]).unwrap();
        let page = m.outboxes.get_page(&mut conn, &outbox, 0, 10).unwrap();
        assert_eq!(page.item_iris(), vec![items[3].clone(), items[1].clone(), items[0].clone()]);
    }

    #[test]
    fn prepend_is_idempotent() {
        let (mut conn, m, _, outbox) = setup();
        let item = url("https://a.example/i/1");
        m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
        m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
        let page = m.outboxes.get_page(&mut conn, &outbox, 0, 10).unwrap();
        assert_eq!(page.total_items, Some(1));
    }

    #[test]
    fn invalid_ranges_and_missing_collections() {
        let (mut conn, m, _, outbox) = setup();
        assert!(matches!(
            m.outboxes.get_page(&mut conn, &outbox, 3, 3),
            Err(StoreError::InvalidRange { min: 3, max: 3 })
        ));
        assert!(matches!(
            m.outboxes.get_page(&mut conn, &outbox, -1, 3),
            Err(StoreError::InvalidRange { .. })
        ));
        let ghost = url("https://a.example/users/ghost/outbox");
        assert!(matches!(
            m.outboxes.get_page(&mut conn, &ghost, 0, 1),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            m.outboxes.prepend_item(&mut conn, &ghost, &url("https://a.example/i/1")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn second_collection_for_actor_is_rejected() {
        let (mut conn, m, actor, _) = setup();
        let again = empty_outbox(&actor);
        assert!(matches!(
            m.outboxes.create(&mut conn, &actor, &again),
            Err(StoreError::DuplicateActor(_))
        ));
    }

    #[test]
    fn reusing_another_actors_collection_names_the_owner() {
        let (mut conn, m, alice, outbox) = setup();
        let paths = Paths::new("https", "a.example").unwrap();
        let mallory = paths.user_iri_for(PathKind::User, "mallory");
        let mut stolen = empty_outbox(&mallory);
        stolen.id = outbox.clone();
        match m.outboxes.create(&mut conn, &mallory, &stolen) {
            Err(StoreError::DuplicateCollection { collection, owner }) => {
                assert_eq!(collection, outbox.as_str());
                assert_eq!(owner, alice.as_str());
            }
            other => panic!("expected duplicate collection, got {other:?}"),
        }
        // mallory's own outbox is still free to create
        m.outboxes.create(&mut conn, &mallory, &empty_outbox(&mallory)).unwrap();
    }

    #[test]
    fn create_seeds_listed_items_newest_first() {
        let (mut conn, m) = testing::sqlite();
        let paths = Paths::new("https", "a.example").unwrap();
        let actor = paths.user_iri_for(PathKind::User, "bob");
        let mut outbox = empty_outbox(&actor);
        let (new, old) = (url("https://a.example/i/new"), url("https://a.example/i/old"));
        outbox.ordered_items = Some(vec![
            fedstore_vocab::CollectionItem::Iri(new.clone()),
            fedstore_vocab::CollectionItem::Iri(old.clone()),
        ]);
        m.outboxes.create(&mut conn, &actor, &outbox).unwrap();
        let page = m.outboxes.get_page(&mut conn, &outbox.id, 0, 5).unwrap();
        assert_eq!(page.item_iris(), vec![new, old]);
    }

    #[test]
    fn public_pages_skip_private_items() {
        let (mut conn, m, _, outbox) = setup();
        let public = ActivityStreams::from_value(json!({
            "type": "Create", "id": "https://a.example/i/pub", "to": [PUBLIC_ADDRESS]
        }))
        .unwrap();
        let followers_only = ActivityStreams::from_value(json!({
            "type": "Create", "id": "https://a.example/i/priv",
            "to": ["https://a.example/users/alice/followers"]
        }))
        .unwrap();
        let cc_public = ActivityStreams::from_value(json!({
            "type": "Announce", "id": "https://b.example/i/boost", "cc": PUBLIC_ADDRESS
        }))
        .unwrap();
        m.local_data.create(&mut conn, &public).unwrap();
        m.local_data.create(&mut conn, &followers_only).unwrap();
        m.fed_data.create(&mut conn, &cc_public).unwrap();
        for doc in [&public, &followers_only, &cc_public] {
            m.outboxes.prepend_item(&mut conn, &outbox, doc.id().unwrap()).unwrap();
        }

        let page = m.outboxes.get_public_page(&mut conn, &outbox, 0, 10).unwrap();
        assert_eq!(
            page.item_iris(),
            vec![url("https://b.example/i/boost"), url("https://a.example/i/pub")]
        );
        assert_eq!(page.total_items, Some(2));

        let (last, start) = m.outboxes.get_public_last_page(&mut conn, &outbox, 1).unwrap();
        assert_eq!(last.item_iris(), vec![url("https://a.example/i/pub")]);
        assert_eq!(start, 1);
    }

    #[test]
    fn inbox_prepend_page_and_last_page() {
        let (mut conn, m, actor, _) = setup();
        let inbox = iri_for_actor_id(PathKind::Inbox, &actor);
        let i1 = ActivityStreams::from_value(json!({
            "type": "Create", "id": "https://b.example/i/1", "to": [PUBLIC_ADDRESS]
        }))
        .unwrap();
        let i2 = ActivityStreams::from_value(json!({
            "type": "Follow", "id": "https://b.example/i/2", "to": [actor.as_str()]
        }))
        .unwrap();
        for doc in [&i1, &i2] {
            m.fed_data.create(&mut conn, doc).unwrap();
            m.inboxes.prepend_item(&mut conn, &inbox, doc.id().unwrap()).unwrap();
        }
        let (i1, i2) = (url("https://b.example/i/1"), url("https://b.example/i/2"));

        let page = m.inboxes.get_page(&mut conn, &inbox, 0, 1).unwrap();
        assert_eq!(page.item_iris(), vec![i2.clone()]);
        assert_eq!(page.total_items, Some(2));
        assert_eq!(page.part_of.as_ref(), Some(&inbox));

        let (last, start) = m.inboxes.get_last_page(&mut conn, &inbox, 1).unwrap();
        assert_eq!(last.item_iris(), vec![i1.clone()]);
        assert_eq!(start, 1);

        let public = m.inboxes.get_public_page(&mut conn, &inbox, 0, 10).unwrap();
        assert_eq!(public.item_iris(), vec![i1.clone()]);
        assert_eq!(public.total_items, Some(1));
        let (public_last, start) = m.inboxes.get_public_last_page(&mut conn, &inbox, 5).unwrap();
        assert_eq!(public_last.item_iris(), vec![i1]);
        assert_eq!(start, 0);

        assert!(m.inboxes.contains_for_actor(&mut conn, &actor, &i2).unwrap());
        assert!(!m.outboxes.contains_for_actor(&mut conn, &actor, &i2).unwrap());
    }

    #[test]
    fn configured_page_size_drives_linked_pages() {
        let (mut conn, m, _, outbox) = setup();
        for i in 0..5 {
            let item = url(&format!("https://a.example/i/{i}"));
            m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
        }
        let cfg = StoreConfig {
            page_size: 2,
            ..StoreConfig::default()
        };

        let first = m.outboxes.linked_page(&mut conn, &outbox, 0, &cfg).unwrap();
        assert_eq!(
            first.item_iris(),
            vec![url("https://a.example/i/4"), url("https://a.example/i/3")]
        );
        assert_eq!(first.id, Some(page_iri(&outbox, 0, 2)));
        assert_eq!(first.prev, None);
        assert_eq!(first.next, Some(page_iri(&outbox, 2, 2)));

        let last = m.outboxes.linked_last_page(&mut conn, &outbox, &cfg).unwrap();
        assert_eq!(
            last.item_iris(),
            vec![url("https://a.example/i/1"), url("https://a.example/i/0")]
        );
        assert_eq!(last.start_index, Some(3));
        assert_eq!(last.prev, Some(page_iri(&outbox, 1, 2)));
        assert_eq!(last.next, None);

        let public = m.outboxes.linked_public_page(&mut conn, &outbox, 0, &cfg).unwrap();
        assert!(public.is_empty());
        assert_eq!(public.next, None);
    }

    #[test]
    fn outbox_for_inbox_resolves_owner() {
        let (mut conn, m, actor, outbox) = setup();
        let inbox = iri_for_actor_id(PathKind::Inbox, &actor);
        assert_eq!(m.outboxes.outbox_for_inbox(&mut conn, &inbox).unwrap(), outbox);
        let ghost = url("https://a.example/users/ghost/inbox");
        assert!(matches!(
            m.outboxes.outbox_for_inbox(&mut conn, &ghost),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn link_page_sets_navigation() {
        let (mut conn, m, _, outbox) = setup();
        for i in 0..5 {
            let item = url(&format!("https://a.example/i/{i}"));
            m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
        }
        let mut page = m.outboxes.get_page(&mut conn, &outbox, 2, 4).unwrap();
        link_page(&mut page, &outbox, 2, 2);
        assert_eq!(page.start_index, Some(2));
        assert_eq!(page.id, Some(page_iri(&outbox, 2, 2)));
        assert_eq!(page.prev, Some(page_iri(&outbox, 0, 2)));
        assert_eq!(page.next, Some(page_iri(&outbox, 4, 2)));

        let (mut last, start) = m.outboxes.get_last_page(&mut conn, &outbox, 2).unwrap();
        link_page(&mut last, &outbox, start, 2);
        assert_eq!(last.next, None);
    }

    proptest! {
        #[test]
        fn pages_match_vec_model(
            ops in proptest::collection::vec((any::<bool>(), 0u8..12), 1..40),
            min in 0i64..15,
            span in 1i64..15,
        ) {
            let (mut conn, m, _, outbox) = setup();
            let mut model: Vec<Url> = Vec::new();
            for (insert, k) in ops {
                let item = url(&format!("https://a.example/i/{k}"));
                if insert {
                    m.outboxes.prepend_item(&mut conn, &outbox, &item).unwrap();
                    if !model.contains(&item) {
                        model.insert(0, item);
                    }
                } else {
                    m.outboxes.delete_item(&mut conn, &outbox, &item).unwrap();
                    model.retain(|x| x != &item);
                }
            }
            let max = min + span;
            let page = m.outboxes.get_page(&mut conn, &outbox, min, max).unwrap();
            let lo = (min as usize).min(model.len());
            let hi = (max as usize).min(model.len());
            prop_assert_eq!(page.item_iris(), model[lo..hi].to_vec());
            prop_assert_eq!(page.total_items, Some(model.len() as u64));
        }
    }
}
