/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Canonical IRIs for local actors and their collections.
//!
//! Layout: `/users/{id}` for the actor, `/users/{id}/{collection}` for its
//! collections, `?page=true` for a first page and `?page=true&end=true` for a
//! last page. Public keys hang off the actor IRI as a fragment.

use fedstore_vocab::OrderedCollection;
use url::Url;

const USERS_ROUTE: &str = "/users";
const PUB_KEY_FRAGMENT_PREFIX: &str = "key-";
const HTTP_SIG_FRAGMENT: &str = "main-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    User,
    Inbox,
    InboxFirst,
    InboxLast,
    Outbox,
    OutboxFirst,
    OutboxLast,
    Followers,
    Following,
    Liked,
    HttpSigPubKey,
}

impl PathKind {
    fn collection_segment(self) -> Option<&'static str> {
        match self {
            PathKind::Inbox | PathKind::InboxFirst | PathKind::InboxLast => Some("inbox"),
            PathKind::Outbox | PathKind::OutboxFirst | PathKind::OutboxLast => Some("outbox"),
            PathKind::Followers => Some("followers"),
            PathKind::Following => Some("following"),
            PathKind::Liked => Some("liked"),
            PathKind::User | PathKind::HttpSigPubKey => None,
        }
    }

    fn query(self) -> Option<&'static str> {
        match self {
            PathKind::InboxFirst | PathKind::OutboxFirst => Some("page=true"),
            PathKind::InboxLast | PathKind::OutboxLast => Some("page=true&end=true"),
            _ => None,
        }
    }
}

/// Base scheme and host of this instance.
#[derive(Debug, Clone)]
pub struct Paths {
    base: Url,
}

impl Paths {
    pub fn new(scheme: &str, host: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(&format!("{scheme}://{host}"))?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// IRI of resource `kind` belonging to the local user `local_id`.
    pub fn user_iri_for(&self, kind: PathKind, local_id: &str) -> Url {
        let mut actor = self.base.clone();
        actor.set_path(&format!("{USERS_ROUTE}/{local_id}"));
        iri_for_actor_id(kind, &actor)
    }
}

/// IRI of resource `kind` for an actor whose IRI is already known.
pub fn iri_for_actor_id(kind: PathKind, actor: &Url) -> Url {
    let mut u = actor.clone();
    u.set_query(None);
    u.set_fragment(None);
    if let Some(seg) = kind.collection_segment() {
        let path = format!("{}/{seg}", actor.path().trim_end_matches('/'));
        u.set_path(&path);
    }
    u.set_query(kind.query());
    if kind == PathKind::HttpSigPubKey {
        u.set_fragment(Some(HTTP_SIG_FRAGMENT));
    }
    u
}

/// IRI of the public key `key_id` owned by `user`.
pub fn public_key_iri(user: &Url, key_id: &str) -> Url {
    let mut u = user.clone();
    u.set_fragment(Some(&format!("{PUB_KEY_FRAGMENT_PREFIX}{key_id}")));
    u
}

/// IRI of the page of `collection` starting at `offset` with at most `n`
/// items.
pub fn page_iri(collection: &Url, offset: u64, n: u64) -> Url {
    let mut u = collection.clone();
    u.set_fragment(None);
    u.query_pairs_mut()
        .clear()
        .append_pair("page", "true")
        .append_pair("offset", &offset.to_string())
        .append_pair("n", &n.to_string());
    u
}

pub fn empty_inbox(actor: &Url) -> OrderedCollection {
    empty_collection(
        iri_for_actor_id(PathKind::Inbox, actor),
        iri_for_actor_id(PathKind::InboxFirst, actor),
        iri_for_actor_id(PathKind::InboxLast, actor),
    )
}

pub fn empty_outbox(actor: &Url) -> OrderedCollection {
    empty_collection(
        iri_for_actor_id(PathKind::Outbox, actor),
        iri_for_actor_id(PathKind::OutboxFirst, actor),
        iri_for_actor_id(PathKind::OutboxLast, actor),
    )
}

fn empty_collection(id: Url, first: Url, last: Url) -> OrderedCollection {
    let mut c = OrderedCollection::new(id);
    c.total_items = Some(0);
    c.first = Some(first);
    c.last = Some(last);
    c
}
