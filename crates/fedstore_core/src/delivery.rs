/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Recipient fan-out for outbound activities.
//!
//! Addressees are either actors, which contribute their inbox, or collections
//! (followers, following, forwarded audiences) whose members are walked in
//! turn. Collections may contain collections and may refer back to each
//! other, so every walk carries a [`RecursionDepth`] and aborts once the
//! configured ceiling is passed instead of following a federation loop.

use crate::config::StoreConfig;
use crate::db::SqlTx;
use crate::error::{Result, StoreError};
use crate::models::{AttemptId, DeliveryAttempts, FedData, LocalData, Models};
use fedstore_vocab::ActivityStreams;
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Nesting counter for collection walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionDepth {
    depth: u32,
    limit: u32,
}

impl RecursionDepth {
    pub fn new(limit: u32) -> Self {
        Self { depth: 0, limit }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// One level deeper, or `RecursionLimitExceeded` past the ceiling.
    pub fn descend(self) -> Result<Self> {
        if self.depth >= self.limit {
            return Err(StoreError::RecursionLimitExceeded { limit: self.limit });
        }
        Ok(Self {
            depth: self.depth + 1,
            limit: self.limit,
        })
    }
}

/// What an addressed IRI turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Actor { id: Url, inbox: Url },
    Collection(Vec<Url>),
}

pub trait RecipientResolver {
    /// `None` for IRIs that cannot be delivered to (unknown, or neither an
    /// actor with an inbox nor a collection).
    fn resolve(&mut self, iri: &Url) -> Result<Option<Recipient>>;
}

/// Resolves addressees from stored documents, local data first.
pub struct StoredRecipients<'a> {
    tx: &'a mut dyn SqlTx,
    local: &'a LocalData,
    fed: &'a FedData,
}

impl<'a> StoredRecipients<'a> {
    pub fn new(tx: &'a mut dyn SqlTx, local: &'a LocalData, fed: &'a FedData) -> Self {
        Self { tx, local, fed }
    }
}

impl RecipientResolver for StoredRecipients<'_> {
    fn resolve(&mut self, iri: &Url) -> Result<Option<Recipient>> {
        let doc = match self.local.find(self.tx, iri)? {
            Some(doc) => Some(doc),
            None => self.fed.find(self.tx, iri)?,
        };
        Ok(doc.and_then(|doc| recipient_of(&doc)))
    }
}

/// Actors deliver to their shared inbox when they advertise one.
pub fn recipient_of(doc: &ActivityStreams) -> Option<Recipient> {
    match doc {
        ActivityStreams::Actor(actor) => {
            let inbox = actor.shared_inbox().or_else(|| actor.inbox.clone())?;
            Some(Recipient::Actor {
                id: actor.id.clone(),
                inbox,
            })
        }
        ActivityStreams::OrderedCollection(c) => Some(Recipient::Collection(c.item_iris())),
        ActivityStreams::OrderedCollectionPage(p) => Some(Recipient::Collection(p.item_iris())),
        _ => None,
    }
}

/// Resolves `roots` to a deduplicated list of inboxes, in first-seen order.
pub fn expand_recipients<R>(resolver: &mut R, roots: &[Url], max_depth: u32) -> Result<Vec<Url>>
where
    R: RecipientResolver + ?Sized,
{
    let mut walk = Walk {
        seen: HashSet::new(),
        inboxes: Vec::new(),
        seen_inboxes: HashSet::new(),
    };
    let depth = RecursionDepth::new(max_depth);
    for root in roots {
        if let Err(e) = walk.visit(resolver, root, depth) {
            warn!(root = %root, limit = max_depth, "recipient expansion aborted: {e}");
            return Err(e);
        }
    }
    debug!(roots = roots.len(), inboxes = walk.inboxes.len(), "recipients expanded");
    Ok(walk.inboxes)
}

struct Walk {
    seen: HashSet<Url>,
    inboxes: Vec<Url>,
    seen_inboxes: HashSet<Url>,
}

impl Walk {
    fn visit<R>(&mut self, resolver: &mut R, iri: &Url, depth: RecursionDepth) -> Result<()>
    where
        R: RecipientResolver + ?Sized,
    {
        if !self.seen.insert(iri.clone()) {
            return Ok(());
        }
        match resolver.resolve(iri)? {
            None => debug!(iri = %iri, "skipping undeliverable recipient"),
            Some(Recipient::Actor { inbox, .. }) => {
                if self.seen_inboxes.insert(inbox.clone()) {
                    self.inboxes.push(inbox);
                }
            }
            Some(Recipient::Collection(members)) => {
                let next = depth.descend()?;
                for member in &members {
                    self.visit(resolver, member, next)?;
                }
            }
        }
        Ok(())
    }
}

/// Inboxes an incoming activity should be forwarded to: its addressees that
/// this server owns, expanded. `owns` decides ownership, usually by host.
pub fn forwarding_recipients<R, F>(
    resolver: &mut R,
    activity: &ActivityStreams,
    owns: F,
    max_depth: u32,
) -> Result<Vec<Url>>
where
    R: RecipientResolver + ?Sized,
    F: Fn(&Url) -> bool,
{
    let roots: Vec<Url> = activity.recipients().into_iter().filter(|r| owns(r)).collect();
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    expand_recipients(resolver, &roots, max_depth)
}

/// One pending attempt per inbox, in the caller's transaction.
pub fn schedule_deliveries(
    tx: &mut dyn SqlTx,
    attempts: &DeliveryAttempts,
    from: &Url,
    inboxes: &[Url],
    payload: &ActivityStreams,
) -> Result<Vec<AttemptId>> {
    let mut ids = Vec::with_capacity(inboxes.len());
    for inbox in inboxes {
        ids.push(attempts.insert_attempt(tx, from, inbox, payload)?);
    }
    Ok(ids)
}

/// Queues `activity` from `from` to every inbox its addressees expand to,
/// walking at most `cfg.max_delivery_depth` levels of collections.
pub fn queue_outbound(
    tx: &mut dyn SqlTx,
    models: &Models,
    cfg: &StoreConfig,
    from: &Url,
    activity: &ActivityStreams,
) -> Result<Vec<AttemptId>> {
    let inboxes = {
        let mut resolver = StoredRecipients::new(tx, &models.local_data, &models.fed_data);
        expand_recipients(&mut resolver, &activity.recipients(), cfg.max_delivery_depth)?
    };
    schedule_deliveries(tx, &models.delivery_attempts, from, &inboxes, activity)
}

/// Queues an incoming `activity` for the local addressees `owns` accepts,
/// walking at most `cfg.max_forwarding_depth` levels of collections.
pub fn queue_forwarding<F>(
    tx: &mut dyn SqlTx,
    models: &Models,
    cfg: &StoreConfig,
    from: &Url,
    activity: &ActivityStreams,
    owns: F,
) -> Result<Vec<AttemptId>>
where
    F: Fn(&Url) -> bool,
{
    let inboxes = {
        let mut resolver = StoredRecipients::new(tx, &models.local_data, &models.fed_data);
        forwarding_recipients(&mut resolver, activity, owns, cfg.max_forwarding_depth)?
    };
    schedule_deliveries(tx, &models.delivery_attempts, from, &inboxes, activity)
}
