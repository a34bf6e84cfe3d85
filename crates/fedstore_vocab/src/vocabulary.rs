/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    OrderedCollection,
    OrderedCollectionPage,
    Actor,
    Activity,
    Object,
    Link,
}

const ACTOR_TYPES: &[&str] = &["Application", "Group", "Organization", "Person", "Service"];

const ACTIVITY_TYPES: &[&str] = &[
    "Accept",
    "Activity",
    "Add",
    "Announce",
    "Arrive",
    "Block",
    "Create",
    "Delete",
    "Dislike",
    "EmojiReact",
    "Flag",
    "Follow",
    "Ignore",
    "IntransitiveActivity",
    "Invite",
    "Join",
    "Leave",
    "Like",
    "Listen",
    "Move",
    "Offer",
    "Question",
    "Read",
    "Reject",
    "Remove",
    "TentativeAccept",
    "TentativeReject",
    "Travel",
    "Undo",
    "Update",
    "View",
];

const OBJECT_TYPES: &[&str] = &[
    "Article",
    "Audio",
    "Collection",
    "CollectionPage",
    "Document",
    "Emoji",
    "Event",
    "Image",
    "Note",
    "Object",
    "Page",
    "Place",
    "Profile",
    "PropertyValue",
    "Relationship",
    "Tombstone",
    "Video",
];

const LINK_TYPES: &[&str] = &["Hashtag", "Link", "Mention"];

/// Maps a `type` value to the variant it decodes into. `None` means the type is
/// outside the ActivityStreams vocabulary (and the common Mastodon extensions).
pub fn classify(kind: &str) -> Option<TypeClass> {
    match kind {
        "OrderedCollection" => Some(TypeClass::OrderedCollection),
        "OrderedCollectionPage" => Some(TypeClass::OrderedCollectionPage),
        k if ACTOR_TYPES.contains(&k) => Some(TypeClass::Actor),
        k if ACTIVITY_TYPES.contains(&k) => Some(TypeClass::Activity),
        k if OBJECT_TYPES.contains(&k) => Some(TypeClass::Object),
        k if LINK_TYPES.contains(&k) => Some(TypeClass::Link),
        _ => None,
    }
}
