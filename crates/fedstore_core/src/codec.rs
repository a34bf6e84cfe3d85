/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Conversions between domain values and `SqlValue`.
//!
//! Every store parameter goes through `ToSqlValue` and every column read goes
//! through `FromSqlValue`, so a value has exactly one storage form no matter
//! which engine is underneath.

use crate::db::SqlValue;
use fedstore_vocab::{Actor, ActivityStreams, OrderedCollection, OrderedCollectionPage, VocabError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("expected {expected} column, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Vocab(#[from] VocabError),
    #[error("invalid IRI `{value}`: {source}")]
    Iri {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unknown delivery state `{0}`")]
    UnknownState(String),
    #[error("value out of range: {0}")]
    OutOfRange(String),
    #[error("document has no `id`")]
    MissingId,
    #[error("row has no column {0}")]
    MissingColumn(usize),
}

pub trait ToSqlValue {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError>;
}

pub trait FromSqlValue: Sized {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError>;
}

/// Encodes each argument with `ToSqlValue` into a parameter array,
/// returning early from the enclosing function on a codec error.
#[macro_export]
macro_rules! sql_params {
    ($($v:expr),+ $(,)?) => {
        [$($crate::codec::ToSqlValue::to_sql_value(&$v)?),+]
    };
}

fn unexpected(expected: &'static str, found: &SqlValue) -> CodecError {
    CodecError::UnexpectedValue {
        expected,
        found: found.type_name(),
    }
}

impl<T: ToSqlValue + ?Sized> ToSqlValue for &T {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        (**self).to_sql_value()
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        match self {
            Some(v) => v.to_sql_value(),
            None => Ok(SqlValue::Null),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        match v {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Integer(*self))
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        match v {
            SqlValue::Integer(i) => Ok(*i),
            other => Err(unexpected("integer", other)),
        }
    }
}

impl ToSqlValue for u64 {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        i64::try_from(*self)
            .map(SqlValue::Integer)
            .map_err(|_| CodecError::OutOfRange(self.to_string()))
    }
}

impl FromSqlValue for u64 {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        let i = i64::from_sql_value(v)?;
        u64::try_from(i).map_err(|_| CodecError::OutOfRange(i.to_string()))
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Bool(*self))
    }
}

/// SQLite has no boolean storage class, so `EXISTS` comes back as 0 or 1.
impl FromSqlValue for bool {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        match v {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Integer(i) => Ok(*i != 0),
            other => Err(unexpected("boolean", other)),
        }
    }
}

impl ToSqlValue for str {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Text(self.to_string()))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Text(self.clone()))
    }
}

impl FromSqlValue for String {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        match v {
            SqlValue::Text(s) => Ok(s.clone()),
            other => Err(unexpected("text", other)),
        }
    }
}

impl ToSqlValue for [u8] {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Blob(self.to_vec()))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Blob(self.clone()))
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        match v {
            SqlValue::Blob(b) => Ok(b.clone()),
            other => Err(unexpected("blob", other)),
        }
    }
}

impl ToSqlValue for Url {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Text(self.as_str().to_string()))
    }
}

impl FromSqlValue for Url {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        let s = String::from_sql_value(v)?;
        Url::parse(&s).map_err(|source| CodecError::Iri { value: s, source })
    }
}

/// JSON columns are text in SQLite and come back as raw bytes from
/// PostgreSQL `json`/`jsonb`.
fn json_bytes(v: &SqlValue) -> Result<&[u8], CodecError> {
    match v {
        SqlValue::Text(s) => Ok(s.as_bytes()),
        SqlValue::Blob(b) => Ok(b),
        other => Err(unexpected("json", other)),
    }
}

/// Serializes through `serde_json::Value`, whose map is key ordered, so equal
/// documents always produce identical text.
fn encode_json<T: Serialize + ?Sized>(v: &T) -> Result<SqlValue, CodecError> {
    let value = serde_json::to_value(v)?;
    Ok(SqlValue::Text(serde_json::to_string(&value)?))
}

fn decode_value(v: &SqlValue) -> Result<serde_json::Value, CodecError> {
    Ok(serde_json::from_slice(json_bytes(v)?)?)
}

impl ToSqlValue for ActivityStreams {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        encode_json(self)
    }
}

impl FromSqlValue for ActivityStreams {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        Ok(ActivityStreams::from_value(decode_value(v)?)?)
    }
}

impl ToSqlValue for OrderedCollection {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        encode_json(self)
    }
}

impl FromSqlValue for OrderedCollection {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        Ok(OrderedCollection::from_value(decode_value(v)?)?)
    }
}

impl ToSqlValue for OrderedCollectionPage {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        encode_json(self)
    }
}

impl FromSqlValue for OrderedCollectionPage {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        Ok(OrderedCollectionPage::from_value(decode_value(v)?)?)
    }
}

impl ToSqlValue for Actor {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        encode_json(self)
    }
}

impl FromSqlValue for Actor {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        Ok(Actor::from_value(decode_value(v)?)?)
    }
}

/// Any serde record stored as a JSON column.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToSqlValue for Json<T> {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        encode_json(&self.0)
    }
}

impl<T: DeserializeOwned> FromSqlValue for Json<T> {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        Ok(Json(serde_json::from_slice(json_bytes(v)?)?))
    }
}

/// Stored as integer unix milliseconds.
impl ToSqlValue for OffsetDateTime {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        let ms = self.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(ms)
            .map(SqlValue::Integer)
            .map_err(|_| CodecError::OutOfRange(ms.to_string()))
    }
}

impl FromSqlValue for OffsetDateTime {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        let ms = i64::from_sql_value(v)?;
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
            .map_err(|e| CodecError::OutOfRange(format!("{ms}ms: {e}")))
    }
}

/// A duration that may be absent. Stored as nullable integer nanoseconds;
/// NULL reads back as `None`, never as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullDuration(pub Option<Duration>);

impl NullDuration {
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

impl From<Duration> for NullDuration {
    fn from(d: Duration) -> Self {
        Self(Some(d))
    }
}

impl ToSqlValue for NullDuration {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        match self.0 {
            None => Ok(SqlValue::Null),
            Some(d) => i64::try_from(d.as_nanos())
                .map(SqlValue::Integer)
                .map_err(|_| CodecError::OutOfRange(format!("{d:?}"))),
        }
    }
}

impl FromSqlValue for NullDuration {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        match v {
            SqlValue::Null => Ok(Self(None)),
            other => {
                let ns = i64::from_sql_value(other)?;
                let ns = u64::try_from(ns).map_err(|_| CodecError::OutOfRange(format!("{ns}ns")))?;
                Ok(Self(Some(Duration::from_nanos(ns))))
            }
        }
    }
}

/// What to do with an incoming Follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OnFollowBehavior {
    #[serde(rename = "ALWAYS_ACCEPT")]
    AlwaysAccept,
    #[serde(rename = "ALWAYS_REJECT")]
    AlwaysReject,
    #[default]
    #[serde(rename = "MANUAL")]
    Manual,
}

impl OnFollowBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysAccept => "ALWAYS_ACCEPT",
            Self::AlwaysReject => "ALWAYS_REJECT",
            Self::Manual => "MANUAL",
        }
    }

    /// Unrecognized tokens fall back to manual review.
    pub fn from_token(input: &str) -> Self {
        match input {
            "ALWAYS_ACCEPT" => Self::AlwaysAccept,
            "ALWAYS_REJECT" => Self::AlwaysReject,
            _ => Self::Manual,
        }
    }
}

impl<'de> Deserialize<'de> for OnFollowBehavior {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_token(&s))
    }
}

impl ToSqlValue for OnFollowBehavior {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Text(self.as_str().to_string()))
    }
}

impl FromSqlValue for OnFollowBehavior {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        Ok(Self::from_token(&String::from_sql_value(v)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    Pending,
    Succeeded,
    Failed,
}

impl DeliveryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_str(input: &str) -> Option<Self> {
        match input {
            "PENDING" => Some(Self::Pending),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSqlValue for DeliveryState {
    fn to_sql_value(&self) -> Result<SqlValue, CodecError> {
        Ok(SqlValue::Text(self.as_str().to_string()))
    }
}

impl FromSqlValue for DeliveryState {
    fn from_sql_value(v: &SqlValue) -> Result<Self, CodecError> {
        let s = String::from_sql_value(v)?;
        Self::from_str(&s).ok_or(CodecError::UnknownState(s))
    }
}
