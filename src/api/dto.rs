//! Request/Response DTOs
//!
//! Wire shapes exchanged with the backend. Entities are snapshots of server
//! state; nothing here is authoritative on the client.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Opaque entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Id {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================
// Instants
// ============================================

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Serde adapter for the backend's second-precision UTC timestamps
///
/// Serializes as `2024-05-01T12:00:00Z`. Deserialization also accepts any
/// RFC 3339 string and the naive form without a zone, which is read as UTC.
pub mod instant {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(INSTANT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid instant: {raw:?}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

// ============================================
// Users
// ============================================

/// A signed-up user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: Id,
    pub name: String,
    pub email: String,
}

/// User to be signed up
#[derive(Debug, Clone, Serialize)]
pub struct UserInit {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Partial user modification; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Filter for `GET /users`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserQuery {
    /// Only users following this user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following_id: Option<Id>,
}

// ============================================
// Auth
// ============================================

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct AuthnRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated identity and its bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnResponse {
    pub user: User,
    pub jwt: String,
}

/// Response to account creation
///
/// Depending on the backend build, `POST /users` either signs the new user
/// in right away or only returns the created record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignupResponse {
    Authenticated(AuthnResponse),
    Registered(User),
}

// ============================================
// Posts
// ============================================

/// A post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: Id,
    pub author: User,
    pub content: String,
    #[serde(with = "instant")]
    pub creation_time: DateTime<Utc>,
    #[serde(with = "instant")]
    pub modification_time: DateTime<Utc>,
}

impl Post {
    /// Whether the post was edited after creation
    pub fn is_modified(&self) -> bool {
        self.modification_time != self.creation_time
    }
}

/// Post to be created
#[derive(Debug, Clone, Serialize)]
pub struct PostInit {
    pub content: String,
    pub author: Id,
}

/// Post modification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

/// Filter for `GET /posts`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostQuery {
    /// Only posts written by this user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Id>,
}

// ============================================
// Comments
// ============================================

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: Id,
    pub author: User,
    pub post: Id,
    pub content: String,
    #[serde(with = "instant")]
    pub creation_time: DateTime<Utc>,
    #[serde(with = "instant")]
    pub modification_time: DateTime<Utc>,
}

impl Comment {
    pub fn is_modified(&self) -> bool {
        self.modification_time != self.creation_time
    }
}

/// Comment to be created
#[derive(Debug, Clone, Serialize)]
pub struct CommentInit {
    pub content: String,
    pub author: Id,
    pub post: Id,
}

/// Comment modification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

/// Filter for `GET /comments`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Id>,
}

// ============================================
// Listings
// ============================================

/// A list response, either a bare array or an object keyed by collection
/// name (`{"users": [...]}`)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Keyed(HashMap<String, Vec<T>>),
}

impl<T> Listing<T> {
    /// Flatten into the items, preferring the expected key
    pub(crate) fn into_items(self, key: &str) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Keyed(mut map) => match map.remove(key) {
                Some(items) => items,
                None => map.into_values().next().unwrap_or_default(),
            },
        }
    }
}
