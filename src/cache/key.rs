//! Cache Key Module
//!
//! Builds and parses keys of the form
//! `{group}:{subtype}[:{entity_id}][:user_{user_id}]`.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::cache::CacheGroup;

/// Prefix marking the user segment of a key.
const USER_SEGMENT: &str = "user_";

// == Entity Id ==
/// Identifier of a cached entity, numeric or free-form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Reads an id segment back, keeping it numeric only when it
    /// formats back to the same text.
    fn from_segment(segment: &str) -> Self {
        match segment.parse::<i64>() {
            Ok(id) if id.to_string() == segment => EntityId::Int(id),
            _ => EntityId::Text(unescape_segment(segment)),
        }
    }
}

/// Text ids are written with `%`, `:` and a leading `user_` escaped, so
/// the id segment can never be mistaken for a separator or the user scope.
impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{}", id),
            EntityId::Text(id) => {
                let user_shaped = id.starts_with(USER_SEGMENT);
                for (i, ch) in id.char_indices() {
                    match ch {
                        '%' => f.write_str("%25")?,
                        ':' => f.write_str("%3A")?,
                        'u' if i == 0 && user_shaped => f.write_str("%75")?,
                        _ => f.write_char(ch)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Decodes `%XX` ASCII escapes; anything else is kept as written.
fn unescape_segment(segment: &str) -> String {
    let mut decoded = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        decoded.push_str(&rest[..pos]);
        let byte = rest
            .get(pos + 1..pos + 3)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .filter(u8::is_ascii);
        match byte {
            Some(byte) => {
                decoded.push(char::from(byte));
                rest = &rest[pos + 3..];
            }
            None => {
                decoded.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        EntityId::Int(id.into())
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId::Int(id.into())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::Text(id)
    }
}

// == Cache Key ==
/// Structured form of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    group: CacheGroup,
    subtype: String,
    entity_id: Option<EntityId>,
    user_id: Option<u64>,
}

impl CacheKey {
    /// Starts a key for `subtype` data in `group`.
    pub fn new(group: CacheGroup, subtype: impl Into<String>) -> Self {
        Self {
            group,
            subtype: subtype.into(),
            entity_id: None,
            user_id: None,
        }
    }

    /// Scopes the key to a single entity.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Scopes the key to a single user.
    pub fn for_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn group(&self) -> CacheGroup {
        self.group
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn entity_id(&self) -> Option<&EntityId> {
        self.entity_id.as_ref()
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    // == Parse ==
    /// Recovers the structured fields from a key string.
    ///
    /// Returns `None` when the first segment is not a known group or the
    /// subtype is missing. Escapes written into text ids are decoded.
    pub fn parse(key: &str) -> Option<Self> {
        let mut segments = key.splitn(3, ':');
        let group = segments.next()?.parse::<CacheGroup>().ok()?;
        let subtype = segments.next().filter(|s| !s.is_empty())?;
        let mut parsed = CacheKey::new(group, subtype);

        let Some(rest) = segments.next() else {
            return Some(parsed);
        };

        let (id, user_id) = match rest.rsplit_once(":user_") {
            Some((id, user)) => match user.parse::<u64>() {
                Ok(user_id) => (id, Some(user_id)),
                Err(_) => (rest, None),
            },
            None => match rest
                .strip_prefix(USER_SEGMENT)
                .and_then(|user| user.parse::<u64>().ok())
            {
                Some(user_id) => ("", Some(user_id)),
                None => (rest, None),
            },
        };

        if !id.is_empty() {
            parsed.entity_id = Some(EntityId::from_segment(id));
        }
        parsed.user_id = user_id;
        Some(parsed)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.subtype)?;
        if let Some(id) = &self.entity_id {
            write!(f, ":{}", id)?;
        }
        if let Some(user_id) = self.user_id {
            write!(f, ":{}{}", USER_SEGMENT, user_id)?;
        }
        Ok(())
    }
}

// == Build Cache Key ==
/// Composes the key string for a logical query.
///
/// Identical inputs always produce the identical key.
pub fn build_cache_key(
    group: CacheGroup,
    subtype: &str,
    id: Option<EntityId>,
    user_id: Option<u64>,
) -> String {
    let mut key = CacheKey::new(group, subtype);
    key.entity_id = id;
    key.user_id = user_id;
    key.to_string()
}
