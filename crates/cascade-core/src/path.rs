//! # Path Keys
//!
//! A `PathKey` is a configuration path of at least three levels
//! (`section/group/field`, optionally deeper) bound to a [`ScopeRef`]. Its fully-qualified form is the physical storage
//! key, and its prefixes are the pub/sub topics.
//!
//! ## Key Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   stores / 3 / general / locale / code                                  │
//! │   ──────   ─   ───────   ──────   ────                                  │
//! │   scope    id  level1                                                   │
//! │                ───────────────                                          │
//! │                level2                                                   │
//! │                ──────────────────────                                   │
//! │                level_all                                                │
//! │                                                                         │
//! │   fq() = "<scope>/<id>/<level_all>"                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::scope::{Scope, ScopeRef};
use crate::{HIERARCHY_LEVEL, PATH_SEPARATOR};

// =============================================================================
// Path Splitting
// =============================================================================

/// Validates path input and returns its segments.
///
/// ## Rules
/// - No parts, or a single empty string: `EmptyPath`
/// - A single part is split on `/` (surrounding slashes are ignored)
/// - Several parts are taken as discrete segments
/// - The result must be at least three non-empty segments with no `/` inside;
///   segments past the third are kept
///
/// ## Example
/// ```rust
/// use cascade_core::path::split_path;
///
/// assert_eq!(split_path(&["a/b/c"]).unwrap(), ["a", "b", "c"]);
/// assert_eq!(split_path(&["a", "b", "c"]).unwrap(), ["a", "b", "c"]);
/// assert_eq!(split_path(&["a/b/c/d"]).unwrap(), ["a", "b", "c", "d"]);
/// assert!(split_path(&["a", "b"]).is_err());
/// assert!(split_path::<&str>(&[]).is_err());
/// ```
pub fn split_path<S: AsRef<str>>(parts: &[S]) -> CoreResult<Vec<String>> {
    let segments: Vec<&str> = match parts {
        [] => return Err(CoreError::EmptyPath),
        [single] => {
            let single = single.as_ref().trim_matches(PATH_SEPARATOR);
            if single.is_empty() {
                return Err(CoreError::EmptyPath);
            }
            single.split(PATH_SEPARATOR).collect()
        }
        many => many.iter().map(AsRef::as_ref).collect(),
    };

    if segments.len() >= HIERARCHY_LEVEL && segments.iter().all(|s| is_valid_segment(s)) {
        return Ok(segments.into_iter().map(str::to_string).collect());
    }

    let joined = segments.join("/");
    let have = joined
        .split(PATH_SEPARATOR)
        .filter(|s| !s.is_empty())
        .count();
    Err(CoreError::invalid_path(joined, have))
}

fn is_valid_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(PATH_SEPARATOR)
}

// =============================================================================
// Path Key
// =============================================================================

/// A validated configuration path bound to a scope.
///
/// Immutable once built. An invalid `PathKey` cannot be constructed, so the
/// level projections never fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey {
    segments: Vec<String>,
    scope: ScopeRef,
}

impl PathKey {
    /// Builds a key from path parts and a scope.
    ///
    /// The scope is normalized through [`ScopeRef::new`]: a non-default scope
    /// with an ID below 1 silently becomes `(Default, 0)`.
    pub fn build<S: AsRef<str>>(parts: &[S], scope: Scope, id: i64) -> CoreResult<Self> {
        Ok(PathKey {
            segments: split_path(parts)?,
            scope: ScopeRef::new(scope, id),
        })
    }

    /// Builds a key at an already normalized scope.
    pub fn at<S: AsRef<str>>(parts: &[S], scope: ScopeRef) -> CoreResult<Self> {
        Ok(PathKey {
            segments: split_path(parts)?,
            scope,
        })
    }

    /// Returns the same path at another scope.
    pub fn with_scope(&self, scope: ScopeRef) -> Self {
        PathKey {
            segments: self.segments.clone(),
            scope,
        }
    }

    /// Decodes a fully-qualified key such as `websites/1/a/b/c`.
    ///
    /// Only canonical keys are accepted: `stores/0/a/b/c` is rejected because
    /// it would encode as `default/0/a/b/c`.
    pub fn parse_fq(key: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = key.splitn(3, PATH_SEPARATOR).collect();
        let [scope, id, path] = parts.as_slice() else {
            return Err(CoreError::invalid_key(key, "expected scope/id/path"));
        };

        let scope: Scope = scope.parse()?;
        let id: i64 = id
            .parse()
            .map_err(|_| CoreError::invalid_key(key, format!("scope id {id:?} is not a number")))?;

        let parsed = PathKey::build(&[*path], scope, id)?;
        if parsed.fq() != key {
            return Err(CoreError::invalid_key(key, "not in canonical form"));
        }
        Ok(parsed)
    }

    /// Returns the scope reference.
    #[inline]
    pub fn scope_ref(&self) -> ScopeRef {
        self.scope
    }

    /// Returns the scope level.
    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope.scope()
    }

    /// Returns the scope ID.
    #[inline]
    pub fn scope_id(&self) -> i64 {
        self.scope.id()
    }

    /// Returns the path segments (at least three).
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, e.g. `general`.
    pub fn level1(&self) -> &str {
        &self.segments[0]
    }

    /// First two segments, e.g. `general/locale`.
    pub fn level2(&self) -> String {
        self.segments[..2].join("/")
    }

    /// Full path, e.g. `general/locale/code`. Keeps every segment of a
    /// deeper path.
    pub fn level_all(&self) -> String {
        self.segments.join("/")
    }

    /// The three topic granularities in dispatch order.
    pub fn topics(&self) -> [String; HIERARCHY_LEVEL] {
        [self.level1().to_string(), self.level2(), self.level_all()]
    }

    /// Fully-qualified storage key: `<scope>/<id>/<level_all>`.
    pub fn fq(&self) -> String {
        format!(
            "{}/{}/{}",
            self.scope.scope(),
            self.scope.id(),
            self.level_all()
        )
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fq())
    }
}
