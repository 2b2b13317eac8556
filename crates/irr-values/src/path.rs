//! Symbolic paths into a [`Value`] tree.
//!
//! Paths are stored as ordered lists of [`Segment`]s rather than
//! dot-joined strings, so that the assembler never has to re-parse a
//! rendered path to find out whether a component was a map key or a
//! sequence index. Dot/bracket rendering happens only at the user
//! boundary (reports, error messages).

use std::fmt;

use serde::{Serialize, Serializer};

use crate::Value;

/// One step along a path into a values tree.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::Key(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::Key(value)
    }
}

impl From<usize> for Segment {
    fn from(value: usize) -> Self {
        Segment::Index(value)
    }
}

/// A symbolic route to a node in a values tree.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the path using Helm's dot/bracket notation, e.g.
    /// `child.image[0].tag`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                Segment::Index(idx) => {
                    out.push('[');
                    out.push_str(&idx.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Serializes as its rendered dot/bracket string -- reports only ever
/// need the human-readable form, never the segment list.
impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

/// A conflict encountered while materializing a path into a values tree:
/// some intermediate segment already holds a scalar where a map or
/// sequence was required.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
#[error("cannot materialize path `{path}`: existing non-container value at `{at}`")]
pub struct SetPathError {
    pub path: Path,
    pub at: Path,
}

impl Value {
    /// Reads the node at `path`, if present.
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        let mut node = self;
        for segment in path.segments() {
            node = match (segment, node) {
                (Segment::Key(key), Value::Map(map)) => map.get(key)?,
                (Segment::Index(idx), Value::Seq(seq)) => seq.get(*idx)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Writes `value` at `path`, creating intermediate maps and
    /// sequences on demand. Sequence gaps are padded with [`Value::Null`].
    ///
    /// This is the path-materialization primitive behind the override
    /// assembler (C7): every intermediate segment along the way becomes a
    /// map or sequence, and nothing else in the tree is touched.
    pub fn set_path(&mut self, path: &Path, value: Value) -> Result<(), SetPathError> {
        self.set_path_from(&Path::root(), path.segments(), value)
    }

    fn set_path_from(
        &mut self,
        consumed: &Path,
        remaining: &[Segment],
        value: Value,
    ) -> Result<(), SetPathError> {
        let Some((segment, rest)) = remaining.split_first() else {
            *self = value;
            return Ok(());
        };

        match segment {
            Segment::Key(key) => {
                if self.is_null() {
                    *self = Value::empty_map();
                }
                let Value::Map(map) = self else {
                    return Err(SetPathError {
                        path: consumed.child(segment.clone()),
                        at: consumed.clone(),
                    });
                };
                let next_consumed = consumed.child(key.as_str());
                let entry = map.entry(key.clone()).or_insert(Value::Null);
                entry.set_path_from(&next_consumed, rest, value)
            }
            Segment::Index(idx) => {
                if self.is_null() {
                    *self = Value::Seq(Vec::new());
                }
                let Value::Seq(seq) = self else {
                    return Err(SetPathError {
                        path: consumed.child(segment.clone()),
                        at: consumed.clone(),
                    });
                };
                if seq.len() <= *idx {
                    seq.resize(idx + 1, Value::Null);
                }
                let next_consumed = consumed.child(*idx);
                seq[*idx].set_path_from(&next_consumed, rest, value)
            }
        }
    }
}
