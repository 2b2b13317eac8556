//! The dynamic values tree and path-addressing scheme shared by every
//! `irr-core` component.
//!
//! Chart loaders hand back an untyped document; everything downstream
//! dispatches on [`Value`]'s tag instead of re-deriving YAML's type rules.
//! Paths are stored as ordered [`Segment`] lists (see [`path`]) so that
//! bracket indices are first-class and no component ever needs to
//! re-parse a rendered `a.b[2].c` string.

mod path;
mod value;

pub use path::{Path, Segment, SetPathError};
pub use value::Value;
