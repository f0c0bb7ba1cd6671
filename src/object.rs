//! Heap-allocated objects referenced from values.

use std::fmt;

/// Discriminator for the kinds of heap objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjKind {
    Str,
}

#[derive(Debug, PartialEq)]
pub enum Obj {
    Str(ObjString),
}

impl Obj {
    pub fn kind(&self) -> ObjKind {
        match self {
            Obj::Str(_) => ObjKind::Str,
        }
    }

    pub fn as_string(&self) -> Option<&ObjString> {
        match self {
            Obj::Str(s) => Some(s),
        }
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Obj::Str(s) => write!(f, "{}", s),
        }
    }
}

/// An immutable string. Equality compares characters, never identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjString {
    chars: Box<str>,
}

impl ObjString {
    pub fn new(chars: &str) -> Self {
        Self {
            chars: chars.into(),
        }
    }

    pub fn concat(lhs: &ObjString, rhs: &ObjString) -> Self {
        let mut chars = String::with_capacity(lhs.len() + rhs.len());
        chars.push_str(&lhs.chars);
        chars.push_str(&rhs.chars);
        Self {
            chars: chars.into_boxed_str(),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.chars
    }
}

impl From<String> for ObjString {
    fn from(chars: String) -> Self {
        Self {
            chars: chars.into_boxed_str(),
        }
    }
}

impl fmt::Display for ObjString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.chars)
    }
}
