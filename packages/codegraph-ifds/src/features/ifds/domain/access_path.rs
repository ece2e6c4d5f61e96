//! Access paths: a base value plus an ordered field chain

use std::fmt;
use std::sync::Arc;

/// Tainted part of a value (`x`, `x.f`, `x.f.g`)
///
/// Opaque to the solver beyond equality and hashing. The zero path has no
/// base and denotes the always-present empty fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessPath {
    base: Option<Arc<str>>,
    fields: Vec<Arc<str>>,
}

impl AccessPath {
    /// Path rooted at a local or parameter
    pub fn new(base: impl Into<Arc<str>>) -> Self {
        Self {
            base: Some(base.into()),
            fields: Vec::new(),
        }
    }

    /// The distinguished empty path
    pub fn zero() -> Self {
        Self {
            base: None,
            fields: Vec::new(),
        }
    }

    /// Append a field access
    pub fn with_field(mut self, field: impl Into<Arc<str>>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Same fields on a different base
    pub fn rebase(&self, base: impl Into<Arc<str>>) -> Self {
        Self {
            base: Some(base.into()),
            fields: self.fields.clone(),
        }
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn fields(&self) -> &[Arc<str>] {
        &self.fields
    }

    pub fn is_zero(&self) -> bool {
        self.base.is_none()
    }

    /// Number of field accesses
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            None => write!(f, "<zero>"),
            Some(base) => {
                write!(f, "{base}")?;
                for field in &self.fields {
                    write!(f, ".{field}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AccessPath::zero().to_string(), "<zero>");
        assert_eq!(
            AccessPath::new("x").with_field("f").with_field("g").to_string(),
            "x.f.g"
        );
    }

    #[test]
    fn test_equality_ignores_construction() {
        let a = AccessPath::new("x").with_field("f");
        let b = AccessPath::new(String::from("x")).with_field(String::from("f"));
        assert_eq!(a, b);
        assert_ne!(a, AccessPath::new("x"));
    }

    #[test]
    fn test_rebase_keeps_fields() {
        let p = AccessPath::new("arg0").with_field("data");
        let q = p.rebase("param");
        assert_eq!(q.base(), Some("param"));
        assert_eq!(q.field_count(), 1);
        assert!(!q.is_zero());
        assert!(AccessPath::zero().is_zero());
    }
}
