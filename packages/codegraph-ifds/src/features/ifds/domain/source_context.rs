//! Source/sink definitions and the source context carried by root facts

use std::fmt;
use std::sync::Arc;

use super::access_path::AccessPath;

/// Identifier of a source or sink category (e.g. `"user_input"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSinkDefinition(Arc<str>);

impl SourceSinkDefinition {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceSinkDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a flow originates: present only on facts without a predecessor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceContext<N> {
    pub definition: SourceSinkDefinition,
    pub access_path: AccessPath,
    pub stmt: N,
    pub user_data: Option<Arc<str>>,
}

impl<N> SourceContext<N> {
    pub fn new(definition: SourceSinkDefinition, access_path: AccessPath, stmt: N) -> Self {
        Self {
            definition,
            access_path,
            stmt,
            user_data: None,
        }
    }

    pub fn with_user_data(mut self, user_data: impl Into<Arc<str>>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }
}
