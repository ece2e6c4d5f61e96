//! Facts that reached a sink

use super::fact::FactId;
use super::source_context::SourceSinkDefinition;

/// A fact observed at a sink statement
///
/// Identity for deduplication is (definition, fact value, statement); the
/// results sink enforces it, this type only carries the triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbstractionAtSink<N> {
    pub sink_definition: SourceSinkDefinition,
    pub fact: FactId,
    pub sink_stmt: N,
}

impl<N> AbstractionAtSink<N> {
    pub fn new(sink_definition: SourceSinkDefinition, fact: FactId, sink_stmt: N) -> Self {
        Self {
            sink_definition,
            fact,
            sink_stmt,
        }
    }
}
