//! Traversal jobs.

use px_types::ListRequest;

use crate::sink::{OpenMode, OutputTarget};

/// Full listing of one partition into its output target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalJob {
    /// Partition identifier (last segment of the discovered prefix)
    pub partition_id: String,

    /// Deep listing request: no delimiter, partition prefix
    pub request: ListRequest,

    pub output: OutputTarget,

    pub open_mode: OpenMode,
}

impl TraversalJob {
    pub fn new(
        partition_id: impl Into<String>,
        request: ListRequest,
        output: OutputTarget,
        open_mode: OpenMode,
    ) -> Self {
        Self {
            partition_id: partition_id.into(),
            request,
            output,
            open_mode,
        }
    }
}
