use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed header, non-integer count or id, edge count mismatch, or a raw data line with
    /// fewer than two tokens.
    #[error("format error: {0}")]
    Format(String),
    /// A node id that does not name a vertex of the graph.
    #[error("node id {id} is out of range for a graph with {vertex_count} vertices")]
    OutOfRange { id: u64, vertex_count: usize },
    #[error("node {0} is missing from both sides of the partition")]
    PartitionIncomplete(u32),
    /// A node listed on both sides, or listed twice on the same side.
    #[error("node {0} appears more than once in the partition")]
    PartitionOverlap(u32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn format(line: usize, reason: impl std::fmt::Display) -> Self {
        Error::Format(format!("line {line}: {reason}"))
    }
}
