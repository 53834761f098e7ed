//! Exchange types for the external evolutionary controller.
//!
//! The controller itself lives outside this crate; only the record shape
//! it trades with the dispatcher is defined here.

use serde::{Deserialize, Serialize};

/// One agent lineage entry as exchanged with the evolutionary controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionAgentRecord {
    pub agent_id: u64,
    pub parent_id: Option<u64>,
    /// Source code or an identifier for it; opaque to the dispatcher.
    pub source_representation: String,
    pub performance_score: f64,
    pub evaluation_log: String,
    pub children_count: u32,
    pub creation_iteration: u32,
}
