//! Timeline handles resolved against the times a table actually has

mod engine;
mod subscriber;

pub use engine::Timeline;
pub use subscriber::TimelineSubscriber;

use crate::time::Time;

/// Snapshot passed to subscribers when the timeline changes
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineContext {
    /// Available times, ascending
    pub times: Vec<Time>,
    /// Raw start handle bound; may be infinite
    pub start_bound: f64,
    /// Raw end handle bound; may be infinite
    pub end_bound: f64,
    /// Start handle resolved to an available time
    pub start_time: Option<Time>,
    /// End handle resolved to an available time
    pub end_time: Option<Time>,
    /// Whether both handles move together
    pub single_time: bool,
}
