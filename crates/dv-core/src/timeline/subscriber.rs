//! Timeline subscriber trait

use super::TimelineContext;

/// Trait for components that need to respond to timeline changes
pub trait TimelineSubscriber: Send + Sync {
    /// Called after the available times or a handle changed
    fn on_timeline_change(&self, context: &TimelineContext);
}
