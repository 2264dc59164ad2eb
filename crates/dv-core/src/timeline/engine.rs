//! Timeline implementation

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use super::{TimelineContext, TimelineSubscriber};
use crate::time::{find_closest_time, find_closest_time_index, Time};

/// Timeline state stored internally
#[derive(Debug, Clone)]
struct TimelineState {
    times: Vec<Time>,
    start_bound: f64,
    end_bound: f64,
    single_time: bool,
}

impl TimelineState {
    fn effective_start_bound(&self) -> f64 {
        if self.single_time {
            self.end_bound
        } else {
            self.start_bound
        }
    }

    fn start_time(&self) -> Option<Time> {
        find_closest_time(&self.times, self.effective_start_bound(), None)
    }

    fn end_time(&self) -> Option<Time> {
        find_closest_time(&self.times, self.end_bound, None)
    }
}

/// Start and end handles over a set of available times
///
/// Handles hold raw bounds (`-∞`/`+∞` mean earliest/latest) and are resolved
/// to the closest available time on read, so they stay meaningful when the
/// available times change underneath them.
pub struct Timeline {
    state: Arc<RwLock<TimelineState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn TimelineSubscriber>>>>,
}

impl Timeline {
    /// Create a timeline spanning all of `times`
    pub fn new(times: Vec<Time>) -> Self {
        let state = TimelineState {
            times: normalize(times),
            start_bound: f64::NEG_INFINITY,
            end_bound: f64::INFINITY,
            single_time: false,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the available times, keeping the handle bounds
    pub fn set_times(&self, times: Vec<Time>) {
        let mut state = self.state.write();
        state.times = normalize(times);
        debug!(count = state.times.len(), "timeline times updated");
        drop(state);
        self.notify_subscribers();
    }

    /// Make both handles move together (map and single-bar views)
    pub fn set_single_time(&self, single_time: bool) {
        let mut state = self.state.write();
        state.single_time = single_time;
        drop(state);
        self.notify_subscribers();
    }

    pub fn set_start_bound(&self, bound: f64) {
        let mut state = self.state.write();
        if state.single_time {
            state.end_bound = bound;
        }
        state.start_bound = bound;
        drop(state);
        self.notify_subscribers();
    }

    pub fn set_end_bound(&self, bound: f64) {
        let mut state = self.state.write();
        if state.single_time {
            state.start_bound = bound;
        }
        state.end_bound = bound;
        drop(state);
        self.notify_subscribers();
    }

    pub fn set_bounds(&self, start: f64, end: f64) {
        let mut state = self.state.write();
        state.start_bound = start;
        state.end_bound = end;
        drop(state);
        self.notify_subscribers();
    }

    /// Start handle resolved to an available time
    pub fn start_time(&self) -> Option<Time> {
        self.state.read().start_time()
    }

    /// End handle resolved to an available time
    pub fn end_time(&self) -> Option<Time> {
        self.state.read().end_time()
    }

    /// Move the end handle to the next available time
    ///
    /// Returns the new end time, or `None` when already at the last time.
    pub fn step_forward(&self) -> Option<Time> {
        self.step(1)
    }

    /// Move the end handle to the previous available time
    ///
    /// Returns the new end time, or `None` when already at the first time.
    pub fn step_back(&self) -> Option<Time> {
        self.step(-1)
    }

    fn step(&self, direction: isize) -> Option<Time> {
        let mut state = self.state.write();
        let current = find_closest_time_index(&state.times, state.end_bound, None)?;
        let next = current.checked_add_signed(direction)?;
        let time = *state.times.get(next)?;

        state.end_bound = time as f64;
        if state.single_time {
            state.start_bound = time as f64;
        }

        drop(state);
        self.notify_subscribers();
        Some(time)
    }

    /// Get current timeline context
    pub fn get_context(&self) -> TimelineContext {
        let state = self.state.read();
        TimelineContext {
            times: state.times.clone(),
            start_bound: state.start_bound,
            end_bound: state.end_bound,
            start_time: state.start_time(),
            end_time: state.end_time(),
            single_time: state.single_time,
        }
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn TimelineSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    /// Notify all subscribers of a timeline change
    fn notify_subscribers(&self) {
        let context = self.get_context();
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_timeline_change(&context);
            }
        }
    }
}

fn normalize(mut times: Vec<Time>) -> Vec<Time> {
    times.sort_unstable();
    times.dedup();
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl TimelineSubscriber for Counter {
        fn on_timeline_change(&self, _context: &TimelineContext) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_unbounded_handles_span_all_times() {
        let timeline = Timeline::new(vec![2010, 2000, 2005, 2005]);
        assert_eq!(timeline.start_time(), Some(2000));
        assert_eq!(timeline.end_time(), Some(2010));
        assert_eq!(timeline.get_context().times, vec![2000, 2005, 2010]);
    }

    #[test]
    fn test_bounds_snap_to_available_times() {
        let timeline = Timeline::new(vec![2000, 2005, 2010]);
        timeline.set_bounds(2001.0, 2008.0);
        assert_eq!(timeline.start_time(), Some(2000));
        assert_eq!(timeline.end_time(), Some(2010));

        timeline.set_times(vec![2002, 2007]);
        assert_eq!(timeline.start_time(), Some(2002));
        assert_eq!(timeline.end_time(), Some(2007));
    }

    #[test]
    fn test_single_time_mirrors_end_handle() {
        let timeline = Timeline::new(vec![1990, 2000, 2010]);
        timeline.set_single_time(true);
        assert_eq!(timeline.start_time(), Some(2010));

        timeline.set_start_bound(1990.0);
        assert_eq!(timeline.end_time(), Some(1990));
        assert_eq!(timeline.start_time(), Some(1990));
    }

    #[test]
    fn test_stepping() {
        let timeline = Timeline::new(vec![1, 2, 3]);
        assert_eq!(timeline.step_forward(), None);
        assert_eq!(timeline.step_back(), Some(2));
        assert_eq!(timeline.step_back(), Some(1));
        assert_eq!(timeline.step_back(), None);
        assert_eq!(timeline.end_time(), Some(1));

        let empty = Timeline::new(Vec::new());
        assert_eq!(empty.step_forward(), None);
        assert_eq!(empty.end_time(), None);
    }

    #[test]
    fn test_subscribers_notified_until_dropped() {
        let timeline = Timeline::new(vec![1, 2]);
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        timeline.add_subscriber(counter.clone());

        timeline.set_end_bound(1.0);
        timeline.set_single_time(true);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);

        drop(counter);
        timeline.set_end_bound(2.0);
    }
}
