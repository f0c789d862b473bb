//! Visibility tracking for the reveal sentinel.
//!
//! A terminal has no layout engine that reports element visibility, so the capability is a trait:
//! [`IntersectionObserver`]. The view tells the observer where the sentinel landed after each
//! layout; the observer queues [`IntersectionRecord`]s; [`IntersectionMonitor`] folds them into the
//! latest [`IntersectionSignal`] for the one marker it currently watches.

use std::ops::Range;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use mdreveal_core::viewport::ViewportState;

pub const DEFAULT_ROOT_MARGIN: u16 = 10;

/// Identifies one placement of the sentinel. A fresh id is minted whenever the reveal boundary
/// moves, so records about an old placement can be told apart from current ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntersectionSignal {
    pub is_intersecting: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntersectionRecord {
    pub marker: MarkerId,
    pub signal: IntersectionSignal,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MonitorOptions {
    /// Rows added above and below the viewport before testing for intersection, so the next
    /// reveal starts before the sentinel is actually on screen.
    pub root_margin: u16,
    /// Fraction of the marker's rows that must fall inside the grown viewport.
    pub threshold: f32,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            root_margin: DEFAULT_ROOT_MARGIN,
            threshold: 0.0,
        }
    }
}

pub trait IntersectionObserver {
    fn observe(&mut self, marker: MarkerId, options: &MonitorOptions);

    fn unobserve(&mut self, marker: MarkerId);

    /// Reports where `marker` landed in content rows after a layout pass.
    fn on_layout(&mut self, marker: MarkerId, rows: Range<u32>, viewport: &ViewportState);

    /// Drains queued records, oldest first.
    fn take_records(&mut self) -> Vec<IntersectionRecord>;
}

#[derive(Clone, Copy, Debug)]
struct Observed {
    marker: MarkerId,
    options: MonitorOptions,
    last: Option<bool>,
}

/// Computes intersection from the marker's rows and the viewport scroll position.
///
/// A record is queued on the first layout after `observe` and whenever the result flips.
#[derive(Clone, Debug, Default)]
pub struct ViewportObserver {
    observed: Vec<Observed>,
    records: Vec<IntersectionRecord>,
}

impl ViewportObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IntersectionObserver for ViewportObserver {
    fn observe(&mut self, marker: MarkerId, options: &MonitorOptions) {
        self.observed.retain(|o| o.marker != marker);
        self.observed.push(Observed {
            marker,
            options: *options,
            last: None,
        });
    }

    fn unobserve(&mut self, marker: MarkerId) {
        self.observed.retain(|o| o.marker != marker);
    }

    fn on_layout(&mut self, marker: MarkerId, rows: Range<u32>, viewport: &ViewportState) {
        let Some(o) = self.observed.iter_mut().find(|o| o.marker == marker) else {
            return;
        };
        let now = intersects(&rows, viewport, &o.options);
        if o.last == Some(now) {
            return;
        }
        o.last = Some(now);
        self.records.push(IntersectionRecord {
            marker,
            signal: IntersectionSignal {
                is_intersecting: now,
            },
        });
    }

    fn take_records(&mut self) -> Vec<IntersectionRecord> {
        std::mem::take(&mut self.records)
    }
}

fn intersects(rows: &Range<u32>, viewport: &ViewportState, options: &MonitorOptions) -> bool {
    // A zero-height marker counts as one row.
    let height = rows.end.saturating_sub(rows.start).max(1);
    let rows = rows.start..rows.start.saturating_add(height);
    let overlap = viewport.rows_within(rows, options.root_margin);
    overlap > 0 && overlap as f32 / height as f32 >= options.threshold
}

#[derive(Debug, Default)]
struct ManualState {
    observed: Vec<MarkerId>,
    records: Vec<IntersectionRecord>,
}

/// An observer driven from outside: clones share state, so a host keeps one handle and gives the
/// other to the monitor. Useful for explicit "show more" affordances and in tests.
#[derive(Clone, Debug, Default)]
pub struct ManualObserver {
    inner: Arc<Mutex<ManualState>>,
}

impl ManualObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a record for `marker`, whether or not it is still observed.
    pub fn signal(&self, marker: MarkerId, is_intersecting: bool) {
        self.lock().records.push(IntersectionRecord {
            marker,
            signal: IntersectionSignal { is_intersecting },
        });
    }

    pub fn observed(&self) -> Vec<MarkerId> {
        self.lock().observed.clone()
    }

    pub fn is_observing(&self, marker: MarkerId) -> bool {
        self.lock().observed.contains(&marker)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IntersectionObserver for ManualObserver {
    fn observe(&mut self, marker: MarkerId, _options: &MonitorOptions) {
        let mut state = self.lock();
        if !state.observed.contains(&marker) {
            state.observed.push(marker);
        }
    }

    fn unobserve(&mut self, marker: MarkerId) {
        self.lock().observed.retain(|m| *m != marker);
    }

    fn on_layout(&mut self, _marker: MarkerId, _rows: Range<u32>, _viewport: &ViewportState) {}

    fn take_records(&mut self) -> Vec<IntersectionRecord> {
        std::mem::take(&mut self.lock().records)
    }
}

/// Watches at most one marker and keeps the latest signal for it.
///
/// Without an observer (see [`IntersectionMonitor::unsupported`]) the signal is permanently
/// "not intersecting"; reveals then only happen on explicit request.
pub struct IntersectionMonitor {
    observer: Option<Box<dyn IntersectionObserver + Send>>,
    options: MonitorOptions,
    active: Option<MarkerId>,
    signal: IntersectionSignal,
}

impl std::fmt::Debug for IntersectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntersectionMonitor")
            .field("supported", &self.observer.is_some())
            .field("options", &self.options)
            .field("active", &self.active)
            .field("signal", &self.signal)
            .finish()
    }
}

impl IntersectionMonitor {
    pub fn new(observer: Box<dyn IntersectionObserver + Send>, options: MonitorOptions) -> Self {
        Self {
            observer: Some(observer),
            options,
            active: None,
            signal: IntersectionSignal::default(),
        }
    }

    pub fn unsupported(options: MonitorOptions) -> Self {
        Self {
            observer: None,
            options,
            active: None,
            signal: IntersectionSignal::default(),
        }
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn is_supported(&self) -> bool {
        self.observer.is_some()
    }

    pub fn active_marker(&self) -> Option<MarkerId> {
        self.active
    }

    /// Switches the watched marker. The previous one is unobserved and the signal starts over as
    /// "not intersecting" until the observer reports on the new marker.
    pub fn set_marker(&mut self, marker: Option<MarkerId>) {
        if marker == self.active {
            return;
        }
        if let (Some(old), Some(observer)) = (self.active, self.observer.as_mut()) {
            observer.unobserve(old);
        }
        self.active = marker;
        self.signal = IntersectionSignal::default();
        if let (Some(new), Some(observer)) = (marker, self.observer.as_mut()) {
            observer.observe(new, &self.options);
        }
    }

    pub fn on_layout(&mut self, rows: Range<u32>, viewport: &ViewportState) {
        if let (Some(marker), Some(observer)) = (self.active, self.observer.as_mut()) {
            observer.on_layout(marker, rows, viewport);
        }
    }

    /// Folds queued records into the current signal and returns it.
    pub fn poll(&mut self) -> IntersectionSignal {
        let Some(observer) = self.observer.as_mut() else {
            return self.signal;
        };
        for record in observer.take_records() {
            if Some(record.marker) == self.active {
                self.signal = record.signal;
            } else {
                tracing::trace!(
                    marker = record.marker.get(),
                    "dropping intersection record for inactive marker"
                );
            }
        }
        self.signal
    }

    pub fn signal(&self) -> IntersectionSignal {
        self.signal
    }

    /// Stops observing for good; later calls are no-ops.
    pub fn disconnect(&mut self) {
        self.set_marker(None);
        self.observer = None;
    }
}

impl Drop for IntersectionMonitor {
    fn drop(&mut self) {
        self.disconnect();
    }
}
