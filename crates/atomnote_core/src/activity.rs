//! Activity log sinks for view and update side effects.
//!
//! # Responsibility
//! - Define the ordered event sink consumed by views and reconciliation.
//! - Provide an in-memory recorder and a `log`-facade forwarder.
//!
//! # Invariants
//! - Events are delivered in the order of the mutations that caused them.
//! - A missing sink never changes graph outcomes; it only drops events.

use crate::model::atom::{Atom, AtomId};
use log::info;

/// Single activity record. Carries ids only, never atom text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    Create { atom_id: AtomId },
    Update { atom_id: AtomId },
    SetProperties { atom_id: AtomId },
    Link { parent_id: AtomId, child_id: AtomId },
    Unlink { parent_id: AtomId, child_id: AtomId },
    View { atom_id: AtomId },
}

impl ActivityEvent {
    /// Short event name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::SetProperties { .. } => "set_properties",
            Self::Link { .. } => "link",
            Self::Unlink { .. } => "unlink",
            Self::View { .. } => "view",
        }
    }
}

/// Ordered sink for activity events.
///
/// Only [`ActivityLog::record`] is required; the `log_*` helpers build the
/// matching event.
pub trait ActivityLog {
    fn record(&mut self, event: ActivityEvent);

    fn log_create(&mut self, atom: &Atom) {
        self.record(ActivityEvent::Create {
            atom_id: atom.id.clone(),
        });
    }

    fn log_update(&mut self, atom: &Atom) {
        self.record(ActivityEvent::Update {
            atom_id: atom.id.clone(),
        });
    }

    fn log_set_properties(&mut self, atom: &Atom) {
        self.record(ActivityEvent::SetProperties {
            atom_id: atom.id.clone(),
        });
    }

    fn log_link(&mut self, parent: &Atom, child: &Atom) {
        self.record(ActivityEvent::Link {
            parent_id: parent.id.clone(),
            child_id: child.id.clone(),
        });
    }

    fn log_unlink(&mut self, parent: &Atom, child_id: &str) {
        self.record(ActivityEvent::Unlink {
            parent_id: parent.id.clone(),
            child_id: child_id.to_string(),
        });
    }

    fn log_view(&mut self, atom: &Atom) {
        self.record(ActivityEvent::View {
            atom_id: atom.id.clone(),
        });
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingActivityLog {
    pub events: Vec<ActivityEvent>,
}

impl RecordingActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|event| event.kind() == kind).count()
    }
}

impl ActivityLog for RecordingActivityLog {
    fn record(&mut self, event: ActivityEvent) {
        self.events.push(event);
    }
}

/// Forwards events to the `log` facade at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogActivityLog;

impl ActivityLog for LogActivityLog {
    fn record(&mut self, event: ActivityEvent) {
        match &event {
            ActivityEvent::Create { atom_id }
            | ActivityEvent::Update { atom_id }
            | ActivityEvent::SetProperties { atom_id }
            | ActivityEvent::View { atom_id } => {
                info!("event=activity kind={} atom_id={atom_id}", event.kind());
            }
            ActivityEvent::Link {
                parent_id,
                child_id,
            }
            | ActivityEvent::Unlink {
                parent_id,
                child_id,
            } => {
                info!(
                    "event=activity kind={} parent_id={parent_id} child_id={child_id}",
                    event.kind()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityEvent, ActivityLog, RecordingActivityLog};
    use crate::model::atom::Atom;

    #[test]
    fn recorder_keeps_arrival_order() {
        let parent = Atom::new("p", 1);
        let child = Atom::new("c", 2);
        let mut log = RecordingActivityLog::new();

        log.log_create(&child);
        log.log_link(&parent, &child);
        log.log_unlink(&parent, "c");

        assert_eq!(
            log.events,
            vec![
                ActivityEvent::Create {
                    atom_id: "c".to_string()
                },
                ActivityEvent::Link {
                    parent_id: "p".to_string(),
                    child_id: "c".to_string()
                },
                ActivityEvent::Unlink {
                    parent_id: "p".to_string(),
                    child_id: "c".to_string()
                },
            ]
        );
        assert_eq!(log.count("link"), 1);
    }
}
