use super::user::Role;
use super::verdict::VerdictView;
use crate::proctor::driver::TerminalEvent;
use crate::proctor::machine::{ProctorState, TerminationReason};
use crate::proctor::registry::SessionEntry;
use crate::proctor::signals::Directive;
use serde::Serialize;

#[derive(Serialize, Debug, Clone)]
pub struct TerminalView {
    pub reason: TerminationReason,
    pub verdict: VerdictView,
}

impl TerminalView {
    pub fn from(ev: &TerminalEvent, role: Role) -> Self {
        Self {
            reason: ev.reason,
            verdict: ev.verdict.view_for(role),
        }
    }
}

/// What the client polls while an attempt is running.
#[derive(Serialize, Debug, Clone)]
pub struct SessionView {
    pub id: String,
    pub problem_id: u32,
    pub state: ProctorState,
    pub remaining_seconds: u64,
    pub violation_count: u32,
    /// False when the client could not enter lockdown at all.
    pub lockdown_enforced: bool,
    /// Client currently locked down and focused.
    pub lockdown_held: bool,
    /// Lockdown and clipboard directives the client has not applied yet.
    pub directives: Vec<Directive>,
    pub terminal: Option<TerminalView>,
}

impl SessionView {
    /// Drains the pending directives of `entry`.
    pub fn from(entry: &SessionEntry, role: Role) -> Self {
        let h = &entry.handle;
        let remaining_seconds = *h.remaining_seconds().borrow();
        let violation_count = *h.violation_count().borrow();
        Self {
            id: entry.id.clone(),
            problem_id: entry.problem_id,
            state: h.state(),
            remaining_seconds,
            violation_count,
            lockdown_enforced: h.lockdown_error().is_none(),
            lockdown_held: h.lockdown_held(),
            directives: entry.signals.drain(),
            terminal: h.terminal().map(|ev| TerminalView::from(&ev, role)),
        }
    }
}
