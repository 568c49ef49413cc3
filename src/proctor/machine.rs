use crate::config::env;
use crate::constants;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a clipboard attempt does during an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardPolicy {
    /// Blocked on the client, never counted.
    #[default]
    Block,
    /// Counted like any other violation.
    Count,
}

impl FromStr for ClipboardPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(ClipboardPolicy::Block),
            "count" => Ok(ClipboardPolicy::Count),
            _ => Err(format!("unknown clipboard policy {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProctorPolicy {
    pub session_budget_secs: u64,
    pub max_violations: u32,
    pub grace_delay_secs: u64,
    pub clipboard: ClipboardPolicy,
}

impl Default for ProctorPolicy {
    fn default() -> Self {
        Self {
            session_budget_secs: constants::DEFAULT_SESSION_BUDGET_SECS,
            max_violations: constants::DEFAULT_MAX_VIOLATIONS,
            grace_delay_secs: constants::DEFAULT_GRACE_DELAY_SECS,
            clipboard: ClipboardPolicy::default(),
        }
    }
}

impl ProctorPolicy {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            session_budget_secs: env::get_or("SESSION_BUDGET_SECS", d.session_budget_secs),
            max_violations: env::get_or("MAX_VIOLATIONS", d.max_violations).max(1),
            grace_delay_secs: env::get_or("GRACE_DELAY_SECS", d.grace_delay_secs),
            clipboard: env::get_or("CLIPBOARD_POLICY", d.clipboard),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Timeout,
    Violations,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum ProctorState {
    Idle,
    Active,
    Warned(u32),
    Terminated(TerminationReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    FocusLost,
    LockdownLost,
    Clipboard,
}

/// Result of feeding one violation to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ignored,
    Blocked,
    Warned(u32),
    Terminated(TerminationReason),
}

/// The attempt's state, free of any clock or io. The first termination
/// trigger latches; every later one is ignored.
#[derive(Debug, Clone)]
pub struct ProctorMachine {
    policy: ProctorPolicy,
    state: ProctorState,
    violations: u32,
    elapsed_secs: u64,
    submit_latched: bool,
    cancelled: bool,
    /// Whether the client is currently locked down and focused.
    lockdown_held: bool,
    pub lang: String,
    pub code: String,
}

impl ProctorMachine {
    pub fn new(policy: ProctorPolicy, lang: &str, code: &str) -> Self {
        Self {
            policy,
            state: ProctorState::Idle,
            violations: 0,
            elapsed_secs: 0,
            submit_latched: false,
            cancelled: false,
            lockdown_held: false,
            lang: lang.to_string(),
            code: code.to_string(),
        }
    }

    pub fn policy(&self) -> &ProctorPolicy {
        &self.policy
    }

    pub fn state(&self) -> ProctorState {
        self.state
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn lockdown_held(&self) -> bool {
        self.lockdown_held
    }

    /// Records a granted or refused lockdown request. Only a live attempt can
    /// hold lockdown.
    pub fn set_lockdown(&mut self, held: bool) {
        self.lockdown_held = held && self.is_live();
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.policy.session_budget_secs.saturating_sub(self.elapsed_secs)
    }

    /// Counting down and accepting signals.
    pub fn is_live(&self) -> bool {
        matches!(self.state, ProctorState::Active | ProctorState::Warned(_)) && !self.submit_latched
    }

    pub fn start(&mut self) -> bool {
        if self.state != ProctorState::Idle || self.submit_latched || self.cancelled {
            return false;
        }
        self.state = ProctorState::Active;
        true
    }

    /// One second passed.
    pub fn tick(&mut self) -> Option<TerminationReason> {
        if !self.is_live() {
            return None;
        }
        self.elapsed_secs += 1;
        if self.elapsed_secs >= self.policy.session_budget_secs {
            return self.terminate(TerminationReason::Timeout);
        }
        None
    }

    pub fn violation(&mut self, v: Violation) -> Step {
        if !self.is_live() {
            return Step::Ignored;
        }
        if v == Violation::Clipboard && self.policy.clipboard == ClipboardPolicy::Block {
            return Step::Blocked;
        }
        if v != Violation::Clipboard {
            self.lockdown_held = false;
        }
        self.violations += 1;
        if self.violations >= self.policy.max_violations {
            return match self.terminate(TerminationReason::Violations) {
                Some(r) => Step::Terminated(r),
                None => Step::Ignored,
            };
        }
        self.state = ProctorState::Warned(self.violations);
        Step::Warned(self.violations)
    }

    pub fn manual_submit(&mut self) -> Option<TerminationReason> {
        if !self.is_live() {
            return None;
        }
        self.terminate(TerminationReason::Manual)
    }

    pub fn update_code(&mut self, code: String) -> bool {
        if !self.is_live() {
            return false;
        }
        self.code = code;
        true
    }

    /// Leaves the attempt without submitting. False once a submission is
    /// under way.
    pub fn cancel(&mut self) -> bool {
        if self.submit_latched || self.cancelled {
            return false;
        }
        self.cancelled = true;
        self.lockdown_held = false;
        self.state = ProctorState::Idle;
        true
    }

    /// Back to `Idle` after the terminal grace period.
    pub fn finish(&mut self) {
        self.state = ProctorState::Idle;
    }

    fn terminate(&mut self, reason: TerminationReason) -> Option<TerminationReason> {
        if self.submit_latched {
            return None;
        }
        self.submit_latched = true;
        self.lockdown_held = false;
        self.state = ProctorState::Terminated(reason);
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(budget: u64, clipboard: ClipboardPolicy) -> ProctorMachine {
        let mut m = ProctorMachine::new(
            ProctorPolicy {
                session_budget_secs: budget,
                clipboard,
                ..Default::default()
            },
            "javascript",
            "",
        );
        assert!(m.start());
        m
    }

    #[test]
    fn violations_warn_until_the_limit() {
        let mut m = machine(1500, ClipboardPolicy::Block);
        assert_eq!(m.violation(Violation::FocusLost), Step::Warned(1));
        assert_eq!(m.violation(Violation::LockdownLost), Step::Warned(2));
        assert_eq!(m.state(), ProctorState::Warned(2));
        assert_eq!(
            m.violation(Violation::FocusLost),
            Step::Terminated(TerminationReason::Violations)
        );
        assert_eq!(m.violation(Violation::FocusLost), Step::Ignored);
        assert_eq!(m.violations(), 3);
    }

    #[test]
    fn clipboard_policy_blocks_or_counts() {
        let mut m = machine(1500, ClipboardPolicy::Block);
        assert_eq!(m.violation(Violation::Clipboard), Step::Blocked);
        assert_eq!(m.violations(), 0);
        assert_eq!(m.state(), ProctorState::Active);

        let mut m = machine(1500, ClipboardPolicy::Count);
        assert_eq!(m.violation(Violation::Clipboard), Step::Warned(1));
    }

    #[test]
    fn countdown_terminates_once() {
        let mut m = machine(3, ClipboardPolicy::Block);
        assert_eq!(m.tick(), None);
        assert_eq!(m.tick(), None);
        assert_eq!(m.remaining_secs(), 1);
        assert_eq!(m.tick(), Some(TerminationReason::Timeout));
        assert_eq!(m.remaining_secs(), 0);
        assert_eq!(m.manual_submit(), None);
        assert_eq!(m.violation(Violation::LockdownLost), Step::Ignored);
        assert_eq!(m.tick(), None);
        assert_eq!(m.elapsed_secs(), 3);
    }

    #[test]
    fn idle_and_cancelled_machines_ignore_everything() {
        let mut m = ProctorMachine::new(ProctorPolicy::default(), "python", "print()");
        assert_eq!(m.tick(), None);
        assert_eq!(m.violation(Violation::FocusLost), Step::Ignored);
        assert!(m.start());
        assert!(!m.start());
        assert!(m.update_code("print(1)".into()));
        assert!(m.cancel());
        assert_eq!(m.manual_submit(), None);
        assert!(!m.update_code("print(2)".into()));
        assert_eq!(m.code, "print(1)");
        assert!(!m.start());
    }

    #[test]
    fn lockdown_is_lost_on_focus_or_lockdown_violations() {
        let mut m = machine(1500, ClipboardPolicy::Count);
        assert!(!m.lockdown_held());
        m.set_lockdown(true);
        assert!(m.lockdown_held());
        m.violation(Violation::Clipboard);
        assert!(m.lockdown_held());
        m.violation(Violation::FocusLost);
        assert!(!m.lockdown_held());
        m.set_lockdown(true);
        m.violation(Violation::LockdownLost);
        assert!(!m.lockdown_held());

        let mut m = machine(1500, ClipboardPolicy::Block);
        m.set_lockdown(true);
        assert!(m.manual_submit().is_some());
        assert!(!m.lockdown_held());
        m.set_lockdown(true);
        assert!(!m.lockdown_held());
    }

    #[test]
    fn clipboard_policy_parses_case_insensitively() {
        assert_eq!("COUNT".parse::<ClipboardPolicy>(), Ok(ClipboardPolicy::Count));
        assert!("ignore".parse::<ClipboardPolicy>().is_err());
    }
}
