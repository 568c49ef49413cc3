use super::machine::{
    ClipboardPolicy, ProctorMachine, ProctorPolicy, ProctorState, Step, TerminationReason, Violation,
};
use super::signals::ProctorSignals;
use crate::dao::submission_dao::Engine;
use crate::model::problem::Problem;
use crate::model::user::User;
use crate::model::verdict::VerdictReport;
use crate::types::error::Error;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Everything needed to grade the attempt when it ends.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub user_id: String,
    pub problem: Problem,
    pub lang: String,
    pub code: String,
    pub elapsed_secs: u64,
    /// Budget the session ran with; the time bonus is measured against it.
    pub budget_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Graded {
    pub verdict: VerdictReport,
    /// `None` when the user no longer exists.
    pub user: Option<User>,
}

/// Grades a finished attempt. Called at most once per session.
pub trait Grader: Send + Sync {
    fn grade(&self, attempt: Attempt) -> BoxFuture<'_, Graded>;
}

impl Grader for Engine {
    fn grade(&self, attempt: Attempt) -> BoxFuture<'_, Graded> {
        Box::pin(async move {
            let verdict = self
                .evaluate(&attempt.problem, &attempt.lang, &attempt.code)
                .await;
            let user = self
                .submit(
                    &attempt.user_id,
                    &attempt.problem,
                    &verdict,
                    attempt.elapsed_secs,
                    attempt.budget_secs,
                )
                .await;
            Graded { verdict, user }
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TerminalEvent {
    pub reason: TerminationReason,
    pub verdict: VerdictReport,
}

#[derive(Debug)]
enum Command {
    Signal(Violation),
    Code(String),
    Submit,
    Cancel,
}

struct Outlets {
    state: watch::Sender<ProctorState>,
    remaining: watch::Sender<u64>,
    violations: watch::Sender<u32>,
    lockdown: watch::Sender<bool>,
    terminal: watch::Sender<Option<TerminalEvent>>,
    navigate: watch::Sender<bool>,
}

impl Outlets {
    fn publish(&self, m: &ProctorMachine) {
        self.state.send_replace(m.state());
        self.remaining.send_replace(m.remaining_secs());
        self.violations.send_replace(m.violations());
        self.lockdown.send_replace(m.lockdown_held());
    }
}

/// The caller's side of a running session. Dropping every handle cancels
/// the session without submitting.
#[derive(Debug)]
pub struct ProctorHandle {
    tx: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ProctorState>,
    remaining: watch::Receiver<u64>,
    violations: watch::Receiver<u32>,
    lockdown: watch::Receiver<bool>,
    terminal: watch::Receiver<Option<TerminalEvent>>,
    navigate: watch::Receiver<bool>,
    lockdown_error: Option<Error>,
}

impl ProctorHandle {
    /// Terminated, cancelled or already navigated away. Grading and the
    /// grace delay may still be running.
    pub fn is_over(&self) -> bool {
        matches!(self.state(), ProctorState::Terminated(_)) || *self.navigate.borrow()
    }

    /// Reports a focus, lockdown or clipboard event. False once the session
    /// is over.
    pub fn signal(&self, v: Violation) -> bool {
        !self.is_over() && self.tx.send(Command::Signal(v)).is_ok()
    }

    pub fn update_code(&self, code: String) -> bool {
        !self.is_over() && self.tx.send(Command::Code(code)).is_ok()
    }

    pub fn submit(&self) -> bool {
        self.tx.send(Command::Submit).is_ok()
    }

    pub fn cancel(&self) -> bool {
        self.tx.send(Command::Cancel).is_ok()
    }

    pub fn state(&self) -> ProctorState {
        *self.state.borrow()
    }

    pub fn remaining_seconds(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    pub fn violation_count(&self) -> watch::Receiver<u32> {
        self.violations.clone()
    }

    /// Client currently locked down and focused, as far as the session knows.
    pub fn lockdown_held(&self) -> bool {
        *self.lockdown.borrow()
    }

    pub fn terminal(&self) -> Option<TerminalEvent> {
        self.terminal.borrow().clone()
    }

    /// Set when the client could not enter lockdown; the attempt runs
    /// unenforced.
    pub fn lockdown_error(&self) -> Option<&Error> {
        self.lockdown_error.as_ref()
    }

    /// Resolves with the terminal event, or `None` if the session ended
    /// without one.
    pub async fn wait_terminal(&self) -> Option<TerminalEvent> {
        let mut rx = self.terminal.clone();
        let ev = match rx.wait_for(|t| t.is_some()).await {
            Ok(t) => t.clone(),
            Err(_) => None,
        };
        ev
    }

    /// Resolves once the session is over and the client should leave.
    pub async fn navigated(&self) {
        let mut rx = self.navigate.clone();
        let _ = rx.wait_for(|n| *n).await;
    }
}

/// Starts an attempt: requests lockdown, then runs the countdown and event
/// loop on its own task.
pub fn start(
    attempt: Attempt,
    policy: ProctorPolicy,
    signals: Arc<dyn ProctorSignals>,
    grader: Arc<dyn Grader>,
) -> ProctorHandle {
    let attempt = Attempt {
        budget_secs: policy.session_budget_secs,
        ..attempt
    };
    let mut machine = ProctorMachine::new(policy, &attempt.lang, &attempt.code);
    machine.start();
    // the countdown runs from here, not from the task's first poll
    let period = Duration::from_secs(1);
    let interval = time::interval_at(Instant::now() + period, period);

    let lockdown_error = signals.request_lockdown().err();
    machine.set_lockdown(lockdown_error.is_none());
    if let Some(e) = lockdown_error.as_ref() {
        warn!(user = %attempt.user_id, problem = attempt.problem.id, "attempt runs without lockdown: {}", e);
    }
    if machine.policy().clipboard == ClipboardPolicy::Block {
        if let Err(e) = signals.block_clipboard() {
            warn!("clipboard blocking unavailable: {}", e);
        }
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(machine.state());
    let (remaining_tx, remaining_rx) = watch::channel(machine.remaining_secs());
    let (violations_tx, violations_rx) = watch::channel(0);
    let (lockdown_tx, lockdown_rx) = watch::channel(machine.lockdown_held());
    let (terminal_tx, terminal_rx) = watch::channel(None);
    let (navigate_tx, navigate_rx) = watch::channel(false);
    let outlets = Outlets {
        state: state_tx,
        remaining: remaining_tx,
        violations: violations_tx,
        lockdown: lockdown_tx,
        terminal: terminal_tx,
        navigate: navigate_tx,
    };
    info!(user = %attempt.user_id, problem = attempt.problem.id, lang = %attempt.lang, "attempt started");
    tokio::spawn(run(machine, attempt, interval, rx, outlets, signals, grader));

    ProctorHandle {
        tx,
        state: state_rx,
        remaining: remaining_rx,
        violations: violations_rx,
        lockdown: lockdown_rx,
        terminal: terminal_rx,
        navigate: navigate_rx,
        lockdown_error,
    }
}

async fn run(
    mut machine: ProctorMachine,
    attempt: Attempt,
    mut interval: time::Interval,
    mut rx: mpsc::UnboundedReceiver<Command>,
    outlets: Outlets,
    signals: Arc<dyn ProctorSignals>,
    grader: Arc<dyn Grader>,
) {
    let reason = loop {
        tokio::select! {
            // commands queued before a tick are applied first
            biased;
            cmd = rx.recv() => match cmd {
                Some(Command::Signal(v)) => match machine.violation(v) {
                    Step::Ignored => {}
                    Step::Blocked => debug!(?v, "clipboard attempt blocked"),
                    Step::Warned(n) => {
                        warn!(user = %attempt.user_id, violations = n, ?v, "proctor warning");
                        // best effort, the client may refuse again
                        let regained = signals.request_lockdown().is_ok();
                        machine.set_lockdown(regained);
                        outlets.publish(&machine);
                    }
                    Step::Terminated(r) => break r,
                },
                Some(Command::Code(code)) => {
                    machine.update_code(code);
                }
                Some(Command::Submit) => {
                    if let Some(r) = machine.manual_submit() {
                        break r;
                    }
                }
                Some(Command::Cancel) | None => {
                    if machine.cancel() {
                        signals.release_lockdown();
                        outlets.publish(&machine);
                        info!(user = %attempt.user_id, problem = attempt.problem.id, "attempt cancelled");
                    }
                    outlets.navigate.send_replace(true);
                    return;
                }
            },
            _ = interval.tick() => {
                if let Some(r) = machine.tick() {
                    break r;
                }
                outlets.remaining.send_replace(machine.remaining_secs());
            }
        }
    };

    outlets.publish(&machine);
    signals.release_lockdown();
    info!(
        user = %attempt.user_id,
        problem = attempt.problem.id,
        ?reason,
        elapsed = machine.elapsed_secs(),
        "attempt terminated"
    );
    let graded = grader
        .grade(Attempt {
            code: machine.code.clone(),
            lang: machine.lang.clone(),
            elapsed_secs: machine.elapsed_secs(),
            ..attempt
        })
        .await;
    outlets.terminal.send_replace(Some(TerminalEvent {
        reason,
        verdict: graded.verdict,
    }));

    time::sleep(Duration::from_secs(machine.policy().grace_delay_secs)).await;
    machine.finish();
    outlets.publish(&machine);
    outlets.navigate.send_replace(true);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::problem::TestCase;
    use crate::model::verdict::CaseVerdict;
    use crate::proctor::signals::{Directive, DirectiveSignals};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every attempt it is asked to grade and passes all of them.
    #[derive(Default)]
    pub struct CountingGrader {
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<Attempt>>,
    }

    impl Grader for CountingGrader {
        fn grade(&self, attempt: Attempt) -> BoxFuture<'_, Graded> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let problem_id = attempt.problem.id;
            self.seen.lock().unwrap().push(attempt);
            Box::pin(async move {
                Graded {
                    verdict: VerdictReport::from_results(
                        problem_id,
                        vec![CaseVerdict {
                            passed: true,
                            ..Default::default()
                        }],
                    ),
                    user: None,
                }
            })
        }
    }

    pub fn attempt() -> Attempt {
        Attempt {
            user_id: "2".into(),
            problem: Problem {
                id: 1,
                title: "Two Sum".into(),
                test_cases: vec![TestCase::visible("a", "1")],
                ..Default::default()
            },
            lang: "javascript".into(),
            code: "// start".into(),
            elapsed_secs: 0,
            budget_secs: 0,
        }
    }

    fn policy(budget: u64) -> ProctorPolicy {
        ProctorPolicy {
            session_budget_secs: budget,
            ..Default::default()
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_and_violation_in_the_same_tick_submit_once() {
        let grader = Arc::new(CountingGrader::default());
        let signals = Arc::new(DirectiveSignals::new(true));
        let h = start(attempt(), policy(5), signals.clone(), grader.clone());
        assert!(h.lockdown_error().is_none());

        assert!(h.signal(Violation::FocusLost));
        assert!(h.signal(Violation::LockdownLost));
        settle().await;
        assert_eq!(h.state(), ProctorState::Warned(2));

        time::advance(Duration::from_secs(4)).await;
        settle().await;
        // third violation and the final tick land together
        h.signal(Violation::LockdownLost);
        time::advance(Duration::from_secs(1)).await;
        let ev = h.wait_terminal().await.unwrap();
        assert_eq!(ev.reason, TerminationReason::Violations);

        time::advance(Duration::from_secs(10)).await;
        h.navigated().await;
        assert_eq!(grader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.state(), ProctorState::Idle);
        assert!(signals.drain().contains(&Directive::ReleaseLockdown));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_and_times_out() {
        let grader = Arc::new(CountingGrader::default());
        let h = start(
            attempt(),
            policy(3),
            Arc::new(DirectiveSignals::new(true)),
            grader.clone(),
        );
        let remaining = h.remaining_seconds();
        assert_eq!(*remaining.borrow(), 3);
        time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(*remaining.borrow(), 2);

        h.update_code("console.log(1)".into());
        let ev = h.wait_terminal().await.unwrap();
        assert_eq!(ev.reason, TerminationReason::Timeout);
        assert!(ev.verdict.passed);
        let seen = grader.seen.lock().unwrap();
        assert_eq!(seen[0].code, "console.log(1)");
        assert_eq!(seen[0].elapsed_secs, 3);
        assert_eq!(seen[0].budget_secs, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn max_minus_one_violations_only_warn() {
        let grader = Arc::new(CountingGrader::default());
        let h = start(
            attempt(),
            policy(1500),
            Arc::new(DirectiveSignals::new(true)),
            grader.clone(),
        );
        let violations = h.violation_count();
        h.signal(Violation::FocusLost);
        h.signal(Violation::LockdownLost);
        settle().await;
        assert_eq!(*violations.borrow(), 2);
        assert_eq!(h.state(), ProctorState::Warned(2));
        assert!(h.terminal().is_none());
        assert_eq!(grader.calls.load(Ordering::SeqCst), 0);

        h.signal(Violation::FocusLost);
        let ev = h.wait_terminal().await.unwrap();
        assert_eq!(ev.reason, TerminationReason::Violations);
        assert_eq!(*violations.borrow(), 3);
        assert_eq!(grader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clipboard_is_blocked_not_counted_by_default() {
        let grader = Arc::new(CountingGrader::default());
        let signals = Arc::new(DirectiveSignals::new(true));
        let h = start(attempt(), policy(1500), signals.clone(), grader.clone());
        for _ in 0..5 {
            h.signal(Violation::Clipboard);
        }
        settle().await;
        assert_eq!(*h.violation_count().borrow(), 0);
        assert_eq!(h.state(), ProctorState::Active);
        assert!(signals.drain().contains(&Directive::BlockClipboard));

        let counting = start(
            attempt(),
            ProctorPolicy {
                clipboard: ClipboardPolicy::Count,
                ..policy(1500)
            },
            Arc::new(DirectiveSignals::new(true)),
            grader.clone(),
        );
        counting.signal(Violation::Clipboard);
        settle().await;
        assert_eq!(*counting.violation_count().borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_releases_lockdown_without_submitting() {
        let grader = Arc::new(CountingGrader::default());
        let signals = Arc::new(DirectiveSignals::new(true));
        let h = start(attempt(), policy(1500), signals.clone(), grader.clone());
        time::advance(Duration::from_secs(2)).await;
        h.cancel();
        h.navigated().await;
        assert!(h.wait_terminal().await.is_none());
        assert!(!h.submit());
        assert_eq!(grader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            signals.drain(),
            vec![
                Directive::RequestLockdown,
                Directive::BlockClipboard,
                Directive::ReleaseLockdown
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_lockdown_is_reported_but_not_fatal() {
        let grader = Arc::new(CountingGrader::default());
        let h = start(
            attempt(),
            policy(1500),
            Arc::new(DirectiveSignals::new(false)),
            grader.clone(),
        );
        assert!(h.lockdown_error().is_some());
        assert!(!h.lockdown_held());
        assert_eq!(h.state(), ProctorState::Active);
        h.submit();
        let ev = h.wait_terminal().await.unwrap();
        assert_eq!(ev.reason, TerminationReason::Manual);
    }

    #[tokio::test(start_paused = true)]
    async fn late_updates_are_refused_while_grading_winds_down() {
        let grader = Arc::new(CountingGrader::default());
        let h = start(
            attempt(),
            policy(1500),
            Arc::new(DirectiveSignals::new(true)),
            grader.clone(),
        );
        assert!(h.lockdown_held());
        assert!(!h.is_over());

        assert!(h.submit());
        let ev = h.wait_terminal().await.unwrap();
        assert_eq!(ev.reason, TerminationReason::Manual);
        // grace delay still running, the channel is open
        assert_eq!(h.state(), ProctorState::Terminated(TerminationReason::Manual));
        assert!(h.is_over());
        assert!(!h.lockdown_held());
        assert!(!h.update_code("late".into()));
        assert!(!h.signal(Violation::FocusLost));

        time::advance(Duration::from_secs(10)).await;
        h.navigated().await;
        assert_eq!(grader.seen.lock().unwrap()[0].code, "// start");
        assert_eq!(*h.violation_count().borrow(), 0);
    }
}
