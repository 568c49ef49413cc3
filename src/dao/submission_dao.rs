use super::store::Store;
use crate::constants;
use crate::model::problem::{Difficulty, Problem};
use crate::model::submission::Submission;
use crate::model::user::User;
use crate::model::verdict::{CaseVerdict, VerdictReport};
use crate::utils::judger::{ExecOutcome, Executor, JudgeSlots, OutputMatch};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attempts carry their own budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// Round credited by `submit`.
    pub round: String,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            round: constants::DEFAULT_ROUND.to_string(),
        }
    }
}

impl ScoringPolicy {
    pub fn from_env() -> Self {
        Self {
            round: constants::CURRENT_ROUND.clone(),
        }
    }
}

/// `base(difficulty)` plus the minutes left in the budget, rounded to the
/// nearest minute. A failed attempt is worth nothing.
pub fn score_delta(difficulty: Difficulty, passed: bool, elapsed_secs: u64, budget_secs: u64) -> u64 {
    if !passed {
        return 0;
    }
    let remaining = budget_secs.saturating_sub(elapsed_secs);
    difficulty.base_score() + (remaining + 30) / 60
}

/// Runs `code` against every test case of `problem`, in order.
pub async fn evaluate(
    executor: &dyn Executor,
    matcher: OutputMatch,
    problem: &Problem,
    lang: &str,
    code: &str,
) -> VerdictReport {
    let time_limit = Duration::from_millis(problem.time_limit_ms.max(1));
    let mut results = Vec::with_capacity(problem.test_cases.len());
    for tc in problem.test_cases.iter() {
        let outcome = executor.run(lang, code, &tc.input, time_limit).await;
        let actual_output = outcome.actual_output();
        let passed = matches!(
            outcome,
            ExecOutcome::Finished { ref stdout } if matcher.matches(&tc.expected_output, stdout)
        );
        results.push(CaseVerdict {
            input: tc.input.clone(),
            expected_output: tc.expected_output.clone(),
            actual_output,
            passed,
            hidden: tc.hidden,
        });
    }
    let report = VerdictReport::from_results(problem.id, results);
    debug!(
        problem = problem.id,
        passed = report.passed,
        pass_count = report.pass_count(),
        "evaluated"
    );
    report
}

/// Credits a graded attempt to `user_id`. The delta is computed before the
/// store is touched and applied in one mutation. Not idempotent: every call
/// adds a history entry and the delta again. `None` when the user is unknown.
pub async fn submit(
    store: &Store,
    user_id: &str,
    problem: &Problem,
    verdict: &VerdictReport,
    elapsed_secs: u64,
    budget_secs: u64,
    policy: &ScoringPolicy,
) -> Option<User> {
    let delta = score_delta(problem.difficulty, verdict.passed, elapsed_secs, budget_secs);
    let record = Submission::from(problem.id, verdict.passed, delta);
    let updated = store
        .mutate(|t| {
            let u = t.users.iter_mut().find(|u| u.id == user_id)?;
            u.score += delta;
            *u.rounds.entry(policy.round.clone()).or_insert(0) += delta;
            if verdict.passed {
                u.problems_solved += 1;
            }
            u.last_submission = Some(record.timestamp.clone());
            u.submissions.push(record);
            Some(u.clone())
        })
        .await;
    match updated.as_ref() {
        Some(u) => info!(
            user = %u.id,
            problem = problem.id,
            passed = verdict.passed,
            delta,
            score = u.score,
            "submission recorded"
        ),
        None => warn!(user = user_id, problem = problem.id, "submit for unknown user ignored"),
    }
    updated
}

/// Evaluation and crediting bundled with the resources they need.
#[derive(Clone)]
pub struct Engine {
    pub store: Arc<Store>,
    pub executor: Arc<dyn Executor>,
    pub slots: JudgeSlots,
    pub matcher: OutputMatch,
    pub scoring: ScoringPolicy,
}

impl Engine {
    pub fn new(store: Arc<Store>, executor: Arc<dyn Executor>) -> Self {
        Self {
            store,
            executor,
            slots: JudgeSlots::new(*constants::MAX_JUDGE_TASKS),
            matcher: OutputMatch::default(),
            scoring: ScoringPolicy::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }

    pub async fn evaluate(&self, problem: &Problem, lang: &str, code: &str) -> VerdictReport {
        let _permit = match self.slots.acquire().await {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("judge slots unavailable: {:#}", e);
                None
            }
        };
        evaluate(self.executor.as_ref(), self.matcher, problem, lang, code).await
    }

    pub async fn submit(
        &self,
        user_id: &str,
        problem: &Problem,
        verdict: &VerdictReport,
        elapsed_secs: u64,
        budget_secs: u64,
    ) -> Option<User> {
        submit(
            &self.store,
            user_id,
            problem,
            verdict,
            elapsed_secs,
            budget_secs,
            &self.scoring,
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dao::user_dao;
    use crate::model::problem::TestCase;
    use futures::future::BoxFuture;

    /// Echoes a fixed answer per input; anything else fails.
    pub struct TableExecutor(pub Vec<(&'static str, ExecOutcome)>);

    impl Executor for TableExecutor {
        fn run<'a>(
            &'a self,
            _lang: &'a str,
            _src: &'a str,
            input: &'a str,
            _time_limit: Duration,
        ) -> BoxFuture<'a, ExecOutcome> {
            let out = self
                .0
                .iter()
                .find(|(i, _)| *i == input)
                .map(|(_, o)| o.clone())
                .unwrap_or(ExecOutcome::Failed {
                    error: "no answer".into(),
                });
            Box::pin(async move { out })
        }
    }

    fn finished(s: &str) -> ExecOutcome {
        ExecOutcome::Finished { stdout: s.into() }
    }

    fn problem(cases: Vec<TestCase>) -> Problem {
        let mut p = Problem {
            id: 1,
            title: "Two Sum".into(),
            difficulty: Difficulty::Easy,
            test_cases: cases,
            ..Default::default()
        };
        p.normalize();
        p
    }

    #[test]
    fn delta_adds_rounded_minutes_left() {
        assert_eq!(score_delta(Difficulty::Easy, true, 300, 1500), 30);
        assert_eq!(score_delta(Difficulty::Hard, true, 1500, 1500), 30);
        assert_eq!(score_delta(Difficulty::Medium, true, 2000, 1500), 20);
        assert_eq!(score_delta(Difficulty::Medium, true, 1470, 1500), 21);
        assert_eq!(score_delta(Difficulty::Medium, true, 1471, 1500), 20);
        assert_eq!(score_delta(Difficulty::Hard, false, 10, 1500), 0);
    }

    #[tokio::test]
    async fn hidden_failure_fails_the_whole_verdict() {
        let p = problem(vec![
            TestCase::visible("a", "1"),
            TestCase::visible("b", "2"),
            TestCase::visible("c", "3"),
            TestCase::hidden("d", "4"),
        ]);
        let exec = TableExecutor(vec![
            ("a", finished("1\n")),
            ("b", finished("2")),
            ("c", finished("3  \n")),
            ("d", finished("5")),
        ]);
        let v = evaluate(&exec, OutputMatch::Normalized, &p, "javascript", "").await;
        assert_eq!(v.results.len(), 4);
        let inputs: Vec<_> = v.results.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["a", "b", "c", "d"]);
        assert_eq!(v.pass_count(), 3);
        assert!(!v.passed);
        assert!(v.results[3].hidden);
    }

    #[tokio::test]
    async fn timeouts_and_errors_fail_their_case() {
        let p = problem(vec![TestCase::visible("a", "1"), TestCase::visible("b", "2")]);
        let exec = TableExecutor(vec![("a", ExecOutcome::TimedOut)]);
        let v = evaluate(&exec, OutputMatch::Normalized, &p, "javascript", "").await;
        assert!(v.results.iter().all(|r| !r.passed));
        assert_eq!(v.results[0].actual_output, "Time Limit Exceeded");
    }

    #[tokio::test]
    async fn zero_cases_never_pass() {
        let p = problem(vec![]);
        let v = evaluate(&TableExecutor(vec![]), OutputMatch::Exact, &p, "python", "").await;
        assert!(!v.passed);
        assert!(v.results.is_empty());
    }

    #[tokio::test]
    async fn submit_twice_counts_twice() {
        let store = Store::in_memory();
        let jane = user_dao::create_student(&store, "Jane", "jane@example.com", "secret1")
            .await
            .unwrap();
        let p = problem(vec![TestCase::visible("a", "1")]);
        let verdict = VerdictReport::from_results(
            p.id,
            vec![CaseVerdict {
                passed: true,
                ..Default::default()
            }],
        );
        let policy = ScoringPolicy::default();

        let once = submit(&store, &jane.id, &p, &verdict, 300, 1500, &policy).await.unwrap();
        assert_eq!(once.score, 30);
        assert_eq!(once.round_score("1"), 30);
        assert_eq!(once.problems_solved, 1);
        assert_eq!(once.submissions.len(), 1);
        assert_eq!(once.last_submission.as_ref(), Some(&once.submissions[0].timestamp));

        let twice = submit(&store, &jane.id, &p, &verdict, 300, 1500, &policy).await.unwrap();
        assert_eq!(twice.score, 60);
        assert_eq!(twice.problems_solved, 2);
        assert_eq!(twice.submissions.len(), 2);
        assert_eq!(twice.submissions[1].score, 30);
        assert_eq!(user_dao::get(&store, &jane.id).await.unwrap(), twice);
    }

    #[tokio::test]
    async fn failed_submit_records_history_without_score() {
        let store = Store::in_memory();
        let jane = user_dao::create_student(&store, "Jane", "jane@example.com", "secret1")
            .await
            .unwrap();
        let p = problem(vec![TestCase::visible("a", "1")]);
        let verdict = VerdictReport::from_results(p.id, vec![]);
        let u = submit(&store, &jane.id, &p, &verdict, 10, 1500, &ScoringPolicy::default())
            .await
            .unwrap();
        assert_eq!(u.score, 0);
        assert_eq!(u.problems_solved, 0);
        assert_eq!(u.submissions.len(), 1);
        assert!(!u.submissions[0].passed);
    }

    #[tokio::test]
    async fn submit_for_unknown_user_is_a_no_op() {
        let store = Store::in_memory();
        let p = problem(vec![TestCase::visible("a", "1")]);
        let verdict = VerdictReport::from_results(p.id, vec![]);
        let before = user_dao::get_all(&store).await;
        assert!(submit(&store, "404", &p, &verdict, 0, 1500, &ScoringPolicy::default())
            .await
            .is_none());
        assert_eq!(user_dao::get_all(&store).await, before);
    }

    #[tokio::test]
    async fn time_bonus_uses_the_attempt_budget() {
        let store = Store::in_memory();
        let jane = user_dao::create_student(&store, "Jane", "jane@example.com", "secret1")
            .await
            .unwrap();
        let engine = Engine::new(Arc::new(store), Arc::new(TableExecutor(vec![])));
        let p = problem(vec![TestCase::visible("a", "1")]);
        let verdict = VerdictReport::from_results(
            p.id,
            vec![CaseVerdict {
                passed: true,
                ..Default::default()
            }],
        );
        // a 60 s session that ran out earns no bonus, whatever the default budget is
        let u = engine.submit(&jane.id, &p, &verdict, 60, 60).await.unwrap();
        assert_eq!(u.score, 10);
        let u = engine.submit(&jane.id, &p, &verdict, 0, 600).await.unwrap();
        assert_eq!(u.score, 30);
    }
}
