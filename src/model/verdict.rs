use super::user::Role;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseVerdict {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
    pub hidden: bool,
}

/// Outcome of running one code submission against every test case of a problem.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictReport {
    pub problem_id: u32,
    pub results: Vec<CaseVerdict>,
    pub passed: bool,
}

impl VerdictReport {
    /// An empty result list never passes.
    pub fn from_results(problem_id: u32, results: Vec<CaseVerdict>) -> Self {
        let passed = !results.is_empty() && results.iter().all(|r| r.passed);
        Self {
            problem_id,
            results,
            passed,
        }
    }

    pub fn pass_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn view_for(&self, role: Role) -> VerdictView {
        let reveal_hidden = role == Role::Admin;
        VerdictView {
            problem_id: self.problem_id,
            passed: self.passed,
            pass_count: self.pass_count(),
            case_count: self.results.len(),
            results: self
                .results
                .iter()
                .map(|r| {
                    if r.hidden && !reveal_hidden {
                        CaseView {
                            hidden: true,
                            passed: r.passed,
                            ..Default::default()
                        }
                    } else {
                        CaseView {
                            input: Some(r.input.clone()),
                            expected_output: Some(r.expected_output.clone()),
                            actual_output: Some(r.actual_output.clone()),
                            passed: r.passed,
                            hidden: r.hidden,
                        }
                    }
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseView {
    pub input: Option<String>,
    pub expected_output: Option<String>,
    pub actual_output: Option<String>,
    pub passed: bool,
    pub hidden: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictView {
    pub problem_id: u32,
    pub passed: bool,
    pub pass_count: usize,
    pub case_count: usize,
    pub results: Vec<CaseView>,
}
