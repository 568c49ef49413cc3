use super::traits::Model;
use crate::constants;
use blind_judge_derive::{GetFieldNames, IntoJsonMap};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Passkey a problem of this tier gets when the author leaves it blank.
    pub fn passkey(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn base_score(&self) -> u64 {
        match self {
            Difficulty::Easy => constants::BASE_SCORE_EASY,
            Difficulty::Medium => constants::BASE_SCORE_MEDIUM,
            Difficulty::Hard => constants::BASE_SCORE_HARD,
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    /// Withheld from students, still counted in the verdict.
    #[serde(default)]
    pub hidden: bool,
}

impl TestCase {
    pub fn visible(input: &str, expected_output: &str) -> Self {
        Self {
            input: input.to_string(),
            expected_output: expected_output.to_string(),
            hidden: false,
        }
    }

    pub fn hidden(input: &str, expected_output: &str) -> Self {
        Self {
            hidden: true,
            ..Self::visible(input, expected_output)
        }
    }
}

#[derive(
    Validate, Serialize, Deserialize, Debug, Clone, Default, PartialEq, GetFieldNames, IntoJsonMap,
)]
pub struct Problem {
    pub id: u32,

    #[validate(length(min = 2, message = "Title must be at least 2 characters"))]
    pub title: String,

    pub difficulty: Difficulty,

    #[validate(length(min = 2, message = "Category must be at least 2 characters"))]
    pub category: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(length(min = 5, message = "Example must be at least 5 characters"))]
    pub example: String,

    #[validate(length(min = 1, message = "At least one constraint is required"))]
    pub constraints: Vec<String>,

    #[validate(length(min = 10, message = "Starter code must be at least 10 characters"))]
    pub starter_code: String,

    #[serde(default)]
    pub passkey: String,

    #[validate(
        length(min = 1, message = "At least one test case is required"),
        custom = "validate_test_cases"
    )]
    pub test_cases: Vec<TestCase>,

    #[serde(default = "default_time_limit")]
    pub time_limit_ms: u64,
}

fn default_time_limit() -> u64 {
    constants::DEFAULT_TIME_LIMIT_MS
}

fn validate_test_cases(cases: &[TestCase]) -> Result<(), ValidationError> {
    if cases
        .iter()
        .any(|tc| tc.input.is_empty() || tc.expected_output.is_empty())
    {
        return Err(ValidationError {
            code: Cow::from("test_case"),
            message: Some(Cow::from(
                "All test cases must have input and expected output",
            )),
            params: Default::default(),
        });
    }
    Ok(())
}

impl Problem {
    /// Fills the fields an author may leave blank.
    pub fn normalize(&mut self) {
        if self.passkey.trim().is_empty() {
            self.passkey = self.difficulty.passkey().to_string();
        }
        if self.time_limit_ms == 0 {
            self.time_limit_ms = default_time_limit();
        }
    }

    /// `None` means the session carries no passkey and sees every problem.
    pub fn unlocked_by(&self, passkey: Option<&str>) -> bool {
        match passkey {
            None => true,
            Some(k) => self.passkey.eq_ignore_ascii_case(k.trim()),
        }
    }

    pub fn student_view(&self) -> Problem {
        let mut p = self.clone();
        p.test_cases.retain(|tc| !tc.hidden);
        p
    }
}

impl Model for Problem {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::traits::StructFieldNames;
    use crate::types::links::JsonMap;

    fn draft() -> Problem {
        Problem {
            title: "Sum Pair".into(),
            difficulty: Difficulty::Medium,
            category: "Arrays".into(),
            description: "Return the sum of two integers.".into(),
            example: "1 2 -> 3".into(),
            constraints: vec!["|a|, |b| < 1000".into()],
            starter_code: "function solve(input) {}".into(),
            test_cases: vec![TestCase::visible("1 2", "3"), TestCase::hidden("5 5", "10")],
            ..Default::default()
        }
    }

    #[test]
    fn normalize_defaults_passkey_to_difficulty() {
        let mut p = draft();
        p.normalize();
        assert_eq!(p.passkey, "medium");
        assert_eq!(p.time_limit_ms, constants::DEFAULT_TIME_LIMIT_MS);

        let mut p = draft();
        p.passkey = "round2".into();
        p.normalize();
        assert_eq!(p.passkey, "round2");
    }

    #[test]
    fn validation_rejects_short_fields_and_empty_cases() {
        assert!(draft().validate().is_ok());

        let mut p = draft();
        p.title = "x".into();
        assert!(p.validate().is_err());

        let mut p = draft();
        p.test_cases.push(TestCase::visible("", "1"));
        assert!(p.validate().is_err());

        let mut p = draft();
        p.test_cases.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn student_view_drops_hidden_cases() {
        let p = draft().student_view();
        assert_eq!(p.test_cases.len(), 1);
        assert!(!p.test_cases[0].hidden);
    }

    #[test]
    fn passkey_gate_is_case_insensitive() {
        let mut p = draft();
        p.normalize();
        assert!(p.unlocked_by(None));
        assert!(p.unlocked_by(Some("MEDIUM")));
        assert!(!p.unlocked_by(Some("easy")));
    }

    #[test]
    fn json_map_derive_keeps_field_names() {
        assert!(Problem::field_names().contains(&"starter_code"));
        let mp: JsonMap = draft().into();
        assert_eq!(mp.get("difficulty").and_then(|v| v.as_str()), Some("Medium"));
        assert_eq!(mp.len(), Problem::field_names().len());
    }

    #[test]
    fn difficulty_parses_any_case() {
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Hard.base_score(), 30);
    }
}
