//! Builder patterns for constructing test data.
//!
//! Builders provide a fluent API for creating suites, test cases and
//! finished runs with only the fields a test cares about.

use benchmaker_domain::{
    Difficulty, ModelParameters, ResultStatus, RunResult, ScoringMethod, ScoringResult, TestCase,
    TestCaseMetadata, TestSuite,
};

/// Builder for creating test cases
pub struct TestCaseBuilder {
    id: String,
    prompt: String,
    expected: Option<String>,
    method: ScoringMethod,
    weight: f64,
    metadata: TestCaseMetadata,
}

impl TestCaseBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: "What is 6 times 7?".to_string(),
            expected: None,
            method: ScoringMethod::ExactMatch,
            weight: 1.0,
            metadata: TestCaseMetadata::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_method(mut self, method: ScoringMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = Some(category.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.metadata.difficulty = Some(difficulty);
        self
    }

    pub fn exact(self, expected: impl Into<String>) -> Self {
        self.with_method(ScoringMethod::ExactMatch).with_expected(expected)
    }

    pub fn numeric(self, expected: impl Into<String>) -> Self {
        self.with_method(ScoringMethod::NumericTolerance).with_expected(expected)
    }

    pub fn judged(self) -> Self {
        self.with_method(ScoringMethod::LlmJudge)
    }

    pub fn build(self) -> TestCase {
        let mut case = TestCase::new(self.id, self.prompt, self.method).with_weight(self.weight);
        case.expected_output = self.expected;
        case.metadata = self.metadata;
        case
    }
}

/// Builder for creating test suites
pub struct TestSuiteBuilder {
    id: String,
    name: String,
    system_prompt: String,
    judge_system_prompt: Option<String>,
    cases: Vec<TestCase>,
}

impl TestSuiteBuilder {
    pub fn new() -> Self {
        Self {
            id: "suite-1".to_string(),
            name: "Test Suite".to_string(),
            system_prompt: String::new(),
            judge_system_prompt: None,
            cases: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_judge_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.judge_system_prompt = Some(prompt.into());
        self
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Add `count` exact-match cases `tc-1..=tc-count` expecting "42"
    pub fn with_exact_cases(mut self, count: usize) -> Self {
        let start = self.cases.len();
        for i in 1..=count {
            self.cases.push(TestCaseBuilder::new(format!("tc-{}", start + i)).exact("42").build());
        }
        self
    }

    pub fn build(self) -> TestSuite {
        let mut suite = TestSuite::new(self.id, self.name);
        suite.system_prompt = self.system_prompt;
        suite.judge_system_prompt = self.judge_system_prompt;
        suite.test_cases = self.cases;
        suite
    }
}

impl Default for TestSuiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for sealed runs with preset scores, for statistics tests
pub struct RunResultBuilder {
    suite: TestSuite,
    models: Vec<String>,
    scores: Vec<(String, Vec<Option<f64>>)>,
    sealed: bool,
    cancelled: bool,
}

impl RunResultBuilder {
    pub fn new(suite: &TestSuite) -> Self {
        Self {
            suite: suite.clone(),
            models: Vec::new(),
            scores: Vec::new(),
            sealed: true,
            cancelled: false,
        }
    }

    /// Scores for one model, one per test case in suite order
    pub fn with_scores(self, model: impl Into<String>, scores: &[f64]) -> Self {
        let scores = scores.iter().copied().map(Some).collect();
        self.with_partial_scores(model, scores)
    }

    /// Like [`with_scores`](Self::with_scores), `None` leaves a result unscored
    pub fn with_partial_scores(mut self, model: impl Into<String>, scores: Vec<Option<f64>>) -> Self {
        let model = model.into();
        self.models.push(model.clone());
        self.scores.push((model, scores));
        self
    }

    /// Leave the run in `running` state
    pub fn unsealed(mut self) -> Self {
        self.sealed = false;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn build(self) -> RunResult {
        let mut run = RunResult::new(&self.suite, self.models, ModelParameters::default(), None);

        for (model, scores) in &self.scores {
            for (case, score) in self.suite.test_cases.iter().zip(scores) {
                if let Some(result) = run.result_mut(&case.id, model) {
                    result.status = ResultStatus::Completed;
                    result.score = score.map(ScoringResult::new);
                }
            }
        }

        if self.sealed {
            run.seal(self.cancelled);
        }
        run
    }
}
