//! Scenario runner implementation
//!
//! Drives one scenario at a time through
//! `Pending -> Running -> (Committing | RollingBack) -> Reported -> Idle`.
//! Assertions are evaluated while the scenario is still running, so
//! producers can still see the cache and store contents. Cleanup runs
//! whatever happened in the body or the assertions.

use serde_json::json;
use tracing::{debug, info, warn};

use super::{Cache, DataStore, Output, Reporter, Scenario, ScenarioReport, SearchIndex};
use crate::assertion::{evaluate, AssertionOutcome, AssertionSpec, Operator, ShapeDefect, Source};
use crate::common::{Error, Result};
use crate::http::{HttpInvoker, RequestSpec};
use crate::path::PathExpression;
use crate::walk::Root;

/// Lifecycle of a single scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Idle,
    Pending,
    Running,
    /// Non-transactional scenario finished; its effects stay.
    Committing,
    RollingBack,
    Reported,
}

/// Runs scenarios against shared collaborators.
///
/// Takes `&mut self` per run, so scenarios sharing one runner (and hence one
/// store) never overlap.
pub struct ScenarioRunner<'c> {
    store: Option<&'c dyn DataStore>,
    cache: Option<&'c dyn Cache>,
    index: Option<&'c dyn SearchIndex>,
    reporter: Option<&'c mut dyn Reporter>,
    state: ScenarioState,
    history: Vec<ScenarioState>,
}

impl Default for ScenarioRunner<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> ScenarioRunner<'c> {
    pub fn new() -> Self {
        Self {
            store: None,
            cache: None,
            index: None,
            reporter: None,
            state: ScenarioState::Idle,
            history: Vec::new(),
        }
    }

    pub fn with_store(mut self, store: &'c dyn DataStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cache(mut self, cache: &'c dyn Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_index(mut self, index: &'c dyn SearchIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_reporter(mut self, reporter: &'c mut dyn Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    /// States visited by the most recent run, in order.
    pub fn history(&self) -> &[ScenarioState] {
        &self.history
    }

    /// Run a scenario whose body issues one HTTP request.
    pub fn run_request(
        &mut self,
        scenario: &Scenario<'_>,
        invoker: &dyn HttpInvoker,
        request: &RequestSpec,
    ) -> Result<ScenarioReport> {
        self.run(scenario, || invoker.invoke(request).map(Output::Response))
    }

    /// Run a scenario.
    ///
    /// Every assertion is evaluated, in declaration order, even after a
    /// failure. A shape defect stops evaluation and is returned once cleanup
    /// is done. A body error skips evaluation and is returned likewise.
    pub fn run<'b>(
        &mut self,
        scenario: &Scenario<'_>,
        body: impl FnOnce() -> Result<Output<'b>>,
    ) -> Result<ScenarioReport> {
        self.history.clear();
        self.transition(ScenarioState::Pending);
        info!("{}: {}", scenario.callsite, scenario.description);

        let scoped = if scenario.transactional {
            match self.open_scope() {
                Ok(scoped) => scoped,
                Err(e) => {
                    self.transition(ScenarioState::Idle);
                    return Err(e);
                }
            }
        } else {
            false
        };

        self.transition(ScenarioState::Running);
        let evaluated = body()
            .map_err(|e| Error::scenario_failed(&scenario.description, e))
            .and_then(|output| evaluate_all(scenario, &output).map_err(Error::from));

        let cleanup = self.cleanup(scoped);

        let outcomes = match evaluated {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.transition(ScenarioState::Idle);
                return Err(e);
            }
        };
        if let Err(e) = cleanup {
            self.transition(ScenarioState::Idle);
            return Err(e);
        }

        self.transition(ScenarioState::Reported);
        let report = ScenarioReport {
            description: scenario.description.clone(),
            callsite: scenario.callsite.clone(),
            outcomes,
        };
        self.report(scenario, &report);
        self.transition(ScenarioState::Idle);

        Ok(report)
    }

    fn open_scope(&mut self) -> Result<bool> {
        match self.store {
            Some(store) => {
                store.begin()?;
                debug!("transactional scope opened");
                Ok(true)
            }
            None => {
                warn!("scenario is transactional but no data store is attached");
                Ok(false)
            }
        }
    }

    /// Roll back, flush, clear. Each step runs even if an earlier one
    /// failed; the first error is returned.
    fn cleanup(&mut self, scoped: bool) -> Result<()> {
        let mut first_error = None;

        if scoped {
            self.transition(ScenarioState::RollingBack);
            if let Some(store) = self.store {
                note(&mut first_error, "rollback", store.rollback());
            }
        } else {
            self.transition(ScenarioState::Committing);
        }
        if let Some(cache) = self.cache {
            note(&mut first_error, "cache flush", cache.flush_all());
        }
        if let Some(index) = self.index {
            note(&mut first_error, "index clear", index.clear_all());
        }

        first_error.map_or(Ok(()), Err)
    }

    fn report(&mut self, scenario: &Scenario<'_>, report: &ScenarioReport) {
        let offset = usize::from(scenario.expected_status.is_none());
        for (position, outcome) in report.outcomes.iter().enumerate() {
            let case = position + offset;
            let label = case_label(case, outcome);
            match &outcome.message {
                None => info!("{}: {} ok", outcome.callsite, label),
                Some(message) => warn!("{}: {} {}", outcome.callsite, label, message),
            }
            if let Some(reporter) = self.reporter.as_deref_mut() {
                reporter.record(&scenario.description, case, outcome);
            }
        }
        if let Some(reporter) = self.reporter.as_deref_mut() {
            reporter.finish(report);
        }
    }

    fn transition(&mut self, next: ScenarioState) {
        debug!(from = ?self.state, to = ?next, "scenario state");
        self.state = next;
        self.history.push(next);
    }
}

fn note(first_error: &mut Option<Error>, step: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("{} failed during cleanup: {}", step, e);
        first_error.get_or_insert(e);
    }
}

/// `[Case<n>. <description>]`, with the status check labelled `[Status]`.
pub(super) fn case_label(case: usize, outcome: &AssertionOutcome) -> String {
    if case == 0 {
        return "[Status]".to_string();
    }
    if outcome.description.is_empty() {
        format!("[Case{}. {}]", case, outcome.subject)
    } else {
        format!("[Case{}. {}]", case, outcome.description)
    }
}

fn evaluate_all(
    scenario: &Scenario<'_>,
    output: &Output<'_>,
) -> std::result::Result<Vec<AssertionOutcome>, EvaluationError> {
    let root = output.root();
    let mut outcomes = Vec::with_capacity(scenario.assertions.len() + 1);

    if let Some(expected) = scenario.expected_status {
        outcomes.push(check_status(scenario, output, expected)?);
    }
    for spec in &scenario.assertions {
        outcomes.push(evaluate(spec, root)?);
    }
    Ok(outcomes)
}

fn check_status(
    scenario: &Scenario<'_>,
    output: &Output<'_>,
    expected: u16,
) -> std::result::Result<AssertionOutcome, EvaluationError> {
    let status = json!({ "status": output.status() });
    let spec = AssertionSpec::new(
        Source::Path(PathExpression::parse("status")?),
        Operator::Equal,
        json!(expected),
        scenario.callsite.clone(),
    )
    .describe("status");
    Ok(evaluate(&spec, Root::Tree(&status))?)
}

/// Defects raised while evaluating a scenario's assertions.
#[derive(Debug, thiserror::Error)]
enum EvaluationError {
    #[error(transparent)]
    Path(#[from] crate::path::InvalidPath),
    #[error(transparent)]
    Shape(#[from] ShapeDefect),
}

impl From<EvaluationError> for Error {
    fn from(e: EvaluationError) -> Self {
        match e {
            EvaluationError::Path(e) => Error::InvalidPath(e),
            EvaluationError::Shape(e) => Error::ShapeDefect(e),
        }
    }
}
