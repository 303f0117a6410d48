//! Invocation engine.
//!
//! An [`Invocation`] walks a runner's points once: it resolves each point's
//! requirements from the context, calls the callable (or enters it, for
//! scopes), and files the result. Scopes stay open until the walk ends and
//! are then exited innermost first.
//!
//! # Failure handling
//!
//! When a step fails the walk stops and the error is handed to each open
//! scope as it exits. A scope returning `true` suppresses the error, so outer
//! scopes exit cleanly and the invocation completes. A scope whose exit fails
//! replaces the error in flight. Whatever error is left once every scope has
//! exited is returned unchanged.

use core::fmt;

use relay_context::context::Context;

use crate::callable::Scope;
use crate::error::RunnerError;
use crate::point::Point;

/// Lifecycle of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Not started yet.
    Idle,
    /// Walking points or unwinding scopes.
    Running,
    /// Finished without an error, or with one a scope suppressed.
    Completed,
    /// Finished with an error.
    Failed,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct OpenScope<'p> {
    name: &'p str,
    scope: Box<dyn Scope>,
}

/// One pass over a sequence of points.
///
/// Each call to [`run`](Self::run) is a separate invocation with its own
/// context; [`state`](Self::state) reports how the latest one ended.
pub struct Invocation<'p> {
    points: &'p [Point],
    state: ExecutionState,
}

impl<'p> Invocation<'p> {
    /// Creates an idle invocation over `points`.
    #[must_use]
    pub fn new(points: &'p [Point]) -> Self {
        Self {
            points,
            state: ExecutionState::Idle,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Runs every point against `ctx`, then exits open scopes.
    ///
    /// # Errors
    ///
    /// Returns the error left after unwinding, if any.
    pub fn run(&mut self, ctx: Context) -> Result<Context, RunnerError> {
        let span = tracing::debug_span!("invocation", points = self.points.len());
        let _guard = span.enter();

        self.transition(ExecutionState::Running);
        let mut ctx = ctx;
        let mut scopes = Vec::new();
        let outcome = self.walk(&mut ctx, &mut scopes);
        let outcome = unwind(scopes, outcome.err());

        match outcome {
            None => {
                self.transition(ExecutionState::Completed);
                Ok(ctx)
            }
            Some(err) => {
                self.transition(ExecutionState::Failed);
                Err(err)
            }
        }
    }

    fn walk(&self, ctx: &mut Context, scopes: &mut Vec<OpenScope<'p>>) -> Result<(), RunnerError> {
        for point in self.points {
            let name = point.name();
            let args = point.requires().resolve(ctx)?;

            let value = if let Some(provider) = point.callable().as_scope() {
                let (value, scope) = provider.enter(args).map_err(RunnerError::Callable)?.into_parts();
                tracing::debug!(scope = name, "entered scope");
                scopes.push(OpenScope { name, scope });
                value
            } else {
                tracing::trace!(callable = name, "calling");
                point.callable().call(args).map_err(RunnerError::Callable)?
            };

            point.returns().file(value, ctx)?;
        }
        Ok(())
    }

    fn transition(&mut self, next: ExecutionState) {
        tracing::debug!(from = %self.state, to = %next, "invocation state");
        self.state = next;
    }
}

/// Exits `scopes` innermost first, threading the error in flight.
fn unwind(scopes: Vec<OpenScope<'_>>, mut error: Option<RunnerError>) -> Option<RunnerError> {
    for OpenScope { name, scope } in scopes.into_iter().rev() {
        match scope.exit(error.as_ref()) {
            Ok(true) => {
                if let Some(suppressed) = error.take() {
                    tracing::warn!(scope = name, error = %suppressed, "scope suppressed error");
                }
            }
            Ok(false) => {
                tracing::debug!(scope = name, "exited scope");
            }
            Err(err) => {
                tracing::debug!(scope = name, error = %err, "scope exit failed");
                error = Some(RunnerError::Callable(err));
            }
        }
    }
    error
}
