//! Runner construction, addressing and composition.
//!
//! A [`Runner`] is an ordered list of [`Point`]s. Points are appended with
//! [`Runner::add`] or inserted through a [`Handle`]: the handle returned by
//! [`Runner::at`] is anchored on a label, and everything added through it
//! lands right after the labelled point, taking the label along. Successive
//! insertions at the same label therefore keep their order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_runner::runner::Runner;
//!
//! struct Sword;
//!
//! fn forge() -> Sword { Sword }
//! fn polish(_sword: Arc<Sword>) {}
//! fn engrave(_sword: Arc<Sword>) {}
//!
//! let mut runner = Runner::new();
//! runner.add(forge).add_label("forged");
//! runner.add(engrave);
//!
//! runner.at("forged")?.add(polish);
//!
//! let names: Vec<&str> = runner.points().iter().map(|p| p.name()).collect();
//! assert_eq!(names, ["forge", "polish", "engrave"]);
//! # Ok::<(), relay_runner::error::RunnerError>(())
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use relay_context::context::Context;
use relay_context::error::ConfigurationError;
use relay_context::requirement::Requires;
use relay_context::returns::Returns;

use crate::callable::{Callable, IntoCallable};
use crate::declare::Declarations;
use crate::error::RunnerError;
use crate::executor::Invocation;
use crate::point::{BoxedCallable, Point};

/// An ordered, re-invocable pipeline of callables.
///
/// Cloning a runner copies its points: the copy can be changed without
/// affecting the original. Callables themselves are shared.
pub struct Runner {
    points: Vec<Point>,
    labels: HashMap<String, usize>,
    declarations: Arc<Declarations>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Runner {
    fn clone(&self) -> Self {
        self.with_points(self.points.clone())
    }
}

impl Runner {
    /// Creates an empty runner reading the [global](Declarations::global)
    /// declarations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_declarations(Declarations::global())
    }

    /// Creates an empty runner reading the given declarations.
    #[must_use]
    pub fn with_declarations(declarations: Arc<Declarations>) -> Self {
        Self {
            points: Vec::new(),
            labels: HashMap::new(),
            declarations,
        }
    }

    fn with_points(&self, points: Vec<Point>) -> Self {
        let mut runner = Self::with_declarations(Arc::clone(&self.declarations));
        runner.points = points;
        runner.reindex();
        runner
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the runner has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the points in call order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the labels and the position of the point each marks.
    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(label, index)| (label.as_str(), *index))
    }

    /// Returns the position of the point carrying `label`.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// Returns the declarations this runner reads.
    #[must_use]
    pub fn declarations(&self) -> &Arc<Declarations> {
        &self.declarations
    }

    /// Appends a callable and returns a handle on its point.
    pub fn add<M>(&mut self, callable: impl IntoCallable<M>) -> Handle<'_> {
        let point = self.point_for(Arc::new(callable.into_callable()));
        self.points.push(point);
        Handle {
            index: self.points.len() - 1,
            runner: self,
            labels: Vec::new(),
        }
    }

    /// Appends several steps in order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateLabel`] if a runner step brings
    /// a label this runner already has. Nothing is added in that case.
    pub fn extend<I>(&mut self, steps: I) -> Result<&mut Self, RunnerError>
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        let points = self.points_for(steps);
        self.check_labels(&points)?;
        self.points.extend(points);
        self.reindex();
        Ok(self)
    }

    /// Returns a handle anchored on the point carrying `label`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::LabelNotFound`] if no point carries `label`.
    pub fn at(&mut self, label: &str) -> Result<Handle<'_>, RunnerError> {
        let index = self.index_of(label)?;
        Ok(Handle {
            runner: self,
            index,
            labels: vec![label.to_owned()],
        })
    }

    /// Returns a handle on the point at `index`, if there is one.
    pub fn at_index(&mut self, index: usize) -> Option<Handle<'_>> {
        (index < self.points.len()).then(|| Handle {
            runner: self,
            index,
            labels: Vec::new(),
        })
    }

    /// Copies the points from `start` up to, but excluding, `end`.
    ///
    /// An omitted bound means the start or end of the runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::LabelNotFound`] if a given label is absent.
    pub fn clone_range(&self, start: Option<&str>, end: Option<&str>) -> Result<Self, RunnerError> {
        let from = start.map_or(Ok(0), |label| self.index_of(label))?;
        let to = end.map_or(Ok(self.points.len()), |label| self.index_of(label))?;
        let points = self.points.get(from..to).map(<[Point]>::to_vec).unwrap_or_default();
        Ok(self.with_points(points))
    }

    /// Swaps the callable of the point holding `old` for `new`.
    ///
    /// The point keeps its descriptors and labels. Callables are matched by
    /// [identity](crate::callable::CallableId): a function matches wherever
    /// it was added, a value callable matches the points holding it or one
    /// of its clones.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ReplaceTargetNotFound`] if `old` is not in the
    /// runner, and [`RunnerError::AmbiguousReplaceTarget`] if more than one
    /// point holds it. The runner is unchanged in both cases.
    pub fn replace<M1, M2>(
        &mut self,
        old: impl IntoCallable<M1>,
        new: impl IntoCallable<M2>,
    ) -> Result<&mut Self, RunnerError> {
        let old = old.into_callable();
        let target = old.id();
        let mut matches = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, point)| point.id() == target)
            .map(|(index, _)| index);
        let index = matches
            .next()
            .ok_or_else(|| RunnerError::ReplaceTargetNotFound(old.name().to_owned()))?;
        let others = matches.count();
        if others > 0 {
            return Err(RunnerError::AmbiguousReplaceTarget {
                name: old.name().to_owned(),
                count: others + 1,
            });
        }
        self.points[index].callable = Arc::new(new.into_callable());
        Ok(self)
    }

    /// Returns a new runner calling this runner's points, then `other`'s.
    ///
    /// Neither runner is changed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateLabel`] if both runners carry
    /// the same label.
    pub fn concat(&self, other: &Runner) -> Result<Self, RunnerError> {
        let mut combined = self.clone();
        combined.check_labels(&other.points)?;
        combined.points.extend(other.points.iter().cloned());
        combined.reindex();
        Ok(combined)
    }

    /// Invokes the runner with a fresh context.
    ///
    /// Returns the context as it stood when the invocation finished.
    ///
    /// # Errors
    ///
    /// Returns the first failure that no open scope suppressed.
    pub fn run(&self) -> Result<Context, RunnerError> {
        self.run_with(Context::new())
    }

    /// Invokes the runner with a context seeded with resources.
    ///
    /// # Errors
    ///
    /// Returns the first failure that no open scope suppressed.
    pub fn run_with(&self, ctx: Context) -> Result<Context, RunnerError> {
        Invocation::new(&self.points).run(ctx)
    }

    fn index_of(&self, label: &str) -> Result<usize, RunnerError> {
        self.position(label)
            .ok_or_else(|| RunnerError::LabelNotFound(label.to_owned()))
    }

    fn point_for(&self, callable: BoxedCallable) -> Point {
        let (requires, returns) = self.declarations.effective(callable.as_ref());
        Point::new(callable, requires, returns)
    }

    fn points_for<I>(&self, steps: I) -> Vec<Point>
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        let mut points = Vec::new();
        for step in steps {
            match step.into() {
                Step::Callable(callable) => points.push(self.point_for(callable)),
                Step::Points(copied) => points.extend(copied),
            }
        }
        points
    }

    /// Fails if `incoming` carries a label that is already taken.
    fn check_labels(&self, incoming: &[Point]) -> Result<(), ConfigurationError> {
        let mut seen: HashSet<&str> = self.labels.keys().map(String::as_str).collect();
        for label in incoming.iter().flat_map(Point::labels) {
            if !seen.insert(label) {
                return Err(ConfigurationError::DuplicateLabel(label.to_owned()));
            }
        }
        Ok(())
    }

    /// Attaches `label` to the point at `index`, taking it from any other.
    fn move_label(&mut self, label: &str, index: usize) {
        if let Some(previous) = self.labels.get(label).copied() {
            self.points[previous].labels.remove(label);
        }
        self.points[index].labels.insert(label.to_owned());
        self.labels.insert(label.to_owned(), index);
    }

    fn reindex(&mut self) {
        self.labels.clear();
        for (index, point) in self.points.iter().enumerate() {
            for label in &point.labels {
                self.labels.insert(label.clone(), index);
            }
        }
    }
}

/// Renders one line per point between `<Runner>` tags.
impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<Runner>")?;
        for point in &self.points {
            writeln!(f, "    {point}")?;
        }
        write!(f, "</Runner>")
    }
}

impl core::ops::Add<&Runner> for &Runner {
    type Output = Result<Runner, RunnerError>;

    fn add(self, rhs: &Runner) -> Self::Output {
        self.concat(rhs)
    }
}

impl core::ops::Add<&Runner> for Runner {
    type Output = Result<Runner, RunnerError>;

    fn add(self, rhs: &Runner) -> Self::Output {
        self.concat(rhs)
    }
}

impl core::ops::Add for Runner {
    type Output = Result<Runner, RunnerError>;

    fn add(self, rhs: Runner) -> Self::Output {
        self.concat(&rhs)
    }
}

/// One item passed to `extend`.
///
/// A callable becomes one point. A runner contributes copies of all its
/// points, labels included, rather than being called as a whole.
pub enum Step {
    /// A callable whose descriptors are looked up when it is added.
    Callable(BoxedCallable),
    /// Points copied from another runner.
    Points(Vec<Point>),
}

/// Wraps a callable as a [`Step`].
pub fn step<M>(callable: impl IntoCallable<M>) -> Step {
    Step::Callable(Arc::new(callable.into_callable()))
}

impl From<&Runner> for Step {
    fn from(runner: &Runner) -> Self {
        Step::Points(runner.points.clone())
    }
}

impl From<Runner> for Step {
    fn from(runner: Runner) -> Self {
        Step::Points(runner.points)
    }
}

/// Insertion handle bound to one point of a runner.
///
/// Callables added through a handle go right after its current point, which
/// then becomes the newly added one. Labels the handle carries (the one it
/// was anchored on, and any given with [`add_label`](Self::add_label)) move
/// along to each new point.
pub struct Handle<'r> {
    runner: &'r mut Runner,
    index: usize,
    labels: Vec<String>,
}

impl Handle<'_> {
    /// Returns the position of the current point.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the current point.
    #[must_use]
    pub fn point(&self) -> &Point {
        &self.runner.points[self.index]
    }

    /// Sets the requirements of the current point.
    ///
    /// Overrides anything declared or inferred for the callable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateParameter`] if a keyword name
    /// appears twice.
    pub fn requires(&mut self, requires: Requires) -> Result<&mut Self, RunnerError> {
        requires.validate()?;
        self.runner.points[self.index].requires = requires;
        Ok(self)
    }

    /// Sets the return descriptor of the current point.
    ///
    /// Overrides anything declared or inferred for the callable.
    pub fn returns(&mut self, returns: impl Into<Returns>) -> &mut Self {
        self.runner.points[self.index].returns = returns.into();
        self
    }

    /// Labels the current point, moving the label if another point has it.
    pub fn add_label(&mut self, label: impl Into<String>) -> &mut Self {
        let label = label.into();
        self.runner.move_label(&label, self.index);
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
        self
    }

    /// Inserts a callable right after the current point.
    pub fn add<M>(&mut self, callable: impl IntoCallable<M>) -> &mut Self {
        let point = self.runner.point_for(Arc::new(callable.into_callable()));
        self.insert(vec![point]);
        self
    }

    /// Inserts several steps in order right after the current point.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateLabel`] if a runner step brings
    /// a label the runner already has. Nothing is added in that case.
    pub fn extend<I>(&mut self, steps: I) -> Result<&mut Self, RunnerError>
    where
        I: IntoIterator,
        I::Item: Into<Step>,
    {
        let points = self.runner.points_for(steps);
        self.runner.check_labels(&points)?;
        self.insert(points);
        Ok(self)
    }

    fn insert(&mut self, points: Vec<Point>) {
        let count = points.len();
        if count == 0 {
            return;
        }
        let at = self.index + 1;
        self.runner.points.splice(at..at, points);
        self.runner.reindex();
        self.index = at + count - 1;
        for label in &self.labels {
            self.runner.move_label(label, self.index);
        }
    }
}
