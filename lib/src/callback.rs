//! Optimizer instrumentation.
//!
//! A [`Callback`] observes an optimization run. Optimizers receive callbacks
//! as an ordered slice of trait objects, `&mut [&mut dyn Callback<B>]`, so
//! callers can mix callback types freely:
//!
//! ```
//! use logitfit::backend::CpuBackend;
//! use logitfit::callback::{Callback, EarlyStopAtMinLoss, MaxIterations, PrintLoss};
//!
//! let mut print = PrintLoss::default();
//! let mut early = EarlyStopAtMinLoss::new(5);
//! let mut cap = MaxIterations::new(100);
//! let callbacks: &mut [&mut dyn Callback<CpuBackend>] = &mut [&mut print, &mut early, &mut cap];
//! assert_eq!(callbacks.len(), 3);
//! ```
//!
//! Every hook has a no-op default. Hooks returning `bool` ask the optimizer to
//! stop when they return `true`; all callbacks are still notified for that
//! event before the optimizer stops.

use crate::backend::{Backend, Tensor1D};

/// Observer of an optimization run.
pub trait Callback<B: Backend> {
    /// Called once before the first iteration with the starting point.
    fn begin_optimization(&mut self, _iterate: &Tensor1D<B>) {}

    /// Called after every objective evaluation.
    fn evaluate(&mut self, _iterate: &Tensor1D<B>, _objective: f64) {}

    /// Called after every gradient evaluation.
    fn gradient(&mut self, _iterate: &Tensor1D<B>, _gradient: &Tensor1D<B>) {}

    /// Called after the optimizer accepts a step. Return `true` to stop.
    fn step_taken(&mut self, _iterate: &Tensor1D<B>, _objective: f64) -> bool {
        false
    }

    /// Called by batch optimizers after each pass over the data. Return
    /// `true` to stop.
    fn end_epoch(&mut self, _iterate: &Tensor1D<B>, _epoch: usize, _objective: f64) -> bool {
        false
    }

    /// Called once with the final iterate and objective.
    fn end_optimization(&mut self, _iterate: &Tensor1D<B>, _objective: f64) {}
}

pub(crate) fn notify_begin<B: Backend>(
    callbacks: &mut [&mut dyn Callback<B>],
    iterate: &Tensor1D<B>,
) {
    for cb in callbacks.iter_mut() {
        cb.begin_optimization(iterate);
    }
}

pub(crate) fn notify_evaluate<B: Backend>(
    callbacks: &mut [&mut dyn Callback<B>],
    iterate: &Tensor1D<B>,
    objective: f64,
) {
    for cb in callbacks.iter_mut() {
        cb.evaluate(iterate, objective);
    }
}

pub(crate) fn notify_gradient<B: Backend>(
    callbacks: &mut [&mut dyn Callback<B>],
    iterate: &Tensor1D<B>,
    gradient: &Tensor1D<B>,
) {
    for cb in callbacks.iter_mut() {
        cb.gradient(iterate, gradient);
    }
}

/// Returns `true` if any callback asked to stop.
pub(crate) fn notify_step<B: Backend>(
    callbacks: &mut [&mut dyn Callback<B>],
    iterate: &Tensor1D<B>,
    objective: f64,
) -> bool {
    let mut stop = false;
    for cb in callbacks.iter_mut() {
        stop |= cb.step_taken(iterate, objective);
    }
    stop
}

/// Returns `true` if any callback asked to stop.
pub(crate) fn notify_epoch<B: Backend>(
    callbacks: &mut [&mut dyn Callback<B>],
    iterate: &Tensor1D<B>,
    epoch: usize,
    objective: f64,
) -> bool {
    let mut stop = false;
    for cb in callbacks.iter_mut() {
        stop |= cb.end_epoch(iterate, epoch, objective);
    }
    stop
}

pub(crate) fn notify_end<B: Backend>(
    callbacks: &mut [&mut dyn Callback<B>],
    iterate: &Tensor1D<B>,
    objective: f64,
) {
    for cb in callbacks.iter_mut() {
        cb.end_optimization(iterate, objective);
    }
}

/// Logs the objective after every accepted step.
#[derive(Debug, Default, Clone)]
pub struct PrintLoss {
    steps: usize,
}

impl<B: Backend> Callback<B> for PrintLoss {
    fn begin_optimization(&mut self, _iterate: &Tensor1D<B>) {
        self.steps = 0;
    }

    fn step_taken(&mut self, _iterate: &Tensor1D<B>, objective: f64) -> bool {
        self.steps += 1;
        tracing::info!(step = self.steps, objective, "step taken");
        false
    }

    fn end_epoch(&mut self, _iterate: &Tensor1D<B>, epoch: usize, objective: f64) -> bool {
        tracing::info!(epoch, objective, "epoch finished");
        false
    }
}

/// Stops when the objective has not improved for `patience` consecutive
/// steps.
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Tensor1D};
/// use logitfit::callback::{Callback, EarlyStopAtMinLoss};
///
/// let x = Tensor1D::<CpuBackend>::zeros(1);
/// let mut early = EarlyStopAtMinLoss::new(2);
/// assert!(!Callback::<CpuBackend>::step_taken(&mut early, &x, 1.0));
/// assert!(!Callback::<CpuBackend>::step_taken(&mut early, &x, 1.5));
/// assert!(Callback::<CpuBackend>::step_taken(&mut early, &x, 1.2));
/// assert_eq!(early.best_objective(), Some(1.0));
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopAtMinLoss {
    patience: usize,
    best_objective: Option<f64>,
    best_step: usize,
    current_step: usize,
}

impl EarlyStopAtMinLoss {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_objective: None,
            best_step: 0,
            current_step: 0,
        }
    }

    /// Lowest objective observed so far.
    pub fn best_objective(&self) -> Option<f64> {
        self.best_objective
    }

    /// Step at which the lowest objective was observed.
    pub fn best_step(&self) -> usize {
        self.best_step
    }

    fn observe(&mut self, objective: f64) -> bool {
        let improved = match self.best_objective {
            None => true,
            Some(best) => objective < best,
        };
        if improved {
            self.best_objective = Some(objective);
            self.best_step = self.current_step;
        }
        self.current_step += 1;

        self.current_step - self.best_step > self.patience
    }
}

impl<B: Backend> Callback<B> for EarlyStopAtMinLoss {
    fn begin_optimization(&mut self, _iterate: &Tensor1D<B>) {
        self.best_objective = None;
        self.best_step = 0;
        self.current_step = 0;
    }

    fn step_taken(&mut self, _iterate: &Tensor1D<B>, objective: f64) -> bool {
        let stop = self.observe(objective);
        if stop {
            tracing::debug!(
                best_step = self.best_step,
                patience = self.patience,
                "objective stopped improving"
            );
        }
        stop
    }
}

/// Remembers the iterate with the lowest objective seen during a run.
#[derive(Debug, Clone)]
pub struct StoreBestCoordinates<B: Backend> {
    best: Option<(f64, Tensor1D<B>)>,
}

impl<B: Backend> Default for StoreBestCoordinates<B> {
    fn default() -> Self {
        Self { best: None }
    }
}

impl<B: Backend> StoreBestCoordinates<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_objective(&self) -> Option<f64> {
        self.best.as_ref().map(|(objective, _)| *objective)
    }

    pub fn best_coordinates(&self) -> Option<&Tensor1D<B>> {
        self.best.as_ref().map(|(_, coordinates)| coordinates)
    }

    fn record(&mut self, iterate: &Tensor1D<B>, objective: f64) {
        let better = self.best.as_ref().map_or(true, |(best, _)| objective < *best);
        if better {
            self.best = Some((objective, iterate.clone()));
        }
    }
}

impl<B: Backend> Callback<B> for StoreBestCoordinates<B> {
    fn begin_optimization(&mut self, _iterate: &Tensor1D<B>) {
        self.best = None;
    }

    fn step_taken(&mut self, iterate: &Tensor1D<B>, objective: f64) -> bool {
        self.record(iterate, objective);
        false
    }

    fn end_optimization(&mut self, iterate: &Tensor1D<B>, objective: f64) {
        self.record(iterate, objective);
    }
}

/// Stops after a fixed number of accepted steps.
#[derive(Debug, Clone)]
pub struct MaxIterations {
    limit: usize,
    steps: usize,
}

impl MaxIterations {
    pub fn new(limit: usize) -> Self {
        Self { limit, steps: 0 }
    }

    /// Steps observed in the current run.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl<B: Backend> Callback<B> for MaxIterations {
    fn begin_optimization(&mut self, _iterate: &Tensor1D<B>) {
        self.steps = 0;
    }

    fn step_taken(&mut self, _iterate: &Tensor1D<B>, _objective: f64) -> bool {
        self.steps += 1;
        self.steps >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    type Cb<'a> = &'a mut dyn Callback<CpuBackend>;

    #[derive(Default)]
    struct Recorder {
        events: Vec<&'static str>,
    }

    impl Callback<CpuBackend> for Recorder {
        fn begin_optimization(&mut self, _iterate: &Tensor1D<CpuBackend>) {
            self.events.push("begin");
        }
        fn step_taken(&mut self, _iterate: &Tensor1D<CpuBackend>, _objective: f64) -> bool {
            self.events.push("step");
            false
        }
        fn end_optimization(&mut self, _iterate: &Tensor1D<CpuBackend>, _objective: f64) {
            self.events.push("end");
        }
    }

    #[test]
    fn test_stop_request_still_notifies_later_callbacks() {
        let x = Tensor1D::<CpuBackend>::zeros(2);
        let mut cap = MaxIterations::new(1);
        let mut recorder = Recorder::default();
        let callbacks: &mut [Cb] = &mut [&mut cap, &mut recorder];

        notify_begin(callbacks, &x);
        assert!(notify_step(callbacks, &x, 1.0));
        notify_end(callbacks, &x, 1.0);

        assert_eq!(recorder.events, vec!["begin", "step", "end"]);
    }

    #[test]
    fn test_no_callbacks_never_stop() {
        let x = Tensor1D::<CpuBackend>::zeros(1);
        let callbacks: &mut [Cb] = &mut [];
        assert!(!notify_step(callbacks, &x, 0.0));
        assert!(!notify_epoch(callbacks, &x, 0, 0.0));
    }

    #[test]
    fn test_max_iterations_counts_steps() {
        let x = Tensor1D::<CpuBackend>::zeros(1);
        let mut cap = MaxIterations::new(3);
        let cb: Cb = &mut cap;
        cb.begin_optimization(&x);
        assert!(!cb.step_taken(&x, 1.0));
        assert!(!cb.step_taken(&x, 1.0));
        assert!(cb.step_taken(&x, 1.0));
        assert_eq!(cap.steps(), 3);
    }

    #[test]
    fn test_early_stop_resets_on_improvement() {
        let mut early = EarlyStopAtMinLoss::new(2);
        assert!(!early.observe(3.0));
        assert!(!early.observe(3.5));
        assert!(!early.observe(2.0));
        assert!(!early.observe(2.5));
        assert!(early.observe(2.1));
        assert_eq!(early.best_objective(), Some(2.0));
        assert_eq!(early.best_step(), 2);
    }

    #[test]
    fn test_early_stop_restarts_with_new_run() {
        let x = Tensor1D::<CpuBackend>::zeros(1);
        let mut early = EarlyStopAtMinLoss::new(1);
        assert!(!early.observe(1.0));
        assert!(early.observe(1.0));

        Callback::<CpuBackend>::begin_optimization(&mut early, &x);
        assert_eq!(early.best_objective(), None);
    }

    #[test]
    fn test_store_best_coordinates() {
        let mut store = StoreBestCoordinates::<CpuBackend>::new();
        store.begin_optimization(&Tensor1D::zeros(2));
        store.step_taken(&Tensor1D::new(vec![1.0, 1.0]), 5.0);
        store.step_taken(&Tensor1D::new(vec![2.0, 2.0]), 3.0);
        store.step_taken(&Tensor1D::new(vec![3.0, 3.0]), 4.0);
        store.end_optimization(&Tensor1D::new(vec![3.0, 3.0]), 4.0);

        assert_eq!(store.best_objective(), Some(3.0));
        assert_eq!(
            store.best_coordinates().map(|c| c.to_vec()),
            Some(vec![2.0, 2.0])
        );
    }
}
