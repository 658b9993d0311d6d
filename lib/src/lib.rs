//! # logitfit
//!
//! Binary logistic regression with L2 regularization, trained through a
//! pluggable optimizer over pluggable tensor backends.
//!
//! ## Core Design Principles
//!
//! - **Objective/optimizer separation**: the regularized negative
//!   log-likelihood is a standalone [`function::LogisticRegressionFunction`];
//!   any [`optimizer::Optimizer`] that accepts it can train the model.
//! - **Backend agnosticism**: the [`backend::Backend`] trait abstracts storage
//!   and arithmetic, so the same model code runs on plain vectors or `ndarray`.
//! - **Observable training**: optimizers report progress to
//!   [`callback::Callback`]s, which may also stop the run early.
//! - **Backend-free persistence**: models save a plain parameter
//!   representation (feature `serde`).
//!
//! ## Quick Start
//!
//! ```rust
//! use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
//! use logitfit::callback::EarlyStopAtMinLoss;
//! use logitfit::model::{LogisticRegression, DEFAULT_DECISION_BOUNDARY};
//! use logitfit::optimizer::LBFGS;
//!
//! let x = Tensor2D::<CpuBackend>::from_rows(&[
//!     vec![-2.0, 1.0],
//!     vec![-1.0, 0.5],
//!     vec![1.0, -0.5],
//!     vec![2.0, -1.0],
//! ]);
//! let y = Tensor1D::<CpuBackend>::new(vec![0.0, 0.0, 1.0, 1.0]);
//!
//! let mut model = LogisticRegression::new(2, 0.01);
//! let mut lbfgs = LBFGS::<CpuBackend>::new().num_basis(5);
//! let mut early = EarlyStopAtMinLoss::new(10);
//! model.train(&x, &y, &mut lbfgs, &mut [&mut early]).unwrap();
//!
//! let accuracy = model
//!     .compute_accuracy(&x, &y, DEFAULT_DECISION_BOUNDARY)
//!     .unwrap();
//! assert_eq!(accuracy, 100.0);
//! ```
//!
//! ## Module Structure
//!
//! - `backend`: Tensor abstractions and computation primitives (`Tensor1D`, `Tensor2D`)
//! - `function`: Differentiable and separable objectives, including the logistic NLL
//! - `optimizer`: L-BFGS, gradient descent and mini-batch SGD
//! - `callback`: Optimizer instrumentation and early stopping
//! - `model`: The logistic regression classifier and the inference interface
//! - `serialization`: Parameter encoding for persistence
//! - `error`: Crate error type

pub mod backend;

/// Optimizer instrumentation.
pub mod callback;

/// Crate-wide error type.
pub mod error;

/// Objective functions minimized by optimizers.
pub mod function;

/// Trained models and their inference interface.
pub mod model;

/// Optimization algorithms.
pub mod optimizer;

/// Parameter persistence formats.
pub mod serialization;

/// Re-export of core backend types for convenient usage.
pub use backend::{Backend, ScalarOps, Tensor1D, Tensor2D};

#[cfg(feature = "cpu")]
pub use backend::CpuBackend;

pub use error::{LogitError, Result};
pub use model::{InferenceModel, LogisticRegression, DEFAULT_DECISION_BOUNDARY};
