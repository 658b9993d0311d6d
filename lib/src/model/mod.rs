//! # Models
//!
//! [`LogisticRegression`] is the binary classifier trained through the
//! [`Optimizer`](crate::optimizer::Optimizer) contract.
//!
//! [`InferenceModel`] is the prediction and persistence surface shared by
//! models: a model converts to and from a plain parameter representation
//! (`ParamsRepr`) that carries no backend resources, and with the `serde`
//! feature that representation is written to and read from files.

use crate::backend::Backend;
use crate::error::Result;

pub mod logistic;

pub use logistic::{LogisticRegression, SerializableLogisticParams, DEFAULT_DECISION_BOUNDARY};

#[cfg(feature = "serde")]
use crate::serialization::SerializableParams;

/// Prediction and persistence interface of a model.
pub trait InferenceModel<B: Backend>: Sized {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;

    /// Backend-free parameter representation.
    type ParamsRepr;

    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle>;

    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch>;

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self>;

    /// Writes the parameter representation to `path`.
    #[cfg(feature = "serde")]
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()>
    where
        Self::ParamsRepr: SerializableParams<Error = bincode::Error>,
    {
        let bytes = self.extract_params().to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Restores a model written by [`save_to_file`](Self::save_to_file).
    #[cfg(feature = "serde")]
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self::ParamsRepr: SerializableParams<Error = bincode::Error>,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::ParamsRepr::from_bytes(&bytes)?;
        Self::from_params(params)
    }
}
