//! Serialization of model parameters.
//!
//! Models persist a plain parameter representation rather than backend
//! tensors, so a file written from one backend loads into any other.

use std::error::Error;

/// A parameter representation that can be serialized to and from bytes.
///
/// Implementors hold only plain numerical data (`Vec<f64>`, scalars), never
/// backend-specific tensors or handles.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

/// `bincode` encoding for every `serde` type.
#[cfg(feature = "serde")]
impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}
