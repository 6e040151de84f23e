//! Data models for the portfolio site.
//!
//! These models match the backend JSON shapes (camelCase keys) for seamless interoperability.

mod contact;
mod profile;
mod project;
mod query;

pub use contact::*;
pub use profile::*;
pub use project::*;
pub use query::*;

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
