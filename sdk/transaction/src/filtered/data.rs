use std::collections::BTreeMap;
use std::convert::Infallible;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

/// What a filtered transaction discloses about one component group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilteredData<T> {
    /// Nothing about the group is disclosed
    Removed,
    /// Only the number of components is disclosed
    SizeOnly { size: usize },
    /// Some or all components, keyed by their original index
    Audit {
        size: usize,
        values: BTreeMap<usize, T>,
    },
}

impl<T> FilteredData<T> {
    pub fn size(&self) -> Option<usize> {
        match self {
            FilteredData::Removed => None,
            FilteredData::SizeOnly { size } | FilteredData::Audit { size, .. } => Some(*size),
        }
    }

    pub fn values(&self) -> Option<&BTreeMap<usize, T>> {
        match self {
            FilteredData::Audit { values, .. } => Some(values),
            FilteredData::Removed | FilteredData::SizeOnly { .. } => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, FilteredData::Removed)
    }

    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(usize, T) -> Result<U, E>,
    ) -> Result<FilteredData<U>, E> {
        Ok(match self {
            FilteredData::Removed => FilteredData::Removed,
            FilteredData::SizeOnly { size } => FilteredData::SizeOnly { size },
            FilteredData::Audit { size, values } => FilteredData::Audit {
                size,
                values: values
                    .into_iter()
                    .map(|(index, value)| Ok((index, f(index, value)?)))
                    .collect::<Result<_, E>>()?,
            },
        })
    }
}

/// Turns serialized component bytes back into values a predicate can inspect
pub trait ComponentDeserializer {
    type Component;
    type Error: std::error::Error + Send + Sync + 'static;

    fn deserialize(&self, group: usize, bytes: &[u8]) -> Result<Self::Component, Self::Error>;
}

/// Hands components over as raw bytes
#[derive(Debug, Default, Clone, Copy)]
pub struct RawComponents;

impl ComponentDeserializer for RawComponents {
    type Component = Vec<u8>;
    type Error = Infallible;

    fn deserialize(&self, _group: usize, bytes: &[u8]) -> Result<Vec<u8>, Infallible> {
        Ok(bytes.to_vec())
    }
}

/// Decodes every component as JSON into `T`
pub struct JsonComponents<T>(PhantomData<fn() -> T>);

impl<T> JsonComponents<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonComponents<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> ComponentDeserializer for JsonComponents<T> {
    type Component = T;
    type Error = serde_json::Error;

    fn deserialize(&self, _group: usize, bytes: &[u8]) -> Result<T, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
