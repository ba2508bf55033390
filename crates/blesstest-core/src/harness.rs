//! Harness registry: maps the `harness` names of resolved cases to callables.

use crate::types::Params;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by harness lookup and invocation.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("unknown harness reference '{0}'")]
    UnknownHarnessReference(String),
    #[error("invalid input for harness '{harness}': {source}")]
    InvalidInput {
        harness: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("harness '{harness}' failed: {message}")]
    Failed { harness: String, message: String },
}

/// What a harness produced.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessOutput {
    Value(Value),
    /// The output could not be serialized.
    InvalidOutput(String),
    /// The harness returned an error or panicked.
    Exception(String),
}

/// One call of a harness.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// The params as the harness understood them, re-serialized.
    pub input: Value,
    pub output: HarnessOutput,
}

/// A callable with a declared input and output shape.
pub trait Harness: Send + Sync {
    /// Call the harness with a case's params.
    ///
    /// # Errors
    /// Returns `HarnessError::InvalidInput` when the params do not fit the
    /// harness input type.
    fn invoke(&self, params: &Params) -> Result<Invocation, HarnessError>;
}

/// Resolves harness names.
pub trait HarnessRegistry: Send + Sync {
    /// Look up a harness by name.
    ///
    /// # Errors
    /// Returns `HarnessError::UnknownHarnessReference` when nothing is
    /// registered under `name`.
    fn resolve(&self, name: &str) -> Result<Arc<dyn Harness>, HarnessError>;
}

/// A harness backed by a typed function.
pub struct FnHarness<I, O, E, F> {
    name: String,
    func: F,
    _types: PhantomData<fn(I) -> Result<O, E>>,
}

impl<I, O, E, F> FnHarness<I, O, E, F>
where
    F: Fn(I) -> Result<O, E>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _types: PhantomData,
        }
    }
}

impl<I, O, E, F> Harness for FnHarness<I, O, E, F>
where
    I: DeserializeOwned + Serialize,
    O: Serialize,
    E: fmt::Display,
    F: Fn(I) -> Result<O, E> + Send + Sync,
{
    fn invoke(&self, params: &Params) -> Result<Invocation, HarnessError> {
        let invalid_input = |source| HarnessError::InvalidInput {
            harness: self.name.clone(),
            source,
        };
        let input: I =
            serde_json::from_value(Value::Object(params.clone())).map_err(invalid_input)?;
        let normalized = serde_json::to_value(&input).map_err(invalid_input)?;

        let output = match (self.func)(input) {
            Ok(output) => match serde_json::to_value(&output) {
                Ok(value) => HarnessOutput::Value(value),
                Err(e) => HarnessOutput::InvalidOutput(e.to_string()),
            },
            Err(e) => HarnessOutput::Exception(e.to_string()),
        };

        Ok(Invocation {
            input: normalized,
            output,
        })
    }
}

/// An in-memory harness registry.
#[derive(Clone, Default)]
pub struct HarnessSet {
    harnesses: BTreeMap<String, Arc<dyn Harness>>,
}

impl HarnessSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed function under `name`, replacing any previous one.
    pub fn register<I, O, E, F>(&mut self, name: &str, func: F) -> &mut Self
    where
        I: DeserializeOwned + Serialize + 'static,
        O: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(FnHarness::new(name, func)))
    }

    /// Register an already-built harness.
    pub fn insert(&mut self, name: &str, harness: Arc<dyn Harness>) -> &mut Self {
        self.harnesses.insert(name.to_string(), harness);
        self
    }
}

impl fmt::Debug for HarnessSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessSet")
            .field("harnesses", &self.harnesses.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HarnessRegistry for HarnessSet {
    fn resolve(&self, name: &str) -> Result<Arc<dyn Harness>, HarnessError> {
        self.harnesses
            .get(name)
            .cloned()
            .ok_or_else(|| HarnessError::UnknownHarnessReference(name.to_string()))
    }
}
