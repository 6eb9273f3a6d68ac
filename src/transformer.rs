//! Transformer registry for bypassing the default extraction pipeline.
//!
//! A transformer takes over the extraction of a whole item for the
//! (type, context) pairs it supports. Transformers are queried in
//! registration order and the first match wins; its output is returned as-is.

use std::fmt;

use crate::contexts::Contexts;
use crate::schema::{Described, Item, TypeKey};
use crate::value::OutputMap;

/// Error type for transformer execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    TypeMismatch {
        expected: TypeKey,
        actual: TypeKey,
    },
    ExecutionError(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            TransformError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}

/// A full replacement of the default pipeline for some items.
pub trait Transformer: Send + Sync {
    /// Whether this transformer handles items of `type_key` under `contexts`.
    fn supports(&self, type_key: TypeKey, contexts: &Contexts) -> bool;

    /// Produce the output mapping for `item`.
    fn process(&self, item: &dyn Item) -> Result<OutputMap, TransformError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closure-based implementation of [`Transformer`]
///
/// # Example
///
/// ```
/// use objectable::{FieldValue, FnTransformer, OutputMap, TypeKey};
///
/// let redact = FnTransformer::new(
///     "redact-secrets",
///     |type_key: TypeKey, _contexts: &objectable::Contexts| type_key.as_str() == "Secret",
///     |_item: &dyn objectable::Item| {
///         let mut out = OutputMap::new();
///         out.insert("value".to_string(), FieldValue::from("***"));
///         Ok(out)
///     },
/// );
/// ```
pub struct FnTransformer<S, P> {
    name: String,
    supports: S,
    process: P,
}

impl<S, P> FnTransformer<S, P>
where
    S: Fn(TypeKey, &Contexts) -> bool + Send + Sync,
    P: Fn(&dyn Item) -> Result<OutputMap, TransformError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, supports: S, process: P) -> Self {
        Self {
            name: name.into(),
            supports,
            process,
        }
    }
}

impl<S, P> Transformer for FnTransformer<S, P>
where
    S: Fn(TypeKey, &Contexts) -> bool + Send + Sync,
    P: Fn(&dyn Item) -> Result<OutputMap, TransformError> + Send + Sync,
{
    fn supports(&self, type_key: TypeKey, contexts: &Contexts) -> bool {
        (self.supports)(type_key, contexts)
    }

    fn process(&self, item: &dyn Item) -> Result<OutputMap, TransformError> {
        (self.process)(item)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Transformer bound to one concrete [`Described`] type.
///
/// Supports every context unless narrowed with [`TypedTransformer::in_contexts`].
pub struct TypedTransformer<T> {
    contexts: Option<Contexts>,
    process: fn(&T) -> OutputMap,
}

impl<T: Described> TypedTransformer<T> {
    pub fn new(process: fn(&T) -> OutputMap) -> Self {
        Self {
            contexts: None,
            process,
        }
    }

    pub fn in_contexts(mut self, contexts: impl Into<Contexts>) -> Self {
        self.contexts = Some(contexts.into());
        self
    }
}

impl<T: Described> Transformer for TypedTransformer<T> {
    fn supports(&self, type_key: TypeKey, contexts: &Contexts) -> bool {
        if type_key != T::schema().type_key() {
            return false;
        }
        match &self.contexts {
            Some(allowed) => allowed.overlaps(contexts),
            None => true,
        }
    }

    fn process(&self, item: &dyn Item) -> Result<OutputMap, TransformError> {
        let typed = item
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| TransformError::TypeMismatch {
                expected: T::schema().type_key(),
                actual: item.type_key(),
            })?;
        Ok((self.process)(typed))
    }

    fn name(&self) -> &str {
        T::schema().type_key().as_str()
    }
}

/// Ordered list of transformers, queried linearly.
pub struct TransformerRegistry {
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformerRegistry {
    /// Create a new empty transformer registry
    pub fn new() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    /// Register a transformer after all previously registered ones.
    pub fn register(&mut self, transformer: Box<dyn Transformer>) {
        tracing::debug!("Registered transformer '{}'", transformer.name());
        self.transformers.push(transformer);
    }

    /// Builder-style [`TransformerRegistry::register`].
    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.register(Box::new(transformer));
        self
    }

    /// First transformer, in registration order, that supports the pair.
    pub fn find(&self, type_key: TypeKey, contexts: &Contexts) -> Option<&dyn Transformer> {
        self.transformers
            .iter()
            .find(|t| t.supports(type_key, contexts))
            .map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Transformer names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("transformers", &self.names())
            .finish()
    }
}
