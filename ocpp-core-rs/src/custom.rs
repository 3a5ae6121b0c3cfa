//! Custom parser and serializer registries
//!
//! Callers extend parsing and serialization per type without touching the
//! message definitions. Every type looks up its own hook and applies it as the
//! very last step of `from_json` / `to_json_with`, so a hook always sees the
//! fully built value and may replace it.
//!
//! A panicking parser hook is caught and reported as `ParseError::Delegate`.
//! Serializer hooks have no error channel and are not contained: a panic there
//! unwinds out of `to_json_with`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::error::ParseError;

type ParserFn<T> = Arc<dyn Fn(&Value, T) -> Result<T, ParseError> + Send + Sync>;
type SerializerFn<T> = Arc<dyn Fn(&T, Value) -> Value + Send + Sync>;

/// Post-processing hooks applied after the built-in parse of a type
#[derive(Clone, Default)]
pub struct CustomParsers {
    hooks: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl CustomParsers {
    /// Registry without any hooks
    pub fn none() -> Self {
        Self::default()
    }

    /// Register a hook for `T`, replacing any previous one
    pub fn register<T, F>(mut self, hook: F) -> Self
    where
        T: 'static,
        F: Fn(&Value, T) -> Result<T, ParseError> + Send + Sync + 'static,
    {
        let hook: ParserFn<T> = Arc::new(hook);
        self.hooks.insert(TypeId::of::<T>(), Arc::new(hook));
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.hooks.contains_key(&TypeId::of::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the hook registered for `T`, if any.
    ///
    /// A panicking hook is contained here and reported as `ParseError::Delegate`.
    pub fn apply<T: 'static>(&self, json: &Value, parsed: T) -> Result<T, ParseError> {
        let Some(hook) = self
            .hooks
            .get(&TypeId::of::<T>())
            .and_then(|hook| hook.downcast_ref::<ParserFn<T>>())
        else {
            return Ok(parsed);
        };

        trace!("Applying custom parser for {}", type_name::<T>());

        match catch_unwind(AssertUnwindSafe(|| hook(json, parsed))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ParseError::Delegate {
                type_name: type_name::<T>(),
                reason: err.to_string(),
            }),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!("Custom parser for {} panicked: {}", type_name::<T>(), reason);
                Err(ParseError::Delegate {
                    type_name: type_name::<T>(),
                    reason,
                })
            }
        }
    }
}

impl fmt::Debug for CustomParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomParsers")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Post-processing hooks applied to the JSON produced for a type
#[derive(Clone, Default)]
pub struct CustomSerializers {
    hooks: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl CustomSerializers {
    pub fn none() -> Self {
        Self::default()
    }

    /// Register a hook for `T`, replacing any previous one
    pub fn register<T, F>(mut self, hook: F) -> Self
    where
        T: 'static,
        F: Fn(&T, Value) -> Value + Send + Sync + 'static,
    {
        let hook: SerializerFn<T> = Arc::new(hook);
        self.hooks.insert(TypeId::of::<T>(), Arc::new(hook));
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.hooks.contains_key(&TypeId::of::<T>())
    }

    /// Run the hook registered for `T` on the already produced JSON
    pub fn apply<T: 'static>(&self, value: &T, json: Value) -> Value {
        match self
            .hooks
            .get(&TypeId::of::<T>())
            .and_then(|hook| hook.downcast_ref::<SerializerFn<T>>())
        {
            Some(hook) => {
                trace!("Applying custom serializer for {}", type_name::<T>());
                hook(value, json)
            }
            None => json,
        }
    }
}

impl fmt::Debug for CustomSerializers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSerializers")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "custom parser panicked".to_string()
    }
}
