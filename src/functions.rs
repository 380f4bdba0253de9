//! Functions module: built-in functions and the process-wide registry.
//!
//! Hosts describe their functions as explicit [`FunctionDescriptor`] tables;
//! the registry validates and indexes them under their uppercased names. The
//! compiler resolves identifiers against the registry at compile time, and
//! the evaluator invokes the resolved handles at run time.

use crate::types::{ParamKind, Value};
use crate::FormulonError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

/// The callable behind a registered function. The evaluator always passes
/// exactly as many arguments as the descriptor declared parameters, each
/// already coerced to its declared kind.
pub type Invoker = Arc<dyn Fn(&[Value]) -> f64 + Send + Sync>;

const BUILTIN_PACKAGE: &str = "formulon::builtins";

/// A host-declared function: name, signature, and the callable itself.
#[derive(Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub params: Vec<ParamKind>,
    pub returns: ParamKind,
    pub invoker: Invoker,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamKind>,
        returns: ParamKind,
        invoker: Invoker,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            invoker,
        }
    }
}

/// A validated, registered function, resolved into `Id` instructions at
/// compile time.
#[derive(Clone)]
pub struct FunctionHandle {
    name: String,
    params: Vec<ParamKind>,
    returns_boolean: bool,
    invoker: Invoker,
}

impl FunctionHandle {
    /// Uppercased registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn returns_boolean(&self) -> bool {
        self.returns_boolean
    }

    pub fn invoke(&self, args: &[Value]) -> f64 {
        (self.invoker)(args)
    }
}

impl std::fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionHandle")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns_boolean", &self.returns_boolean)
            .finish()
    }
}

/// Catalog of callable names, shared across every compilation and evaluation.
///
/// Lookups may run concurrently; registration takes the write side. The
/// package set keeps bulk registration idempotent: a package name that has
/// already been scanned is skipped wholesale.
pub struct FunctionRegistry {
    packages: Mutex<HashSet<String>>,
    functions: RwLock<HashMap<String, Arc<FunctionHandle>>>,
}

impl FunctionRegistry {
    /// An empty registry with no built-ins. Most callers want
    /// [`FunctionRegistry::global`] instead.
    pub fn new() -> Self {
        Self {
            packages: Mutex::new(HashSet::new()),
            functions: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry, created on first use and pre-populated
    /// with the built-in function set.
    pub fn global() -> Arc<FunctionRegistry> {
        static GLOBAL: OnceLock<Arc<FunctionRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| {
                let registry = FunctionRegistry::new();
                for descriptor in builtin_descriptors() {
                    registry.install(descriptor);
                }
                registry.mark_package(BUILTIN_PACKAGE);
                Arc::new(registry)
            })
            .clone()
    }

    /// Register every function a package exposes. Idempotent: a package name
    /// that was already registered is a no-op. Each descriptor is validated
    /// first; one bad signature abandons the whole batch. Within a batch,
    /// the first registration for a name wins and later duplicates are
    /// silently ignored.
    pub fn register_package(
        &self,
        package: &str,
        descriptors: impl IntoIterator<Item = FunctionDescriptor>,
    ) -> Result<(), FormulonError> {
        if self.is_package_registered(package) {
            return Ok(());
        }

        let descriptors: Vec<FunctionDescriptor> = descriptors.into_iter().collect();

        for descriptor in &descriptors {
            inspect(descriptor)?;
        }

        for descriptor in descriptors {
            self.install(descriptor);
        }

        self.mark_package(package);

        Ok(())
    }

    pub fn is_package_registered(&self, package: &str) -> bool {
        self.packages
            .lock()
            .map(|set| set.contains(package))
            .unwrap_or(false)
    }

    /// Case-insensitive presence check.
    pub fn is_registered(&self, name: &str) -> bool {
        self.functions
            .read()
            .map(|map| map.contains_key(&name.to_uppercase()))
            .unwrap_or(false)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<Arc<FunctionHandle>> {
        self.functions
            .read()
            .ok()
            .and_then(|map| map.get(&name.to_uppercase()).cloned())
    }

    pub fn len(&self) -> usize {
        self.functions.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn install(&self, descriptor: FunctionDescriptor) {
        let name = descriptor.name.to_uppercase();
        let handle = FunctionHandle {
            name: name.clone(),
            params: descriptor.params,
            returns_boolean: descriptor.returns == ParamKind::Boolean,
            invoker: descriptor.invoker,
        };
        if let Ok(mut map) = self.functions.write() {
            map.entry(name).or_insert_with(|| Arc::new(handle));
        }
    }

    fn mark_package(&self, package: &str) {
        if let Ok(mut set) = self.packages.lock() {
            set.insert(package.to_string());
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Signature validation: return kind must be Number. Parameter kinds are a
/// closed enum, so the parameter restriction holds by construction.
fn inspect(descriptor: &FunctionDescriptor) -> Result<(), FormulonError> {
    if descriptor.returns != ParamKind::Number {
        return Err(FormulonError::Registration {
            name: descriptor.name.clone(),
            reason: format!("return kind must be number, not {}", descriptor.returns),
        });
    }
    Ok(())
}

macro_rules! builtin_functions {
    ($( $name:literal: [$($kind:ident),*], $args:ident => $body:expr ),* $(,)?) => {
        /// Descriptors for the always-available built-in function set.
        pub fn builtin_descriptors() -> Vec<FunctionDescriptor> {
            vec![
                $(
                    FunctionDescriptor::new(
                        $name,
                        vec![$(ParamKind::$kind),*],
                        ParamKind::Number,
                        Arc::new(|$args: &[Value]| -> f64 { $body }),
                    ),
                )*
            ]
        }
    };
}

builtin_functions! {
    "isnan": [Number], args => {
        if args[0].as_number().is_nan() { 1.0 } else { 0.0 }
    },
    "if": [Boolean, Number, Number], args => {
        if args[0].as_boolean() { args[1].as_number() } else { args[2].as_number() }
    },
    "iif": [Boolean, Number, Number], args => {
        if args[0].as_boolean() { args[1].as_number() } else { args[2].as_number() }
    },
    "abs": [Number], args => {
        args[0].as_number().abs()
    },
    "round": [Number, Number], args => {
        // f64::round ties away from zero.
        let scale = 10f64.powi(args[1].as_number() as i32);
        (args[0].as_number() * scale).round() / scale
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, returns: ParamKind) -> FunctionDescriptor {
        FunctionDescriptor::new(name, vec![ParamKind::Number], returns, Arc::new(|_| 0.0))
    }

    #[test]
    fn test_register_and_lookup_case_insensitive() {
        let reg = FunctionRegistry::new();
        reg.register_package("host", vec![descriptor("Growth", ParamKind::Number)])
            .unwrap();
        assert!(reg.is_registered("growth"));
        assert!(reg.is_registered("GROWTH"));
        assert_eq!(reg.get("gRoWtH").unwrap().name(), "GROWTH");
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn test_registration_is_idempotent_per_package() {
        let reg = FunctionRegistry::new();
        reg.register_package("host", vec![descriptor("a", ParamKind::Number)])
            .unwrap();
        let count = reg.len();
        reg.register_package("host", vec![descriptor("b", ParamKind::Number)])
            .unwrap();
        assert_eq!(reg.len(), count);
        assert!(!reg.is_registered("b"));
    }

    #[test]
    fn test_first_registration_wins() {
        let reg = FunctionRegistry::new();
        let first = FunctionDescriptor::new(
            "f",
            vec![],
            ParamKind::Number,
            Arc::new(|_| 1.0),
        );
        let second = FunctionDescriptor::new(
            "F",
            vec![],
            ParamKind::Number,
            Arc::new(|_| 2.0),
        );
        reg.register_package("host", vec![first, second]).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("f").unwrap().invoke(&[]), 1.0);
    }

    #[test]
    fn test_invalid_return_kind_abandons_batch() {
        let reg = FunctionRegistry::new();
        let result = reg.register_package(
            "host",
            vec![
                descriptor("good", ParamKind::Number),
                descriptor("bad", ParamKind::Text),
            ],
        );
        assert!(matches!(result, Err(FormulonError::Registration { .. })));
        assert!(!reg.is_registered("good"));
        // The package was not marked scanned, so a fixed batch can retry.
        reg.register_package("host", vec![descriptor("good", ParamKind::Number)])
            .unwrap();
        assert!(reg.is_registered("good"));
    }

    #[test]
    fn test_global_has_builtins() {
        let reg = FunctionRegistry::global();
        for name in ["ISNAN", "IF", "IIF", "ABS", "ROUND"] {
            assert!(reg.is_registered(name), "missing builtin {name}");
        }
        assert_eq!(reg.get("if").unwrap().params().len(), 3);
    }

    #[test]
    fn test_builtin_round_ties_away_from_zero() {
        let reg = FunctionRegistry::global();
        let round = reg.get("round").unwrap();
        assert_eq!(round.invoke(&[Value::Number(2.345), Value::Number(2.0)]), 2.35);
        assert_eq!(round.invoke(&[Value::Number(-2.5), Value::Number(0.0)]), -3.0);
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let reg = Arc::new(FunctionRegistry::new());
        let mut threads = Vec::new();
        for _ in 0..4 {
            let reg = Arc::clone(&reg);
            threads.push(std::thread::spawn(move || {
                reg.register_package("shared", vec![descriptor("f", ParamKind::Number)])
                    .unwrap();
                for _ in 0..100 {
                    let _ = reg.is_registered("f");
                }
            }));
        }
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(reg.len(), 1);
    }
}
