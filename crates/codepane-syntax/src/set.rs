//! Syntax definition registry.

use crate::definition::SyntaxDefinition;
use crate::error::SyntaxError;
use crate::syntax::Syntax;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Name of the built-in definition that colours nothing.
pub const PLAIN_TEXT: &str = "Plain Text";

const BUILTIN_DEFINITIONS: &[&str] = &[
    include_str!("../syntaxes/plain_text.yaml"),
    include_str!("../syntaxes/rust.yaml"),
    include_str!("../syntaxes/python.yaml"),
    include_str!("../syntaxes/json.yaml"),
];

#[derive(Debug, Default)]
/// A registry of syntax definitions, addressed by name.
///
/// Definitions are parsed when loaded but compiled lazily on first [`SyntaxSet::get`], so a
/// definition with a broken regex is only reported when someone tries to activate it.
pub struct SyntaxSet {
    definitions: BTreeMap<String, SyntaxDefinition>,
    compiled: HashMap<String, Arc<Syntax>>,
}

impl SyntaxSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set preloaded with the bundled definitions.
    pub fn with_builtins() -> Self {
        let mut set = Self::new();
        for yaml in BUILTIN_DEFINITIONS {
            if let Err(err) = set.load_from_str(yaml) {
                tracing::warn!("failed to load bundled syntax definition: {err}");
            }
        }
        set
    }

    /// Parse a YAML definition and register it. Returns the definition name.
    ///
    /// A definition with the same name replaces the previous one.
    pub fn load_from_str(&mut self, yaml: &str) -> Result<String, SyntaxError> {
        let definition: SyntaxDefinition = serde_yaml::from_str(yaml)?;
        let name = definition.name.clone();
        self.insert(definition);
        Ok(name)
    }

    /// Register an already-parsed definition.
    pub fn insert(&mut self, definition: SyntaxDefinition) {
        self.compiled.remove(&definition.name);
        tracing::debug!(name = %definition.name, "registered syntax definition");
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Returns `true` if a definition named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Registered definition names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Find the definition associated with a file extension (without the leading dot).
    pub fn name_for_extension(&self, extension: &str) -> Option<&str> {
        self.definitions
            .values()
            .find(|d| {
                d.file_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(extension))
            })
            .map(|d| d.name.as_str())
    }

    /// Get (compiling on first use) the definition named `name`.
    pub fn get(&mut self, name: &str) -> Result<Arc<Syntax>, SyntaxError> {
        if let Some(syntax) = self.compiled.get(name) {
            return Ok(syntax.clone());
        }
        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| SyntaxError::UnknownSyntax(name.to_string()))?;
        let compiled = Arc::new(Syntax::compile(definition.clone())?);
        self.compiled.insert(name.to_string(), compiled.clone());
        Ok(compiled)
    }
}
