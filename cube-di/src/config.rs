//! Configuration store: definitions and parameters

use crate::argument::Argument;
use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Read access to definitions and parameters
///
/// This is the only view the builder has of the configuration. Parameter
/// paths are dot separated and traversal semantics belong to the store.
pub trait ConfigStore: Send + Sync {
    /// Get a definition by id
    fn definition(&self, id: &str) -> Option<&Definition>;

    /// Get a parameter by dotted path
    fn parameter(&self, path: &str) -> Option<&Value>;

    /// Check whether a definition exists
    fn has_definition(&self, id: &str) -> bool {
        self.definition(id).is_some()
    }

    /// Check whether a parameter exists
    fn has_parameter(&self, path: &str) -> bool {
        self.parameter(path).is_some()
    }

    /// Ids of every definition, in no particular order
    fn definition_ids(&self) -> Vec<&str>;
}

/// In-memory configuration store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    definitions: FxHashMap<String, Definition>,
    parameters: Map<String, Value>,
}

impl Config {
    /// Create a store from definitions and top-level parameters
    pub fn new(
        definitions: impl IntoIterator<Item = (String, Definition)>,
        parameters: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut config = Self::default();
        config.set_definitions(definitions).set_parameters(parameters);
        config
    }

    pub fn set_definition(&mut self, id: impl Into<String>, definition: Definition) -> &mut Self {
        self.definitions.insert(id.into(), definition);
        self
    }

    pub fn set_definitions(
        &mut self,
        definitions: impl IntoIterator<Item = (String, Definition)>,
    ) -> &mut Self {
        for (id, definition) in definitions {
            self.set_definition(id, definition);
        }
        self
    }

    pub fn definitions(&self) -> &FxHashMap<String, Definition> {
        &self.definitions
    }

    /// Set a top-level parameter, replacing any previous value under that key
    pub fn set_parameter(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set several top-level parameters
    ///
    /// Nested mappings are replaced wholesale, not merged.
    pub fn set_parameters(&mut self, parameters: impl IntoIterator<Item = (String, Value)>) -> &mut Self {
        for (name, value) in parameters {
            self.set_parameter(name, value);
        }
        self
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Load a configuration document from a JSON string
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        ConfigFile::from_json(json_str).map(Self::from)
    }

    /// Load a configuration document from a TOML string
    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        ConfigFile::from_toml(toml_str).map(Self::from)
    }

    /// Load a configuration document, picking the format from the extension
    pub fn from_path(path: impl AsRef<Path>) -> DiResult<Self> {
        ConfigFile::from_path(path).map(Self::from)
    }
}

impl ConfigStore for Config {
    fn definition(&self, id: &str) -> Option<&Definition> {
        self.definitions.get(id)
    }

    fn parameter(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.parameters, path)
    }

    fn definition_ids(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }
}

/// Walk a dotted path through nested objects and arrays
///
/// Empty segments are skipped. A path with no segments at all, a missing
/// segment, or a `null` value all count as absent.
pub fn lookup_path<'a>(parameters: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.').filter(|segment| !segment.is_empty());
    let mut current = parameters.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Null => None,
        value => Some(value),
    }
}

/// Serialized form of a configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub definitions: FxHashMap<String, Definition>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ConfigFile {
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        let document: Value = serde_json::from_str(json_str)
            .map_err(|e| DiError::Config(format!("Failed to parse JSON: {}", e)))?;
        let file = Self::from_document(document)?;
        debug!(
            definitions = file.definitions.len(),
            parameters = file.parameters.len(),
            "Loaded JSON configuration"
        );
        Ok(file)
    }

    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        let document: Value = toml::from_str(toml_str)
            .map_err(|e| DiError::Config(format!("Failed to parse TOML: {}", e)))?;
        let file = Self::from_document(document)?;
        debug!(
            definitions = file.definitions.len(),
            parameters = file.parameters.len(),
            "Loaded TOML configuration"
        );
        Ok(file)
    }

    /// Build from an already parsed document
    ///
    /// Malformed references are reported as [`DiError::MalformedReference`],
    /// any other shape problem as [`DiError::Config`].
    pub fn from_document(document: Value) -> DiResult<Self> {
        check_references(&document)?;
        serde_json::from_value(document)
            .map_err(|e| DiError::Config(format!("Invalid configuration: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DiError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            Some("toml") => Self::from_toml(&contents),
            other => Err(DiError::Config(format!(
                "Unsupported configuration format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Classify every argument string so a bad sigil surfaces with its own variant
fn check_references(document: &Value) -> DiResult<()> {
    let Some(definitions) = document.get("definitions").and_then(Value::as_object) else {
        return Ok(());
    };

    for definition in definitions.values() {
        let calls = definition
            .get("calls")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|call| call.get("arguments"));
        let lists = std::iter::once(definition.get("args")).chain(calls).flatten();

        for raw in lists.filter_map(Value::as_array).flatten() {
            if raw.is_string() {
                Argument::parse(raw.clone())?;
            }
        }
    }
    Ok(())
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Config {
            definitions: file.definitions,
            parameters: file.parameters,
        }
    }
}

impl From<Config> for ConfigFile {
    fn from(config: Config) -> Self {
        ConfigFile {
            definitions: config.definitions,
            parameters: config.parameters,
        }
    }
}
