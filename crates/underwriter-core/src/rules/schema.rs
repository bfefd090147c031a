//! JSON Schema validation for rule-set documents.
//!
//! Documents are checked against `schema/ruleset.schema.json` before they are
//! deserialized, so authoring mistakes surface with a path into the document.

use std::sync::OnceLock;

/// Embedded rule-set schema (loaded at compile time).
const RULESET_SCHEMA_JSON: &str = include_str!("../../schema/ruleset.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(RULESET_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate a rule-set document against the schema.
///
/// Returns every violation found, each suffixed with its instance path.
pub fn validate_ruleset_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
