//! Print a parameter value

use anyhow::{Context, Result};
use cube_di::{ConfigStore, DiError};
use serde_json::Value;
use std::path::Path;

pub fn run(file: &Path, path: &str) -> Result<()> {
    let value = lookup(file, path)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn lookup(file: &Path, path: &str) -> Result<Value> {
    let config = super::load(file)?;
    config
        .parameter(path)
        .cloned()
        .ok_or_else(|| DiError::ParameterNotFound {
            path: path.to_string(),
        })
        .with_context(|| format!("in {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let file = fixtures::file(fixtures::MAILER);
        assert_eq!(lookup(file.path(), "smtp.port").unwrap(), json!(25));
        assert_eq!(
            lookup(file.path(), "smtp").unwrap(),
            json!({ "host": "localhost", "port": 25 })
        );
    }

    #[test]
    fn test_missing_parameter() {
        let file = fixtures::file(fixtures::MAILER);
        let err = lookup(file.path(), "smtp.user").unwrap_err();
        let cause = err.downcast_ref::<DiError>().unwrap();
        assert!(cause.is_not_found());
    }
}
