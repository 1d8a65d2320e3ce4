//! External schema-validation collaborator.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::BindError;

/// Wrapper around the external `virt-xml-validate` command.
///
/// Validation is delegated entirely to the external tool; failures to run
/// it surface as opaque [`BindError::Validator`] errors and are never
/// retried here.
#[derive(Debug, Clone)]
pub struct Validator {
    command: String,
}

impl Default for Validator {
    fn default() -> Self {
        Validator {
            command: "virt-xml-validate".to_string(),
        }
    }
}

impl Validator {
    /// Use a different validator executable.
    pub fn new<S: Into<String>>(command: S) -> Self {
        Validator {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Validate `file` against the named schema, returning whether the
    /// external tool reported success.
    pub fn validate(&self, file: &Path, schema_name: &str) -> Result<bool, BindError> {
        debug!(
            command = %self.command,
            file = %file.display(),
            schema = schema_name,
            "running schema validator"
        );
        let output = Command::new(&self.command)
            .arg(file)
            .arg(schema_name)
            .output()
            .map_err(|err| BindError::Validator(format!("{}: {}", self.command, err)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(status = ?output.status, stderr = %stderr, "validator reported failure");
        }
        Ok(output.status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_tool_exit_status() {
        let file = Path::new("/dev/null");
        assert!(Validator::new("true").validate(file, "domain").expect("run true"));
        assert!(!Validator::new("false").validate(file, "domain").expect("run false"));
    }

    #[test]
    fn missing_tool_is_an_opaque_error() {
        let err = Validator::new("virtxml-no-such-validator")
            .validate(Path::new("/dev/null"), "domain")
            .unwrap_err();
        assert!(matches!(err, BindError::Validator(_)));
    }
}
