use std::path::Path;
use thiserror::Error;

/// Errors produced while configuring a differ or capturing snapshots
///
/// Every variant carries owned context strings so an error can be cloned and
/// handed back again by a differ that latched it during `update`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DifferError {
	#[error("Configuration error: {parameter} - {reason}")]
	ConfigurationError { parameter: String, reason: String },

	#[error("Filesystem error: {operation} failed on {path} - {cause}")]
	FilesystemError {
		operation: String,
		path: String,
		cause: String,
		error_code: Option<i32>,
	},

	#[error("{context}: {source}")]
	Context {
		context: String,
		#[source]
		source: Box<DifferError>,
	},
}

impl DifferError {
	/// The error a differ reports when it is built without a root
	pub fn missing_root() -> Self {
		DifferError::ConfigurationError {
			parameter: "root".to_string(),
			reason: "Root option is required".to_string(),
		}
	}

	/// Create a configuration error
	pub fn configuration_error(parameter: &str, reason: &str) -> Self {
		DifferError::ConfigurationError {
			parameter: parameter.to_string(),
			reason: reason.to_string(),
		}
	}

	/// Create a filesystem error from the stage that failed and the I/O error behind it
	pub fn filesystem(operation: &str, path: &Path, err: &std::io::Error) -> Self {
		DifferError::FilesystemError {
			operation: operation.to_string(),
			path: path.display().to_string(),
			cause: err.to_string(),
			error_code: err.raw_os_error(),
		}
	}

	/// Wrap this error with a description of what the caller was doing
	pub fn context(self, context: &str) -> Self {
		DifferError::Context {
			context: context.to_string(),
			source: Box::new(self),
		}
	}

	/// The innermost error, skipping any context wrappers
	pub fn root_cause(&self) -> &DifferError {
		match self {
			DifferError::Context { source, .. } => source.root_cause(),
			other => other,
		}
	}

	/// Check if this error indicates that the operation should be retried
	///
	/// Filesystem failures are usually transient (a file vanished mid-walk);
	/// configuration errors never resolve themselves.
	pub fn is_retryable(&self) -> bool {
		matches!(self.root_cause(), DifferError::FilesystemError { .. })
	}

	/// Check if this error is related to configuration issues
	pub fn is_configuration_error(&self) -> bool {
		matches!(self.root_cause(), DifferError::ConfigurationError { .. })
	}

	/// Check if this error came from the filesystem
	pub fn is_filesystem_error(&self) -> bool {
		matches!(self.root_cause(), DifferError::FilesystemError { .. })
	}

	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self.root_cause() {
			DifferError::ConfigurationError { .. } => "configuration",
			DifferError::FilesystemError { .. } => "filesystem",
			DifferError::Context { .. } => "context",
		}
	}
}

pub type Result<T> = std::result::Result<T, DifferError>;
