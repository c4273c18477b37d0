//! Render pipeline settings
//!
//! Settings are plain serde structures so they can be embedded in a project's
//! TOML configuration:
//!
//! ```toml
//! default_charset = "utf-8"
//! default_head_format = "html"
//! vary_on_accept = true
//! protected_assigns = ["current_user"]
//!
//! [[formats]]
//! symbol = "ndjson"
//! media_type = "application/x-ndjson"
//! extensions = ["ndjson"]
//! ```

use reinhardt_mime::{FormatRegistry, MimeError, MimeType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("failed to parse render settings: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("invalid format definition `{symbol}`: {source}")]
	InvalidFormat {
		symbol: String,
		#[source]
		source: MimeError,
	},
}

/// A custom response format declared in configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatDefinition {
	pub symbol: String,
	pub media_type: String,
	#[serde(default)]
	pub synonyms: Vec<String>,
	#[serde(default)]
	pub extensions: Vec<String>,
}

impl FormatDefinition {
	pub fn to_mime_type(&self) -> Result<MimeType, SettingsError> {
		let invalid = |source| SettingsError::InvalidFormat {
			symbol: self.symbol.clone(),
			source,
		};

		Ok(MimeType::new(&self.symbol, &self.media_type)
			.and_then(|mime| mime.with_synonyms(self.synonyms.iter().cloned()))
			.map_err(invalid)?
			.with_extensions(self.extensions.iter().cloned()))
	}
}

/// Settings for the render pipeline
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderSettings {
	/// Charset appended to `Content-Type` unless a response clears it
	pub default_charset: String,

	/// Format used by `head` when nothing was negotiated
	pub default_head_format: String,

	/// Emit `Vary: Accept` when the response format came from the Accept header
	pub vary_on_accept: bool,

	/// Assign names hidden from views in addition to the framework-reserved ones
	pub protected_assigns: Vec<String>,

	/// Custom formats registered when the render engine is built
	pub formats: Vec<FormatDefinition>,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			default_charset: "utf-8".to_string(),
			default_head_format: "html".to_string(),
			vary_on_accept: true,
			protected_assigns: Vec::new(),
			formats: Vec::new(),
		}
	}
}

impl RenderSettings {
	/// Parses settings from a TOML document; missing keys keep their defaults
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::RenderSettings;
	///
	/// let settings = RenderSettings::from_toml_str("vary_on_accept = false").unwrap();
	/// assert!(!settings.vary_on_accept);
	/// assert_eq!(settings.default_charset, "utf-8");
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		Ok(toml::from_str(source)?)
	}

	/// Registers the configured custom formats, returning how many were new
	pub fn register_formats(&self, registry: &FormatRegistry) -> Result<usize, SettingsError> {
		let mut added = 0;
		for definition in &self.formats {
			if registry.register(definition.to_mime_type()?) {
				added += 1;
			}
		}
		Ok(added)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let settings = RenderSettings::default();

		assert_eq!(settings.default_charset, "utf-8");
		assert_eq!(settings.default_head_format, "html");
		assert!(settings.vary_on_accept);
		assert!(settings.formats.is_empty());
	}

	#[rstest]
	fn test_from_toml_with_formats() {
		// Arrange
		let source = r#"
			default_charset = "iso-8859-1"
			protected_assigns = ["current_user"]

			[[formats]]
			symbol = "ndjson"
			media_type = "application/x-ndjson"
			extensions = ["ndjson"]
		"#;

		// Act
		let settings = RenderSettings::from_toml_str(source).unwrap();

		// Assert
		assert_eq!(settings.default_charset, "iso-8859-1");
		assert_eq!(settings.protected_assigns, vec!["current_user".to_string()]);
		assert_eq!(settings.formats.len(), 1);
		assert!(settings.formats[0].synonyms.is_empty());
	}

	#[rstest]
	fn test_from_toml_rejects_wrong_types() {
		let result = RenderSettings::from_toml_str("vary_on_accept = \"yes\"");

		assert!(matches!(result, Err(SettingsError::Parse(_))));
	}

	#[rstest]
	fn test_register_formats() {
		// Arrange
		let registry = FormatRegistry::with_defaults();
		let settings = RenderSettings {
			formats: vec![
				FormatDefinition {
					symbol: "ndjson".to_string(),
					media_type: "application/x-ndjson".to_string(),
					synonyms: vec![],
					extensions: vec!["jsonl".to_string()],
				},
				FormatDefinition {
					symbol: "json".to_string(),
					media_type: "application/json".to_string(),
					synonyms: vec![],
					extensions: vec![],
				},
			],
			..RenderSettings::default()
		};

		// Act
		let added = settings.register_formats(&registry).unwrap();

		// Assert
		assert_eq!(added, 1);
		assert_eq!(registry.lookup("jsonl").unwrap().symbol(), "ndjson");
	}

	#[rstest]
	fn test_register_formats_rejects_wildcards() {
		let settings = RenderSettings {
			formats: vec![FormatDefinition {
				symbol: "anything".to_string(),
				media_type: "text/*".to_string(),
				synonyms: vec![],
				extensions: vec![],
			}],
			..RenderSettings::default()
		};

		let result = settings.register_formats(&FormatRegistry::new());

		assert!(matches!(
			result,
			Err(SettingsError::InvalidFormat { ref symbol, .. }) if symbol == "anything"
		));
	}
}
