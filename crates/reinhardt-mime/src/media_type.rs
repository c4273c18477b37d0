//! Response format descriptors
//!
//! A [`MimeType`] pairs a symbolic format token (`html`, `json`, ...) with the
//! concrete media type sent in `Content-Type`. Two descriptors are the same
//! format when their symbols are equal.

use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

const ALL_SYMBOL: &str = "all";
const ALL_MEDIA_TYPE: &str = "*/*";

/// Errors raised while constructing a [`MimeType`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MimeError {
	#[error("`{0}` is not a valid format symbol")]
	InvalidSymbol(String),

	#[error("`{0}` is not a valid media type, expected `type/subtype`")]
	InvalidMediaType(String),

	#[error("`{0}` contains a wildcard; registered formats must be fully resolved")]
	Wildcard(String),
}

/// A response format: symbolic token plus its resolved media type
///
/// # Examples
///
/// ```
/// use reinhardt_mime::MimeType;
///
/// let json = MimeType::new("json", "application/json").unwrap();
/// assert_eq!(json.symbol(), "json");
/// assert_eq!(json.subtype(), "json");
/// assert_eq!(json.to_string(), "application/json");
///
/// assert!(MimeType::new("any", "text/*").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MimeType {
	symbol: String,
	media_type: String,
	synonyms: Vec<String>,
	extensions: Vec<String>,
}

impl MimeType {
	/// Creates a new format, validating the symbol and media type
	pub fn new(
		symbol: impl Into<String>,
		media_type: impl Into<String>,
	) -> Result<Self, MimeError> {
		let symbol = symbol.into();
		validate_symbol(&symbol)?;
		let media_type = normalize_media_type(&media_type.into())?;

		Ok(Self {
			symbol,
			media_type,
			synonyms: Vec::new(),
			extensions: Vec::new(),
		})
	}

	/// Adds alternative media types that resolve to this format
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_mime::MimeType;
	///
	/// let xml = MimeType::new("xml", "application/xml")
	///     .unwrap()
	///     .with_synonyms(["text/xml"])
	///     .unwrap();
	/// assert!(xml.matches_media_type("TEXT/XML"));
	/// ```
	pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Result<Self, MimeError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for synonym in synonyms {
			let synonym = normalize_media_type(&synonym.into())?;
			if !self.synonyms.contains(&synonym) {
				self.synonyms.push(synonym);
			}
		}
		Ok(self)
	}

	/// Adds file extensions (`yml`, `jpg`, ...) that resolve to this format
	pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for extension in extensions {
			let extension = extension.into();
			if !extension.is_empty() && !self.extensions.contains(&extension) {
				self.extensions.push(extension);
			}
		}
		self
	}

	/// The `*/*` sentinel used during negotiation. It is never registered.
	pub fn all() -> Self {
		Self {
			symbol: ALL_SYMBOL.to_string(),
			media_type: ALL_MEDIA_TYPE.to_string(),
			synonyms: Vec::new(),
			extensions: Vec::new(),
		}
	}

	pub(crate) fn from_static(
		symbol: &str,
		media_type: &str,
		synonyms: &[&str],
		extensions: &[&str],
	) -> Self {
		Self {
			symbol: symbol.to_string(),
			media_type: media_type.to_string(),
			synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
			extensions: extensions.iter().map(|s| s.to_string()).collect(),
		}
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn media_type(&self) -> &str {
		&self.media_type
	}

	/// Top-level type, e.g. `text` for `text/html`
	pub fn top_level(&self) -> &str {
		self.media_type
			.split_once('/')
			.map(|(top, _)| top)
			.unwrap_or(&self.media_type)
	}

	pub fn subtype(&self) -> &str {
		self.media_type
			.split_once('/')
			.map(|(_, sub)| sub)
			.unwrap_or("")
	}

	pub fn synonyms(&self) -> &[String] {
		&self.synonyms
	}

	pub fn extensions(&self) -> &[String] {
		&self.extensions
	}

	pub fn is_all(&self) -> bool {
		self.symbol == ALL_SYMBOL && self.media_type == ALL_MEDIA_TYPE
	}

	pub fn is_html(&self) -> bool {
		self.symbol == "html" || self.subtype().contains("html")
	}

	/// Whether `media_type` names this format directly or through a synonym
	pub fn matches_media_type(&self, media_type: &str) -> bool {
		let candidate = media_type.trim();
		self.media_type.eq_ignore_ascii_case(candidate)
			|| self
				.synonyms
				.iter()
				.any(|synonym| synonym.eq_ignore_ascii_case(candidate))
	}
}

impl PartialEq for MimeType {
	fn eq(&self, other: &Self) -> bool {
		self.symbol == other.symbol
	}
}

impl Eq for MimeType {}

impl Hash for MimeType {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.symbol.hash(state);
	}
}

impl fmt::Display for MimeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.media_type)
	}
}

fn validate_symbol(symbol: &str) -> Result<(), MimeError> {
	let valid = !symbol.is_empty()
		&& symbol != ALL_SYMBOL
		&& symbol
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_');
	if valid {
		Ok(())
	} else {
		Err(MimeError::InvalidSymbol(symbol.to_string()))
	}
}

fn normalize_media_type(value: &str) -> Result<String, MimeError> {
	let trimmed = value.trim();
	if trimmed.contains('*') {
		return Err(MimeError::Wildcard(trimmed.to_string()));
	}

	let Some((top, sub)) = trimmed.split_once('/') else {
		return Err(MimeError::InvalidMediaType(trimmed.to_string()));
	};

	let is_token = |part: &str| {
		!part.is_empty()
			&& part
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
	};
	if !is_token(top) || !is_token(sub) {
		return Err(MimeError::InvalidMediaType(trimmed.to_string()));
	}

	Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_new_splits_type_and_subtype() {
		// Arrange & Act
		let mime = MimeType::new("rss", "application/rss+xml").unwrap();

		// Assert
		assert_eq!(mime.top_level(), "application");
		assert_eq!(mime.subtype(), "rss+xml");
		assert_eq!(mime.to_string(), "application/rss+xml");
	}

	#[rstest]
	#[case("text/*")]
	#[case("*/*")]
	fn test_new_rejects_wildcards(#[case] media_type: &str) {
		let result = MimeType::new("custom", media_type);

		assert_eq!(result.unwrap_err(), MimeError::Wildcard(media_type.to_string()));
	}

	#[rstest]
	#[case("html")]
	#[case("text/")]
	#[case("/html")]
	#[case("text/html; charset=utf-8")]
	fn test_new_rejects_malformed_media_types(#[case] media_type: &str) {
		assert!(matches!(
			MimeType::new("custom", media_type),
			Err(MimeError::InvalidMediaType(_))
		));
	}

	#[rstest]
	#[case("")]
	#[case("all")]
	#[case("has-dash")]
	#[case("with space")]
	fn test_new_rejects_invalid_symbols(#[case] symbol: &str) {
		assert!(matches!(
			MimeType::new(symbol, "text/plain"),
			Err(MimeError::InvalidSymbol(_))
		));
	}

	#[rstest]
	fn test_media_type_is_lowercased() {
		let mime = MimeType::new("csv", "Text/CSV").unwrap();

		assert_eq!(mime.media_type(), "text/csv");
	}

	#[rstest]
	fn test_identity_is_by_symbol() {
		// Arrange
		let a = MimeType::new("json", "application/json").unwrap();
		let b = MimeType::new("json", "text/x-json").unwrap();
		let c = MimeType::new("api", "application/json").unwrap();

		// Assert
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[rstest]
	fn test_matches_media_type_checks_synonyms() {
		let js = MimeType::new("js", "text/javascript")
			.unwrap()
			.with_synonyms(["application/javascript", "application/x-javascript"])
			.unwrap();

		assert!(js.matches_media_type("text/javascript"));
		assert!(js.matches_media_type(" application/javascript "));
		assert!(!js.matches_media_type("application/json"));
	}

	#[rstest]
	fn test_with_extensions_deduplicates() {
		let yaml = MimeType::new("yaml", "application/x-yaml")
			.unwrap()
			.with_extensions(["yml", "yaml", "yml", ""]);

		assert_eq!(yaml.extensions(), ["yml".to_string(), "yaml".to_string()]);
	}

	#[rstest]
	fn test_all_sentinel() {
		let all = MimeType::all();

		assert!(all.is_all());
		assert_eq!(all.to_string(), "*/*");
		assert!(!MimeType::new("html", "text/html").unwrap().is_all());
	}

	#[rstest]
	fn test_is_html() {
		assert!(MimeType::new("html", "text/html").unwrap().is_html());
		assert!(MimeType::new("xhtml", "application/xhtml+xml").unwrap().is_html());
		assert!(!MimeType::new("json", "application/json").unwrap().is_html());
	}
}
