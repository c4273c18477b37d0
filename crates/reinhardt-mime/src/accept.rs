//! Accept header parsing

use std::cmp::Ordering;

use crate::media_type::MimeType;
use crate::registry::FormatRegistry;

/// One media range from an Accept header
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEntry {
	pub media_range: String,
	pub quality: f32,
}

/// Represents an Accept header
#[derive(Debug, Clone, Default)]
pub struct AcceptHeader {
	pub entries: Vec<AcceptEntry>,
}

impl AcceptHeader {
	/// Parses an Accept header, ordering entries by quality (highest first)
	///
	/// Entries with `q=0` are dropped. Entries of equal quality keep the order
	/// in which the client sent them.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_mime::AcceptHeader;
	///
	/// let accept = AcceptHeader::parse("text/html;q=0.5, application/json");
	/// assert_eq!(accept.entries.len(), 2);
	/// assert_eq!(accept.entries[0].media_range, "application/json");
	/// assert_eq!(accept.entries[1].quality, 0.5);
	/// ```
	pub fn parse(header: &str) -> Self {
		let mut entries: Vec<AcceptEntry> = header.split(',').filter_map(parse_entry).collect();

		entries.sort_by(|a, b| {
			b.quality
				.partial_cmp(&a.quality)
				.unwrap_or(Ordering::Equal)
		});

		Self { entries }
	}

	/// Browsers send `*/*` alongside concrete types; such headers are not
	/// trusted for format negotiation.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_mime::AcceptHeader;
	///
	/// assert!(AcceptHeader::is_browser_like("text/html, */*"));
	/// assert!(AcceptHeader::is_browser_like("*/* ,text/html"));
	/// assert!(!AcceptHeader::is_browser_like("application/json"));
	/// assert!(!AcceptHeader::is_browser_like("*/*"));
	/// ```
	pub fn is_browser_like(header: &str) -> bool {
		let parts: Vec<&str> = header.split(',').map(str::trim).collect();
		parts.len() > 1 && parts.iter().any(|part| part.starts_with("*/*"))
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Resolves the entries against `registry`
	///
	/// `*/*` becomes [`MimeType::all`], `type/*` expands to every known format
	/// of that top-level type, and unknown media types are skipped.
	pub fn resolve(&self, registry: &FormatRegistry) -> Vec<MimeType> {
		let mut formats: Vec<MimeType> = Vec::new();
		let mut push = |mime: MimeType| {
			if !formats.contains(&mime) {
				formats.push(mime);
			}
		};

		for entry in &self.entries {
			match entry.media_range.split_once('/') {
				Some(("*", "*")) => push(MimeType::all()),
				Some((top, "*")) => {
					for mime in registry.lookup_top_level(top) {
						push(mime);
					}
				}
				_ => {
					if let Some(mime) = registry.lookup_media_type(&entry.media_range) {
						push(mime);
					}
				}
			}
		}

		formats
	}
}

fn parse_entry(raw: &str) -> Option<AcceptEntry> {
	let mut parts = raw.split(';');
	let media_range = parts.next()?.trim().to_ascii_lowercase();
	if !media_range.contains('/') {
		return None;
	}

	let mut quality = 1.0_f32;
	for param in parts {
		if let Some((name, value)) = param.split_once('=')
			&& name.trim().eq_ignore_ascii_case("q")
		{
			quality = value.trim().parse::<f32>().ok()?.clamp(0.0, 1.0);
		}
	}

	if quality <= 0.0 {
		return None;
	}

	Some(AcceptEntry {
		media_range,
		quality,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_orders_by_quality() {
		// Act
		let accept = AcceptHeader::parse("text/html;q=0.8, application/json, text/csv;q=0.9");

		// Assert
		let ranges: Vec<_> = accept.entries.iter().map(|e| e.media_range.as_str()).collect();
		assert_eq!(ranges, vec!["application/json", "text/csv", "text/html"]);
	}

	#[rstest]
	#[case("application/json;q=0", 0)]
	#[case("bogus, application/json", 1)]
	#[case("application/json;q=abc", 0)]
	#[case("", 0)]
	fn test_parse_skips_unusable_entries(#[case] header: &str, #[case] expected: usize) {
		assert_eq!(AcceptHeader::parse(header).entries.len(), expected);
	}

	#[rstest]
	fn test_resolve_maps_to_registered_formats() {
		// Arrange
		let registry = FormatRegistry::with_defaults();
		let accept = AcceptHeader::parse("application/x-unknown, text/xml, */*;q=0.1");

		// Act
		let formats = accept.resolve(&registry);

		// Assert
		let symbols: Vec<_> = formats.iter().map(|f| f.symbol()).collect();
		assert_eq!(symbols, vec!["xml", "all"]);
	}

	#[rstest]
	fn test_resolve_expands_top_level_wildcard() {
		let registry = FormatRegistry::with_defaults();

		let formats = AcceptHeader::parse("font/*").resolve(&registry);

		let symbols: Vec<_> = formats.iter().map(|f| f.symbol()).collect();
		assert_eq!(symbols, vec!["otf", "ttf", "woff", "woff2"]);
	}

	#[rstest]
	fn test_resolve_deduplicates() {
		let registry = FormatRegistry::with_defaults();

		let formats = AcceptHeader::parse("text/xml, application/xml").resolve(&registry);

		assert_eq!(formats.len(), 1);
	}
}
