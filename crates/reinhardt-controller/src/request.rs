//! Request attributes that drive format and variant selection

use hyper::HeaderMap;
use hyper::header::ACCEPT;
use reinhardt_mime::{AcceptHeader, FormatRegistry, MimeType};

/// The parts of an inbound request the render pipeline looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
	/// Raw `Accept` header
	pub accept: Option<String>,
	/// Explicit format parameter (`?format=json`, `/users.json`)
	pub format_param: Option<String>,
	/// Negotiated variants in priority order (`phone`, `tablet`, ...)
	pub variants: Vec<String>,
}

impl RequestInfo {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds request info from transport headers
	pub fn from_headers(headers: &HeaderMap) -> Self {
		Self {
			accept: headers
				.get(ACCEPT)
				.and_then(|value| value.to_str().ok())
				.map(str::to_string),
			..Self::default()
		}
	}

	pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
		self.accept = Some(accept.into());
		self
	}

	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format_param = Some(format.into());
		self
	}

	pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
		self.variants.push(variant.into());
		self
	}

	/// Whether the Accept header decides the response format
	pub fn uses_accept_header(&self) -> bool {
		self.format_param.as_deref().is_none_or(str::is_empty)
			&& self
				.accept
				.as_deref()
				.is_some_and(|accept| !accept.trim().is_empty() && !AcceptHeader::is_browser_like(accept))
	}

	/// Formats acceptable for this request, most preferred first
	///
	/// An explicit format parameter wins; then a non-browser Accept header;
	/// otherwise `html`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::RequestInfo;
	/// use reinhardt_mime::FormatRegistry;
	///
	/// let registry = FormatRegistry::with_defaults();
	///
	/// let api = RequestInfo::new().with_accept("application/json");
	/// assert_eq!(api.negotiate_formats(&registry)[0].symbol(), "json");
	///
	/// let browser = RequestInfo::new().with_accept("text/html,application/xml;q=0.9,*/*;q=0.8");
	/// assert_eq!(browser.negotiate_formats(&registry)[0].symbol(), "html");
	///
	/// let suffixed = RequestInfo::new().with_format("csv");
	/// assert_eq!(suffixed.negotiate_formats(&registry)[0].symbol(), "csv");
	/// ```
	pub fn negotiate_formats(&self, registry: &FormatRegistry) -> Vec<MimeType> {
		if let Some(format) = self.format_param.as_deref().filter(|f| !f.is_empty()) {
			return registry
				.lookup(format)
				.filter(|mime| registry.is_negotiable(mime))
				.into_iter()
				.collect();
		}

		if self.uses_accept_header()
			&& let Some(accept) = self.accept.as_deref()
		{
			return AcceptHeader::parse(accept).resolve(registry);
		}

		registry
			.lookup("html")
			.into_iter()
			.collect()
	}
}
