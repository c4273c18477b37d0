//! Collaborator seams of the render pipeline
//!
//! - [`BodyRenderer`] turns a normalized [`RenderRequest`] into a body
//! - [`UrlResolver`] turns a redirect or `location` target into a URL
//! - [`RenderHooks`] holds the overridable pure transforms

use std::sync::Arc;

use async_trait::async_trait;
use reinhardt_mime::{MimeType, defaults};
use serde_json::Value;

use crate::body::Body;
use crate::error::{BoxError, RenderError, Result};
use crate::normalize::{Options, RenderRequest};

/// Assign names every controller reserves for itself
pub const PROTECTED_ASSIGNS: &[&str] = &["action_name", "response_body", "formats", "prefixes"];

/// Produces response bodies for normalized render requests
///
/// Errors are propagated to the caller unchanged and leave the response
/// uncommitted.
#[async_trait]
pub trait BodyRenderer: Send + Sync {
	async fn render_to_body(&self, request: &RenderRequest, assigns: &Options) -> std::result::Result<Body, BoxError>;
}

#[async_trait]
impl<T: BodyRenderer + ?Sized> BodyRenderer for Arc<T> {
	async fn render_to_body(&self, request: &RenderRequest, assigns: &Options) -> std::result::Result<Body, BoxError> {
		(**self).render_to_body(request, assigns).await
	}
}

/// Resolves redirect and `location` targets to URLs
pub trait UrlResolver: Send + Sync {
	fn url_for(&self, locator: &Value) -> Result<String>;
}

/// Accepts ready-made paths and URLs, or a mapping with a `path` or `url` key
#[derive(Debug, Clone, Copy, Default)]
pub struct PathUrlResolver;

impl UrlResolver for PathUrlResolver {
	fn url_for(&self, locator: &Value) -> Result<String> {
		let url = match locator {
			Value::String(url) => Some(url.as_str()),
			Value::Object(map) => map
				.get("url")
				.or_else(|| map.get("path"))
				.and_then(Value::as_str),
			_ => None,
		};

		url.filter(|url| !url.is_empty())
			.map(str::to_string)
			.ok_or_else(|| RenderError::invalid_argument(format!("Cannot redirect to {}", locator)))
	}
}

/// Overridable transforms applied by the render pipeline
pub trait RenderHooks: Send + Sync {
	/// Final pass over normalized options; identity by default
	fn normalize_options(&self, options: Options) -> Options {
		options
	}

	/// Format a response is rendered in when nothing more specific applies:
	/// the first concrete negotiated format, else plain text
	fn rendered_format(&self, formats: &[MimeType]) -> MimeType {
		formats
			.iter()
			.find(|format| !format.is_all())
			.cloned()
			.unwrap_or_else(defaults::text)
	}

	/// Assign names hidden from views
	fn protected_assigns(&self) -> Vec<String> {
		PROTECTED_ASSIGNS.iter().map(|name| name.to_string()).collect()
	}
}

/// Hooks with every default behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderHooks;

impl RenderHooks for DefaultRenderHooks {}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!("/users/1"), "/users/1")]
	#[case(json!("https://example.com/"), "https://example.com/")]
	#[case(json!({"path": "/login"}), "/login")]
	#[case(json!({"url": "https://example.com/a", "path": "/a"}), "https://example.com/a")]
	fn test_path_url_resolver(#[case] locator: Value, #[case] expected: &str) {
		assert_eq!(PathUrlResolver.url_for(&locator).unwrap(), expected);
	}

	#[rstest]
	#[case(json!(null))]
	#[case(json!(""))]
	#[case(json!({"id": 1}))]
	fn test_path_url_resolver_rejects_unresolvable(#[case] locator: Value) {
		assert!(matches!(
			PathUrlResolver.url_for(&locator),
			Err(RenderError::InvalidArgument(_))
		));
	}

	#[rstest]
	fn test_rendered_format_defaults_to_text() {
		let hooks = DefaultRenderHooks;

		assert_eq!(hooks.rendered_format(&[]).symbol(), "text");
		assert_eq!(hooks.rendered_format(&[MimeType::all()]).symbol(), "text");
		assert_eq!(hooks.rendered_format(&[defaults::html()]).symbol(), "html");
	}

	#[rstest]
	fn test_default_protected_assigns() {
		let protected = DefaultRenderHooks.protected_assigns();

		assert_eq!(protected, vec!["action_name", "response_body", "formats", "prefixes"]);
	}
}
