//! Body-less responses

use hyper::StatusCode;
use hyper::header::{HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{RenderError, Result};
use crate::normalize::Options;
use crate::status::StatusArg;

/// Converts an option key to a header name
///
/// The key is split on `-` and `_`, the first character of every segment is
/// upper-cased and the segments are joined with `-`. The rest of each segment
/// is left as is; trailing empty segments are dropped. Any other empty
/// segment is rejected with [`RenderError::InvalidHeader`].
///
/// # Examples
///
/// ```
/// use reinhardt_controller::head::canonical_header_name;
///
/// assert_eq!(canonical_header_name("x_foo").unwrap(), "X-Foo");
/// assert_eq!(canonical_header_name("cache-control").unwrap(), "Cache-Control");
/// assert_eq!(canonical_header_name("x_API_key").unwrap(), "X-API-Key");
/// assert!(canonical_header_name("_x").is_err());
/// ```
pub fn canonical_header_name(key: &str) -> Result<String> {
	let mut segments: Vec<&str> = key.split(['-', '_']).collect();
	while segments.last().is_some_and(|segment| segment.is_empty()) {
		segments.pop();
	}

	segments
		.into_iter()
		.map(|segment| {
			let mut chars = segment.chars();
			match chars.next() {
				Some(first) => Ok(first.to_uppercase().chain(chars).collect()),
				None => Err(RenderError::InvalidHeader(format!(
					"empty segment in header key `{}`",
					key
				))),
			}
		})
		.collect::<Result<Vec<String>>>()
		.map(|segments| segments.join("-"))
}

/// Whether a response with `status` carries a representation
///
/// Informational statuses, `204 No Content`, `205 Reset Content` and
/// `304 Not Modified` do not.
pub fn includes_content(status: StatusCode) -> bool {
	!(status.is_informational()
		|| matches!(
			status,
			StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
		))
}

/// A validated `head` call, computed before the response is touched
#[derive(Debug)]
pub(crate) struct HeadPlan {
	pub status: StatusCode,
	pub location: Option<Value>,
	pub content_type: Option<String>,
	pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl HeadPlan {
	pub fn new(status: StatusArg, mut options: Options) -> Result<Self> {
		let status = status.resolve(StatusCode::OK)?;

		let location = options.remove("location").filter(|location| !location.is_null());
		let content_type = match options.remove("content_type") {
			None | Some(Value::Null) => None,
			Some(Value::String(content_type)) => Some(content_type),
			Some(other) => Some(header_text(&other)),
		};

		let headers = options
			.iter()
			.map(|(key, value)| {
				let name = canonical_header_name(key)?;
				let header_name = HeaderName::from_bytes(name.as_bytes())
					.map_err(|_| RenderError::InvalidHeader(format!("invalid header name `{}`", name)))?;
				let text = header_text(value);
				let header_value = HeaderValue::from_str(&text)
					.map_err(|_| RenderError::InvalidHeader(format!("{}: {}", name, text)))?;
				Ok((header_name, header_value))
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			status,
			location,
			content_type,
			headers,
		})
	}
}

fn header_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn options(value: Value) -> Options {
		match value {
			Value::Object(map) => map,
			_ => panic!("expected a mapping"),
		}
	}

	#[rstest]
	#[case("x_foo", "X-Foo")]
	#[case("x-foo_bar", "X-Foo-Bar")]
	#[case("etag", "Etag")]
	#[case("X-Already", "X-Already")]
	#[case("retry_after_", "Retry-After")]
	#[case("retry__", "Retry")]
	#[case("1st_try", "1st-Try")]
	fn test_canonical_header_name(#[case] key: &str, #[case] expected: &str) {
		assert_eq!(canonical_header_name(key).unwrap(), expected);
	}

	#[rstest]
	#[case("_x")]
	#[case("-x")]
	#[case("x__y")]
	#[case("x-_y")]
	fn test_canonical_header_name_rejects_empty_segments(#[case] key: &str) {
		let result = canonical_header_name(key);

		assert!(matches!(result, Err(RenderError::InvalidHeader(ref message)) if message.contains(key)));
	}

	#[rstest]
	#[case(StatusCode::CONTINUE, false)]
	#[case(StatusCode::SWITCHING_PROTOCOLS, false)]
	#[case(StatusCode::NO_CONTENT, false)]
	#[case(StatusCode::RESET_CONTENT, false)]
	#[case(StatusCode::NOT_MODIFIED, false)]
	#[case(StatusCode::OK, true)]
	#[case(StatusCode::CREATED, true)]
	#[case(StatusCode::NOT_FOUND, true)]
	fn test_includes_content(#[case] status: StatusCode, #[case] expected: bool) {
		assert_eq!(includes_content(status), expected);
	}

	#[rstest]
	fn test_plan_extracts_distinguished_keys() {
		// Arrange
		let options = options(json!({
			"location": "/x",
			"content_type": "application/json",
			"x_request_id": 42,
			"cache_control": "no-cache",
		}));

		// Act
		let plan = HeadPlan::new(StatusArg::from("created"), options).unwrap();

		// Assert
		assert_eq!(plan.status, StatusCode::CREATED);
		assert_eq!(plan.location, Some(json!("/x")));
		assert_eq!(plan.content_type.as_deref(), Some("application/json"));
		let names: Vec<_> = plan.headers.iter().map(|(name, _)| name.as_str()).collect();
		assert_eq!(names, vec!["cache-control", "x-request-id"]);
		assert_eq!(plan.headers[1].1, "42");
	}

	#[rstest]
	fn test_plan_defaults_to_ok() {
		let plan = HeadPlan::new(StatusArg::Unspecified, Options::new()).unwrap();

		assert_eq!(plan.status, StatusCode::OK);
		assert!(plan.headers.is_empty());
	}

	#[rstest]
	fn test_plan_rejects_mapping_status() {
		let result = HeadPlan::new(StatusArg::from(json!({})), Options::new());

		assert!(matches!(
			result,
			Err(RenderError::InvalidArgument(ref message)) if message == "{} is not a valid value for `status`."
		));
	}

	#[rstest]
	fn test_plan_rejects_keys_with_empty_segments() {
		let result = HeadPlan::new(StatusArg::Code(200), options(json!({"x__y": "2"})));

		assert!(matches!(result, Err(RenderError::InvalidHeader(_))));
	}

	#[rstest]
	fn test_plan_rejects_invalid_header_values() {
		let result = HeadPlan::new(StatusArg::Code(200), options(json!({"x_note": "line\nbreak"})));

		assert!(matches!(result, Err(RenderError::InvalidHeader(_))));
	}
}
