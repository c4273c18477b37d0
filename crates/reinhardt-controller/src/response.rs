//! Response state and its single commit point
//!
//! A request's response is either [`ResponseState::Pending`] or
//! [`ResponseState::Committed`]. Render, redirect and head work on a draft
//! taken from the pending response and publish it with
//! [`ResponseState::commit`]; a committed response can never be committed
//! again.

use hyper::header::{CONTENT_TYPE, HeaderValue, LOCATION};
use hyper::{HeaderMap, StatusCode};

use crate::body::Body;
use crate::error::{RenderError, Result};

/// HTTP response being assembled for a request
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Body,
	charset: Option<String>,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Body::Empty,
			charset: None,
		}
	}

	pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
		self.charset = Some(charset.into());
		self
	}

	/// Copy of status, headers and charset with an empty body
	pub fn draft(&self) -> Self {
		Self {
			status: self.status,
			headers: self.headers.clone(),
			body: Body::Empty,
			charset: self.charset.clone(),
		}
	}

	/// Full `Content-Type` header value
	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
	}

	/// `Content-Type` without parameters
	pub fn media_type(&self) -> Option<&str> {
		self.content_type()
			.map(|value| value.split(';').next().unwrap_or(value).trim())
			.filter(|media_type| !media_type.is_empty())
	}

	pub fn charset(&self) -> Option<&str> {
		self.charset.as_deref()
	}

	/// Sets `Content-Type`
	///
	/// A `charset` parameter in `content_type` replaces the response charset;
	/// otherwise the response charset, if any, is appended.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::Response;
	/// use hyper::StatusCode;
	///
	/// let mut response = Response::new(StatusCode::OK).with_charset("utf-8");
	/// response.set_content_type("application/json").unwrap();
	/// assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
	///
	/// response.set_charset(None).unwrap();
	/// assert_eq!(response.content_type(), Some("application/json"));
	/// ```
	pub fn set_content_type(&mut self, content_type: &str) -> Result<()> {
		let mut parts = content_type.split(';');
		let media_type = parts.next().unwrap_or_default().trim().to_string();
		for param in parts {
			if let Some((name, value)) = param.split_once('=')
				&& name.trim().eq_ignore_ascii_case("charset")
			{
				self.charset = Some(value.trim().trim_matches('"').to_string());
			}
		}
		self.write_content_type(&media_type)
	}

	/// Replaces the charset, rewriting `Content-Type` if one is set
	pub fn set_charset(&mut self, charset: Option<&str>) -> Result<()> {
		self.charset = charset.map(str::to_string);
		match self.media_type().map(str::to_string) {
			Some(media_type) => self.write_content_type(&media_type),
			None => Ok(()),
		}
	}

	pub fn location(&self) -> Option<&str> {
		self.headers
			.get(LOCATION)
			.and_then(|value| value.to_str().ok())
	}

	pub fn set_location(&mut self, location: &str) -> Result<()> {
		let value = HeaderValue::from_str(location)
			.map_err(|_| RenderError::InvalidHeader(format!("Location: {}", location)))?;
		self.headers.insert(LOCATION, value);
		Ok(())
	}

	fn write_content_type(&mut self, media_type: &str) -> Result<()> {
		let header = match &self.charset {
			Some(charset) => format!("{}; charset={}", media_type, charset),
			None => media_type.to_string(),
		};
		let value = HeaderValue::from_str(&header)
			.map_err(|_| RenderError::InvalidHeader(format!("Content-Type: {}", header)))?;
		self.headers.insert(CONTENT_TYPE, value);
		Ok(())
	}
}

/// Per-request response lifecycle
#[derive(Debug)]
pub enum ResponseState {
	Pending(Response),
	Committed(Response),
}

impl ResponseState {
	pub fn new(response: Response) -> Self {
		ResponseState::Pending(response)
	}

	pub fn is_committed(&self) -> bool {
		matches!(self, ResponseState::Committed(_))
	}

	pub fn response(&self) -> &Response {
		match self {
			ResponseState::Pending(response) | ResponseState::Committed(response) => response,
		}
	}

	/// Mutable access to the response before it is committed
	pub fn pending_mut(&mut self) -> Result<&mut Response> {
		match self {
			ResponseState::Pending(response) => Ok(response),
			ResponseState::Committed(_) => Err(RenderError::DoubleRender),
		}
	}

	/// A draft of the pending response; fails once committed
	pub fn draft(&self) -> Result<Response> {
		match self {
			ResponseState::Pending(response) => Ok(response.draft()),
			ResponseState::Committed(_) => Err(RenderError::DoubleRender),
		}
	}

	/// Publishes `response` as the final response for the request
	///
	/// On failure the current state is left untouched.
	pub fn commit(&mut self, response: Response) -> Result<()> {
		if self.is_committed() {
			tracing::warn!("rejected second render or redirect for the same request");
			return Err(RenderError::DoubleRender);
		}
		tracing::debug!(status = %response.status, "response committed");
		*self = ResponseState::Committed(response);
		Ok(())
	}

	pub fn into_response(self) -> Response {
		match self {
			ResponseState::Pending(response) | ResponseState::Committed(response) => response,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_set_content_type_with_explicit_charset() {
		// Arrange
		let mut response = Response::new(StatusCode::OK).with_charset("utf-8");

		// Act
		response.set_content_type("text/html; charset=ISO-8859-1").unwrap();

		// Assert
		assert_eq!(response.media_type(), Some("text/html"));
		assert_eq!(response.charset(), Some("ISO-8859-1"));
		assert_eq!(response.content_type(), Some("text/html; charset=ISO-8859-1"));
	}

	#[rstest]
	fn test_set_content_type_without_charset() {
		let mut response = Response::new(StatusCode::OK);

		response.set_content_type("image/png").unwrap();

		assert_eq!(response.content_type(), Some("image/png"));
	}

	#[rstest]
	fn test_set_content_type_rejects_invalid_header_values() {
		let mut response = Response::new(StatusCode::OK);

		let result = response.set_content_type("text/plain\n");

		assert!(matches!(result, Err(RenderError::InvalidHeader(_))));
		assert!(response.content_type().is_none());
	}

	#[rstest]
	fn test_draft_drops_body() {
		// Arrange
		let mut response = Response::new(StatusCode::CREATED);
		response.body = Body::from("payload");
		response.headers.insert("x-request-id", HeaderValue::from_static("abc"));

		// Act
		let draft = response.draft();

		// Assert
		assert_eq!(draft.status, StatusCode::CREATED);
		assert_eq!(draft.headers.get("x-request-id").unwrap(), "abc");
		assert!(draft.body.is_empty());
	}

	#[rstest]
	fn test_commit_happens_once() {
		// Arrange
		let mut state = ResponseState::new(Response::new(StatusCode::OK));
		let mut first = state.draft().unwrap();
		first.body = Body::from("first");

		// Act
		state.commit(first).unwrap();
		let second = state.commit(Response::new(StatusCode::ACCEPTED));

		// Assert
		assert!(matches!(second, Err(RenderError::DoubleRender)));
		assert!(state.is_committed());
		assert_eq!(state.response().status, StatusCode::OK);
		assert_eq!(state.response().body.as_bytes().unwrap(), "first");
	}

	#[rstest]
	fn test_draft_and_pending_mut_fail_after_commit() {
		let mut state = ResponseState::new(Response::new(StatusCode::OK));
		state.commit(Response::new(StatusCode::OK)).unwrap();

		assert!(matches!(state.draft(), Err(RenderError::DoubleRender)));
		assert!(matches!(state.pending_mut(), Err(RenderError::DoubleRender)));
	}
}
