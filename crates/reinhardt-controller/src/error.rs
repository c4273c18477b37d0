//! Render pipeline errors

use hyper::StatusCode;
use thiserror::Error;

/// Boxed error produced by external collaborators such as body renderers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, RenderError>;

pub const DOUBLE_RENDER_MESSAGE: &str = "Render and/or redirect were called multiple times in this action. \
	Please note that you may only call render OR redirect, and at most once per action. \
	Also note that neither redirect nor render terminate execution of the action, \
	so if you want to exit an action after redirecting, you need to return explicitly \
	after calling redirect_to.";

pub const UNKNOWN_FORMAT_GUIDANCE: &str = "To respond to a custom format, register it as a MIME type first. \
	If you meant to respond to a variant like `tablet` or `phone`, not a custom format, \
	be sure to nest your variant response within a format response: \
	format.html(FormatResponse::variants(|html| html.variant(\"tablet\", ...)))";

#[derive(Debug, Error)]
pub enum RenderError {
	#[error("unknown format `{format}`. {}", UNKNOWN_FORMAT_GUIDANCE)]
	UnknownFormat { format: String },

	/// The token names a known format that is excluded from negotiation, or
	/// the dispatch table could not produce a handler for it.
	#[error("no format handler `{format}` is defined")]
	NoSuchHandler { format: String },

	#[error("{}", DOUBLE_RENDER_MESSAGE)]
	DoubleRender,

	#[error("render parameters are not permitted")]
	ForbiddenParameters,

	#[error("{0}")]
	InvalidArgument(String),

	#[error("no acceptable format among [{}]", .formats.join(", "))]
	NotAcceptable { formats: Vec<String> },

	#[error("invalid header: {0}")]
	InvalidHeader(String),

	/// Failure reported by the body renderer, passed through untouched
	#[error("{0}")]
	Body(#[source] BoxError),
}

impl RenderError {
	pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
		RenderError::InvalidArgument(message.into())
	}

	/// HTTP status a transport layer should answer with for this error
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::RenderError;
	/// use hyper::StatusCode;
	///
	/// let error = RenderError::NotAcceptable { formats: vec!["xml".to_string()] };
	/// assert_eq!(error.status_code(), StatusCode::NOT_ACCEPTABLE);
	/// assert_eq!(RenderError::ForbiddenParameters.status_code(), StatusCode::BAD_REQUEST);
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			RenderError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
			RenderError::ForbiddenParameters => StatusCode::BAD_REQUEST,
			RenderError::UnknownFormat { .. }
			| RenderError::NoSuchHandler { .. }
			| RenderError::DoubleRender
			| RenderError::InvalidArgument(_)
			| RenderError::InvalidHeader(_)
			| RenderError::Body(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_double_render_message_states_the_rule() {
		let message = RenderError::DoubleRender.to_string();

		assert!(message.contains("render OR redirect, and at most once per action"));
		assert!(message.contains("neither redirect nor render terminate execution"));
	}

	#[test]
	fn test_unknown_format_message_guides_caller() {
		let message = RenderError::UnknownFormat {
			format: "tablet".to_string(),
		}
		.to_string();

		assert!(message.starts_with("unknown format `tablet`"));
		assert!(message.contains("register it as a MIME type"));
		assert!(message.contains("nest your variant response"));
	}

	#[test]
	fn test_body_error_keeps_source() {
		let error = RenderError::Body("template missing".into());

		assert_eq!(error.to_string(), "template missing");
		assert!(std::error::Error::source(&error).is_some());
	}
}
