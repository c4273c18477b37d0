//! Status arguments accepted by `head` and `redirect_to`
//!
//! Statuses may be given as codes or as symbols derived from the reason
//! phrase: lowercase, with whitespace and hyphens replaced by underscores
//! (`No Content` becomes `no_content`).

use hyper::StatusCode;
use serde_json::Value;

use crate::error::{RenderError, Result};

/// A caller-supplied status, validated by [`StatusArg::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusArg {
	/// No status given; the operation default applies
	Unspecified,
	Code(u16),
	Symbol(String),
	/// A mapping was passed where a status was expected (keeps its rendering)
	Mapping(String),
	/// Any other value shape (keeps its rendering)
	Unsupported(String),
}

impl StatusArg {
	pub fn is_mapping(&self) -> bool {
		matches!(self, StatusArg::Mapping(_))
	}

	/// Resolves to a concrete status code, using `default` when unspecified
	pub fn resolve(&self, default: StatusCode) -> Result<StatusCode> {
		match self {
			StatusArg::Unspecified => Ok(default),
			StatusArg::Code(code) => StatusCode::from_u16(*code).map_err(|_| {
				RenderError::invalid_argument(format!("{} is not a valid value for `status`.", code))
			}),
			StatusArg::Symbol(symbol) => status_from_symbol(symbol).ok_or_else(|| {
				RenderError::invalid_argument(format!("Unrecognized status code :{}", symbol))
			}),
			StatusArg::Mapping(repr) | StatusArg::Unsupported(repr) => Err(
				RenderError::invalid_argument(format!("{} is not a valid value for `status`.", repr)),
			),
		}
	}
}

impl From<StatusCode> for StatusArg {
	fn from(status: StatusCode) -> Self {
		StatusArg::Code(status.as_u16())
	}
}

impl From<u16> for StatusArg {
	fn from(code: u16) -> Self {
		StatusArg::Code(code)
	}
}

impl From<&str> for StatusArg {
	fn from(symbol: &str) -> Self {
		StatusArg::Symbol(symbol.to_string())
	}
}

impl From<String> for StatusArg {
	fn from(symbol: String) -> Self {
		StatusArg::Symbol(symbol)
	}
}

impl<T: Into<StatusArg>> From<Option<T>> for StatusArg {
	fn from(status: Option<T>) -> Self {
		status.map_or(StatusArg::Unspecified, Into::into)
	}
}

impl From<Value> for StatusArg {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => StatusArg::Unspecified,
			Value::String(symbol) => StatusArg::Symbol(symbol),
			Value::Number(ref number) => match number.as_u64().and_then(|n| u16::try_from(n).ok()) {
				Some(code) => StatusArg::Code(code),
				None => StatusArg::Unsupported(value.to_string()),
			},
			Value::Object(_) => StatusArg::Mapping(value.to_string()),
			other => StatusArg::Unsupported(other.to_string()),
		}
	}
}

impl From<&Value> for StatusArg {
	fn from(value: &Value) -> Self {
		StatusArg::from(value.clone())
	}
}

/// Symbol for `status`, e.g. `not_found` for 404
///
/// # Examples
///
/// ```
/// use reinhardt_controller::status::status_symbol;
/// use hyper::StatusCode;
///
/// assert_eq!(status_symbol(StatusCode::NO_CONTENT).as_deref(), Some("no_content"));
/// assert_eq!(status_symbol(StatusCode::OK).as_deref(), Some("ok"));
/// ```
pub fn status_symbol(status: StatusCode) -> Option<String> {
	status.canonical_reason().map(symbolize)
}

/// Status code for a reason-phrase symbol
///
/// # Examples
///
/// ```
/// use reinhardt_controller::status::status_from_symbol;
/// use hyper::StatusCode;
///
/// assert_eq!(status_from_symbol("created"), Some(StatusCode::CREATED));
/// assert_eq!(status_from_symbol("unprocessable_entity"), Some(StatusCode::UNPROCESSABLE_ENTITY));
/// assert_eq!(status_from_symbol("nope"), None);
/// ```
pub fn status_from_symbol(symbol: &str) -> Option<StatusCode> {
	(100u16..600)
		.filter_map(|code| StatusCode::from_u16(code).ok())
		.find(|status| status_symbol(*status).as_deref() == Some(symbol))
}

fn symbolize(reason: &str) -> String {
	reason
		.to_ascii_lowercase()
		.chars()
		.map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
		.collect()
}
