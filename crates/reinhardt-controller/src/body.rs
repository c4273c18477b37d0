//! Response bodies produced by body renderers

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use crate::error::BoxError;

/// Type alias for streaming body
pub type StreamBody = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A rendered body: nothing, a complete buffer, or a stream of chunks
#[derive(Default)]
pub enum Body {
	#[default]
	Empty,
	Full(Bytes),
	Stream(StreamBody),
}

impl Body {
	pub fn stream<S>(stream: S) -> Self
	where
		S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
	{
		Body::Stream(Box::pin(stream))
	}

	/// `true` for [`Body::Empty`] and zero-length buffers. Streams are never
	/// considered empty.
	pub fn is_empty(&self) -> bool {
		match self {
			Body::Empty => true,
			Body::Full(bytes) => bytes.is_empty(),
			Body::Stream(_) => false,
		}
	}

	pub fn is_stream(&self) -> bool {
		matches!(self, Body::Stream(_))
	}

	/// The buffered bytes, or `None` for streams
	pub fn as_bytes(&self) -> Option<&Bytes> {
		match self {
			Body::Full(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// Collects the whole body into one buffer
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::Body;
	/// use bytes::Bytes;
	///
	/// # futures::executor::block_on(async {
	/// let body = Body::stream(futures::stream::iter(vec![
	///     Ok(Bytes::from("Hello, ")),
	///     Ok(Bytes::from("World")),
	/// ]));
	/// assert_eq!(body.collect().await.unwrap(), Bytes::from("Hello, World"));
	/// # });
	/// ```
	pub async fn collect(self) -> Result<Bytes, BoxError> {
		match self {
			Body::Empty => Ok(Bytes::new()),
			Body::Full(bytes) => Ok(bytes),
			Body::Stream(mut stream) => {
				let mut buffer = Vec::new();
				while let Some(chunk) = stream.next().await {
					buffer.extend_from_slice(&chunk?);
				}
				Ok(Bytes::from(buffer))
			}
		}
	}
}

impl fmt::Debug for Body {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Body::Empty => f.write_str("Body::Empty"),
			Body::Full(bytes) => f.debug_tuple("Body::Full").field(bytes).finish(),
			Body::Stream(_) => f.write_str("Body::Stream(..)"),
		}
	}
}

impl From<Bytes> for Body {
	fn from(bytes: Bytes) -> Self {
		Body::Full(bytes)
	}
}

impl From<String> for Body {
	fn from(text: String) -> Self {
		Body::Full(Bytes::from(text))
	}
}

impl From<&'static str> for Body {
	fn from(text: &'static str) -> Self {
		Body::Full(Bytes::from_static(text.as_bytes()))
	}
}

impl From<Vec<u8>> for Body {
	fn from(bytes: Vec<u8>) -> Self {
		Body::Full(Bytes::from(bytes))
	}
}
