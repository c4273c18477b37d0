//! Format dispatch for `respond_to`
//!
//! [`FormatDispatcher`] owns one handler per dispatchable format. Handlers are
//! generated for every known format at construction, for each format the
//! registry learns about later, and lazily for any format that is known but
//! still has no handler when it is first requested. [`Collector`] gathers the
//! per-format responses of one `respond_to` call through the dispatcher.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use parking_lot::{Mutex, RwLock};
use reinhardt_mime::{FormatRegistry, ListenerId, MimeType};
use serde_json::Value;

use crate::error::{RenderError, Result};
use crate::normalize::{Options, RenderArgs};
use crate::status::StatusArg;

/// What to do when a format is selected
#[derive(Debug, Clone, Default)]
pub enum FormatResponse {
	/// Render the current action
	#[default]
	Default,
	Render(RenderArgs),
	Head(StatusArg, Options),
	Redirect(Value, StatusArg),
	/// Per-variant responses
	Variants(VariantCollector),
}

impl FormatResponse {
	pub fn render(args: impl Into<RenderArgs>) -> Self {
		FormatResponse::Render(args.into())
	}

	pub fn head(status: impl Into<StatusArg>) -> Self {
		FormatResponse::Head(status.into(), Options::new())
	}

	pub fn head_with(status: impl Into<StatusArg>, options: Options) -> Self {
		FormatResponse::Head(status.into(), options)
	}

	pub fn redirect(location: impl Into<Value>) -> Self {
		FormatResponse::Redirect(location.into(), StatusArg::Unspecified)
	}

	/// Builds per-variant responses
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::FormatResponse;
	///
	/// let response = FormatResponse::variants(|html| {
	///     html.variant("phone", FormatResponse::render("show_phone"))
	///         .none(FormatResponse::Default);
	/// });
	/// assert!(matches!(response, FormatResponse::Variants(_)));
	/// ```
	pub fn variants(build: impl FnOnce(&mut VariantCollector)) -> Self {
		let mut collector = VariantCollector::default();
		build(&mut collector);
		FormatResponse::Variants(collector)
	}
}

/// Responses for request variants within one format
///
/// The first response registered for a variant wins.
#[derive(Debug, Clone, Default)]
pub struct VariantCollector {
	variants: IndexMap<String, FormatResponse>,
	none: Option<Box<FormatResponse>>,
	any: Option<Box<FormatResponse>>,
}

impl VariantCollector {
	pub fn variant(&mut self, name: impl Into<String>, response: FormatResponse) -> &mut Self {
		self.variants.entry(name.into()).or_insert(response);
		self
	}

	/// Response when the request has no variant
	pub fn none(&mut self, response: FormatResponse) -> &mut Self {
		self.none.get_or_insert_with(|| Box::new(response));
		self
	}

	/// Response when no registered variant matches
	pub fn any(&mut self, response: FormatResponse) -> &mut Self {
		self.any.get_or_insert_with(|| Box::new(response));
		self
	}

	/// Picks the response for the request's variants, in priority order
	pub fn response_for(&self, variants: &[String]) -> Option<&FormatResponse> {
		if variants.is_empty() {
			return self.none.as_deref().or(self.any.as_deref());
		}
		variants
			.iter()
			.find_map(|variant| self.variants.get(variant))
			.or(self.any.as_deref())
	}
}

type Handler = Arc<dyn Fn(&mut Collector, FormatResponse) + Send + Sync>;

/// Dispatch table from format symbol to handler
pub struct FormatDispatcher {
	registry: Arc<FormatRegistry>,
	handlers: RwLock<HashMap<String, Handler>>,
	listener: Mutex<Option<ListenerId>>,
}

impl FormatDispatcher {
	/// Builds handlers for every known format and subscribes to catalog growth
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use reinhardt_controller::FormatDispatcher;
	/// use reinhardt_mime::{FormatRegistry, MimeType};
	///
	/// let registry = Arc::new(FormatRegistry::with_defaults());
	/// let dispatcher = FormatDispatcher::new(Arc::clone(&registry));
	/// assert!(dispatcher.has_handler("json"));
	///
	/// registry.register(MimeType::new("ndjson", "application/x-ndjson").unwrap());
	/// assert!(dispatcher.has_handler("ndjson"));
	/// ```
	pub fn new(registry: Arc<FormatRegistry>) -> Arc<Self> {
		let dispatcher = Arc::new(Self {
			registry: Arc::clone(&registry),
			handlers: RwLock::new(HashMap::new()),
			listener: Mutex::new(None),
		});

		let weak = Arc::downgrade(&dispatcher);
		let id = registry.on_register(move |mime| {
			if let Some(dispatcher) = weak.upgrade() {
				dispatcher.install(mime);
			}
		});
		*dispatcher.listener.lock() = Some(id);

		for mime in registry.known() {
			dispatcher.install(&mime);
		}
		dispatcher
	}

	pub fn registry(&self) -> &Arc<FormatRegistry> {
		&self.registry
	}

	pub fn has_handler(&self, token: &str) -> bool {
		self.handlers.read().contains_key(token)
	}

	pub fn handler_count(&self) -> usize {
		self.handlers.read().len()
	}

	/// Invokes the handler for `token`
	///
	/// A token without a handler is resolved against the registry. Unknown
	/// tokens fail with [`RenderError::UnknownFormat`]; tokens known only as
	/// aliases fail with [`RenderError::NoSuchHandler`]. Otherwise the handler
	/// is generated and invoked once under the resolved symbol.
	pub fn dispatch(&self, token: &str, collector: &mut Collector, response: FormatResponse) -> Result<()> {
		if let Some(handler) = self.handler(token) {
			handler(collector, response);
			return Ok(());
		}

		let Some(mime) = self.registry.lookup(token) else {
			tracing::debug!(format = %token, "dispatch requested for unknown format");
			return Err(RenderError::UnknownFormat {
				format: token.to_string(),
			});
		};
		if !self.registry.is_negotiable(&mime) {
			return Err(RenderError::NoSuchHandler {
				format: token.to_string(),
			});
		}

		if self.install(&mime) {
			tracing::debug!(format = %token, symbol = %mime.symbol(), "materialized format handler on first use");
		}
		match self.handler(mime.symbol()) {
			Some(handler) => {
				handler(collector, response);
				Ok(())
			}
			None => Err(RenderError::NoSuchHandler {
				format: token.to_string(),
			}),
		}
	}

	fn handler(&self, token: &str) -> Option<Handler> {
		self.handlers.read().get(token).cloned()
	}

	/// Generates the handler for `mime` unless one exists; returns whether it
	/// was generated by this call
	fn install(&self, mime: &MimeType) -> bool {
		let installed = {
			let mut handlers = self.handlers.write();
			if handlers.contains_key(mime.symbol()) {
				false
			} else {
				handlers.insert(mime.symbol().to_string(), generate_handler(mime.clone()));
				true
			}
		};

		if let Err(error) = self.registry.mark_dispatchable(mime) {
			tracing::warn!(format = %mime.symbol(), %error, "format handler installed for unregistered format");
		}
		if installed {
			tracing::trace!(format = %mime.symbol(), "installed format handler");
		}
		installed
	}
}

fn generate_handler(mime: MimeType) -> Handler {
	Arc::new(move |collector: &mut Collector, response: FormatResponse| {
		collector.custom(mime.clone(), response);
	})
}

impl Drop for FormatDispatcher {
	fn drop(&mut self) {
		if let Some(id) = self.listener.lock().take() {
			self.registry.remove_listener(id);
		}
	}
}

impl fmt::Debug for FormatDispatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut formats: Vec<String> = self.handlers.read().keys().cloned().collect();
		formats.sort();
		f.debug_struct("FormatDispatcher")
			.field("handlers", &formats)
			.finish()
	}
}

macro_rules! format_shortcuts {
	($($name:ident),* $(,)?) => {
		$(
			#[doc = concat!("Registers the response for `", stringify!($name), "`")]
			pub fn $name(&mut self, response: FormatResponse) -> Result<&mut Self> {
				self.format(stringify!($name), response)
			}
		)*
	};
}

/// Per-format responses of one `respond_to` call, in registration order
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use reinhardt_controller::{Collector, FormatDispatcher, FormatResponse};
/// use reinhardt_mime::FormatRegistry;
///
/// let registry = Arc::new(FormatRegistry::with_defaults());
/// let mut collector = Collector::new(FormatDispatcher::new(Arc::clone(&registry)));
///
/// collector.html(FormatResponse::Default).unwrap();
/// collector.json(FormatResponse::render(serde_json::json!({"json": []}))).unwrap();
///
/// let json = registry.lookup("json").unwrap();
/// assert_eq!(collector.negotiate_format(&[json.clone()]), Some(json));
/// ```
#[derive(Debug)]
pub struct Collector {
	dispatcher: Arc<FormatDispatcher>,
	responses: IndexMap<MimeType, FormatResponse>,
}

impl Collector {
	pub fn new(dispatcher: Arc<FormatDispatcher>) -> Self {
		Self {
			dispatcher,
			responses: IndexMap::new(),
		}
	}

	/// Registers `response` for `mime`; a format keeps its first response
	pub fn custom(&mut self, mime: MimeType, response: FormatResponse) -> &mut Self {
		match self.responses.entry(mime) {
			Entry::Occupied(entry) => {
				tracing::trace!(format = %entry.key().symbol(), "ignored repeated format response");
			}
			Entry::Vacant(entry) => {
				entry.insert(response);
			}
		}
		self
	}

	/// Registers `response` for the format named `token`
	pub fn format(&mut self, token: &str, response: FormatResponse) -> Result<&mut Self> {
		let dispatcher = Arc::clone(&self.dispatcher);
		dispatcher.dispatch(token, self, response)?;
		Ok(self)
	}

	/// Registers `response` for any format
	pub fn any(&mut self, response: FormatResponse) -> &mut Self {
		self.custom(MimeType::all(), response)
	}

	/// Registers the same response for each of `tokens`
	pub fn any_of(&mut self, tokens: &[&str], response: FormatResponse) -> Result<&mut Self> {
		for token in tokens {
			self.format(token, response.clone())?;
		}
		Ok(self)
	}

	format_shortcuts!(html, text, js, css, csv, xml, rss, atom, yaml, json, pdf, zip);

	pub fn is_empty(&self) -> bool {
		self.responses.is_empty()
	}

	pub fn len(&self) -> usize {
		self.responses.len()
	}

	/// Registered formats in registration order
	pub fn formats(&self) -> impl Iterator<Item = &MimeType> {
		self.responses.keys()
	}

	/// Picks the format to respond with
	///
	/// Walks the request's formats in priority order: a `*/*` entry selects
	/// the first registered format, otherwise the first registered match
	/// wins. Without a match, an `any` response selects the request's most
	/// preferred format.
	pub fn negotiate_format(&self, formats: &[MimeType]) -> Option<MimeType> {
		for priority in formats {
			if priority.is_all() {
				return self.responses.keys().next().cloned();
			}
			if self.responses.contains_key(priority) {
				return Some(priority.clone());
			}
		}

		if self.responses.contains_key(&MimeType::all()) {
			formats.first().cloned()
		} else {
			None
		}
	}

	/// Whether `format` is served only by an `any` response
	pub fn is_any_response(&self, format: &MimeType) -> bool {
		!self.responses.contains_key(format) && self.responses.contains_key(&MimeType::all())
	}

	/// Response for `format` with variants resolved
	///
	/// A variant collector without a matching variant yields
	/// [`FormatResponse::Default`].
	pub fn response_for(&self, format: &MimeType, variants: &[String]) -> Option<FormatResponse> {
		let mut response = self
			.responses
			.get(format)
			.or_else(|| self.responses.get(&MimeType::all()))?;

		while let FormatResponse::Variants(collector) = response {
			match collector.response_for(variants) {
				Some(selected) => response = selected,
				None => return Some(FormatResponse::Default),
			}
		}
		Some(response.clone())
	}
}
