//! Render argument normalization
//!
//! `render` accepts several call shapes. [`RenderNormalizer`] collapses them
//! into one [`RenderRequest`]:
//!
//! | Call shape                      | Directive                    |
//! |---------------------------------|------------------------------|
//! | no argument                     | current action               |
//! | `"show"`                        | action `show`                |
//! | `"users/show"`                  | file `users/show`            |
//! | `{"action": "show"}`            | action `show`                |
//! | `{"html": "<p>"}`               | inline HTML                  |
//! | `{"json": {...}}`               | options rendered as `json`   |
//! | permitted [`Parameters`]        | their content, as a mapping  |

use std::fmt;
use std::sync::Arc;

use hyper::StatusCode;
use reinhardt_mime::{FormatRegistry, MimeType, defaults};
use serde_json::{Map, Value};

use crate::error::{RenderError, Result};
use crate::hooks::RenderHooks;
use crate::status::StatusArg;

/// Render options keyed by name
pub type Options = Map<String, Value>;

// Option keys that never name a renderer
const RESERVED_KEYS: &[&str] = &[
	"status",
	"content_type",
	"formats",
	"variant",
	"variants",
	"layout",
	"locals",
	"location",
];

/// Request parameters that must be explicitly permitted before they can be
/// used as render options
pub trait ParameterGate: fmt::Debug + Send + Sync {
	fn is_permitted(&self) -> bool;
	fn to_options(&self) -> Options;
}

/// Parameter bag that is unpermitted until [`permit`](Parameters::permit) is called
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
	values: Options,
	permitted: bool,
}

impl Parameters {
	pub fn new(values: Options) -> Self {
		Self {
			values,
			permitted: false,
		}
	}

	pub fn permit(mut self) -> Self {
		self.permitted = true;
		self
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}
}

impl ParameterGate for Parameters {
	fn is_permitted(&self) -> bool {
		self.permitted
	}

	fn to_options(&self) -> Options {
		self.values.clone()
	}
}

/// First positional argument of a render call
#[derive(Debug, Clone)]
pub enum RenderArg {
	Value(Value),
	Parameters(Arc<dyn ParameterGate>),
}

/// Arguments of a render call: an optional first argument plus extra options
///
/// # Examples
///
/// ```
/// use reinhardt_controller::RenderArgs;
/// use serde_json::json;
///
/// let bare = RenderArgs::from("show");
/// let with_status = RenderArgs::from("show").with("status", 201);
/// let mapping = RenderArgs::from(json!({"json": {"id": 1}}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderArgs {
	first: Option<RenderArg>,
	extra: Options,
}

impl RenderArgs {
	/// Renders the current action
	pub fn new() -> Self {
		Self::default()
	}

	pub fn parameters(gate: impl ParameterGate + 'static) -> Self {
		Self {
			first: Some(RenderArg::Parameters(Arc::new(gate))),
			extra: Options::new(),
		}
	}

	/// Adds an extra option, merged over the first argument
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extra.insert(key.into(), value.into());
		self
	}

	pub fn first(&self) -> Option<&RenderArg> {
		self.first.as_ref()
	}

	pub fn extra(&self) -> &Options {
		&self.extra
	}
}

impl From<Value> for RenderArgs {
	fn from(value: Value) -> Self {
		Self {
			first: Some(RenderArg::Value(value)),
			extra: Options::new(),
		}
	}
}

impl From<&str> for RenderArgs {
	fn from(target: &str) -> Self {
		Self::from(Value::String(target.to_string()))
	}
}

impl From<String> for RenderArgs {
	fn from(target: String) -> Self {
		Self::from(Value::String(target))
	}
}

impl From<Options> for RenderArgs {
	fn from(options: Options) -> Self {
		Self::from(Value::Object(options))
	}
}

impl From<Parameters> for RenderArgs {
	fn from(parameters: Parameters) -> Self {
		Self::parameters(parameters)
	}
}

impl<A: Into<RenderArgs>> From<(A, Options)> for RenderArgs {
	fn from((first, extra): (A, Options)) -> Self {
		let mut args = first.into();
		args.extra.extend(extra);
		args
	}
}

/// Source kinds for inline bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
	Html,
	Plain,
	Body,
	/// An inline template to be evaluated by the body renderer
	Template,
}

impl InlineKind {
	const KEYS: [(&'static str, InlineKind); 4] = [
		("html", InlineKind::Html),
		("plain", InlineKind::Plain),
		("body", InlineKind::Body),
		("inline", InlineKind::Template),
	];
}

/// What a render request renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
	Inline { kind: InlineKind, source: String },
	File(String),
	Action(String),
	/// Options rendered by the named renderer (`json`, `xml`, ...)
	Options { renderer: String },
}

/// Canonical description of a render call
#[derive(Debug, Clone)]
pub struct RenderRequest {
	pub directive: Directive,
	/// Options after merging, variant folding and hook normalization
	pub options: Options,
	/// Action the request was made for
	pub action: String,
	/// Formats acceptable for this render, most preferred first
	pub formats: Vec<MimeType>,
	/// Format implied by the render call itself
	pub format_override: Option<MimeType>,
	pub variant: Option<String>,
	pub status: Option<StatusCode>,
	pub content_type: Option<String>,
	/// Raw HTML was supplied
	pub html: bool,
}

impl RenderRequest {
	/// The directive's payload: source, path, action name or renderer key
	pub fn payload(&self) -> &str {
		match &self.directive {
			Directive::Inline { source, .. } => source,
			Directive::File(path) => path,
			Directive::Action(action) => action,
			Directive::Options { renderer } => renderer,
		}
	}
}

/// Builds [`RenderRequest`]s for one controller invocation
pub struct RenderNormalizer<'a> {
	registry: &'a FormatRegistry,
	hooks: &'a dyn RenderHooks,
	action: &'a str,
	formats: &'a [MimeType],
	variants: &'a [String],
}

impl<'a> RenderNormalizer<'a> {
	pub fn new(registry: &'a FormatRegistry, hooks: &'a dyn RenderHooks, action: &'a str) -> Self {
		Self {
			registry,
			hooks,
			action,
			formats: &[],
			variants: &[],
		}
	}

	pub fn with_formats(mut self, formats: &'a [MimeType]) -> Self {
		self.formats = formats;
		self
	}

	pub fn with_variants(mut self, variants: &'a [String]) -> Self {
		self.variants = variants;
		self
	}

	/// Normalizes `args` into a render request
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_controller::{DefaultRenderHooks, Directive, RenderArgs, RenderNormalizer};
	/// use reinhardt_mime::FormatRegistry;
	///
	/// let registry = FormatRegistry::with_defaults();
	/// let normalizer = RenderNormalizer::new(&registry, &DefaultRenderHooks, "index");
	///
	/// let request = normalizer.normalize(RenderArgs::from("users/show")).unwrap();
	/// assert_eq!(request.directive, Directive::File("users/show".to_string()));
	///
	/// let request = normalizer.normalize(RenderArgs::new()).unwrap();
	/// assert_eq!(request.directive, Directive::Action("index".to_string()));
	/// ```
	pub fn normalize(&self, args: RenderArgs) -> Result<RenderRequest> {
		let RenderArgs { first, extra } = args;

		let (mut options, shorthand) = match first {
			None | Some(RenderArg::Value(Value::Null)) => (Options::new(), None),
			Some(RenderArg::Parameters(gate)) => {
				if !gate.is_permitted() {
					tracing::warn!(action = %self.action, "rejected unpermitted parameters passed to render");
					return Err(RenderError::ForbiddenParameters);
				}
				(gate.to_options(), None)
			}
			Some(RenderArg::Value(Value::Object(map))) => (map, None),
			Some(RenderArg::Value(Value::String(target))) => (Options::new(), Some(target)),
			Some(RenderArg::Value(other)) => {
				return Err(RenderError::invalid_argument(format!(
					"{} is not a valid render target",
					other
				)));
			}
		};

		options.extend(extra);
		if let Some(target) = shorthand {
			insert_shorthand(&mut options, target)?;
		}

		let variant = self.fold_variants(&mut options)?;
		let options = self.hooks.normalize_options(options);

		let directive = self.classify(&options)?;
		let html = matches!(
			directive,
			Directive::Inline {
				kind: InlineKind::Html,
				..
			}
		);

		let mut formats = self.formats.to_vec();
		let format_override = match self.requested_formats(&options)? {
			Some(requested) => {
				let first = requested.first().cloned();
				formats = requested;
				first
			}
			None => self.implied_format(&directive),
		};

		let status = options
			.get("status")
			.map(|status| StatusArg::from(status).resolve(StatusCode::OK))
			.transpose()?;

		let content_type = match options.get("content_type") {
			None | Some(Value::Null) => None,
			Some(Value::String(content_type)) => Some(content_type.clone()),
			Some(other) => {
				return Err(RenderError::invalid_argument(format!(
					"{} is not a valid value for `content_type`.",
					other
				)));
			}
		};

		tracing::trace!(action = %self.action, directive = ?directive, "normalized render arguments");

		Ok(RenderRequest {
			directive,
			options,
			action: self.action.to_string(),
			formats,
			format_override,
			variant,
			status,
			content_type,
			html,
		})
	}

	/// Applies a `variants` mapping for the first negotiated variant it names
	fn fold_variants(&self, options: &mut Options) -> Result<Option<String>> {
		let explicit = match options.get("variant") {
			None | Some(Value::Null) => None,
			Some(Value::String(variant)) => Some(variant.clone()),
			Some(other) => {
				return Err(RenderError::invalid_argument(format!(
					"{} is not a valid value for `variant`.",
					other
				)));
			}
		};
		let fallback = explicit.clone().or_else(|| self.variants.first().cloned());

		let Some(raw) = options.remove("variants") else {
			return Ok(fallback);
		};
		let Value::Object(mut per_variant) = raw else {
			return Err(RenderError::invalid_argument(
				"`variants` must map variant names to render options",
			));
		};

		let matched = explicit
			.iter()
			.chain(self.variants.iter())
			.find(|variant| per_variant.contains_key(variant.as_str()))
			.cloned();
		let Some(variant) = matched else {
			return Ok(fallback);
		};

		match per_variant.remove(&variant) {
			Some(Value::Object(sub_options)) => options.extend(sub_options),
			Some(Value::String(target)) => insert_shorthand(options, target)?,
			Some(Value::Null) | None => {}
			Some(other) => {
				return Err(RenderError::invalid_argument(format!(
					"{} is not a valid render target for variant `{}`",
					other, variant
				)));
			}
		}
		Ok(Some(variant))
	}

	fn classify(&self, options: &Options) -> Result<Directive> {
		for (key, kind) in InlineKind::KEYS {
			if let Some(value) = options.get(key) {
				return Ok(Directive::Inline {
					kind,
					source: text_option(key, value)?,
				});
			}
		}
		if let Some(value) = options.get("file") {
			return Ok(Directive::File(text_option("file", value)?));
		}
		if let Some(value) = options.get("template") {
			return Ok(Directive::File(text_option("template", value)?));
		}
		if let Some(value) = options.get("action") {
			return Ok(Directive::Action(text_option("action", value)?));
		}

		let renderer = options.keys().find(|key| {
			!RESERVED_KEYS.contains(&key.as_str())
				&& self
					.registry
					.lookup(key.as_str())
					.is_some_and(|mime| self.registry.is_negotiable(&mime))
		});
		Ok(match renderer {
			Some(renderer) => Directive::Options {
				renderer: renderer.clone(),
			},
			None => Directive::Action(self.action.to_string()),
		})
	}

	/// Formats named by a `formats` option
	fn requested_formats(&self, options: &Options) -> Result<Option<Vec<MimeType>>> {
		let tokens: Vec<&Value> = match options.get("formats") {
			None | Some(Value::Null) => return Ok(None),
			Some(Value::Array(tokens)) => tokens.iter().collect(),
			Some(token) => vec![token],
		};

		tokens
			.into_iter()
			.map(|token| {
				let name = token.as_str().ok_or_else(|| {
					RenderError::invalid_argument(format!("{} is not a valid format", token))
				})?;
				self.registry
					.lookup(name)
					.ok_or_else(|| RenderError::UnknownFormat {
						format: name.to_string(),
					})
			})
			.collect::<Result<Vec<_>>>()
			.map(Some)
	}

	fn implied_format(&self, directive: &Directive) -> Option<MimeType> {
		match directive {
			Directive::Inline {
				kind: InlineKind::Html,
				..
			} => Some(defaults::html()),
			Directive::Inline {
				kind: InlineKind::Plain,
				..
			} => Some(defaults::text()),
			Directive::Options { renderer } => self.registry.lookup(renderer.as_str()),
			_ => None,
		}
	}
}

/// `"show"` renders an action, `"users/show"` a file
fn insert_shorthand(options: &mut Options, target: String) -> Result<()> {
	if target.is_empty() {
		return Err(RenderError::invalid_argument("render target must not be empty"));
	}
	let key = if target.contains('/') { "file" } else { "action" };
	options.insert(key.to_string(), Value::String(target));
	Ok(())
}

fn text_option(key: &str, value: &Value) -> Result<String> {
	match value {
		Value::String(text) => Ok(text.clone()),
		Value::Number(_) | Value::Bool(_) => Ok(value.to_string()),
		other => Err(RenderError::invalid_argument(format!(
			"{} is not a valid value for `{}`.",
			other, key
		))),
	}
}
