//! Tera-backed body renderer
//!
//! Actions and files are looked up as templates, most specific name first:
//!
//! - `users/show.html+phone`
//! - `users/show.html`
//! - `users/show`
//!
//! Inline templates are evaluated with the same context. Raw `html`, `plain`
//! and `body` sources are returned as is, and renderer options such as
//! `json` are serialized.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;

use crate::body::Body;
use crate::error::BoxError;
use crate::hooks::BodyRenderer;
use crate::normalize::{Directive, InlineKind, Options, RenderRequest};

#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("missing template `{name}`, searched: {}", .searched.join(", "))]
	Missing { name: String, searched: Vec<String> },

	#[error("missing value for the `{0}` renderer")]
	MissingValue(String),

	#[error(transparent)]
	Tera(#[from] tera::Error),

	#[error(transparent)]
	Serialize(#[from] serde_json::Error),
}

/// Renders bodies from Tera templates
///
/// # Examples
///
/// ```
/// use reinhardt_controller::TemplateBodyRenderer;
///
/// let renderer = TemplateBodyRenderer::new();
/// renderer.add_template("users/show.html", "<h1>{{ name }}</h1>").unwrap();
/// assert!(renderer.has_template("users/show.html"));
/// ```
#[derive(Debug, Default)]
pub struct TemplateBodyRenderer {
	tera: RwLock<Tera>,
}

impl TemplateBodyRenderer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_tera(tera: Tera) -> Self {
		Self {
			tera: RwLock::new(tera),
		}
	}

	pub fn add_template(&self, name: &str, source: &str) -> Result<(), TemplateError> {
		self.tera.write().add_raw_template(name, source)?;
		Ok(())
	}

	pub fn has_template(&self, name: &str) -> bool {
		self.tera.read().get_template_names().any(|known| known == name)
	}

	/// Template names tried for `name`, most specific first
	pub fn candidates(name: &str, request: &RenderRequest) -> Vec<String> {
		let format = request
			.format_override
			.as_ref()
			.or_else(|| request.formats.iter().find(|format| !format.is_all()))
			.map(|format| format.symbol());

		let mut candidates = Vec::with_capacity(3);
		if let Some(format) = format {
			if let Some(variant) = &request.variant {
				candidates.push(format!("{}.{}+{}", name, format, variant));
			}
			candidates.push(format!("{}.{}", name, format));
		}
		candidates.push(name.to_string());
		candidates
	}

	fn render_named(&self, name: &str, request: &RenderRequest, context: &Context) -> Result<String, TemplateError> {
		let searched = Self::candidates(name, request);
		let tera = self.tera.read();
		let found = searched
			.iter()
			.find(|candidate| tera.get_template_names().any(|known| known == candidate.as_str()));

		match found {
			Some(template) => {
				tracing::trace!(%template, "rendering template");
				Ok(tera.render(template, context)?)
			}
			None => Err(TemplateError::Missing {
				name: name.to_string(),
				searched,
			}),
		}
	}

	fn render_request(&self, request: &RenderRequest, assigns: &Options) -> Result<Body, TemplateError> {
		let context = build_context(request, assigns)?;

		let text = match &request.directive {
			Directive::Inline {
				kind: InlineKind::Template,
				source,
			} => Tera::one_off(source, &context, true)?,
			Directive::Inline { source, .. } => source.clone(),
			Directive::File(name) | Directive::Action(name) => self.render_named(name, request, &context)?,
			Directive::Options { renderer } => match request.options.get(renderer) {
				Some(Value::String(text)) => text.clone(),
				Some(value) => serde_json::to_string(value)?,
				None => return Err(TemplateError::MissingValue(renderer.clone())),
			},
		};
		Ok(Body::from(text))
	}
}

#[async_trait]
impl BodyRenderer for TemplateBodyRenderer {
	async fn render_to_body(&self, request: &RenderRequest, assigns: &Options) -> Result<Body, BoxError> {
		Ok(self.render_request(request, assigns)?)
	}
}

/// Assigns overlaid with the `locals` option
fn build_context(request: &RenderRequest, assigns: &Options) -> Result<Context, TemplateError> {
	let mut values = assigns.clone();
	if let Some(Value::Object(locals)) = request.options.get("locals") {
		values.extend(locals.iter().map(|(name, value)| (name.clone(), value.clone())));
	}
	Ok(Context::from_serialize(Value::Object(values))?)
}
