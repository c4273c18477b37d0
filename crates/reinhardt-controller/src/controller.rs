//! Render engine and per-request controller
//!
//! A [`RenderEngine`] is built once per application and shared between
//! requests. Each request gets its own [`Controller`], which owns the
//! request's [`ResponseState`] and enforces that at most one of `render`,
//! `redirect_to` or `head` commits a response.

use std::sync::Arc;

use hyper::StatusCode;
use hyper::header::{CONTENT_TYPE, HeaderValue, VARY};
use reinhardt_mime::{FormatRegistry, MimeType, defaults};
use serde_json::Value;

use crate::body::Body;
use crate::collector::{Collector, FormatDispatcher, FormatResponse};
use crate::error::{RenderError, Result};
use crate::head::{HeadPlan, includes_content};
use crate::hooks::{BodyRenderer, DefaultRenderHooks, PathUrlResolver, RenderHooks, UrlResolver};
use crate::normalize::{Options, RenderArgs, RenderNormalizer, RenderRequest};
use crate::request::RequestInfo;
use crate::response::{Response, ResponseState};
use crate::settings::{RenderSettings, SettingsError};
use crate::status::StatusArg;

/// Shared render pipeline: registry, dispatcher and collaborators
pub struct RenderEngine {
	registry: Arc<FormatRegistry>,
	dispatcher: Arc<FormatDispatcher>,
	renderer: Arc<dyn BodyRenderer>,
	urls: Arc<dyn UrlResolver>,
	hooks: Arc<dyn RenderHooks>,
	settings: RenderSettings,
}

impl RenderEngine {
	/// Starts building an engine around `renderer`
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use async_trait::async_trait;
	/// use reinhardt_controller::{Body, BodyRenderer, BoxError, Options, RenderEngine, RenderRequest, RequestInfo};
	/// use reinhardt_mime::FormatRegistry;
	///
	/// struct Echo;
	///
	/// #[async_trait]
	/// impl BodyRenderer for Echo {
	///     async fn render_to_body(&self, request: &RenderRequest, _: &Options) -> Result<Body, BoxError> {
	///         Ok(Body::from(request.payload().to_string()))
	///     }
	/// }
	///
	/// let engine = RenderEngine::builder(Echo)
	///     .registry(Arc::new(FormatRegistry::with_defaults()))
	///     .build()
	///     .unwrap();
	/// let controller = engine.controller("index", RequestInfo::new());
	/// assert_eq!(controller.rendered_format().symbol(), "html");
	/// ```
	pub fn builder(renderer: impl BodyRenderer + 'static) -> RenderEngineBuilder {
		RenderEngineBuilder {
			registry: None,
			renderer: Arc::new(renderer),
			urls: Arc::new(PathUrlResolver),
			hooks: Arc::new(DefaultRenderHooks),
			settings: RenderSettings::default(),
		}
	}

	pub fn registry(&self) -> &Arc<FormatRegistry> {
		&self.registry
	}

	pub fn dispatcher(&self) -> &Arc<FormatDispatcher> {
		&self.dispatcher
	}

	pub fn settings(&self) -> &RenderSettings {
		&self.settings
	}

	/// A controller for one request to `action`
	pub fn controller(self: &Arc<Self>, action: impl Into<String>, request: RequestInfo) -> Controller {
		Controller::new(Arc::clone(self), action.into(), request)
	}
}

impl std::fmt::Debug for RenderEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderEngine")
			.field("registry", &self.registry)
			.field("dispatcher", &self.dispatcher)
			.field("settings", &self.settings)
			.finish_non_exhaustive()
	}
}

pub struct RenderEngineBuilder {
	registry: Option<Arc<FormatRegistry>>,
	renderer: Arc<dyn BodyRenderer>,
	urls: Arc<dyn UrlResolver>,
	hooks: Arc<dyn RenderHooks>,
	settings: RenderSettings,
}

impl RenderEngineBuilder {
	/// Registry to dispatch against; a registry with the default catalog
	/// is created when none is given
	pub fn registry(mut self, registry: Arc<FormatRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn url_resolver(mut self, urls: impl UrlResolver + 'static) -> Self {
		self.urls = Arc::new(urls);
		self
	}

	pub fn hooks(mut self, hooks: impl RenderHooks + 'static) -> Self {
		self.hooks = Arc::new(hooks);
		self
	}

	pub fn settings(mut self, settings: RenderSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Registers configured formats and builds the dispatch table
	pub fn build(self) -> std::result::Result<Arc<RenderEngine>, SettingsError> {
		let registry = self
			.registry
			.unwrap_or_else(|| Arc::new(FormatRegistry::with_defaults()));
		let added = self.settings.register_formats(&registry)?;
		let dispatcher = FormatDispatcher::new(Arc::clone(&registry));
		tracing::debug!(
			configured_formats = added,
			handlers = dispatcher.handler_count(),
			"render engine ready"
		);

		Ok(Arc::new(RenderEngine {
			registry,
			dispatcher,
			renderer: self.renderer,
			urls: self.urls,
			hooks: self.hooks,
			settings: self.settings,
		}))
	}
}

/// Render entry points for one request
#[derive(Debug)]
pub struct Controller {
	engine: Arc<RenderEngine>,
	action: String,
	request: RequestInfo,
	formats: Vec<MimeType>,
	assigns: Options,
	state: ResponseState,
}

impl Controller {
	fn new(engine: Arc<RenderEngine>, action: String, request: RequestInfo) -> Self {
		let formats = request.negotiate_formats(&engine.registry);
		let mut response = Response::new(StatusCode::OK);
		if !engine.settings.default_charset.is_empty() {
			response = response.with_charset(engine.settings.default_charset.clone());
		}

		Self {
			engine,
			action,
			request,
			formats,
			assigns: Options::new(),
			state: ResponseState::new(response),
		}
	}

	pub fn action_name(&self) -> &str {
		&self.action
	}

	pub fn request(&self) -> &RequestInfo {
		&self.request
	}

	/// Formats acceptable for this request, most preferred first
	pub fn formats(&self) -> &[MimeType] {
		&self.formats
	}

	/// Exposes `value` to views as `name`
	pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.assigns.insert(name.into(), value.into());
		self
	}

	/// Assigns visible to views: everything except protected names
	pub fn view_assigns(&self) -> Options {
		let mut protected = self.engine.hooks.protected_assigns();
		protected.extend(self.engine.settings.protected_assigns.iter().cloned());

		self.assigns
			.iter()
			.filter(|(name, _)| !protected.iter().any(|p| p == *name))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect()
	}

	/// Format a render without an explicit format produces
	pub fn rendered_format(&self) -> MimeType {
		self.engine.hooks.rendered_format(&self.formats)
	}

	/// Whether a response has been committed
	pub fn is_performed(&self) -> bool {
		self.state.is_committed()
	}

	pub fn response(&self) -> &Response {
		self.state.response()
	}

	/// The response before it is committed, for adjusting headers
	pub fn response_mut(&mut self) -> Result<&mut Response> {
		self.state.pending_mut()
	}

	pub fn into_response(self) -> Response {
		self.state.into_response()
	}

	/// Renders and commits the response
	///
	/// Fails with [`RenderError::DoubleRender`] before normalizing anything
	/// when a response was already committed. Errors from normalization or
	/// the body renderer leave the response uncommitted.
	pub async fn render(&mut self, args: impl Into<RenderArgs>) -> Result<()> {
		let mut response = self.state.draft()?;
		let request = self.normalize(args.into())?;
		let body = self.produce_body(&request).await?;

		if let Some(status) = request.status {
			response.status = status;
		}
		self.apply_content_type(&mut response, &request)?;
		self.apply_vary(&mut response);
		response.body = body;

		tracing::debug!(
			action = %self.action,
			status = %response.status,
			content_type = response.content_type().unwrap_or_default(),
			"rendered"
		);
		self.state.commit(response)
	}

	/// Renders a body without touching the response
	pub async fn render_to_body(&self, args: impl Into<RenderArgs>) -> Result<Body> {
		let request = self.normalize(args.into())?;
		self.produce_body(&request).await
	}

	/// Renders a body to a string without touching the response
	pub async fn render_to_string(&self, args: impl Into<RenderArgs>) -> Result<String> {
		let bytes = self
			.render_to_body(args)
			.await?
			.collect()
			.await
			.map_err(RenderError::Body)?;
		String::from_utf8(bytes.to_vec()).map_err(|error| RenderError::Body(Box::new(error)))
	}

	/// Redirects to `location`, `302 Found` unless `status` says otherwise
	pub fn redirect_to(&mut self, location: impl Into<Value>, status: impl Into<StatusArg>) -> Result<()> {
		let mut response = self.state.draft()?;
		let status = status.into().resolve(StatusCode::FOUND)?;
		let url = self.engine.urls.url_for(&location.into())?;

		response.status = status;
		response.set_location(&url)?;
		response.body = Body::Empty;

		tracing::debug!(action = %self.action, %status, location = %url, "redirected");
		self.state.commit(response)
	}

	/// Commits a response without a body
	///
	/// `location` and `content_type` in `options` are applied as the response
	/// location and content type; every other key becomes a header. Returns
	/// `true` once committed.
	pub fn head(&mut self, status: impl Into<StatusArg>, options: Options) -> Result<bool> {
		let plan = HeadPlan::new(status.into(), options)?;
		let explicit_type = plan
			.content_type
			.as_deref()
			.map(|content_type| self.resolve_content_type(content_type))
			.transpose()?;
		let mut response = self.state.draft()?;

		for (name, value) in plan.headers {
			response.headers.insert(name, value);
		}
		response.status = plan.status;
		if let Some(location) = &plan.location {
			let url = self.engine.urls.url_for(location)?;
			response.set_location(&url)?;
		}

		if includes_content(plan.status) {
			if response.media_type().is_none() {
				let content_type =
					explicit_type.unwrap_or_else(|| self.head_format().media_type().to_string());
				response.set_content_type(&content_type)?;
			}
			response.set_charset(None)?;
		} else {
			response.headers.remove(CONTENT_TYPE);
		}
		response.body = Body::Empty;

		self.state.commit(response)?;
		Ok(true)
	}

	/// Responds with the first registered format the request accepts
	///
	/// Fails with [`RenderError::NotAcceptable`] when none matches.
	pub async fn respond_to<F>(&mut self, build: F) -> Result<()>
	where
		F: FnOnce(&mut Collector) -> Result<()>,
	{
		if self.state.is_committed() {
			return Err(RenderError::DoubleRender);
		}

		let mut collector = Collector::new(Arc::clone(&self.engine.dispatcher));
		build(&mut collector)?;

		let Some(negotiated) = collector.negotiate_format(&self.formats) else {
			let formats: Vec<String> = self.formats.iter().map(|f| f.symbol().to_string()).collect();
			tracing::debug!(action = %self.action, ?formats, "no acceptable format");
			return Err(RenderError::NotAcceptable { formats });
		};
		let format = if negotiated.is_all() {
			self.rendered_format()
		} else {
			negotiated
		};

		let response = collector
			.response_for(&format, &self.request.variants)
			.unwrap_or_default();
		tracing::trace!(action = %self.action, format = %format.symbol(), "negotiated response format");
		self.formats = vec![format];

		match response {
			FormatResponse::Default | FormatResponse::Variants(_) => self.render(RenderArgs::new()).await,
			FormatResponse::Render(args) => self.render(args).await,
			FormatResponse::Head(status, options) => self.head(status, options).map(|_| ()),
			FormatResponse::Redirect(location, status) => self.redirect_to(location, status),
		}
	}

	fn normalize(&self, args: RenderArgs) -> Result<RenderRequest> {
		RenderNormalizer::new(&self.engine.registry, self.engine.hooks.as_ref(), &self.action)
			.with_formats(&self.formats)
			.with_variants(&self.request.variants)
			.normalize(args)
	}

	async fn produce_body(&self, request: &RenderRequest) -> Result<Body> {
		let assigns = self.view_assigns();
		self.engine
			.renderer
			.render_to_body(request, &assigns)
			.await
			.map_err(RenderError::Body)
	}

	fn apply_content_type(&self, response: &mut Response, request: &RenderRequest) -> Result<()> {
		if request.html {
			return response.set_content_type(defaults::html().media_type());
		}
		if let Some(content_type) = &request.content_type {
			return response.set_content_type(content_type);
		}
		if response.media_type().is_none() {
			let format = request
				.format_override
				.clone()
				.unwrap_or_else(|| self.engine.hooks.rendered_format(&request.formats));
			response.set_content_type(format.media_type())?;
		}
		Ok(())
	}

	fn apply_vary(&self, response: &mut Response) {
		if self.engine.settings.vary_on_accept
			&& self.request.uses_accept_header()
			&& !response.headers.contains_key(VARY)
		{
			response.headers.insert(VARY, HeaderValue::from_static("Accept"));
		}
	}

	/// Literal media types pass through; anything else is a format token
	fn resolve_content_type(&self, content_type: &str) -> Result<String> {
		if content_type.contains('/') {
			return Ok(content_type.to_string());
		}
		self.engine
			.registry
			.lookup(content_type)
			.map(|format| format.media_type().to_string())
			.ok_or_else(|| RenderError::UnknownFormat {
				format: content_type.to_string(),
			})
	}

	fn head_format(&self) -> MimeType {
		self.formats
			.iter()
			.find(|format| !format.is_all())
			.cloned()
			.or_else(|| {
				self.engine
					.registry
					.lookup(self.engine.settings.default_head_format.as_str())
			})
			.unwrap_or_else(defaults::html)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::BoxError;
	use async_trait::async_trait;
	use rstest::{fixture, rstest};
	use serde_json::json;

	struct PayloadRenderer;

	#[async_trait]
	impl BodyRenderer for PayloadRenderer {
		async fn render_to_body(
			&self,
			request: &RenderRequest,
			_assigns: &Options,
		) -> std::result::Result<Body, BoxError> {
			Ok(Body::from(request.payload().to_string()))
		}
	}

	#[fixture]
	fn engine() -> Arc<RenderEngine> {
		RenderEngine::builder(PayloadRenderer)
			.registry(Arc::new(FormatRegistry::with_defaults()))
			.settings(RenderSettings {
				protected_assigns: vec!["current_user".to_string()],
				..RenderSettings::default()
			})
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_view_assigns_hide_protected_names(engine: Arc<RenderEngine>) {
		// Arrange
		let mut controller = engine.controller("index", RequestInfo::new());
		controller
			.assign("title", "Users")
			.assign("action_name", "index")
			.assign("prefixes", json!(["users"]))
			.assign("current_user", json!({"id": 1}));

		// Act
		let assigns = controller.view_assigns();

		// Assert
		assert_eq!(assigns.len(), 1);
		assert_eq!(assigns["title"], json!("Users"));
	}

	#[rstest]
	#[case(RequestInfo::new(), "html")]
	#[case(RequestInfo::new().with_accept("application/json"), "json")]
	#[case(RequestInfo::new().with_format("mobile"), "text")]
	fn test_rendered_format(engine: Arc<RenderEngine>, #[case] request: RequestInfo, #[case] expected: &str) {
		let controller = engine.controller("index", request);

		assert_eq!(controller.rendered_format().symbol(), expected);
	}

	#[rstest]
	fn test_head_format_falls_back_to_setting(engine: Arc<RenderEngine>) {
		let controller = engine.controller("index", RequestInfo::new().with_format("mobile"));

		assert_eq!(controller.head_format().symbol(), "html");
	}

	#[rstest]
	#[tokio::test]
	async fn test_render_to_string_uses_payload(engine: Arc<RenderEngine>) {
		let controller = engine.controller("index", RequestInfo::new());

		let output = controller.render_to_string("users/show").await.unwrap();

		assert_eq!(output, "users/show");
		assert!(!controller.is_performed());
	}

	#[rstest]
	fn test_build_registers_configured_formats() {
		// Arrange
		let registry = Arc::new(FormatRegistry::with_defaults());
		let settings = RenderSettings::from_toml_str(
			r#"
			[[formats]]
			symbol = "ndjson"
			media_type = "application/x-ndjson"
			"#,
		)
		.unwrap();

		// Act
		let engine = RenderEngine::builder(PayloadRenderer)
			.registry(Arc::clone(&registry))
			.settings(settings)
			.build()
			.unwrap();

		// Assert
		assert!(engine.dispatcher().has_handler("ndjson"));
		assert!(registry.is_dispatchable(&registry.lookup("ndjson").unwrap()));
	}
}
