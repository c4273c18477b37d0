//! # Reinhardt Rendering
//!
//! Format dispatch and render pipeline for Reinhardt controllers.
//!
//! ## Crates
//!
//! - [`mime`] (`reinhardt-mime`): format registry, default MIME catalog and
//!   Accept header negotiation
//! - [`controller`] (`reinhardt-controller`): `respond_to` dispatch, render
//!   normalization and single-commit responses
//!
//! ## Feature Flags
//!
//! - `templates` (default) - Tera-backed [`TemplateBodyRenderer`]
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_rendering::prelude::*;
//! use serde_json::json;
//!
//! struct Plain;
//!
//! #[async_trait]
//! impl BodyRenderer for Plain {
//!     async fn render_to_body(&self, request: &RenderRequest, _: &Options) -> Result<Body, BoxError> {
//!         Ok(Body::from(request.payload().to_string()))
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = RenderEngine::builder(Plain).build().unwrap();
//! let mut controller = engine.controller("destroy", RequestInfo::new());
//!
//! controller
//!     .respond_to(|format| {
//!         format.html(FormatResponse::redirect("/users"))?;
//!         format.json(FormatResponse::head("no_content"))?;
//!         Ok(())
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(controller.response().status, StatusCode::FOUND);
//! # });
//! ```

pub use reinhardt_controller as controller;
pub use reinhardt_mime as mime;

pub use reinhardt_controller::{
	Body, BodyRenderer, BoxError, Collector, Controller, DefaultRenderHooks, Directive, FormatDispatcher,
	FormatResponse, Options, Parameters, PathUrlResolver, RenderArgs, RenderEngine, RenderError, RenderHooks,
	RenderRequest, RenderSettings, RequestInfo, Response, StatusArg, UrlResolver, VariantCollector,
};
#[cfg(feature = "templates")]
pub use reinhardt_controller::{TemplateBodyRenderer, TemplateError};
pub use reinhardt_mime::{AcceptHeader, FormatRegistry, MimeType};

pub use reinhardt_controller::StatusCode;

pub mod prelude {
	pub use crate::{
		Body,
		BodyRenderer,
		BoxError,
		Collector,
		Controller,
		FormatRegistry,
		FormatResponse,
		MimeType,
		Options,
		RenderArgs,
		RenderEngine,
		RenderError,
		RenderRequest,
		RequestInfo,
		StatusCode,
	};

	#[cfg(feature = "templates")]
	pub use crate::TemplateBodyRenderer;

	// External
	pub use async_trait::async_trait;
}
