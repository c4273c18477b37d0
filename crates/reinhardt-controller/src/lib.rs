//! # Reinhardt Controller
//!
//! Render pipeline for Reinhardt controllers.
//!
//! ## Overview
//!
//! - [`FormatDispatcher`] and [`Collector`]: per-format responses for
//!   `respond_to`, with handlers generated for formats registered at any time
//! - [`RenderNormalizer`]: collapses the accepted `render` call shapes into a
//!   [`RenderRequest`]
//! - [`Controller`]: `render`, `render_to_string`, `redirect_to`, `head` and
//!   `respond_to` over a response that is committed at most once
//! - [`TemplateBodyRenderer`]: Tera-backed [`BodyRenderer`] (`templates`
//!   feature, on by default)
//!
//! ## Examples
//!
//! ```
//! use reinhardt_controller::{FormatResponse, RenderEngine, RequestInfo, TemplateBodyRenderer};
//! use serde_json::json;
//!
//! # futures::executor::block_on(async {
//! let templates = TemplateBodyRenderer::new();
//! templates.add_template("show.html", "<h1>{{ title }}</h1>").unwrap();
//!
//! let engine = RenderEngine::builder(templates).build().unwrap();
//! let mut controller = engine.controller("show", RequestInfo::new().with_accept("application/json"));
//!
//! controller
//!     .respond_to(|format| {
//!         format.html(FormatResponse::Default)?;
//!         format.json(FormatResponse::render(json!({"json": {"title": "Hello"}})))?;
//!         Ok(())
//!     })
//!     .await
//!     .unwrap();
//!
//! let response = controller.into_response();
//! assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
//! assert_eq!(response.body.as_bytes().unwrap().as_ref(), br#"{"title":"Hello"}"#);
//! # });
//! ```

pub mod body;
pub mod collector;
pub mod controller;
pub mod error;
pub mod head;
pub mod hooks;
pub mod normalize;
pub mod request;
pub mod response;
pub mod settings;
pub mod status;
#[cfg(feature = "templates")]
pub mod template;

pub use body::{Body, StreamBody};
pub use collector::{Collector, FormatDispatcher, FormatResponse, VariantCollector};
pub use controller::{Controller, RenderEngine, RenderEngineBuilder};
pub use error::{BoxError, RenderError, Result};
pub use head::{canonical_header_name, includes_content};
pub use hooks::{BodyRenderer, DefaultRenderHooks, PROTECTED_ASSIGNS, PathUrlResolver, RenderHooks, UrlResolver};
pub use normalize::{
	Directive, InlineKind, Options, ParameterGate, Parameters, RenderArg, RenderArgs, RenderNormalizer,
	RenderRequest,
};
pub use request::RequestInfo;
pub use response::{Response, ResponseState};
pub use settings::{FormatDefinition, RenderSettings, SettingsError};
pub use status::StatusArg;
#[cfg(feature = "templates")]
pub use template::{TemplateBodyRenderer, TemplateError};

pub use hyper::{HeaderMap, StatusCode};
pub use reinhardt_mime::{FormatRegistry, MimeType};
