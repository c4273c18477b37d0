//! # Reinhardt MIME
//!
//! Response format registry for Reinhardt controllers.
//!
//! ## Overview
//!
//! - [`MimeType`]: a format token (`html`, `json`, ...) and its media type
//! - [`FormatRegistry`]: the append-only catalog of known formats, the set of
//!   formats with a dispatch handler, and catalog-growth notifications
//! - [`AcceptHeader`]: Accept header parsing and resolution against a registry
//!
//! ## Examples
//!
//! ```
//! use reinhardt_mime::{AcceptHeader, FormatRegistry, MimeType};
//!
//! let registry = FormatRegistry::with_defaults();
//! registry.register(MimeType::new("ndjson", "application/x-ndjson").unwrap());
//!
//! let formats = AcceptHeader::parse("application/x-ndjson, text/html;q=0.5").resolve(&registry);
//! assert_eq!(formats[0].symbol(), "ndjson");
//! assert_eq!(formats[1].symbol(), "html");
//! ```

pub mod accept;
pub mod defaults;
pub mod media_type;
pub mod registry;

pub use accept::{AcceptEntry, AcceptHeader};
pub use defaults::default_formats;
pub use media_type::{MimeError, MimeType};
pub use registry::{FormatRef, FormatRegistry, GrowthListener, ListenerId, RegistryError};
