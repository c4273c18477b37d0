//! Process-wide format registry
//!
//! The registry knows every response format the application can produce and
//! tracks which of them currently have a dispatch handler. Entries are never
//! removed. Registering a new format after construction notifies growth
//! listeners so dependent dispatch tables can extend themselves.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;

use crate::defaults::default_formats;
use crate::media_type::MimeType;

/// Callback invoked with each format added to the registry
pub type GrowthListener = Arc<dyn Fn(&MimeType) + Send + Sync>;

/// Handle returned by [`FormatRegistry::on_register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("format `{0}` is not registered")]
	NotRegistered(String),
}

/// A caller-supplied format reference: a name or an already typed format
#[derive(Debug, Clone, Copy)]
pub enum FormatRef<'a> {
	Name(&'a str),
	Mime(&'a MimeType),
}

impl<'a> From<&'a str> for FormatRef<'a> {
	fn from(name: &'a str) -> Self {
		FormatRef::Name(name)
	}
}

impl<'a> From<&'a String> for FormatRef<'a> {
	fn from(name: &'a String) -> Self {
		FormatRef::Name(name.as_str())
	}
}

impl<'a> From<&'a MimeType> for FormatRef<'a> {
	fn from(mime: &'a MimeType) -> Self {
		FormatRef::Mime(mime)
	}
}

#[derive(Default)]
struct Catalog {
	known: IndexMap<String, MimeType>,
	aliases: HashMap<String, MimeType>,
	// extension -> symbol
	extensions: HashMap<String, String>,
}

impl Catalog {
	fn index_extensions(&mut self, mime: &MimeType) {
		self.extensions
			.entry(mime.symbol().to_string())
			.or_insert_with(|| mime.symbol().to_string());
		for extension in mime.extensions() {
			self.extensions
				.entry(extension.clone())
				.or_insert_with(|| mime.symbol().to_string());
		}
	}

	fn by_symbol(&self, symbol: &str) -> Option<&MimeType> {
		self.known.get(symbol).or_else(|| self.aliases.get(symbol))
	}
}

/// Registry of known and dispatchable response formats
///
/// # Examples
///
/// ```
/// use reinhardt_mime::{FormatRegistry, MimeType};
///
/// let registry = FormatRegistry::with_defaults();
/// assert!(registry.lookup("json").is_some());
/// assert!(registry.lookup("yml").is_some());
/// assert!(registry.lookup("mobile").is_none());
///
/// let mobile = MimeType::new("mobile", "text/x-mobile").unwrap();
/// assert!(registry.register(mobile.clone()));
/// assert!(!registry.register(mobile));
/// ```
pub struct FormatRegistry {
	catalog: RwLock<Catalog>,
	dispatchable: RwLock<HashSet<String>>,
	listeners: RwLock<Vec<(ListenerId, GrowthListener)>>,
	next_listener: AtomicU64,
}

static GLOBAL_REGISTRY: Lazy<Arc<FormatRegistry>> =
	Lazy::new(|| Arc::new(FormatRegistry::with_defaults()));

impl FormatRegistry {
	/// Creates an empty registry
	pub fn new() -> Self {
		Self {
			catalog: RwLock::new(Catalog::default()),
			dispatchable: RwLock::new(HashSet::new()),
			listeners: RwLock::new(Vec::new()),
			next_listener: AtomicU64::new(0),
		}
	}

	/// Creates a registry pre-loaded with the default catalog
	pub fn with_defaults() -> Self {
		let registry = Self::new();
		for mime in default_formats() {
			registry.register(mime);
		}
		registry
	}

	/// The process-wide registry, loaded with the default catalog on first use
	pub fn global() -> Arc<FormatRegistry> {
		Arc::clone(&GLOBAL_REGISTRY)
	}

	/// Adds `mime` to the known formats
	///
	/// Returns `true` when the format was not known before. Growth listeners
	/// are notified only for new formats, after the catalog lock is released.
	/// A format previously registered as an alias is promoted.
	pub fn register(&self, mime: MimeType) -> bool {
		{
			let mut catalog = self.catalog.write();
			if catalog.known.contains_key(mime.symbol()) {
				return false;
			}
			catalog.aliases.remove(mime.symbol());
			catalog.index_extensions(&mime);
			catalog.known.insert(mime.symbol().to_string(), mime.clone());
		}

		tracing::debug!(format = %mime.symbol(), media_type = %mime, "registered response format");
		self.notify(&mime);
		true
	}

	/// Makes `mime` resolvable through [`lookup`](Self::lookup) without making
	/// it available for response negotiation
	pub fn register_alias(&self, mime: MimeType) -> bool {
		let mut catalog = self.catalog.write();
		if catalog.by_symbol(mime.symbol()).is_some() {
			return false;
		}
		catalog.index_extensions(&mime);
		tracing::debug!(format = %mime.symbol(), "registered format alias");
		catalog.aliases.insert(mime.symbol().to_string(), mime);
		true
	}

	/// Resolves a format name (symbol or extension) or typed format
	///
	/// Returns `None` when nothing matches; this is not an error.
	pub fn lookup<'a>(&self, token: impl Into<FormatRef<'a>>) -> Option<MimeType> {
		let catalog = self.catalog.read();
		match token.into() {
			FormatRef::Mime(mime) => catalog.by_symbol(mime.symbol()).cloned(),
			FormatRef::Name(name) => catalog.by_symbol(name).cloned().or_else(|| {
				catalog
					.extensions
					.get(name)
					.and_then(|symbol| catalog.by_symbol(symbol))
					.cloned()
			}),
		}
	}

	/// Resolves a `type/subtype` string, including synonyms, to a known format
	pub fn lookup_media_type(&self, media_type: &str) -> Option<MimeType> {
		let catalog = self.catalog.read();
		catalog
			.known
			.values()
			.chain(catalog.aliases.values())
			.find(|mime| mime.matches_media_type(media_type))
			.cloned()
	}

	/// Known formats whose top-level type is `top_level`, in registration order
	pub fn lookup_top_level(&self, top_level: &str) -> Vec<MimeType> {
		self.catalog
			.read()
			.known
			.values()
			.filter(|mime| mime.top_level().eq_ignore_ascii_case(top_level))
			.cloned()
			.collect()
	}

	/// Whether `mime` takes part in response negotiation
	pub fn is_negotiable(&self, mime: &MimeType) -> bool {
		self.catalog.read().known.contains_key(mime.symbol())
	}

	/// All negotiable formats in registration order
	pub fn known(&self) -> Vec<MimeType> {
		self.catalog.read().known.values().cloned().collect()
	}

	/// Records that a dispatch handler exists for `mime`
	///
	/// Idempotent. Returns `true` when the format was not dispatchable before.
	pub fn mark_dispatchable(&self, mime: &MimeType) -> Result<bool, RegistryError> {
		if !self.is_negotiable(mime) {
			return Err(RegistryError::NotRegistered(mime.symbol().to_string()));
		}
		Ok(self.dispatchable.write().insert(mime.symbol().to_string()))
	}

	pub fn is_dispatchable(&self, mime: &MimeType) -> bool {
		self.dispatchable.read().contains(mime.symbol())
	}

	pub fn dispatchable_count(&self) -> usize {
		self.dispatchable.read().len()
	}

	/// Subscribes to catalog growth
	///
	/// The listener only sees formats registered after subscription.
	pub fn on_register<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&MimeType) + Send + Sync + 'static,
	{
		let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
		self.listeners.write().push((id, Arc::new(listener)));
		id
	}

	pub fn remove_listener(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.write();
		let before = listeners.len();
		listeners.retain(|(listener_id, _)| *listener_id != id);
		listeners.len() != before
	}

	fn notify(&self, mime: &MimeType) {
		let listeners: Vec<GrowthListener> = self
			.listeners
			.read()
			.iter()
			.map(|(_, listener)| Arc::clone(listener))
			.collect();

		for listener in listeners {
			listener(mime);
		}
	}
}

impl Default for FormatRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for FormatRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let catalog = self.catalog.read();
		f.debug_struct("FormatRegistry")
			.field("known", &catalog.known.keys().collect::<Vec<_>>())
			.field("aliases", &catalog.aliases.keys().collect::<Vec<_>>())
			.field("dispatchable", &self.dispatchable.read().len())
			.field("listeners", &self.listeners.read().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::sync::Mutex;

	#[fixture]
	fn registry() -> FormatRegistry {
		FormatRegistry::with_defaults()
	}

	fn mobile() -> MimeType {
		MimeType::new("mobile", "text/x-mobile")
			.unwrap()
			.with_extensions(["mob"])
	}

	#[rstest]
	fn test_register_is_idempotent(registry: FormatRegistry) {
		// Arrange
		let before = registry.known().len();

		// Act
		let first = registry.register(mobile());
		let second = registry.register(mobile());

		// Assert
		assert!(first);
		assert!(!second);
		assert_eq!(registry.known().len(), before + 1);
	}

	#[rstest]
	fn test_register_does_not_touch_dispatchable(registry: FormatRegistry) {
		registry.register(mobile());

		assert!(!registry.is_dispatchable(&mobile()));
		assert_eq!(registry.dispatchable_count(), 0);
	}

	#[rstest]
	#[case("json", "json")]
	#[case("yml", "yaml")]
	#[case("jpg", "jpeg")]
	#[case("txt", "text")]
	fn test_lookup_by_symbol_or_extension(
		registry: FormatRegistry,
		#[case] token: &str,
		#[case] expected: &str,
	) {
		let mime = registry.lookup(token).unwrap();

		assert_eq!(mime.symbol(), expected);
	}

	#[rstest]
	fn test_lookup_unknown_returns_none(registry: FormatRegistry) {
		assert!(registry.lookup("mobile").is_none());
		assert!(registry.lookup("").is_none());
	}

	#[rstest]
	fn test_lookup_typed_format_resolves_registered_entry(registry: FormatRegistry) {
		// Arrange
		let stale = MimeType::new("json", "text/x-json").unwrap();

		// Act
		let resolved = registry.lookup(&stale).unwrap();

		// Assert
		assert_eq!(resolved.media_type(), "application/json");
	}

	#[rstest]
	fn test_lookup_media_type_uses_synonyms(registry: FormatRegistry) {
		assert_eq!(registry.lookup_media_type("text/xml").unwrap().symbol(), "xml");
		assert_eq!(
			registry
				.lookup_media_type("application/xhtml+xml")
				.unwrap()
				.symbol(),
			"html"
		);
		assert!(registry.lookup_media_type("application/x-unknown").is_none());
	}

	#[rstest]
	fn test_alias_is_resolvable_but_not_negotiable(registry: FormatRegistry) {
		// Arrange
		let legacy = MimeType::new("legacy", "text/x-legacy").unwrap();

		// Act
		assert!(registry.register_alias(legacy.clone()));

		// Assert
		assert_eq!(registry.lookup("legacy"), Some(legacy.clone()));
		assert!(!registry.is_negotiable(&legacy));
		assert_eq!(
			registry.mark_dispatchable(&legacy),
			Err(RegistryError::NotRegistered("legacy".to_string()))
		);
	}

	#[rstest]
	fn test_register_promotes_alias(registry: FormatRegistry) {
		let legacy = MimeType::new("legacy", "text/x-legacy").unwrap();
		registry.register_alias(legacy.clone());

		assert!(registry.register(legacy.clone()));
		assert!(registry.is_negotiable(&legacy));
	}

	#[rstest]
	fn test_mark_dispatchable_requires_known(registry: FormatRegistry) {
		// Arrange
		let json = registry.lookup("json").unwrap();

		// Act & Assert
		assert_eq!(registry.mark_dispatchable(&json), Ok(true));
		assert_eq!(registry.mark_dispatchable(&json), Ok(false));
		assert!(registry.is_dispatchable(&json));
		assert!(registry.mark_dispatchable(&mobile()).is_err());
	}

	#[rstest]
	fn test_listener_notified_for_new_formats_only(registry: FormatRegistry) {
		// Arrange
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		registry.on_register(move |mime| sink.lock().unwrap().push(mime.symbol().to_string()));

		// Act
		registry.register(mobile());
		registry.register(mobile());
		registry.register(registry.lookup("json").unwrap());

		// Assert
		assert_eq!(*seen.lock().unwrap(), vec!["mobile".to_string()]);
	}

	#[rstest]
	fn test_listener_may_query_registry(registry: FormatRegistry) {
		// Arrange
		let registry = Arc::new(registry);
		let handle = Arc::downgrade(&registry);
		let seen = Arc::new(Mutex::new(false));
		let sink = Arc::clone(&seen);
		registry.on_register(move |mime| {
			if let Some(registry) = handle.upgrade() {
				*sink.lock().unwrap() = registry.mark_dispatchable(mime).unwrap();
			}
		});

		// Act
		registry.register(mobile());

		// Assert
		assert!(*seen.lock().unwrap());
		assert!(registry.is_dispatchable(&mobile()));
	}

	#[rstest]
	fn test_remove_listener(registry: FormatRegistry) {
		let calls = Arc::new(Mutex::new(0));
		let sink = Arc::clone(&calls);
		let id = registry.on_register(move |_| *sink.lock().unwrap() += 1);

		assert!(registry.remove_listener(id));
		assert!(!registry.remove_listener(id));
		registry.register(mobile());

		assert_eq!(*calls.lock().unwrap(), 0);
	}

	#[rstest]
	fn test_known_preserves_registration_order(registry: FormatRegistry) {
		let known = registry.known();

		assert_eq!(known[0].symbol(), "html");
		assert_eq!(known[1].symbol(), "text");
	}
}
