//! Registry behaviour under concurrent registration and lookup

use reinhardt_mime::{FormatRegistry, MimeType};
use rstest::rstest;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn custom(index: usize) -> MimeType {
	MimeType::new(format!("custom_{}", index), format!("application/x-custom-{}", index)).unwrap()
}

#[rstest]
fn test_racing_registration_notifies_once_per_format() {
	// Arrange
	let registry = Arc::new(FormatRegistry::with_defaults());
	let notifications = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&notifications);
	registry.on_register(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	});
	let barrier = Arc::new(Barrier::new(8));

	// Act - eight threads register the same four formats
	let handles: Vec<_> = (0..8)
		.map(|_| {
			let registry = Arc::clone(&registry);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				for index in 0..4 {
					registry.register(custom(index));
					assert!(registry.lookup("json").is_some());
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	// Assert
	assert_eq!(notifications.load(Ordering::SeqCst), 4);
	for index in 0..4 {
		assert!(registry.lookup(format!("custom_{}", index).as_str()).is_some());
	}
}

#[rstest]
fn test_concurrent_mark_dispatchable_is_idempotent() {
	// Arrange
	let registry = Arc::new(FormatRegistry::with_defaults());
	let json = registry.lookup("json").unwrap();

	// Act
	let newly_marked: usize = (0..6)
		.map(|_| {
			let registry = Arc::clone(&registry);
			let json = json.clone();
			thread::spawn(move || registry.mark_dispatchable(&json).unwrap())
		})
		.collect::<Vec<_>>()
		.into_iter()
		.map(|handle| handle.join().unwrap() as usize)
		.sum();

	// Assert
	assert_eq!(newly_marked, 1);
	assert_eq!(registry.dispatchable_count(), 1);
}

#[rstest]
#[serial(global_registry)]
fn test_global_registry_is_shared() {
	// Arrange
	let first = FormatRegistry::global();
	let second = FormatRegistry::global();

	// Act
	first.register(MimeType::new("global_probe", "application/x-global-probe").unwrap());

	// Assert
	assert!(Arc::ptr_eq(&first, &second));
	assert!(second.lookup("global_probe").is_some());
	assert!(second.lookup("html").is_some());
}
