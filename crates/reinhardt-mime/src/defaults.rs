//! Formats registered by [`FormatRegistry::with_defaults`](crate::FormatRegistry::with_defaults)

use crate::media_type::MimeType;

// (symbol, media type, synonyms, extensions)
const DEFAULT_FORMATS: &[(&str, &str, &[&str], &[&str])] = &[
	("html", "text/html", &["application/xhtml+xml"], &["xhtml"]),
	("text", "text/plain", &[], &["txt"]),
	(
		"js",
		"text/javascript",
		&["application/javascript", "application/x-javascript"],
		&[],
	),
	("css", "text/css", &[], &[]),
	("ics", "text/calendar", &[], &[]),
	("csv", "text/csv", &[], &[]),
	("vcf", "text/vcard", &[], &[]),
	("vtt", "text/vtt", &[], &["vtt"]),
	("png", "image/png", &[], &["png"]),
	("jpeg", "image/jpeg", &[], &["jpg", "jpeg", "jpe", "pjpeg"]),
	("gif", "image/gif", &[], &["gif"]),
	("bmp", "image/bmp", &[], &["bmp"]),
	("tiff", "image/tiff", &[], &["tif", "tiff"]),
	("svg", "image/svg+xml", &[], &[]),
	("webp", "image/webp", &[], &["webp"]),
	("mpeg", "video/mpeg", &[], &["mpg", "mpeg", "mpe"]),
	("mp3", "audio/mpeg", &[], &["mp1", "mp2", "mp3"]),
	("ogg", "audio/ogg", &[], &["oga", "ogg", "spx", "opus"]),
	("m4a", "audio/aac", &["audio/mp4"], &["m4a", "mpg4", "aac"]),
	("webm", "video/webm", &[], &["webm"]),
	("mp4", "video/mp4", &[], &["mp4", "m4v"]),
	("otf", "font/otf", &[], &["otf"]),
	("ttf", "font/ttf", &[], &["ttf"]),
	("woff", "font/woff", &[], &["woff"]),
	("woff2", "font/woff2", &[], &["woff2"]),
	("xml", "application/xml", &["text/xml", "application/x-xml"], &[]),
	("rss", "application/rss+xml", &[], &[]),
	("atom", "application/atom+xml", &[], &[]),
	("yaml", "application/x-yaml", &["text/yaml"], &["yml", "yaml"]),
	("multipart_form", "multipart/form-data", &[], &[]),
	("url_encoded_form", "application/x-www-form-urlencoded", &[], &[]),
	(
		"json",
		"application/json",
		&["text/x-json", "application/jsonrequest"],
		&[],
	),
	("pdf", "application/pdf", &[], &["pdf"]),
	("zip", "application/zip", &[], &["zip"]),
	("gzip", "application/gzip", &["application/x-gzip"], &["gz"]),
];

/// The default catalog, in registration order
pub fn default_formats() -> Vec<MimeType> {
	DEFAULT_FORMATS
		.iter()
		.map(|(symbol, media_type, synonyms, extensions)| {
			MimeType::from_static(symbol, media_type, synonyms, extensions)
		})
		.collect()
}

/// `text/plain`, the fallback rendered format
pub fn text() -> MimeType {
	MimeType::from_static("text", "text/plain", &[], &["txt"])
}

/// `text/html`, forced when a render supplies raw HTML
pub fn html() -> MimeType {
	MimeType::from_static("html", "text/html", &["application/xhtml+xml"], &["xhtml"])
}
