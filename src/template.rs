//! Synthesizing display names from a template over directory attributes.

use std::collections::BTreeSet;

use ldap3::SearchEntry;

use crate::entry::SearchEntryExt;

/// A display name template containing `{attributeName}` placeholders, for
/// example `{givenName} {sn}`.
///
/// The template is parsed once so the set of referenced attributes is known
/// up front; the per-user attribute fetch is then restricted to attributes
/// that are actually needed.
#[derive(Debug, Clone)]
pub struct DisplayNameTemplate {
	/// The literal and placeholder spans of the template, in order.
	spans: Vec<Span>,
}

/// One parsed piece of a template.
#[derive(Debug, Clone)]
enum Span {
	/// Verbatim text.
	Literal(String),
	/// An `{attributeName}` reference, stored without the braces.
	Placeholder(String),
}

impl DisplayNameTemplate {
	/// Parse a template string with a single left to right scan.
	///
	/// A placeholder is a non-empty brace-delimited span; `{}` and an
	/// unclosed `{` are plain literal text. Placeholders do not nest, and a
	/// substituted value is never re-scanned.
	#[must_use]
	pub fn parse(template: &str) -> Self {
		let mut spans = Vec::new();
		let mut literal = String::new();
		let mut rest = template;

		while let Some(open) = rest.find('{') {
			match rest[open + 1..].find('}') {
				Some(len) if len > 0 => {
					literal.push_str(&rest[..open]);
					if !literal.is_empty() {
						spans.push(Span::Literal(std::mem::take(&mut literal)));
					}
					spans.push(Span::Placeholder(rest[open + 1..open + 1 + len].to_owned()));
					rest = &rest[open + len + 2..];
				}
				Some(_) => {
					// "{}" is not a placeholder.
					literal.push_str(&rest[..open + 2]);
					rest = &rest[open + 2..];
				}
				None => break,
			}
		}
		literal.push_str(rest);
		if !literal.is_empty() {
			spans.push(Span::Literal(literal));
		}

		Self { spans }
	}

	/// The set of attributes the template references.
	#[must_use]
	pub fn attributes(&self) -> BTreeSet<String> {
		self.spans
			.iter()
			.filter_map(|span| match span {
				Span::Placeholder(attribute) => Some(attribute.clone()),
				Span::Literal(_) => None,
			})
			.collect()
	}

	/// Render the template over a fetched entry.
	///
	/// A placeholder whose attribute is absent substitutes the empty string,
	/// and the finished result is trimmed of leading and trailing
	/// whitespace.
	#[must_use]
	pub fn render(&self, record: &SearchEntry) -> String {
		let mut result = String::new();
		for span in &self.spans {
			match span {
				Span::Literal(text) => result.push_str(text),
				Span::Placeholder(attribute) => {
					if let Some(value) = record.attr_first(attribute) {
						result.push_str(value);
					}
				}
			}
		}
		result.trim().to_owned()
	}
}

/// Replaces the various bits of data into the display name template string.
///
/// Without a template the raw name attribute's value is returned, or `None`
/// when the entry has none. With a template the rendered result is returned
/// even when every placeholder was missing.
#[must_use]
pub fn compose_display_name(
	template: Option<&DisplayNameTemplate>,
	record: &SearchEntry,
	name_attr: &str,
) -> Option<String> {
	match template {
		Some(template) => Some(template.render(record)),
		None => record.attr_first(name_attr).map(str::to_owned),
	}
}
