//! Parsing of the configured search field mappings.

use std::collections::BTreeSet;

use crate::config::AttributeConfig;

/// Ordered mapping of logical, display facing search field names (such as
/// "Name" or "Email") to the physical directory attributes they query.
///
/// Insertion order is preserved so that diagnostics list fields the way the
/// administrator wrote them; it has no effect on search behaviour. A
/// duplicated logical name keeps its original position but takes the later
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
	/// The mapping entries in insertion order.
	entries: Vec<(String, String)>,
}

impl FieldMap {
	/// Parses the string parameter for the search fields into a map.
	///
	/// An absent spec yields the built-in Username/Name/Email mapping over
	/// the configured core attributes. A malformed spec fails as a whole:
	/// the error is logged and the empty mapping is returned, so a bad
	/// setting degrades search instead of aborting startup.
	#[must_use]
	pub fn parse(spec: Option<&str>, attributes: &AttributeConfig) -> Self {
		let Some(spec) = spec else {
			let mut map = FieldMap::default();
			map.insert("Username", &attributes.username);
			map.insert("Name", &attributes.name);
			map.insert("Email", &attributes.email);
			return map;
		};

		match Self::parse_spec(spec) {
			Ok(map) => map,
			Err(err) => {
				tracing::error!("Error parsing LDAP search fields {spec:?}: {err}");
				FieldMap::default()
			}
		}
	}

	/// Parse a present spec, failing on the first malformed token.
	fn parse_spec(spec: &str) -> Result<Self, ParseError> {
		let mut map = FieldMap::default();
		for token in spec.split(',') {
			let (logical, physical) = token
				.split_once('/')
				.ok_or_else(|| ParseError::MissingSeparator(token.to_owned()))?;
			if logical.is_empty() {
				return Err(ParseError::EmptyFieldName(token.to_owned()));
			}
			map.insert(logical, physical);
		}
		Ok(map)
	}

	/// Insert a mapping, overwriting the value of an existing logical name in
	/// place.
	fn insert(&mut self, logical: &str, physical: &str) {
		if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == logical) {
			entry.1 = physical.to_owned();
		} else {
			self.entries.push((logical.to_owned(), physical.to_owned()));
		}
	}

	/// Look up the physical attribute mapped from a logical field.
	#[must_use]
	pub fn get(&self, logical: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(name, _)| name == logical)
			.map(|(_, physical)| physical.as_str())
	}

	/// Whether the logical field is mapped.
	#[must_use]
	pub fn contains(&self, logical: &str) -> bool {
		self.entries.iter().any(|(name, _)| name == logical)
	}

	/// The logical field names, in insertion order.
	pub fn logical_names(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(name, _)| name.as_str())
	}

	/// Whether the mapping has no entries.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Reasons a search field spec can fail to parse.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ParseError {
	/// A token had no `/` between the logical and the physical name.
	#[error("field {0:?} has no '/' separator")]
	MissingSeparator(String),
	/// A token had an empty logical name.
	#[error("field {0:?} has an empty field name")]
	EmptyFieldName(String),
}

/// Parses the string parameter for the search name fields into a set.
///
/// These are the logical fields a query for the virtual "Name" field expands
/// into. `None` means the expansion is not configured at all, which is
/// distinct from an empty set. Tokens are trimmed and blank tokens dropped;
/// duplicates collapse silently.
#[must_use]
pub fn parse_name_fields(spec: Option<&str>) -> Option<BTreeSet<String>> {
	spec.map(|spec| {
		spec.split(',')
			.map(str::trim)
			.filter(|field| !field.is_empty())
			.map(str::to_owned)
			.collect()
	})
}
