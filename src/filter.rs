//! Construction of LDAP search filters from user queries.

use std::collections::{BTreeSet, HashSet};

use crate::{error::Error, fields::FieldMap};

/// Adds wildcarding onto a search term and escapes the reserved filter
/// characters.
///
/// Exactly four characters are escaped: `\` becomes `\5c`, `(` becomes
/// `\28`, `)` becomes `\29` and `/` becomes `\2f`. The backslash is escaped
/// first, so the sequences introduced for the other three are not themselves
/// re-escaped. A trailing `*` is appended unless the term already ends with
/// one.
///
/// Must be applied exactly once per raw term; a second pass would
/// double-escape the backslashes introduced by the first.
#[must_use]
pub fn sanitize_term(term: &str) -> String {
	let mut result = term
		.replace('\\', "\\5c")
		.replace('(', "\\28")
		.replace(')', "\\29")
		.replace('/', "\\2f");

	if !result.ends_with('*') {
		result.push('*');
	}

	result
}

/// Build the search filter for a user search.
///
/// The requested logical `fields` must all be present in `field_map`. The
/// virtual "Name" field never reaches the directory verbatim: it is replaced
/// by the configured `name_fields` before the filter is assembled, and a
/// "Name" request without that configuration is rejected. Each term of the
/// query is sanitized with [`sanitize_term`] and matched against every
/// physical attribute of the expanded field set (an OR-group when there is
/// more than one); all term clauses are ANDed together under the
/// administrator's scope filter, whose `{0}` placeholder is always rendered
/// with the fixed `*` wildcard.
///
/// The caller is expected to have short-circuited an empty query or field
/// set to an empty result before getting here.
pub fn build_filter(
	fields: &HashSet<String>,
	query: &str,
	field_map: &FieldMap,
	name_fields: Option<&BTreeSet<String>>,
	scope_filter: &str,
	separate_terms: bool,
) -> Result<String, Error> {
	let mut invalid: Vec<String> =
		fields.iter().filter(|field| !field_map.contains(field.as_str())).cloned().collect();
	if !invalid.is_empty() {
		invalid.sort();
		return Err(Error::InvalidSearchFields(invalid));
	}

	// Expand the virtual "Name" field. The BTreeSet keeps the clause order
	// deterministic.
	let mut fields_to_search: BTreeSet<&str> = fields.iter().map(String::as_str).collect();
	if fields_to_search.remove("Name") {
		match name_fields {
			Some(name_fields) => {
				fields_to_search.extend(name_fields.iter().map(String::as_str));
			}
			None => return Err(Error::InvalidSearchFields(vec!["Name".to_owned()])),
		}
	}

	let mut attributes = Vec::with_capacity(fields_to_search.len());
	let mut unmapped = Vec::new();
	for field in &fields_to_search {
		match field_map.get(field) {
			Some(attribute) => attributes.push(attribute),
			None => unmapped.push((*field).to_owned()),
		}
	}
	if !unmapped.is_empty() {
		return Err(Error::InvalidSearchFields(unmapped));
	}
	if attributes.is_empty() {
		// Expansion can empty the set out entirely, e.g. "Name" with a
		// configured-empty expansion. Refuse rather than emit a filter with
		// no term clauses.
		let mut requested: Vec<String> = fields.iter().cloned().collect();
		requested.sort();
		return Err(Error::InvalidSearchFields(requested));
	}

	let terms: Vec<&str> = if separate_terms {
		let terms: Vec<&str> = query.split_whitespace().collect();
		// A whitespace-only query still produces one term.
		if terms.is_empty() {
			vec![query]
		} else {
			terms
		}
	} else {
		vec![query]
	};

	let mut filter = String::new();
	filter.push_str("(&(");
	filter.push_str(&render_scope_filter(scope_filter));
	filter.push(')');
	for term in terms {
		let term = sanitize_term(term);

		if attributes.len() > 1 {
			filter.push_str("(|");
		}
		for attribute in &attributes {
			filter.push('(');
			filter.push_str(attribute);
			filter.push('=');
			filter.push_str(&term);
			filter.push(')');
		}
		if attributes.len() > 1 {
			filter.push(')');
		}
	}
	filter.push(')');

	tracing::debug!("ldap query = {filter}");

	Ok(filter)
}

/// Render the administrator's scope filter by substituting the fixed `*`
/// wildcard into its `{0}` placeholder. The scope clause constrains the
/// candidate population independently of what the user typed.
fn render_scope_filter(template: &str) -> String {
	template.replace("{0}", "*")
}
