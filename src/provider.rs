//! The user provider adapter surface.

use std::{
	collections::{BTreeSet, HashSet},
	sync::Arc,
};

use ldap3::SearchEntry;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
	config::{AttributeConfig, Config, CREATE_TIMESTAMP_ATTR, MODIFY_TIMESTAMP_ATTR},
	dates::parse_ldap_date,
	directory::{Directory, DirectorySession},
	entry::SearchEntryExt,
	error::Error,
	fields::{parse_name_fields, FieldMap},
	filter::build_filter,
	ident,
	template::{compose_display_name, DisplayNameTemplate},
};

/// A user record assembled from a directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
	/// The identifier, escaped for use by the caller.
	pub username: String,
	/// The synthesized display name, if one could be produced.
	pub name: Option<String>,
	/// Email address, when the directory has one.
	pub email: Option<String>,
	/// When the entry was created.
	pub creation_date: OffsetDateTime,
	/// When the entry was last modified.
	pub modification_date: OffsetDateTime,
}

/// The display name template together with the attribute list derived from
/// it.
///
/// The two are always swapped as one unit, so a reader never sees a new
/// template paired with a stale attribute list.
#[derive(Debug, Clone)]
struct TemplateSnapshot {
	/// The parsed template, if one is configured.
	template: Option<DisplayNameTemplate>,
	/// The attributes to request when loading a user: the core attributes
	/// plus everything the template references. Restricting the fetch to
	/// these keeps the directory round-trip payload small.
	attributes_to_load: Vec<String>,
}

impl TemplateSnapshot {
	/// Parse the template and derive the attribute list from it.
	fn compute(template: Option<&str>, attributes: &AttributeConfig) -> Self {
		let template = template.map(DisplayNameTemplate::parse);

		let mut required = BTreeSet::from([
			attributes.username.clone(),
			attributes.name.clone(),
			attributes.email.clone(),
			CREATE_TIMESTAMP_ATTR.to_owned(),
			MODIFY_TIMESTAMP_ATTR.to_owned(),
		]);
		if let Some(template) = &template {
			required.extend(template.attributes());
		}

		Self { template, attributes_to_load: required.into_iter().collect() }
	}
}

/// User directory adapter for LDAP repositories which don't have a full name
/// attribute available.
///
/// Display names are synthesized from the configured template, and a search
/// on the virtual "Name" field transparently expands into the configured set
/// of underlying fields. Everything protocol-shaped is delegated to the
/// [`Directory`] backend.
#[derive(Debug)]
pub struct UserProvider<D> {
	/// The directory backend loads and searches go through.
	directory: D,
	/// Names of the core user attributes.
	attributes: AttributeConfig,
	/// The search base for user entries.
	user_base: String,
	/// The administrator's scope filter template, with a `{0}` placeholder.
	scope_filter: String,
	/// Whether queries split on whitespace into AND-ed terms.
	separate_search_terms: bool,
	/// Logical to physical search field mapping.
	search_fields: FieldMap,
	/// Logical fields a "Name" search expands into.
	search_name_fields: Option<BTreeSet<String>>,
	/// Suffix appended to identifiers returned from searches.
	username_suffix: Option<String>,
	/// The current template snapshot.
	snapshot: Arc<RwLock<TemplateSnapshot>>,
}

impl<D: Directory + Sync> UserProvider<D> {
	/// Create an adapter over a directory backend.
	///
	/// A malformed `search_fields` spec is logged and degrades to the empty
	/// mapping rather than failing construction; searches then reject every
	/// field until the setting is fixed.
	#[must_use]
	pub fn new(config: &Config, directory: D) -> Self {
		let search_fields =
			FieldMap::parse(config.search_fields.as_deref(), &config.attributes);
		let search_name_fields = parse_name_fields(config.search_name_fields.as_deref());
		let snapshot =
			TemplateSnapshot::compute(config.display_name_template.as_deref(), &config.attributes);
		Self {
			directory,
			attributes: config.attributes.clone(),
			user_base: config.user_base.clone(),
			scope_filter: config.scope_filter.clone(),
			separate_search_terms: config.separate_search_terms,
			search_fields,
			search_name_fields,
			username_suffix: config.username_suffix.clone(),
			snapshot: Arc::new(RwLock::new(snapshot)),
		}
	}

	/// The logical fields that can be passed to [`find_users`](Self::find_users).
	pub fn search_field_names(&self) -> impl Iterator<Item = &str> {
		self.search_fields.logical_names()
	}

	/// Replace the display name template.
	///
	/// The parsed template and the attribute list derived from it are
	/// published together, so a concurrent load sees either the old pair or
	/// the new one, never a mix.
	pub async fn set_display_name_template(&self, template: Option<&str>) {
		let snapshot = TemplateSnapshot::compute(template, &self.attributes);
		*self.snapshot.write().await = snapshot;
	}

	/// Load a single user by identifier.
	///
	/// A fully qualified identifier is accepted when its domain is this
	/// server's; the node part is unescaped before it is used against the
	/// directory and re-escaped in the returned record. Any failure on the
	/// way to a complete record is reported as [`Error::UserNotFound`] with
	/// the cause attached.
	pub async fn load_user(&self, username: &str) -> Result<User, Error> {
		let node = self.normalize_username(username)?;
		let snapshot = self.snapshot.read().await.clone();

		let location = self
			.directory
			.resolve_location(&node)
			.await
			.map_err(|err| Error::user_not_found(username, err))?;
		let mut session = self
			.directory
			.open_session(&self.user_base)
			.await
			.map_err(|err| Error::user_not_found(username, err))?;
		let fetched = session.fetch_attributes(&location, &snapshot.attributes_to_load).await;
		session.close().await;
		let record = fetched.map_err(|err| Error::user_not_found(username, err))?;

		let name = compose_display_name(snapshot.template.as_ref(), &record, &self.attributes.name);
		debug!("Using {name:?} as display name for user {node}");

		let email = record.attr_first(&self.attributes.email).map(str::to_owned);
		let creation_date = timestamp_or_now(&record, CREATE_TIMESTAMP_ATTR);
		let modification_date = timestamp_or_now(&record, MODIFY_TIMESTAMP_ATTR);

		Ok(User {
			username: ident::escape_node(&node),
			name,
			email,
			creation_date,
			modification_date,
		})
	}

	/// Search for users matching `query` across the requested logical
	/// fields, without pagination.
	pub async fn find_users(
		&self,
		fields: &HashSet<String>,
		query: &str,
	) -> Result<Vec<String>, Error> {
		self.find_users_paged(fields, query, -1, -1).await
	}

	/// Search for users matching `query` across the requested logical
	/// fields.
	///
	/// `start_index` and `max_results` of `-1` disable pagination. An empty
	/// query or field set yields no results without touching the directory,
	/// and unknown fields are rejected before any directory access.
	pub async fn find_users_paged(
		&self,
		fields: &HashSet<String>,
		query: &str,
		start_index: i32,
		max_results: i32,
	) -> Result<Vec<String>, Error> {
		debug!("Search for {query:?} in fields {fields:?}");

		if fields.is_empty() || query.is_empty() {
			return Ok(Vec::new());
		}

		let filter = build_filter(
			fields,
			query,
			&self.search_fields,
			self.search_name_fields.as_ref(),
			&self.scope_filter,
			self.separate_search_terms,
		)?;

		self.directory
			.search_identifiers(
				&self.attributes.username,
				&filter,
				start_index,
				max_results,
				self.username_suffix.as_deref(),
			)
			.await
	}

	/// Strip the domain part of a fully qualified identifier and unescape
	/// the node. Identifiers belonging to a remote server cannot be loaded.
	fn normalize_username(&self, username: &str) -> Result<String, Error> {
		let node = match username.rsplit_once('@') {
			Some((node, _)) => {
				if !self.directory.is_local(username) {
					return Err(Error::user_not_found(
						username,
						format!("cannot load user of remote server: {username}"),
					));
				}
				node
			}
			None => username,
		};
		Ok(ident::unescape_node(node))
	}
}

/// Read a timestamp attribute, parsing it when present and non-blank and
/// substituting the current time otherwise.
fn timestamp_or_now(record: &SearchEntry, attr: &str) -> OffsetDateTime {
	record.attr_first_nonblank(attr).map_or_else(OffsetDateTime::now_utc, parse_ldap_date)
}

#[cfg(test)]
mod tests {
	use super::TemplateSnapshot;
	use crate::config::AttributeConfig;

	#[test]
	fn snapshot_collects_the_required_attributes() {
		let snapshot =
			TemplateSnapshot::compute(Some("{givenName} {sn}"), &AttributeConfig::example());

		assert_eq!(
			snapshot.attributes_to_load,
			["createTimestamp", "givenName", "mail", "modifyTimestamp", "sn", "uid"],
		);
	}

	#[test]
	fn snapshot_without_template_keeps_the_core_attributes() {
		let snapshot = TemplateSnapshot::compute(None, &AttributeConfig::example());

		assert!(snapshot.template.is_none());
		assert_eq!(
			snapshot.attributes_to_load,
			["createTimestamp", "mail", "modifyTimestamp", "sn", "uid"],
		);
	}
}
