use std::{
	collections::HashMap,
	error::Error,
	sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ldap3::{LdapConnAsync, SearchEntry};
use ldap_user_provider::{
	config::{AttributeConfig, Config, ConnectionConfig},
	directory::{Directory, DirectorySession},
	error::Error as AdapterError,
};
use url::Url;

/// A configuration matching the docker test environment, with the search
/// field setup the scenario tests share.
pub fn test_config() -> Config {
	Config {
		url: Url::parse("ldap://localhost:1389").unwrap(),
		connection: ConnectionConfig::default(),
		search_user: String::new(),
		search_password: String::new(),
		user_base: "ou=users,dc=example,dc=org".to_owned(),
		scope_filter: "(uid={0})".to_owned(),
		attributes: AttributeConfig {
			username: "uid".to_owned(),
			name: "sn".to_owned(),
			email: "mail".to_owned(),
		},
		display_name_template: Some("{givenName} {sn}".to_owned()),
		separate_search_terms: true,
		search_fields: Some(
			"Username/uid,Name/uid,Email/mail,Given Name/givenName,Family Name/sn".to_owned(),
		),
		search_name_fields: Some("Given Name,Family Name".to_owned()),
		username_suffix: None,
	}
}

/// One recorded call to `search_identifiers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
	pub username_attr: String,
	pub filter: String,
	pub start_index: i32,
	pub max_results: i32,
	pub suffix: Option<String>,
}

/// Shared state behind the mock directory.
#[derive(Debug, Default)]
struct MockState {
	/// Entries by location (DN).
	entries: HashMap<String, HashMap<String, Vec<String>>>,
	/// Location by username.
	locations: HashMap<String, String>,
	/// Identifier lists keyed by the exact filter that must be produced.
	search_results: HashMap<String, Vec<String>>,
	/// Every search issued against the mock.
	searches: Vec<SearchCall>,
	/// Session accounting.
	sessions_opened: usize,
	sessions_closed: usize,
	/// Domains considered local to this server.
	local_domains: Vec<String>,
}

/// In-memory directory used to drive the adapter in tests.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
	inner: Arc<Mutex<MockState>>,
}

impl MockDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a user entry with the given single-valued attributes.
	pub fn add_user(&self, username: &str, attrs: &[(&str, &str)]) {
		let dn = format!("cn={username},ou=test");
		let mut state = self.inner.lock().unwrap();
		state.locations.insert(username.to_owned(), dn.clone());
		state.entries.insert(
			dn,
			attrs
				.iter()
				.map(|(name, value)| ((*name).to_owned(), vec![(*value).to_owned()]))
				.collect(),
		);
	}

	/// Register a resolvable location with no entry behind it, so attribute
	/// fetches fail after the session was opened.
	pub fn add_dangling_location(&self, username: &str) {
		let dn = format!("cn={username},ou=test");
		self.inner.lock().unwrap().locations.insert(username.to_owned(), dn);
	}

	/// Only searches producing exactly this filter return these results.
	pub fn expect_search(&self, filter: &str, results: &[&str]) {
		self.inner
			.lock()
			.unwrap()
			.search_results
			.insert(filter.to_owned(), results.iter().map(|s| (*s).to_owned()).collect());
	}

	/// Mark a domain as belonging to this server.
	pub fn set_local_domain(&self, domain: &str) {
		self.inner.lock().unwrap().local_domains.push(domain.to_owned());
	}

	pub fn searches(&self) -> Vec<SearchCall> {
		self.inner.lock().unwrap().searches.clone()
	}

	pub fn sessions_opened(&self) -> usize {
		self.inner.lock().unwrap().sessions_opened
	}

	pub fn sessions_closed(&self) -> usize {
		self.inner.lock().unwrap().sessions_closed
	}
}

#[async_trait]
impl Directory for MockDirectory {
	type Session = MockSession;

	async fn resolve_location(&self, username: &str) -> Result<String, AdapterError> {
		self.inner
			.lock()
			.unwrap()
			.locations
			.get(username)
			.cloned()
			.ok_or_else(|| AdapterError::Missing(format!("no entry for user {username}")))
	}

	async fn open_session(&self, _base: &str) -> Result<MockSession, AdapterError> {
		self.inner.lock().unwrap().sessions_opened += 1;
		Ok(MockSession { inner: Arc::clone(&self.inner) })
	}

	async fn search_identifiers(
		&self,
		username_attr: &str,
		filter: &str,
		start_index: i32,
		max_results: i32,
		suffix: Option<&str>,
	) -> Result<Vec<String>, AdapterError> {
		let mut state = self.inner.lock().unwrap();
		state.searches.push(SearchCall {
			username_attr: username_attr.to_owned(),
			filter: filter.to_owned(),
			start_index,
			max_results,
			suffix: suffix.map(str::to_owned),
		});
		let results = state.search_results.get(filter).cloned().unwrap_or_default();
		Ok(results
			.into_iter()
			.map(|name| match suffix {
				Some(suffix) => format!("{name}{suffix}"),
				None => name,
			})
			.collect())
	}

	fn is_local(&self, identifier: &str) -> bool {
		match identifier.rsplit_once('@') {
			Some((_, domain)) => {
				self.inner.lock().unwrap().local_domains.iter().any(|local| local == domain)
			}
			None => true,
		}
	}
}

/// A session over the mock directory.
#[derive(Debug)]
pub struct MockSession {
	inner: Arc<Mutex<MockState>>,
}

#[async_trait]
impl DirectorySession for MockSession {
	async fn fetch_attributes(
		&mut self,
		location: &str,
		attributes: &[String],
	) -> Result<SearchEntry, AdapterError> {
		let state = self.inner.lock().unwrap();
		let entry = state
			.entries
			.get(location)
			.ok_or_else(|| AdapterError::Missing(format!("no entry at {location}")))?;
		// Only hand back what was asked for, like a real server would.
		let attrs = entry
			.iter()
			.filter(|(name, _)| attributes.contains(name))
			.map(|(name, values)| (name.clone(), values.clone()))
			.collect();
		Ok(SearchEntry { dn: location.to_owned(), attrs, bin_attrs: HashMap::new() })
	}

	async fn close(self) {
		self.inner.lock().unwrap().sessions_closed += 1;
	}
}

// Helpers for the docker-backed integration test below.

pub async fn ldap_connect() -> Result<ldap3::Ldap, Box<dyn Error>> {
	let (conn, mut ldap) = LdapConnAsync::new("ldap://localhost:1389").await?;
	let _handle = tokio::spawn(async move {
		if let Err(err) = conn.drive().await {
			panic!("Ldap connection error {err}");
		}
	});
	ldap.simple_bind("cn=admin,dc=example,dc=org", "adminpassword").await?;
	Ok(ldap)
}

pub async fn ldap_add_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(
		&format!("ou={ou},dc=example,dc=org"),
		vec![("objectClass", ["organizationalUnit"].into())],
	)
	.await?
	.success()?;
	Ok(())
}

pub async fn ldap_delete_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.delete(&format!("ou={ou},dc=example,dc=org")).await?.success()?;
	Ok(())
}

pub async fn ldap_add_user(
	ldap: &mut ldap3::Ldap,
	uid: &str,
	given_name: &str,
	sn: &str,
) -> Result<(), Box<dyn Error>> {
	let mail = format!("{uid}@example.org");
	ldap.add(
		&format!("uid={uid},ou=users,dc=example,dc=org"),
		vec![
			("objectClass", ["inetOrgPerson"].into()),
			("uid", [uid].into()),
			("cn", [uid].into()),
			("givenName", [given_name].into()),
			("sn", [sn].into()),
			("mail", [mail.as_str()].into()),
		],
	)
	.await?
	.success()?;
	Ok(())
}

pub async fn ldap_delete_user(ldap: &mut ldap3::Ldap, uid: &str) -> Result<(), Box<dyn Error>> {
	ldap.delete(&format!("uid={uid},ou=users,dc=example,dc=org")).await?.success()?;
	Ok(())
}
