//! Directory access backed by a real LDAP server via `ldap3`.

use async_trait::async_trait;
use ldap3::{ldap_escape, LdapConnAsync, Scope, SearchEntry};
use tracing::warn;

use crate::{
	config::Config,
	directory::{Directory, DirectorySession},
	entry::SearchEntryExt,
	error::Error,
};

/// A [`Directory`] over an LDAP server, using the connection settings and
/// search base from the adapter [`Config`].
///
/// Every operation acquires its own bound connection and releases it before
/// returning; nothing is pooled or retried here.
#[derive(Debug, Clone)]
pub struct LdapDirectory {
	/// The adapter configuration.
	config: Config,
}

/// A bound LDAP connection scoped to one unit of work.
pub struct LdapSession {
	/// The bound handle operations are issued on.
	ldap: ldap3::Ldap,
	/// The background task driving the connection.
	driver: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for LdapSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LdapSession").finish_non_exhaustive()
	}
}

impl LdapDirectory {
	/// Create a backend over the given configuration.
	#[must_use]
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Create a connection to the ldap server based on the settings and url
	/// specified in the configuration, spawn the connection driver and bind
	/// as the search user.
	async fn connect(&self) -> Result<LdapSession, Error> {
		let settings = self.config.connection.to_settings();
		let (conn, mut ldap) =
			LdapConnAsync::from_url_with_settings(settings, &self.config.url).await?;
		let driver = tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("Ldap connection error {err}");
			}
		});
		ldap.simple_bind(&self.config.search_user, &self.config.search_password)
			.await?
			.success()?;
		Ok(LdapSession { ldap, driver })
	}
}

#[async_trait]
impl Directory for LdapDirectory {
	type Session = LdapSession;

	async fn resolve_location(&self, username: &str) -> Result<String, Error> {
		let filter =
			format!("({}={})", self.config.attributes.username, ldap_escape(username));

		let mut session = self.connect().await?;
		let outcome = session
			.ldap
			.search(&self.config.user_base, Scope::Subtree, &filter, vec!["dn"])
			.await
			.and_then(ldap3::SearchResult::success);
		session.close().await;

		let (entries, _) = outcome?;
		entries
			.into_iter()
			.next()
			.map(|entry| SearchEntry::construct(entry).dn)
			.ok_or_else(|| Error::Missing(format!("no entry for user {username}")))
	}

	async fn open_session(&self, _base: &str) -> Result<LdapSession, Error> {
		// ldap3 connections are not base-scoped; the base is implicit in the
		// entry locations handed to the session.
		self.connect().await
	}

	async fn search_identifiers(
		&self,
		username_attr: &str,
		filter: &str,
		start_index: i32,
		max_results: i32,
		suffix: Option<&str>,
	) -> Result<Vec<String>, Error> {
		let mut session = self.connect().await?;
		let outcome = session
			.ldap
			.search(&self.config.user_base, Scope::Subtree, filter, vec![username_attr])
			.await
			.and_then(ldap3::SearchResult::success);
		session.close().await;

		let (entries, _) = outcome?;
		let mut identifiers: Vec<String> = entries
			.into_iter()
			.map(SearchEntry::construct)
			.filter_map(|entry| {
				let name = entry.attr_first(username_attr)?;
				Some(match suffix {
					Some(suffix) => format!("{name}{suffix}"),
					None => name.to_owned(),
				})
			})
			.collect();

		if start_index > 0 {
			let start = usize::try_from(start_index).unwrap_or(0).min(identifiers.len());
			identifiers.drain(..start);
		}
		if max_results >= 0 {
			identifiers.truncate(usize::try_from(max_results).unwrap_or(0));
		}

		Ok(identifiers)
	}

	fn is_local(&self, identifier: &str) -> bool {
		// A bare node is always local; a full identifier is local when its
		// domain matches the configured server host.
		match identifier.rsplit_once('@') {
			Some((_, domain)) => self
				.config
				.url
				.host_str()
				.is_some_and(|host| host.eq_ignore_ascii_case(domain)),
			None => true,
		}
	}
}

#[async_trait]
impl DirectorySession for LdapSession {
	async fn fetch_attributes(
		&mut self,
		location: &str,
		attributes: &[String],
	) -> Result<SearchEntry, Error> {
		let (entries, _) = self
			.ldap
			.search(location, Scope::Base, "(objectClass=*)", attributes.to_vec())
			.await?
			.success()?;
		entries
			.into_iter()
			.next()
			.map(SearchEntry::construct)
			.ok_or_else(|| Error::Missing(format!("no entry at {location}")))
	}

	async fn close(mut self) {
		if let Err(err) = self.ldap.unbind().await {
			warn!("Failed to unbind ldap connection: {err}");
		}
		if let Err(err) = self.driver.await {
			warn!("Failed to join background task: {err}");
		}
	}
}
