//! The directory access seam.
//!
//! The adapter core never speaks the wire protocol itself; it consumes the
//! capabilities below. [`LdapDirectory`](crate::ldap::LdapDirectory) is the
//! shipped implementation, and tests substitute an in-memory one.

use async_trait::async_trait;
use ldap3::SearchEntry;

use crate::error::Error;

/// Capabilities the adapter needs from a directory server.
#[async_trait]
pub trait Directory {
	/// The session type produced by [`open_session`](Directory::open_session).
	type Session: DirectorySession + Send;

	/// Map a logical user identifier to the directory location of its entry.
	async fn resolve_location(&self, username: &str) -> Result<String, Error>;

	/// Acquire a session scoped to the subtree under `base`. The session
	/// must be closed after use, on every exit path.
	async fn open_session(&self, base: &str) -> Result<Self::Session, Error>;

	/// Execute a previously built filter and return the matching
	/// identifiers, read from `username_attr`. `start_index` and
	/// `max_results` of `-1` disable pagination. A `suffix` is appended to
	/// every returned identifier.
	async fn search_identifiers(
		&self,
		username_attr: &str,
		filter: &str,
		start_index: i32,
		max_results: i32,
		suffix: Option<&str>,
	) -> Result<Vec<String>, Error>;

	/// Whether the identifier belongs to this server rather than a remote
	/// one.
	fn is_local(&self, identifier: &str) -> bool;
}

/// A scoped directory session for a single unit of work.
#[async_trait]
pub trait DirectorySession {
	/// Fetch the named attributes of the entry at `location`.
	async fn fetch_attributes(
		&mut self,
		location: &str,
		attributes: &[String],
	) -> Result<SearchEntry, Error>;

	/// Release the session. Failures during release are logged, not
	/// surfaced.
	async fn close(self);
}
