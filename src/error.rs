//! Error codes

/// Errors surfaced by the user directory adapter.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// One or more requested search fields are not present in the configured
	/// field mapping. The search is rejected before any directory access
	/// happens.
	#[error("search fields {0:?} are not valid")]
	InvalidSearchFields(Vec<String>),
	/// A user could not be loaded. Wraps whatever failed on the way to a
	/// complete user record: identifier resolution, session acquisition,
	/// the attribute fetch, or a remote-server identifier.
	#[error("user {username} not found")]
	UserNotFound {
		/// The identifier that failed to load.
		username: String,
		/// The underlying cause of the failure.
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},
	/// An expected entry or attribute was missing from a directory response.
	#[error("missing data: {0}")]
	Missing(String),
	/// An underlying protocol error or similar occurred, or the LDAP library
	/// was used incorrectly.
	#[error(transparent)]
	Ldap(#[from] ldap3::LdapError),
}

impl Error {
	/// Wrap a lookup failure, preserving the cause for diagnostics.
	pub(crate) fn user_not_found(
		username: &str,
		source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
	) -> Self {
		Error::UserNotFound { username: username.to_owned(), source: source.into() }
	}
}
