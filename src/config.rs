//! Config for the user directory adapter.
use std::time::Duration;

use ldap3::LdapConnSettings;
use serde::{Deserialize, Serialize};
use url::Url;

/// Format of the fixed 14 digit stem of LDAP Generalized Time values,
/// configured according to the syntax definition
/// `( 1.3.6.1.4.1.1466.115.121.1.24 DESC 'Generalized Time' )` described in
/// RFC4517 section 3.1.13. The trailing `Z` and fractional seconds are
/// handled separately, see [`crate::dates`].
pub const LDAP_DATE_FORMAT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second]");

/// The operational attribute holding the creation time of an entry.
pub const CREATE_TIMESTAMP_ATTR: &str = "createTimestamp";

/// The operational attribute holding the last modification time of an entry.
pub const MODIFY_TIMESTAMP_ATTR: &str = "modifyTimestamp";

/// Adapter configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
	/// The URL to connect to the server with. Supports ldap, ldaps, and ldapi
	/// schemes
	pub url: Url,
	/// Connection settings.
	pub connection: ConnectionConfig,
	/// The username for the LDAP search user
	pub search_user: String,
	/// The password for the LDAP search user
	pub search_password: String,
	/// The search base under which user entries live
	pub user_base: String,
	/// The administrator's scope filter, applied to every search so that only
	/// the intended part of the directory population is ever returned. Its
	/// `{0}` placeholder is rendered before use, e.g. `(uid={0})`.
	pub scope_filter: String,
	/// Names of the core user attributes
	pub attributes: AttributeConfig,
	/// A template for synthesized display names. Attribute names enclosed in
	/// curly braces are replaced with the attribute's value, for example
	/// `{givenName} {sn}`. Absent means the raw name attribute is used.
	#[serde(default)]
	pub display_name_template: Option<String>,
	/// If true, a search query is split on whitespace into separate terms
	/// which all have to match. A search for "some thing" then finds users
	/// matching "some" AND "thing".
	#[serde(default)]
	pub separate_search_terms: bool,
	/// Spec of the searchable fields as `Logical/physicalAttr` pairs
	/// separated by commas, e.g. `Name/cn,Email/mail`. Absent means the
	/// built-in Username/Name/Email mapping over [`Self::attributes`].
	#[serde(default)]
	pub search_fields: Option<String>,
	/// Comma separated set of logical fields which are searched when a query
	/// for the virtual "Name" field is received. These are the logical names
	/// from [`Self::search_fields`], not LDAP attribute names.
	#[serde(default)]
	pub search_name_fields: Option<String>,
	/// A suffix appended to every identifier returned from a search.
	#[serde(default)]
	pub username_suffix: Option<String>,
}

/// Names of the core attributes of a user entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeConfig {
	/// The attribute holding the login name of the user
	pub username: String,
	/// The attribute holding the (fallback) display name of the user
	pub name: String,
	/// The attribute holding the email address of the user
	pub email: String,
}

impl AttributeConfig {
	/// Returns an example AttributeConfig
	#[allow(dead_code)]
	pub(crate) fn example() -> Self {
		AttributeConfig {
			username: "uid".to_owned(),
			name: "sn".to_owned(),
			email: "mail".to_owned(),
		}
	}
}

/// Configuration for how to connect to the LDAP server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	pub starttls: bool,

	/// Disable verification of TLS certificates
	pub no_tls_verify: bool,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		ConnectionConfig { timeout: 5, starttls: false, no_tls_verify: false }
	}
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) fn to_settings(&self) -> LdapConnSettings {
		LdapConnSettings::new()
			.set_conn_timeout(Duration::from_secs(self.timeout))
			.set_starttls(self.starttls)
			.set_no_tls_verify(self.no_tls_verify)
	}
}
