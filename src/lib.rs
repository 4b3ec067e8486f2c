//! User directory adapter for LDAP repositories that lack a single full name
//! attribute.
//!
//! The adapter sits between an application's user management layer and an
//! LDAP directory and does two things. It synthesizes a display name from a
//! configurable template over directory attributes, so `{givenName} {sn}`
//! turns a pair of attributes into one name. And it builds search filters
//! that let a generic "Name" search field transparently expand into several
//! underlying attributes, optionally splitting multi-word queries into
//! AND-ed sub-terms.
//!
//! For a general primer on LDAP, the [introduction] in the `ldap3` crate
//! which is used here for interfacing with LDAP is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Configuration
//! The recognized adapter options, all optional:
//!
//! | option | effect |
//! |---|---|
//! | `display_name_template` | template for display names; absent falls back to the raw name attribute |
//! | `separate_search_terms` | split queries on whitespace into AND-ed terms |
//! | `search_fields` | `Logical/physicalAttr,...` spec of searchable fields |
//! | `search_name_fields` | comma list of logical fields a "Name" search expands into |
//!
//! # Getting started
//! A minimal example of using the adapter might look like so:
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::collections::HashSet;
//!
//! use ldap_user_provider::{
//!     config::{AttributeConfig, Config, ConnectionConfig},
//!     ldap::LdapDirectory,
//!     provider::UserProvider,
//! };
//! use url::Url;
//!
//! // Configuration can also be deserialized with serde. It's hand-constructed
//! // here for demonstration purposes.
//! let config = Config {
//!     url: Url::parse("ldap://localhost")?,
//!     connection: ConnectionConfig::default(),
//!     search_user: "admin".to_owned(),
//!     search_password: "verysecret".to_owned(),
//!     user_base: "ou=people,dc=example,dc=com".to_owned(),
//!     scope_filter: "(uid={0})".to_owned(),
//!     attributes: AttributeConfig {
//!         username: "uid".to_owned(),
//!         name: "sn".to_owned(),
//!         email: "mail".to_owned(),
//!     },
//!     display_name_template: Some("{givenName} {sn}".to_owned()),
//!     separate_search_terms: true,
//!     search_fields: Some("Name/sn,Given Name/givenName,Family Name/sn".to_owned()),
//!     search_name_fields: Some("Given Name,Family Name".to_owned()),
//!     username_suffix: None,
//! };
//!
//! let provider = UserProvider::new(&config, LdapDirectory::new(config.clone()));
//!
//! let user = provider.load_user("jdoe").await?;
//! println!("Display name: {:?}", user.name);
//!
//! let matches = provider.find_users(&HashSet::from(["Name".to_owned()]), "jane doe").await?;
//! println!("Matching users: {matches:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * Directory results are not cached; every load and search talks to the
//!   server.
//! * Templates are not recursive: a substituted value is never re-scanned
//!   for further placeholders.
//! * A malformed directory timestamp degrades to the current time rather
//!   than an error, mirroring the behaviour of the providers this adapter
//!   replaces.

pub mod config;
pub mod dates;
pub mod directory;
pub mod entry;
pub mod error;
pub mod fields;
pub mod filter;
pub mod ident;
pub mod ldap;
pub mod provider;
pub mod template;

pub use ldap3::{self, SearchEntry};

pub use crate::{
	config::{AttributeConfig, Config, ConnectionConfig},
	directory::{Directory, DirectorySession},
	entry::SearchEntryExt,
	error::Error,
	fields::FieldMap,
	ldap::LdapDirectory,
	provider::{User, UserProvider},
	template::DisplayNameTemplate,
};
