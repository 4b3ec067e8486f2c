//! Helper methods for extracting data from fetched directory entries.
use ldap3::SearchEntry;

/// An extension trait for [`SearchEntry`] that provides convenience methods
/// for extracting attribute values.
pub trait SearchEntryExt {
	/// Get the first value of an attribute. Will return `None` if attribute
	/// value is not valid UTF-8.
	fn attr_first(&self, attr: &str) -> Option<&str>;

	/// Get the first value of an attribute, trimmed, treating a blank value
	/// as absent. Some directory servers return operational attributes as
	/// empty strings rather than omitting them.
	fn attr_first_nonblank(&self, attr: &str) -> Option<&str> {
		self.attr_first(attr).map(str::trim).filter(|value| !value.is_empty())
	}
}

impl SearchEntryExt for SearchEntry {
	fn attr_first(&self, attr: &str) -> Option<&str> {
		let attr = self.attrs.get(attr)?;
		attr.first().map(String::as_str)
	}
}
