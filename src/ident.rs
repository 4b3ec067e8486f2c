//! Escaping of user identifiers per the XEP-0106 node escaping rules.
//!
//! Directory-side usernames may contain characters that are not allowed in
//! the node part of a user identifier. XEP-0106 defines a reversible escaping
//! for them; identifiers cross this boundary escaped and are unescaped before
//! they are used against the directory.

/// The escapable characters and their escape sequences.
const ESCAPES: [(char, &str); 10] = [
	(' ', "\\20"),
	('"', "\\22"),
	('&', "\\26"),
	('\'', "\\27"),
	('/', "\\2f"),
	(':', "\\3a"),
	('<', "\\3c"),
	('>', "\\3e"),
	('@', "\\40"),
	('\\', "\\5c"),
];

/// Escape a raw node for use in an identifier.
///
/// The backslash is escaped first so the sequences introduced for the other
/// characters survive a later [`unescape_node`].
#[must_use]
pub fn escape_node(node: &str) -> String {
	node.replace('\\', "\\5c")
		.replace(' ', "\\20")
		.replace('"', "\\22")
		.replace('&', "\\26")
		.replace('\'', "\\27")
		.replace('/', "\\2f")
		.replace(':', "\\3a")
		.replace('<', "\\3c")
		.replace('>', "\\3e")
		.replace('@', "\\40")
}

/// Reverse [`escape_node`] with a single left to right scan. Sequences not
/// in the escape table pass through verbatim.
#[must_use]
pub fn unescape_node(node: &str) -> String {
	let mut result = String::with_capacity(node.len());
	let mut rest = node;

	while !rest.is_empty() {
		if let Some((unescaped, sequence)) =
			ESCAPES.iter().find(|(_, sequence)| rest.starts_with(sequence))
		{
			result.push(*unescaped);
			rest = &rest[sequence.len()..];
		} else {
			let mut chars = rest.chars();
			if let Some(ch) = chars.next() {
				result.push(ch);
			}
			rest = chars.as_str();
		}
	}

	result
}
