//! Parsing of dates/time stamps stored in LDAP.
//!
//! Directory servers are not consistent about the exact shape of timestamp
//! values. Some possible values:
//!
//! * `20020228150820`
//! * `20030228150820Z`
//! * `20050228150820.12`
//! * `20060711011740.0Z`

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::config::LDAP_DATE_FORMAT;

/// Parse a directory timestamp, substituting the current time when the value
/// is malformed.
///
/// A bad timestamp on an otherwise valid entry must not abort loading the
/// user, so this function is total; the substitution is logged. Callers that
/// need to distinguish the fallback use [`try_parse_ldap_date`].
#[must_use]
pub fn parse_ldap_date(text: &str) -> OffsetDateTime {
	match try_parse_ldap_date(text) {
		Ok(date) => date,
		Err(err) => {
			tracing::error!("Failed to parse LDAP date {text:?}: {err}");
			OffsetDateTime::now_utc()
		}
	}
}

/// Fallible form of [`parse_ldap_date`].
///
/// Only the fixed 14 digit `yyyyMMddHHmmss` stem is matched; characters after
/// it, such as a fractional seconds suffix, are ignored. A trailing `Z` marks
/// UTC. Without it the local offset is assumed, with UTC standing in when the
/// local offset cannot be determined.
pub(crate) fn try_parse_ldap_date(text: &str) -> Result<OffsetDateTime, ParseError> {
	let stem = text.get(..14).ok_or(ParseError::TooShort)?;
	let stamp = PrimitiveDateTime::parse(stem, &LDAP_DATE_FORMAT)?;

	let offset = if text.ends_with('Z') {
		UtcOffset::UTC
	} else {
		UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
	};

	Ok(stamp.assume_offset(offset))
}

/// Reasons a timestamp can fail to parse.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ParseError {
	/// The value was shorter than the 14 digit date-time stem.
	#[error("timestamp shorter than the 14 digit stem")]
	TooShort,
	/// The stem did not parse as a date-time.
	#[error(transparent)]
	Time(#[from] time::error::Parse),
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use time::macros::datetime;

	use super::{parse_ldap_date, try_parse_ldap_date};

	#[test]
	fn utc_timestamps_parse_exactly() {
		assert_eq!(
			try_parse_ldap_date("20030228150820Z").unwrap(),
			datetime!(2003-02-28 15:08:20 UTC),
		);
		assert_eq!(
			try_parse_ldap_date("20060711011740.0Z").unwrap(),
			datetime!(2006-07-11 01:17:40 UTC),
			"Fractional seconds before the Z should be ignored",
		);
	}

	#[test]
	fn zoneless_timestamps_keep_their_wall_clock() {
		// The assumed offset depends on the host, but the wall clock fields
		// come straight from the stem.
		let parsed = try_parse_ldap_date("20020228150820").unwrap();
		assert_eq!(parsed.date(), datetime!(2002-02-28 0:00 UTC).date());
		assert_eq!(parsed.time(), datetime!(2002-02-28 15:08:20 UTC).time());

		let parsed = try_parse_ldap_date("20050228150820.12").unwrap();
		assert_eq!(parsed.time(), datetime!(2005-02-28 15:08:20 UTC).time());
	}

	#[test]
	fn malformed_timestamps_fail_the_fallible_parse() {
		assert!(try_parse_ldap_date("2002").is_err());
		assert!(try_parse_ldap_date("not-a-timestamp").is_err());
		assert!(try_parse_ldap_date("").is_err());
	}

	#[test]
	fn malformed_timestamps_fall_back_to_now() {
		let before = time::OffsetDateTime::now_utc();
		let parsed = parse_ldap_date("garbage");
		let after = time::OffsetDateTime::now_utc();

		assert!(parsed >= before && parsed <= after);
	}
}
