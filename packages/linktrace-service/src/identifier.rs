//! Telephone-number identifiers.
//!
//! User input is normalized strictly: the result must be ten digits with a valid leading digit.
//! Values discovered inside stored rows are looser and only need to look like ten digits.

use std::fmt;

use serde::Serialize;

pub const IDENTIFIER_LEN: usize = 10;
pub const VALID_LEADING_DIGITS: &[u8] = b"6789";

/// A normalized ten digit number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);
impl Identifier {
	/// Normalizes free-form input such as `"+91 98765 43210"` or `"091-9876543210"`.
	pub fn parse(raw: &str) -> Option<Self> {
		let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

		if digits.is_empty() {
			return None;
		}

		let trimmed = match digits.len() {
			12 if digits.starts_with("91") => &digits[2..],
			11 if digits.starts_with('0') => &digits[1..],
			13 if digits.starts_with("091") => &digits[3..],
			_ => digits.as_str(),
		};

		if trimmed.len() != IDENTIFIER_LEN
			|| !trimmed.bytes().next().is_some_and(|first| VALID_LEADING_DIGITS.contains(&first))
		{
			return None;
		}

		Some(Self(trimmed.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}
impl AsRef<str> for Identifier {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for Identifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A stored `mobile` value usable as a traversal node. It must already be exactly ten digits.
pub fn primary_link(value: &str) -> Option<&str> {
	let value = value.trim();

	is_digits(value, IDENTIFIER_LEN).then_some(value)
}

/// A stored `alt_mobile` value usable as a traversal node. Longer values carry a prefix and are
/// cut down to their trailing ten digits.
pub fn secondary_link(value: &str) -> Option<&str> {
	let value = value.trim();

	if value.len() < IDENTIFIER_LEN || !value.is_ascii() {
		return None;
	}

	let tail = &value[value.len() - IDENTIFIER_LEN..];

	is_digits(tail, IDENTIFIER_LEN).then_some(tail)
}

fn is_digits(value: &str, len: usize) -> bool {
	value.len() == len && value.bytes().all(|byte| byte.is_ascii_digit())
}
