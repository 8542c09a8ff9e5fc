//! Reduction of traversal rows into one identity profile.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use linktrace_storage::models::Record;

/// Values the dataset uses in place of `NULL`.
pub const NULL_MARKERS: [&str; 3] = ["", "None", "N/A"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	pub seed: String,
	pub phones: Vec<String>,
	pub names: Vec<String>,
	pub fnames: Vec<String>,
	pub emails: Vec<String>,
	pub addresses: Vec<String>,
	pub circles: Vec<String>,
	/// Operator ids in row order. Repeats are kept.
	pub op_ids: Vec<String>,
	pub total_records: usize,
	pub total_phones: usize,
}

/// Trims `value` and maps null markers to `None`.
pub fn present(value: Option<&str>) -> Option<&str> {
	let value = value?.trim();

	(!NULL_MARKERS.contains(&value)).then_some(value)
}

pub fn consolidate(seed: &str, records: &[Record]) -> Profile {
	let mut phones = OrderedSet::default();
	let mut names = OrderedSet::default();
	let mut fnames = OrderedSet::default();
	let mut emails = OrderedSet::default();
	let mut addresses = OrderedSet::default();
	let mut circles = OrderedSet::default();
	let mut op_ids = Vec::new();

	for record in records {
		phones.push(record.mobile.as_deref());
		phones.push(record.alt_mobile.as_deref());
		names.push(record.name.as_deref());
		fnames.push(record.fname.as_deref());
		emails.push(record.email.as_deref());
		addresses.push(record.address.as_deref());
		circles.push(record.circle.as_deref());

		if let Some(op_id) = present(record.operator_id.as_deref()) {
			op_ids.push(op_id.to_string());
		}
	}

	let phones = phones.into_vec();
	let total_phones = phones.len();

	Profile {
		seed: seed.to_string(),
		phones,
		names: names.into_vec(),
		fnames: fnames.into_vec(),
		emails: emails.into_vec(),
		addresses: addresses.into_vec(),
		circles: circles.into_vec(),
		op_ids,
		total_records: records.len(),
		total_phones,
	}
}

/// First-seen order with per-field uniqueness.
#[derive(Default)]
struct OrderedSet {
	seen: HashSet<String>,
	values: Vec<String>,
}
impl OrderedSet {
	fn push(&mut self, value: Option<&str>) {
		let Some(value) = present(value) else {
			return;
		};

		if self.seen.insert(value.to_string()) {
			self.values.push(value.to_string());
		}
	}

	fn into_vec(self) -> Vec<String> {
		self.values
	}
}
