//! Bounded breadth-first traversal over `mobile` / `alt_mobile` links.
//!
//! Each level resolves every frontier number with the two indexed lookups, keeps rows whose
//! content fingerprint is new, and collects the numbers those rows mention for the next level.
//! Query volume is bounded by `max_depth × frontier width × max_results`.

use std::{
	collections::HashSet,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use linktrace_storage::{Error as StorageError, models::Record};

use crate::{BoxFuture, Error, Result, identifier, profile};

/// The two point lookups traversal is allowed to issue.
pub trait LinkIndex
where
	Self: Send + Sync,
{
	fn find_by_primary<'a>(
		&'a self,
		identifier: &'a str,
	) -> BoxFuture<'a, linktrace_storage::Result<Vec<Record>>>;

	fn find_by_secondary<'a>(
		&'a self,
		identifier: &'a str,
	) -> BoxFuture<'a, linktrace_storage::Result<Vec<Record>>>;
}

/// Cooperative cancellation, checked once before each level.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);
impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// Content fingerprint over (mobile, name, fname, address).
///
/// Two rows with identical values in these columns are treated as the same fact even when they
/// are physically distinct rows. Values are trimmed and null markers hash as absent, matching
/// what the profile keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowKey([u8; 32]);
impl RowKey {
	pub fn of(record: &Record) -> Self {
		let mut hasher = blake3::Hasher::new();

		for field in [&record.mobile, &record.name, &record.fname, &record.address] {
			match profile::present(field.as_deref()) {
				Some(value) => {
					hasher.update(&[1]);
					hasher.update(&(value.len() as u64).to_le_bytes());
					hasher.update(value.as_bytes());
				},
				None => {
					hasher.update(&[0]);
				},
			}
		}

		Self(*hasher.finalize().as_bytes())
	}
}

#[derive(Debug, Default)]
pub struct Traversal {
	/// Unique rows in discovery order.
	pub records: Vec<Record>,
	/// Every explored number, in visitation order.
	pub visited: Vec<String>,
	/// Number of levels processed.
	pub levels: u32,
	/// Lookups that failed and were treated as empty.
	pub failed_lookups: u32,
}

/// Walks the link graph from `seed` for at most `max_depth` levels.
///
/// Lookup failures other than a missing session are logged and treated as empty result sets so
/// one bad branch does not discard the rest of the traversal.
pub async fn traverse<I>(
	index: &I,
	seed: &str,
	max_depth: u32,
	cancel: Option<&CancelFlag>,
) -> Result<Traversal>
where
	I: LinkIndex + ?Sized,
{
	let mut out = Traversal::default();
	let mut visited: HashSet<String> = HashSet::new();
	let mut row_keys: HashSet<RowKey> = HashSet::new();
	let mut frontier = vec![seed.to_string()];

	while !frontier.is_empty() && out.levels < max_depth {
		if cancel.is_some_and(CancelFlag::is_cancelled) {
			return Err(Error::Cancelled);
		}

		let last_level = out.levels + 1 == max_depth;
		let mut next = Vec::new();
		let mut queued: HashSet<String> = HashSet::new();

		for number in frontier {
			if !visited.insert(number.clone()) {
				continue;
			}

			out.visited.push(number.clone());

			let mut rows = lookup(index, &number, Direction::Primary, &mut out).await?;

			rows.extend(lookup(index, &number, Direction::Secondary, &mut out).await?);

			for record in rows {
				if !last_level {
					for candidate in links(&record) {
						if !visited.contains(candidate) && queued.insert(candidate.to_string()) {
							next.push(candidate.to_string());
						}
					}
				}
				if row_keys.insert(RowKey::of(&record)) {
					out.records.push(record);
				}
			}
		}

		tracing::debug!(
			seed,
			level = out.levels,
			next_frontier = next.len(),
			records = out.records.len(),
			"Traversal level resolved."
		);

		frontier = next;
		out.levels += 1;
	}

	Ok(out)
}

#[derive(Clone, Copy, Debug)]
enum Direction {
	Primary,
	Secondary,
}
impl Direction {
	fn as_str(self) -> &'static str {
		match self {
			Self::Primary => "primary",
			Self::Secondary => "secondary",
		}
	}
}

async fn lookup<I>(
	index: &I,
	number: &str,
	direction: Direction,
	out: &mut Traversal,
) -> Result<Vec<Record>>
where
	I: LinkIndex + ?Sized,
{
	let result = match direction {
		Direction::Primary => index.find_by_primary(number).await,
		Direction::Secondary => index.find_by_secondary(number).await,
	};

	match result {
		Ok(rows) => Ok(rows),
		Err(err @ (StorageError::NotConnected | StorageError::Connection { .. })) => Err(err.into()),
		Err(err) => {
			tracing::warn!(
				number,
				direction = direction.as_str(),
				error = %err,
				"Link lookup failed. Treating branch as empty."
			);

			out.failed_lookups += 1;

			Ok(Vec::new())
		},
	}
}

fn links(record: &Record) -> impl Iterator<Item = &str> {
	let primary = record.mobile.as_deref().and_then(identifier::primary_link);
	let secondary = record.alt_mobile.as_deref().and_then(identifier::secondary_link);

	primary.into_iter().chain(secondary)
}
