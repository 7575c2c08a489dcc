//! Content hashing for issue deduplication.
//!
//! Uses a 64-bit `xxh3` digest over title/description/design/acceptance_criteria
//! with a fixed separator. Non-cryptographic: this is an advisory dedup key,
//! never a security boundary or a substitute for issue identity.

use xxhash_rust::xxh3::Xxh3;

use crate::model::Issue;

/// Trait for types that can produce a deterministic content digest.
pub trait ContentHashable {
    fn content_digest(&self) -> u64;
}

impl ContentHashable for Issue {
    fn content_digest(&self) -> u64 {
        self.compute_content_hash()
    }
}

/// Compute the 64-bit content digest for an issue's content fields.
///
/// Fields included, in order, each terminated with a NUL separator:
/// title, description, design, acceptance_criteria.
///
/// Fields excluded: id, status, priority, assignee, timestamps, labels,
/// dependencies, comments — anything that isn't "content" per the spec.
#[must_use]
pub fn content_hash(
    title: &str,
    description: Option<&str>,
    design: Option<&str>,
    acceptance_criteria: Option<&str>,
) -> u64 {
    let mut hasher = Xxh3::new();

    let mut add_field = |value: &str| {
        hasher.update(value.as_bytes());
        hasher.update(b"\0");
    };

    add_field(title);
    add_field(description.unwrap_or(""));
    add_field(design.unwrap_or(""));
    add_field(acceptance_criteria.unwrap_or(""));

    hasher.digest()
}
