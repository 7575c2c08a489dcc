//! Identifier generation and parsing.
//!
//! IDs are `<prefix>-<hash>`, where `<hash>` is lowercase base-36
//! (`[0-9a-z]`), starting at 3 characters and expanding up to 8 as the
//! collision set grows. The seed is the high-resolution clock, the
//! existing-issue count, and a per-call counter — never issue content —
//! so two calls for the same issue never collide against each other.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{BeadsError, Result};

const MIN_HASH_LENGTH: usize = 3;
const MAX_HASH_LENGTH: usize = 8;
const MAX_RETRIES: u32 = 256;

static CALL_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Default ID generation configuration.
#[derive(Debug, Clone)]
pub struct IdConfig {
    /// Issue ID prefix (e.g., "bd", "br").
    pub prefix: String,
    pub min_hash_length: usize,
    pub max_hash_length: usize,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: "bd".to_string(),
            min_hash_length: MIN_HASH_LENGTH,
            max_hash_length: MAX_HASH_LENGTH,
        }
    }
}

impl IdConfig {
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }
}

/// ID generator that produces unique issue IDs.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    config: IdConfig,
}

impl IdGenerator {
    #[must_use]
    pub const fn new(config: IdConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(IdConfig::default())
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Generate a new, unique ID.
    ///
    /// `n_existing` is the current issue count (used to pick a starting hash
    /// length so collisions stay rare as the store grows). `collides` should
    /// return `true` if the candidate ID is already taken.
    ///
    /// # Errors
    ///
    /// Returns `CollisionLimitExceeded` after 256 retries without finding a
    /// free ID, even at the maximum hash length.
    pub fn generate<F>(&self, n_existing: usize, collides: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut length =
            starting_length(n_existing, self.config.min_hash_length, self.config.max_hash_length);

        for _ in 0..MAX_RETRIES {
            let candidate = format!("{}-{}", self.config.prefix, next_hash(length));
            if !collides(&candidate) {
                return Ok(candidate);
            }
            if length < self.config.max_hash_length {
                length += 1;
            }
        }

        Err(BeadsError::CollisionLimitExceeded {
            prefix: self.config.prefix.clone(),
        })
    }
}

/// Pick a starting hash length proportional to the existing issue count, so
/// a fresh workspace gets short IDs and a large one starts wider immediately.
fn starting_length(n_existing: usize, min_len: usize, max_len: usize) -> usize {
    let mut length = min_len;
    while length < max_len
        && (36_usize.saturating_pow(u32::try_from(length).unwrap_or(u32::MAX)))
            < n_existing.saturating_mul(4)
    {
        length += 1;
    }
    length
}

/// Produce the next base-36 hash of the given length from the clock + counter seed.
fn next_hash(length: usize) -> String {
    let counter = CALL_COUNTER.fetch_add(1, Ordering::Relaxed);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seed = (now.as_nanos() as u64)
        ^ (u64::from(counter).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        ^ (u64::from(now.subsec_nanos()) << 17);

    let encoded = base36_encode(seed);
    if encoded.len() >= length {
        encoded.chars().rev().take(length).collect::<String>().chars().rev().collect()
    } else {
        format!("{encoded:0>length$}")
    }
}

fn base36_encode(mut num: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if num == 0 {
        return "0".to_string();
    }
    let mut chars = Vec::new();
    while num > 0 {
        chars.push(ALPHABET[(num % 36) as usize] as char);
        num /= 36;
    }
    chars.into_iter().rev().collect()
}

// ============================================================================
// ID Parsing and Validation
// ============================================================================

/// Parsed components of an issue ID (`<prefix>-<hash>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    pub prefix: String,
    pub hash: String,
}

impl ParsedId {
    #[must_use]
    pub fn to_id_string(&self) -> String {
        format!("{}-{}", self.prefix, self.hash)
    }
}

/// Parse an issue ID into its components.
///
/// # Errors
///
/// Returns `InvalidId` if the ID format is invalid.
pub fn parse_id(id: &str) -> Result<ParsedId> {
    let Some(dash_pos) = id.find('-') else {
        return Err(BeadsError::InvalidId { id: id.to_string() });
    };

    let prefix = &id[..dash_pos];
    let hash = &id[dash_pos + 1..];

    if prefix.is_empty() || hash.is_empty() {
        return Err(BeadsError::InvalidId { id: id.to_string() });
    }

    if !hash
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(BeadsError::InvalidId { id: id.to_string() });
    }

    Ok(ParsedId {
        prefix: prefix.to_string(),
        hash: hash.to_string(),
    })
}

/// Validate that an ID has the expected prefix (or one of the allowed ones).
///
/// # Errors
///
/// Returns `PrefixMismatch` if the prefix doesn't match expected or allowed.
pub fn validate_prefix(id: &str, expected_prefix: &str, allowed_prefixes: &[String]) -> Result<()> {
    let parsed = parse_id(id)?;

    if parsed.prefix == expected_prefix || allowed_prefixes.contains(&parsed.prefix) {
        return Ok(());
    }

    Err(BeadsError::PrefixMismatch {
        expected: expected_prefix.to_string(),
        found: parsed.prefix,
    })
}

#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

#[must_use]
pub fn is_valid_id_format(id: &str) -> bool {
    parse_id(id).is_ok()
}

// ============================================================================
// ID Resolution
// ============================================================================

/// Configuration for ID resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub default_prefix: String,
    pub allowed_prefixes: Vec<String>,
    pub allow_substring_match: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_prefix: "bd".to_string(),
            allowed_prefixes: Vec::new(),
            allow_substring_match: true,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            default_prefix: prefix.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedId {
    pub id: String,
    pub match_type: MatchType,
    pub original_input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    PrefixNormalized,
    Substring,
}

/// ID resolver that resolves partial IDs to full IDs.
///
/// Resolution order:
/// 1. Exact ID match
/// 2. Normalize: if missing prefix, prepend `default_prefix-` and retry
/// 3. Substring match on hash portion across all prefixes
/// 4. Ambiguity => error with candidate list
#[derive(Debug, Clone)]
pub struct IdResolver {
    config: ResolverConfig,
}

impl IdResolver {
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ResolverConfig::default())
    }

    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::new(ResolverConfig::with_prefix(prefix))
    }

    /// # Errors
    ///
    /// - `IssueNotFound` if no match is found.
    /// - `AmbiguousId` if multiple matches are found.
    pub fn resolve<F, G>(&self, input: &str, exists_fn: F, substring_match_fn: G) -> Result<ResolvedId>
    where
        F: Fn(&str) -> bool,
        G: Fn(&str) -> Vec<String>,
    {
        let input = input.trim();
        if input.is_empty() {
            return Err(BeadsError::InvalidId { id: String::new() });
        }

        let normalized = normalize_id(input);

        if exists_fn(&normalized) {
            return Ok(ResolvedId {
                id: normalized,
                match_type: MatchType::Exact,
                original_input: input.to_string(),
            });
        }

        if !normalized.contains('-') {
            let with_prefix = format!("{}-{}", self.config.default_prefix, normalized);
            if exists_fn(&with_prefix) {
                return Ok(ResolvedId {
                    id: with_prefix,
                    match_type: MatchType::PrefixNormalized,
                    original_input: input.to_string(),
                });
            }
        }

        if self.config.allow_substring_match {
            let hash_pattern = normalized
                .find('-')
                .map_or(normalized.as_str(), |pos| &normalized[pos + 1..]);

            if !hash_pattern.is_empty() {
                let matches = substring_match_fn(hash_pattern);
                match matches.len() {
                    0 => {}
                    1 => {
                        return Ok(ResolvedId {
                            id: matches.into_iter().next().expect("length checked to be 1"),
                            match_type: MatchType::Substring,
                            original_input: input.to_string(),
                        });
                    }
                    _ => {
                        return Err(BeadsError::AmbiguousId {
                            partial: input.to_string(),
                            matches,
                        });
                    }
                }
            }
        }

        Err(BeadsError::IssueNotFound {
            id: input.to_string(),
        })
    }
}

/// Find all issue IDs that contain the given substring in their hash portion.
#[must_use]
pub fn find_matching_ids(all_ids: &[String], hash_substring: &str) -> Vec<String> {
    all_ids
        .iter()
        .filter(|id| {
            id.find('-')
                .is_some_and(|pos| id[pos + 1..].contains(hash_substring))
        })
        .cloned()
        .collect()
}

/// # Errors
///
/// - `IssueNotFound` if no match is found.
/// - `AmbiguousId` if multiple matches are found.
/// - `InvalidId` if the input is empty.
pub fn resolve_id<F, G>(input: &str, exists_fn: F, substring_match_fn: G) -> Result<String>
where
    F: Fn(&str) -> bool,
    G: Fn(&str) -> Vec<String>,
{
    let resolver = IdResolver::with_defaults();
    resolver
        .resolve(input, exists_fn, substring_match_fn)
        .map(|r| r.id)
}
