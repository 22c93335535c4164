//! Slug normalization and grammar
//!
//! A slug is one or more runs of `[a-z0-9]` joined by single hyphens, i.e. it
//! matches `^[a-z0-9]+(-[a-z0-9]+)*$`.

use std::fmt;

/// Normalize a display name into a slug
///
/// Lowercases the name, replaces every run of characters outside `[a-z0-9]`
/// with a single hyphen and strips hyphens from both ends. Letters that are
/// not ASCII after lowercasing count as separators.
///
/// Returns an empty string when the name holds no ASCII alphanumerics, so
/// callers that need a slug must bring their own fallback.
///
/// # Examples
///
/// ```
/// use component_slugs::normalize;
///
/// assert_eq!(normalize("My Button!!"), "my-button");
/// assert_eq!(normalize("***"), "");
/// ```
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for character in lowered.chars() {
        if character.is_ascii_lowercase() || character.is_ascii_digit() {
            // Separators before the first segment are dropped
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(character);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Check whether a string is a well-formed slug
///
/// Rejects the empty string, uppercase letters, anything outside `[a-z0-9-]`,
/// leading or trailing hyphens, and doubled hyphens.
pub fn is_valid(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit())
        })
}

/// A display name together with its normalized form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    raw: String,
    normalized: String,
}

impl Candidate {
    /// Create a candidate from a display name
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    /// The name as entered
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized slug, possibly empty
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whether normalization left nothing usable
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// One step of the suffix search: `base` on the first attempt, `base-N` after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt<'a> {
    base: &'a str,
    suffix: Option<u32>,
}

impl<'a> Attempt<'a> {
    /// The first attempt, without suffix
    pub fn first(base: &'a str) -> Self {
        Self { base, suffix: None }
    }

    /// The attempt after this one
    pub fn next(self) -> Self {
        let suffix = self.suffix.map_or(1, |suffix| suffix + 1);
        Self {
            base: self.base,
            suffix: Some(suffix),
        }
    }

    pub fn base(&self) -> &'a str {
        self.base
    }

    pub fn suffix(&self) -> Option<u32> {
        self.suffix
    }
}

impl fmt::Display for Attempt<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suffix {
            Some(suffix) => write!(formatter, "{}-{}", self.base, suffix),
            None => formatter.write_str(self.base),
        }
    }
}
