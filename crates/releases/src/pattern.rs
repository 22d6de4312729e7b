//! Release-name pattern and the acceptance check built on it.

use regex::Regex;
use tracing::debug;

use crate::{Release, ReleaseCheckError};

/// Loose version pattern for Micronaut release names.
///
/// "Micronaut", optionally followed by " Framework", then the version and an
/// optional RC or milestone suffix. The `.` separators are wildcards.
pub const MICRONAUT_RELEASE_PATTERN: &str =
    "Micronaut( Framework)? [0-9].[0-9].[0-9]([0-9])?( (RC|M)[0-9])?";

/// What an unescaped `.` compiles to: any character except a line terminator.
const ANY_BUT_LINE_TERMINATOR: &str = r"[^\n\r\x{85}\x{2028}\x{2029}]";

/// A compiled pattern that release names must match in full.
#[derive(Debug, Clone)]
pub struct ReleaseNamePattern {
    source: String,
    regex: Regex,
}

impl ReleaseNamePattern {
    /// Compiles `pattern`, anchored at both ends.
    ///
    /// A bare `.` never matches `\r`, U+0085, U+2028 or U+2029, in addition
    /// to the `\n` that `regex` already excludes.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", exclude_line_terminators(pattern)))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns `true` if the whole of `name` matches.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Returns the unanchored pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for ReleaseNamePattern {
    fn default() -> Self {
        Self::new(MICRONAUT_RELEASE_PATTERN)
            .unwrap_or_else(|e| unreachable!("built-in pattern is valid: {e}"))
    }
}

/// Rewrites every `.` outside escapes and character classes.
fn exclude_line_terminators(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut class_depth = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' => {
                out.push(c);
                class_depth += 1;
                // A `]` right after the opening bracket (or `[^`) is literal.
                if chars.peek() == Some(&'^') {
                    out.extend(chars.next());
                }
                if chars.peek() == Some(&']') {
                    out.extend(chars.next());
                }
            }
            ']' if class_depth > 0 => {
                out.push(c);
                class_depth -= 1;
            }
            '.' if class_depth == 0 => out.push_str(ANY_BUT_LINE_TERMINATOR),
            _ => out.push(c),
        }
    }
    out
}

/// Checks every release name against `pattern`.
///
/// Returns the number of records checked. With `require_non_empty`, an empty
/// input is an error; every mismatching name is reported, not only the first.
pub fn check_release_names<'a, I>(
    pattern: &ReleaseNamePattern,
    releases: I,
    require_non_empty: bool,
) -> Result<usize, ReleaseCheckError>
where
    I: IntoIterator<Item = &'a Release>,
{
    let mut checked = 0;
    let mut mismatches = Vec::new();
    for release in releases {
        checked += 1;
        if !pattern.is_match(&release.name) {
            debug!(name = %release.name, "Release name does not match");
            mismatches.push(release.name.clone());
        }
    }

    if checked == 0 && require_non_empty {
        return Err(ReleaseCheckError::Empty);
    }
    if !mismatches.is_empty() {
        return Err(ReleaseCheckError::NameMismatch {
            pattern: pattern.as_str().to_string(),
            names: mismatches,
        });
    }
    Ok(checked)
}
