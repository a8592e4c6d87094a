//! Timestamp resolution for run file names
//!
//! The harness names its output `<family>_<variant>_<DD>_<MM>_<HHMMSS>.<ext>`,
//! e.g. `concurrent_cpu_aff_03_04_185131.txt` (3 April, 18:51:31). The suffix
//! carries no year, so the resolver supplies one: the current local year by
//! default, or an explicit year via [`TimestampResolver::with_year`].
//!
//! Files spanning a year boundary are mis-ranked under the default; callers
//! that care must pass an explicit year.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"_(\d{2})_(\d{2})_(\d{2})(\d{2})(\d{2})\.[A-Za-z0-9]+$")
            .expect("timestamp suffix pattern is a valid regex")
    })
}

/// Resolves the `_DD_MM_HHMMSS.<ext>` suffix of a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampResolver {
    year: i32,
}

impl Default for TimestampResolver {
    fn default() -> Self {
        Self::current_year()
    }
}

impl TimestampResolver {
    /// Resolver that stamps every timestamp with the current local year
    #[must_use]
    pub fn current_year() -> Self {
        Self {
            year: Local::now().year(),
        }
    }

    /// Resolver with an explicit year source
    #[must_use]
    pub const fn with_year(year: i32) -> Self {
        Self { year }
    }

    /// Year applied to resolved timestamps
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Resolve the timestamp embedded in a file name
    ///
    /// Only the final path component is inspected.
    ///
    /// # Returns
    /// `None` when the name has no `_DD_MM_HHMMSS.<ext>` suffix or the suffix
    /// is not a valid calendar date/time (e.g. `31_02_...`) in the
    /// resolver's year.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trueno_perflog::timestamp::TimestampResolver;
    ///
    /// let resolver = TimestampResolver::with_year(2025);
    /// let earlier = resolver.resolve("x_03_04_185131.txt").unwrap();
    /// let later = resolver.resolve("x_03_04_190000.txt").unwrap();
    /// assert!(earlier < later);
    /// assert!(resolver.resolve("x_results.txt").is_none());
    /// ```
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> Option<NaiveDateTime> {
        let name = path.as_ref().file_name()?.to_str()?;
        let captures = suffix_pattern().captures(name)?;
        let field = |index: usize| captures.get(index)?.as_str().parse::<u32>().ok();

        let date = NaiveDate::from_ymd_opt(self.year, field(2)?, field(1)?)?;
        let time = NaiveTime::from_hms_opt(field(3)?, field(4)?, field(5)?)?;
        Some(date.and_time(time))
    }
}

/// Resolve a file name timestamp using the current local year
#[must_use]
pub fn resolve_timestamp(path: impl AsRef<Path>) -> Option<NaiveDateTime> {
    TimestampResolver::current_year().resolve(path)
}
