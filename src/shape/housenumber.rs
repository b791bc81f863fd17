use log::debug;

/// How the upper bound of an `A-B` house-number range is treated.
///
/// `HalfOpen` stops before `B` (`12-15` gives 12, 13, 14). That is most likely
/// not what mappers mean, but it is the behaviour stored documents have so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RangePolicy {
    #[default]
    HalfOpen,
    Inclusive,
}

/// Ranges longer than this are kept as raw values.
pub const MAX_RANGE_LEN: i64 = 10_000;

/// Parsing rule picked for a raw house number, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Range,
    List,
    Raw,
}

impl Rule {
    fn select(raw: &str) -> Rule {
        if raw.contains('-') {
            Rule::Range
        } else if raw.contains(',') {
            Rule::List
        } else {
            Rule::Raw
        }
    }
}

/// Normalizes `addr:housenumber` values into a list of house numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseNumberExpander {
    range_policy: RangePolicy,
}

impl HouseNumberExpander {
    pub fn new(range_policy: RangePolicy) -> Self {
        HouseNumberExpander { range_policy }
    }

    pub fn range_policy(&self) -> RangePolicy {
        self.range_policy
    }

    /// Never fails: a value the selected rule cannot parse is returned as a
    /// single raw entry.
    pub fn expand(&self, raw: &str) -> Vec<String> {
        let attempt = match Rule::select(raw) {
            Rule::Range => self.expand_range(raw),
            Rule::List => Some(split_list(raw)),
            Rule::Raw => None,
        };
        attempt.unwrap_or_else(|| vec![raw.to_string()])
    }

    /// Only the first two `-`-separated parts are read.
    fn expand_range(&self, raw: &str) -> Option<Vec<String>> {
        let mut bounds = raw.split('-');
        let start: i64 = bounds.next()?.trim().parse().ok()?;
        let end: i64 = bounds.next()?.trim().parse().ok()?;
        let end = match self.range_policy {
            RangePolicy::HalfOpen => end,
            RangePolicy::Inclusive => end.checked_add(1)?,
        };
        let len = end.checked_sub(start)?;
        if len > MAX_RANGE_LEN {
            debug!(value = raw, len = len; "House number range too long to expand, keeping raw value");
            return None;
        }
        Some((start..end).map(|number| number.to_string()).collect())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(raw: &str) -> Vec<String> {
        HouseNumberExpander::default().expand(raw)
    }

    #[test]
    fn range_excludes_upper_bound() {
        assert_eq!(expand("12-15"), vec!["12", "13", "14"]);
    }

    #[test]
    fn inclusive_range_includes_upper_bound() {
        let expander = HouseNumberExpander::new(RangePolicy::Inclusive);
        assert_eq!(expander.expand("12-15"), vec!["12", "13", "14", "15"]);
    }

    #[test]
    fn list_is_split_verbatim() {
        assert_eq!(expand("3,5,7"), vec!["3", "5", "7"]);
        assert_eq!(expand("3, 5a"), vec!["3", " 5a"]);
    }

    #[test]
    fn plain_value_is_wrapped() {
        assert_eq!(expand("42b"), vec!["42b"]);
    }

    #[test]
    fn non_numeric_range_falls_back_to_raw() {
        assert_eq!(expand("12A-15"), vec!["12A-15"]);
        assert_eq!(expand("-5"), vec!["-5"]);
        assert_eq!(expand("1-2,3"), vec!["1-2,3"]);
    }

    #[test]
    fn range_bounds_allow_surrounding_whitespace() {
        assert_eq!(expand("1 - 3"), vec!["1", "2"]);
    }

    #[test]
    fn extra_range_parts_are_ignored() {
        assert_eq!(expand("1-3-9"), vec!["1", "2"]);
    }

    #[test]
    fn empty_and_reversed_ranges_expand_to_nothing() {
        assert!(expand("10-10").is_empty());
        assert!(expand("15-12").is_empty());
    }

    #[test]
    fn oversized_range_falls_back_to_raw() {
        assert_eq!(expand("1-1000000000"), vec!["1-1000000000"]);
        assert_eq!(expand("1-20000"), vec!["1-20000"]);
        assert_eq!(expand("1-10001").len(), 10_000);
    }
}
