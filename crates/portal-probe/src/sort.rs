//! Sort-order checks and the article sort options they verify.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Direction for [`is_sorted`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Each value `<=` the next
    Ascending,
    /// Each value `>=` the next
    Descending,
}

/// Whether every adjacent pair respects `direction`; ties are allowed.
///
/// Empty and single-element slices are sorted.
#[must_use]
pub fn is_sorted<T: PartialOrd>(values: &[T], direction: SortDirection) -> bool {
    values.windows(2).all(|pair| match direction {
        SortDirection::Ascending => pair[0] <= pair[1],
        SortDirection::Descending => pair[0] >= pair[1],
    })
}

fn integer_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").ok())
        .as_ref()
}

/// First integer in `text`, if it fits in a `u64`.
///
/// Comma thousands separators are read as part of the number, so
/// `"1,204 views"` is 1204; a comma not followed by three digits ends it.
#[must_use]
pub fn first_integer(text: &str) -> Option<u64> {
    integer_pattern()?
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Article ordering offered by the Knowledge Base sort dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOption {
    /// A to Z by title
    Alphabetical,
    /// Best rated first
    HighestRated,
    /// Most viewed first
    MostPopular,
    /// Most recent first
    Newest,
}

impl SortOption {
    /// Every option, in dropdown order
    pub const ALL: [Self; 4] = [
        Self::Alphabetical,
        Self::HighestRated,
        Self::MostPopular,
        Self::Newest,
    ];

    /// Label shown in the dropdown
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Alphabetical => "Alphabetical",
            Self::HighestRated => "Highest Rated",
            Self::MostPopular => "Most Popular",
            Self::Newest => "Newest",
        }
    }

    /// Option whose label equals `label`, ignoring case
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|option| option.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod is_sorted_tests {
        use super::*;

        #[test]
        fn test_trivial_sequences() {
            let empty: [u64; 0] = [];
            assert!(is_sorted(&empty, SortDirection::Descending));
            assert!(is_sorted(&empty, SortDirection::Ascending));
            assert!(is_sorted(&[7], SortDirection::Descending));
        }

        #[test]
        fn test_ties_allowed() {
            assert!(is_sorted(&[9, 5, 5, 1], SortDirection::Descending));
            assert!(is_sorted(&[1, 1, 2], SortDirection::Ascending));
        }

        #[test]
        fn test_violation() {
            assert!(!is_sorted(&[9, 5, 6], SortDirection::Descending));
            assert!(!is_sorted(&[1, 0], SortDirection::Ascending));
        }
    }

    mod first_integer_tests {
        use super::*;

        #[test]
        fn test_extracts_first_run() {
            assert_eq!(first_integer("Viewed 37 times, 2 today"), Some(37));
            assert_eq!(first_integer("Visible: 10"), Some(10));
        }

        #[test]
        fn test_thousands_separators() {
            assert_eq!(first_integer("1,204 views"), Some(1204));
            assert_eq!(first_integer("12,345,678 views"), Some(12_345_678));
            assert_eq!(first_integer("987 views"), Some(987));
        }

        #[test]
        fn test_comma_without_group_ends_number() {
            assert_eq!(first_integer("10,2 views"), Some(10));
            assert_eq!(first_integer("3, 4"), Some(3));
        }

        #[test]
        fn test_grouped_counts_keep_their_order() {
            let counts: Vec<u64> = ["1,204 views", "987 views", "15 views"]
                .iter()
                .filter_map(|t| first_integer(t))
                .collect();
            assert_eq!(counts, vec![1204, 987, 15]);
            assert!(is_sorted(&counts, SortDirection::Descending));
        }

        #[test]
        fn test_none_without_digits() {
            assert_eq!(first_integer("no views yet"), None);
            assert_eq!(first_integer(""), None);
        }

        #[test]
        fn test_overflow_is_none() {
            assert_eq!(first_integer("99999999999999999999999 views"), None);
        }
    }

    mod sort_option_tests {
        use super::*;

        #[test]
        fn test_labels_round_trip() {
            for option in SortOption::ALL {
                assert_eq!(SortOption::from_label(option.label()), Some(option));
            }
            assert_eq!(
                SortOption::from_label(" most popular "),
                Some(SortOption::MostPopular)
            );
            assert_eq!(SortOption::from_label("Oldest"), None);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_descending_iff_adjacent_pairs(values in proptest::collection::vec(0u64..50, 0..20)) {
                let expected = values.iter().zip(values.iter().skip(1)).all(|(a, b)| a >= b);
                prop_assert_eq!(is_sorted(&values, SortDirection::Descending), expected);
            }

            #[test]
            fn prop_sorted_vec_is_sorted(mut values in proptest::collection::vec(any::<u64>(), 0..30)) {
                values.sort_unstable();
                prop_assert!(is_sorted(&values, SortDirection::Ascending));
                values.reverse();
                prop_assert!(is_sorted(&values, SortDirection::Descending));
            }

            #[test]
            fn prop_first_integer_finds_embedded_number(n in any::<u32>(), prefix in "[a-z ]{0,8}") {
                let text = format!("{prefix}{n} views");
                prop_assert_eq!(first_integer(&text), Some(u64::from(n)));
            }

            #[test]
            fn prop_first_integer_reads_grouped_number(n in any::<u32>()) {
                let digits = n.to_string();
                let mut grouped = String::new();
                for (i, c) in digits.chars().enumerate() {
                    if i > 0 && (digits.len() - i) % 3 == 0 {
                        grouped.push(',');
                    }
                    grouped.push(c);
                }
                prop_assert_eq!(first_integer(&format!("{grouped} views")), Some(u64::from(n)));
            }
        }
    }
}
