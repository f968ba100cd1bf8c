//! Ordering strategies for tarball lists
//!
//! All strategies are stable: entries that compare equal keep their input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::tarball::error::RegistryError;
use crate::tarball::types::TarballDescription;
use crate::version::ordinal::VersionOrdinal;

/// How to order a list of tarballs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortCriteria {
    /// flavor, version, OS, arch, name. The canonical persisted order.
    #[default]
    AllFields,
    Date,
    Name,
    ShortVersion,
    Version,
}

impl SortCriteria {
    pub const ALL: [SortCriteria; 5] = [
        SortCriteria::AllFields,
        SortCriteria::Date,
        SortCriteria::Name,
        SortCriteria::ShortVersion,
        SortCriteria::Version,
    ];

    /// Returns the label used to select this criteria
    pub fn as_str(&self) -> &'static str {
        match self {
            SortCriteria::AllFields => "full",
            SortCriteria::Date => "date",
            SortCriteria::Name => "name",
            SortCriteria::ShortVersion => "short",
            SortCriteria::Version => "version",
        }
    }

    fn compare(&self, a: &TarballDescription, b: &TarballDescription) -> Ordering {
        match self {
            SortCriteria::AllFields => compare_all_fields(a, b),
            SortCriteria::Date => compare_dates(&a.date_added, &b.date_added),
            SortCriteria::Name => a.name.cmp(&b.name),
            SortCriteria::ShortVersion => compare_versions(&a.short_version, &b.short_version),
            SortCriteria::Version => compare_versions(&a.version, &b.version),
        }
    }
}

impl fmt::Display for SortCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriteria {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|criteria| criteria.as_str() == s)
            .ok_or_else(|| {
                let labels: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                RegistryError::InvalidArgument(format!(
                    "invalid sort criteria: {}. Expected one of: {}",
                    s,
                    labels.join(", ")
                ))
            })
    }
}

/// Sort a tarball list in place and return it
pub fn sorted_tarball_list(
    mut tarballs: Vec<TarballDescription>,
    criteria: SortCriteria,
) -> Vec<TarballDescription> {
    tarballs.sort_by(|a, b| criteria.compare(a, b));
    tarballs
}

/// Group tarballs by short version, in ascending short version order
pub fn tarball_tree(tarballs: &[TarballDescription]) -> IndexMap<String, Vec<TarballDescription>> {
    let sorted = sorted_tarball_list(tarballs.to_vec(), SortCriteria::ShortVersion);

    let mut tree: IndexMap<String, Vec<TarballDescription>> = IndexMap::new();
    for tarball in sorted {
        tree.entry(tarball.short_version.clone())
            .or_default()
            .push(tarball);
    }
    tree
}

fn compare_all_fields(a: &TarballDescription, b: &TarballDescription) -> Ordering {
    a.flavor
        .cmp(&b.flavor)
        .then_with(|| compare_versions(&a.version, &b.version))
        .then_with(|| a.operating_system.cmp(&b.operating_system))
        .then_with(|| a.arch.cmp(&b.arch))
        .then_with(|| a.name.cmp(&b.name))
}

/// Order two version strings by their ordinals
///
/// Versions where one is a prefix of the other ("8.0" and "8.0.1") are not
/// less than each other; the shorter one is placed first so the ordering
/// stays total.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = VersionOrdinal::parse(a);
    let b = VersionOrdinal::parse(b);
    if a.less(&b) {
        Ordering::Less
    } else if b.less(&a) {
        Ordering::Greater
    } else {
        a.segments().len().cmp(&b.segments().len())
    }
}

/// Parsed dates come first in date order, then unparsed values in string order
fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(date_a), Some(date_b)) => date_a.cmp(&date_b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y", "%b %d %Y"];

/// Parse a free-form date, accepting the common layouts found in the
/// `date_added` field
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.naive_utc());
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.naive_utc());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tarball(
        name: &str,
        flavor: &str,
        version: &str,
        os: &str,
        arch: &str,
    ) -> TarballDescription {
        TarballDescription {
            name: name.to_string(),
            flavor: flavor.to_string(),
            version: version.to_string(),
            short_version: crate::version::ordinal::short_version(version),
            operating_system: os.to_string(),
            arch: arch.to_string(),
            ..Default::default()
        }
    }

    fn dated(name: &str, date_added: &str) -> TarballDescription {
        TarballDescription {
            name: name.to_string(),
            date_added: date_added.to_string(),
            ..Default::default()
        }
    }

    fn names(tarballs: &[TarballDescription]) -> Vec<&str> {
        tarballs.iter().map(|t| t.name.as_str()).collect()
    }

    #[rstest]
    #[case("full", SortCriteria::AllFields)]
    #[case("date", SortCriteria::Date)]
    #[case("name", SortCriteria::Name)]
    #[case("short", SortCriteria::ShortVersion)]
    #[case("version", SortCriteria::Version)]
    fn from_str_accepts_known_labels(#[case] label: &str, #[case] expected: SortCriteria) {
        assert_eq!(label.parse::<SortCriteria>().unwrap(), expected);
        assert_eq!(expected.as_str(), label);
    }

    #[test]
    fn from_str_rejects_unknown_label_listing_valid_ones() {
        let err = "size".parse::<SortCriteria>().unwrap_err();

        assert!(matches!(err, RegistryError::InvalidArgument(_)));
        let message = err.to_string();
        for criteria in SortCriteria::ALL {
            assert!(message.contains(criteria.as_str()), "{message}");
        }
    }

    #[test]
    fn default_criteria_is_all_fields() {
        assert_eq!(SortCriteria::default(), SortCriteria::AllFields);
    }

    #[test]
    fn sort_by_name_is_lexicographic() {
        let sorted = sorted_tarball_list(
            vec![
                tarball("c", "mysql", "8.0.1", "linux", "amd64"),
                tarball("a", "mysql", "8.0.2", "linux", "amd64"),
                tarball("b", "mysql", "8.0.3", "linux", "amd64"),
            ],
            SortCriteria::Name,
        );

        assert_eq!(names(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn sort_by_version_uses_numeric_segments() {
        let sorted = sorted_tarball_list(
            vec![
                tarball("v10", "mysql", "8.0.10", "linux", "amd64"),
                tarball("v9", "mysql", "8.0.9", "linux", "amd64"),
                tarball("v57", "mysql", "5.7.44", "linux", "amd64"),
            ],
            SortCriteria::Version,
        );

        assert_eq!(names(&sorted), vec!["v57", "v9", "v10"]);
    }

    #[test]
    fn sort_by_short_version_keeps_input_order_within_family() {
        let sorted = sorted_tarball_list(
            vec![
                tarball("second-8.0", "mysql", "8.0.9", "linux", "amd64"),
                tarball("only-5.7", "mysql", "5.7.44", "linux", "amd64"),
                tarball("first-8.0", "mysql", "8.0.1", "linux", "amd64"),
            ],
            SortCriteria::ShortVersion,
        );

        assert_eq!(names(&sorted), vec!["only-5.7", "second-8.0", "first-8.0"]);
    }

    #[test]
    fn sort_by_all_fields_orders_flavor_version_os_arch_name() {
        let sorted = sorted_tarball_list(
            vec![
                tarball("percona", "percona", "5.7.1", "linux", "amd64"),
                tarball("mysql-linux-arm", "mysql", "8.0.37", "linux", "arm64"),
                tarball("mysql-darwin", "mysql", "8.0.37", "darwin", "arm64"),
                tarball("mysql-linux-amd", "mysql", "8.0.37", "linux", "amd64"),
                tarball("mysql-old", "mysql", "8.0.9", "linux", "amd64"),
            ],
            SortCriteria::AllFields,
        );

        assert_eq!(
            names(&sorted),
            vec![
                "mysql-old",
                "mysql-darwin",
                "mysql-linux-amd",
                "mysql-linux-arm",
                "percona"
            ]
        );
    }

    #[test]
    fn sort_by_all_fields_is_idempotent() {
        let input = vec![
            tarball("b", "ndb", "8.0.1", "linux", "amd64"),
            tarball("a", "mysql", "8.0.2", "linux", "amd64"),
            tarball("c", "mysql", "5.7.2", "darwin", "amd64"),
            tarball("d", "mysql", "5.7.2", "darwin", "amd64"),
        ];

        let once = sorted_tarball_list(input, SortCriteria::AllFields);
        let twice = sorted_tarball_list(once.clone(), SortCriteria::AllFields);

        assert_eq!(once, twice);
    }

    #[test]
    fn sort_by_date_compares_parsed_instants() {
        let sorted = sorted_tarball_list(
            vec![
                dated("late", "2024-03-01 10:00"),
                dated("early", "2023-12-31"),
                dated("middle", "2024-01-15T08:30:00Z"),
            ],
            SortCriteria::Date,
        );

        assert_eq!(names(&sorted), vec!["early", "middle", "late"]);
    }

    #[test]
    fn sort_by_date_puts_unparsed_values_last_in_string_order() {
        let sorted = sorted_tarball_list(
            vec![
                dated("c", "sometime later"),
                dated("b", "2024-02-01"),
                dated("d", "5 junk"),
                dated("a", "9 January 2024"),
            ],
            SortCriteria::Date,
        );

        assert_eq!(names(&sorted), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn sort_by_date_handles_large_mixed_input() {
        let input: Vec<TarballDescription> = (0..600u32)
            .map(|i| {
                let seed = i.wrapping_mul(2_654_435_761) % 1000;
                let date_added = match seed % 3 {
                    0 => format!("{} January {}", seed % 28 + 1, 2020 + seed % 5),
                    1 => format!("{} junk", seed),
                    _ => format!("{}-0{}-1{}", 2020 + seed % 5, seed % 9 + 1, seed % 9),
                };
                dated(&i.to_string(), &date_added)
            })
            .collect();

        let sorted = sorted_tarball_list(input, SortCriteria::Date);

        assert_eq!(sorted.len(), 600);
        let split = sorted
            .iter()
            .position(|t| parse_date(&t.date_added).is_none())
            .unwrap_or(sorted.len());
        let (parsed, unparsed) = sorted.split_at(split);
        assert!(
            parsed
                .windows(2)
                .all(|w| parse_date(&w[0].date_added) <= parse_date(&w[1].date_added))
        );
        assert!(unparsed.iter().all(|t| parse_date(&t.date_added).is_none()));
        assert!(unparsed.windows(2).all(|w| w[0].date_added <= w[1].date_added));
    }

    #[rstest]
    #[case("2024-01-15", true)]
    #[case("2024-01-15 08:30", true)]
    #[case("2024-01-15T08:30:00+02:00", true)]
    #[case("Mon, 15 Jan 2024 08:30:00 +0000", true)]
    #[case("15 January 2024", true)]
    #[case("", false)]
    #[case("yesterday", false)]
    fn parse_date_accepts_common_layouts(#[case] input: &str, #[case] parses: bool) {
        assert_eq!(parse_date(input).is_some(), parses);
    }

    #[test]
    fn tarball_tree_groups_by_short_version_in_order() {
        let tree = tarball_tree(&[
            tarball("a", "mysql", "8.0.37", "linux", "amd64"),
            tarball("b", "mysql", "5.7.44", "linux", "amd64"),
            tarball("c", "mysql", "8.0.36", "linux", "amd64"),
        ]);

        let keys: Vec<&String> = tree.keys().collect();
        assert_eq!(keys, vec!["5.7", "8.0"]);
        assert_eq!(names(&tree["8.0"]), vec!["a", "c"]);
    }
}
