use chrono::{DateTime, Utc};
use std::path::Path;

/// Non-empty `/`-separated segments of a repository path.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub fn node_id(path: &str) -> String {
    path.replace('/', "_")
}

/// Extension without the leading dot, or `None` for names like `Makefile`.
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Whole days elapsed between `then` and `now`, rounded down.
pub fn days_between(now: &DateTime<Utc>, then: &DateTime<Utc>) -> i64 {
    (*now - *then).num_hours().div_euclid(24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn segments_skip_empty_parts() {
        let parts: Vec<_> = path_segments("/src//heat/score.rs/").collect();
        assert_eq!(parts, vec!["src", "heat", "score.rs"]);
        assert_eq!(path_segments("///").count(), 0);
    }

    #[test]
    fn extension_strips_dot() {
        assert_eq!(extension("score.rs").as_deref(), Some("rs"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("Makefile"), None);
        assert_eq!(extension(".gitignore"), None);
    }

    #[test]
    fn days_between_rounds_down() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(days_between(&now, &(now - Duration::hours(23))), 0);
        assert_eq!(days_between(&now, &(now - Duration::hours(49))), 2);
        assert_eq!(days_between(&now, &(now + Duration::hours(1))), -1);
    }

    #[test]
    fn node_id_flattens_separators() {
        assert_eq!(node_id("src/heat/score.rs"), "src_heat_score.rs");
    }
}
