use tws_types::{PackageId, Region};

/// HTTP endpoint paths for the trace warning package distribution.
pub mod endpoints {
    pub const API_VERSION: &str = "v2";
    pub const PACKAGE_ROOT: &str = "twp";
}

/// Response headers the distribution server sets on package downloads.
pub mod headers {
    pub const ETAG: &str = "etag";
    /// Present with value `1` when the bucket was published without content.
    pub const EMPTY_PACKAGE: &str = "cwa-empty-pkg";
}

/// Discovery path for a region: `/version/v2/twp/country/{region}/hour`.
pub fn discovery_path(region: &Region) -> String {
    format!(
        "/version/{}/{}/country/{}/hour",
        endpoints::API_VERSION,
        endpoints::PACKAGE_ROOT,
        region
    )
}

/// Package path for one bucket: `/version/v2/twp/country/{region}/hour/{id}`.
pub fn package_path(region: &Region, id: PackageId) -> String {
    format!("{}/{}", discovery_path(region), id)
}

/// Interprets the empty-package header value.
pub fn is_empty_marker(value: &str) -> bool {
    value.trim() == "1"
}

/// Strips the quotes and weak-validator prefix HTTP puts around ETags.
pub fn normalize_etag(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    raw.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn de() -> Region {
        Region::new("DE").unwrap()
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(discovery_path(&de()), "/version/v2/twp/country/DE/hour");
        assert_eq!(
            package_path(&de(), PackageId::new(449_005)),
            "/version/v2/twp/country/DE/hour/449005"
        );
    }

    #[test]
    fn empty_marker_values() {
        assert!(is_empty_marker("1"));
        assert!(is_empty_marker(" 1 "));
        assert!(!is_empty_marker("0"));
        assert!(!is_empty_marker(""));
    }

    #[test]
    fn etag_normalization() {
        assert_eq!(normalize_etag("\"abc\""), "abc");
        assert_eq!(normalize_etag("W/\"abc\""), "abc");
        assert_eq!(normalize_etag("abc"), "abc");
    }
}
