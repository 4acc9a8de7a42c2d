//! Run configuration shared by the discovery and packaging steps.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::ConfigError;

/// Package-manager group every exported package is created in.
pub const PACKAGE_GROUP: &str = "data_exporter_packages";

/// Independent recursion bounds for the two discovery phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLimits {
    /// Global budget of recursive page fetches.
    pub max_page_depth: usize,
    /// Maximum nesting of asset expansion below each page.
    pub max_dam_depth: usize,
}

impl DepthLimits {
    pub fn new(max_page_depth: usize, max_dam_depth: usize) -> Self {
        Self {
            max_page_depth,
            max_dam_depth,
        }
    }

    /// Builds limits from raw argument values.
    ///
    /// Blank values count as absent, and at least one of the two must be
    /// present. A value that is absent or not a non-negative integer is
    /// treated as unbounded.
    pub fn from_arguments(
        max_page_depth: Option<&str>,
        max_dam_depth: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let max_page_depth = non_blank(max_page_depth);
        let max_dam_depth = non_blank(max_dam_depth);
        if max_page_depth.is_none() && max_dam_depth.is_none() {
            return Err(ConfigError::MissingDepth);
        }
        let limits = Self::new(parse_depth(max_page_depth), parse_depth(max_dam_depth));
        info!(
            max_page_depth = limits.max_page_depth,
            max_dam_depth = limits.max_dam_depth,
            "Resolved discovery depth limits"
        );
        Ok(limits)
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_depth(raw: Option<&str>) -> usize {
    match raw {
        Some(value) => value.parse::<usize>().unwrap_or_else(|e| {
            debug!(value, error = %e, "Depth is not a non-negative integer, treating as unbounded");
            usize::MAX
        }),
        None => usize::MAX,
    }
}

/// Everything `create_packages` needs besides the fetcher.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Content path the traversal starts from.
    pub path: String,
    pub limits: DepthLimits,
    /// Recorded as creator in the package manifests.
    pub username: String,
    /// Base package name; partitions append `_<index>`.
    pub package_name: String,
    pub working_directory: PathBuf,
}

/// `<base>_<index>`, the name shared by a partition's artifact and every transfer step.
pub fn package_name(base: &str, index: usize) -> String {
    format!("{base}_{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neither_depth_supplied_is_refused() {
        assert_eq!(
            DepthLimits::from_arguments(None, None),
            Err(ConfigError::MissingDepth)
        );
    }

    #[test]
    fn blank_depths_count_as_missing() {
        assert_eq!(
            DepthLimits::from_arguments(Some(""), Some("  ")),
            Err(ConfigError::MissingDepth)
        );
        assert_eq!(
            DepthLimits::from_arguments(Some(" "), None),
            Err(ConfigError::MissingDepth)
        );
    }

    #[test]
    fn absent_or_garbage_depth_is_unbounded() {
        let limits = DepthLimits::from_arguments(Some("2"), None).unwrap();
        assert_eq!(limits, DepthLimits::new(2, usize::MAX));

        let limits = DepthLimits::from_arguments(Some("deep"), Some(" 3 ")).unwrap();
        assert_eq!(limits, DepthLimits::new(usize::MAX, 3));

        let limits = DepthLimits::from_arguments(Some("-1"), Some("")).unwrap();
        assert_eq!(limits, DepthLimits::new(usize::MAX, usize::MAX));
    }

    #[test]
    fn package_names_carry_the_sequence_index() {
        assert_eq!(package_name("site", 1), "site_1");
        assert_eq!(package_name("site", 12), "site_12");
    }
}
