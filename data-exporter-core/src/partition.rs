//! Splits a [`ContentSet`] into package-sized partitions.

use crate::config::package_name;
use crate::discovery::ContentSet;
use crate::error::PartitionError;

/// Maximum number of filter roots in one package definition.
pub const MAXIMUM_PACKAGE_CONTENT_PATHS: usize = 100;

/// A contiguous run of content paths destined for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// 1-based sequence number.
    pub index: usize,
    pub paths: Vec<String>,
}

impl Partition {
    /// Name of the package built from this partition.
    pub fn package_name(&self, base: &str) -> String {
        package_name(base, self.index)
    }
}

/// Partitions `content` in insertion order into runs of at most `max_size`.
///
/// An empty set produces no partitions.
pub fn partition(content: &ContentSet, max_size: usize) -> Result<Vec<Partition>, PartitionError> {
    if max_size == 0 {
        return Err(PartitionError::ZeroSize);
    }
    Ok(content
        .as_slice()
        .chunks(max_size)
        .enumerate()
        .map(|(offset, chunk)| Partition {
            index: offset + 1,
            paths: chunk.to_vec(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        let content: ContentSet = ["/a"].into_iter().collect();
        assert_eq!(partition(&content, 0), Err(PartitionError::ZeroSize));
    }

    #[test]
    fn names_follow_the_index() {
        let content: ContentSet = ["/a", "/b", "/c"].into_iter().collect();
        let partitions = partition(&content, 2).unwrap();
        let names: Vec<_> = partitions.iter().map(|p| p.package_name("site")).collect();
        assert_eq!(names, ["site_1", "site_2"]);
    }
}
