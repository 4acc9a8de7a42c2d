use data_exporter_core::discovery::ContentSet;
use data_exporter_core::partition::{partition, MAXIMUM_PACKAGE_CONTENT_PATHS};

fn content_of(size: usize) -> ContentSet {
    (0..size).map(|i| format!("/content/dam/asset-{i}.png")).collect()
}

#[test]
fn empty_content_yields_no_partitions() {
    let partitions = partition(&ContentSet::new(), MAXIMUM_PACKAGE_CONTENT_PATHS).unwrap();
    assert!(partitions.is_empty());
}

#[test]
fn partitions_cover_content_in_order() {
    for size in [1, 99, 100, 101, 250, 300] {
        let content = content_of(size);
        let partitions = partition(&content, MAXIMUM_PACKAGE_CONTENT_PATHS).unwrap();

        assert_eq!(partitions.len(), size.div_ceil(100), "size {size}");
        assert!(partitions.iter().all(|p| p.paths.len() <= 100));
        let indices: Vec<_> = partitions.iter().map(|p| p.index).collect();
        assert_eq!(indices, (1..=partitions.len()).collect::<Vec<_>>());

        let rejoined: Vec<String> = partitions.into_iter().flat_map(|p| p.paths).collect();
        assert_eq!(rejoined, content.as_slice());
    }
}

#[test]
fn only_the_last_partition_is_short() {
    let partitions = partition(&content_of(250), MAXIMUM_PACKAGE_CONTENT_PATHS).unwrap();
    let sizes: Vec<_> = partitions.iter().map(|p| p.paths.len()).collect();
    assert_eq!(sizes, [100, 100, 50]);
    assert_eq!(partitions[2].paths[0], "/content/dam/asset-200.png");
}

#[test]
fn duplicates_are_absorbed_before_partitioning() {
    let content: ContentSet = ["/a", "/b", "/a", "/c", "/b"].into_iter().collect();
    let partitions = partition(&content, 2).unwrap();
    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].paths, ["/a", "/b"]);
    assert_eq!(partitions[1].paths, ["/c"]);
}
