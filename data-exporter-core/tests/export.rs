mod common;

use std::fs::File;
use std::io::Read;

use common::FakeRepository;
use data_exporter_core::artifact::{ArtifactWriter, VaultDocument};
use data_exporter_core::config::ExportRequest;
use data_exporter_core::export::create_packages;
use data_exporter_core::DepthLimits;
use serde_json::json;
use tempfile::tempdir;

fn read_entry(archive: &std::path::Path, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn writer_produces_manifests_and_archive() {
    let dir = tempdir().unwrap();
    let writer = ArtifactWriter::new(dir.path());
    let paths = vec!["/content/site/home".to_owned(), "/content/dam/logo.png".to_owned()];

    let archive = writer.write(&paths, "admin", "site_1").unwrap();

    assert_eq!(archive, dir.path().join("site_1.zip"));
    for document in VaultDocument::ALL {
        assert!(
            dir.path().join("site_1").join(document.entry_name()).is_file(),
            "missing {}",
            document.entry_name()
        );
    }

    let zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let mut names: Vec<_> = zip.file_names().map(str::to_owned).collect();
    names.sort();
    let mut expected: Vec<_> = VaultDocument::ALL.iter().map(|d| d.entry_name().to_owned()).collect();
    expected.sort();
    assert_eq!(names, expected);

    let filter = read_entry(&archive, "META-INF/vault/filter.xml");
    assert!(filter.contains(r#"<filter root="/content/dam/logo.png"/>"#));
}

#[tokio::test]
async fn create_packages_splits_discovered_content() {
    let dir = tempdir().unwrap();
    let mut references = serde_json::Map::new();
    for i in 0..150 {
        references.insert(format!("img{i}"), json!(format!("/content/dam/img-{i}.png")));
    }
    let repo = FakeRepository::new().with(
        "/content/site/home/jcr:content.infinity.json",
        serde_json::Value::Object(references),
    );
    let request = ExportRequest {
        path: "/content/site/home".into(),
        limits: DepthLimits::new(0, 1),
        username: "exporter".into(),
        package_name: "site".into(),
        working_directory: dir.path().to_path_buf(),
    };

    let summary = create_packages(&repo, &request).await.unwrap();

    assert_eq!(summary.content_paths, 151);
    assert_eq!(summary.package_count(), 2);
    let names: Vec<_> = summary.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["site_1", "site_2"]);

    let first = read_entry(&summary.packages[0].path, "META-INF/vault/filter.xml");
    assert_eq!(first.matches("<filter ").count(), 100);
    assert!(first.contains(r#"root="/content/site/home""#));

    let second = read_entry(&summary.packages[1].path, "META-INF/vault/filter.xml");
    assert_eq!(second.matches("<filter ").count(), 51);
    assert!(second.contains(r#"root="/content/dam/img-149.png""#));

    let definition = read_entry(&summary.packages[1].path, "META-INF/vault/definition/.content.xml");
    assert!(definition.contains(r#"name="site_2""#));
    assert!(definition.contains(r#"jcr:createdBy="exporter""#));
}
