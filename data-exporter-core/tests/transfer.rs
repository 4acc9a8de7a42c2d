use std::path::PathBuf;

use data_exporter_core::contract::{MockPackageManager, PackageManagerResponse};
use data_exporter_core::error::TransferError;
use data_exporter_core::transfer::{TransferPipeline, TransferStep};
use mockall::Sequence;

fn ok_response() -> PackageManagerResponse {
    PackageManagerResponse {
        success: true,
        message: Some("ok".into()),
        path: None,
    }
}

#[tokio::test]
async fn upload_stops_at_first_failing_package() {
    let mut manager = MockPackageManager::new();
    manager
        .expect_upload()
        .times(2)
        .returning(|archive| match archive.name.as_str() {
            "site_2" => Err(TransferError::Status {
                url: "http://localhost:4502/crx/packmgr/service/.json/".into(),
                status: 500,
            }),
            _ => Ok(()),
        });

    let pipeline = TransferPipeline::new(&manager, "site", "/tmp/packages");
    let err = pipeline.run(TransferStep::Upload, 3).await.unwrap_err();

    assert!(matches!(err, TransferError::Status { status: 500, .. }));
}

#[tokio::test]
async fn archives_are_resolved_in_the_working_directory() {
    let mut manager = MockPackageManager::new();
    manager
        .expect_download()
        .withf(|archive| {
            archive.name == "site_1" && archive.path == PathBuf::from("/work/site_1.zip")
        })
        .times(1)
        .returning(|_| Ok(2048));

    let pipeline = TransferPipeline::new(&manager, "site", "/work");
    let report = pipeline.run(TransferStep::Download, 1).await.unwrap();

    assert_eq!(report.step, TransferStep::Download);
    assert_eq!(report.packages, ["site_1"]);
}

#[tokio::test]
async fn unsuccessful_install_is_fatal() {
    let mut manager = MockPackageManager::new();
    manager.expect_install().times(1).returning(|_| {
        Ok(PackageManagerResponse {
            success: false,
            message: Some("Package not found".into()),
            path: None,
        })
    });

    let pipeline = TransferPipeline::new(&manager, "site", "/work");
    let err = pipeline.run(TransferStep::Install, 4).await.unwrap_err();

    match err {
        TransferError::Rejected { action, package, message } => {
            assert_eq!(action, "installation");
            assert_eq!(package, "site_1");
            assert_eq!(message, "Package not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn export_steps_run_step_by_step_over_all_packages() {
    let mut manager = MockPackageManager::new();
    let mut seq = Sequence::new();
    for name in ["site_1", "site_2"] {
        manager
            .expect_upload()
            .withf(move |archive| archive.name == name)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
    }
    for name in ["site_1", "site_2"] {
        manager
            .expect_build()
            .withf(move |package| package == name)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_response()));
    }
    for name in ["site_1", "site_2"] {
        manager
            .expect_download()
            .withf(move |archive| archive.name == name)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(10));
    }
    for name in ["site_1", "site_2"] {
        manager
            .expect_remove()
            .withf(move |package| package == name)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
    }

    let pipeline = TransferPipeline::new(&manager, "site", "/work");
    let reports = pipeline.run_all(&TransferStep::EXPORT, 2).await.unwrap();

    let steps: Vec<_> = reports.iter().map(|r| r.step).collect();
    assert_eq!(steps, TransferStep::EXPORT);
}

#[tokio::test]
async fn zero_packages_make_no_calls() {
    let manager = MockPackageManager::new();
    let pipeline = TransferPipeline::new(&manager, "site", "/work");
    let report = pipeline.run(TransferStep::Remove, 0).await.unwrap();
    assert!(report.packages.is_empty());
}
