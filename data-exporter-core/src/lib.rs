#![doc = "data-exporter-core: discovery, partitioning, artifact and transfer logic for data-exporter."]

//! This crate holds everything that does not depend on a concrete HTTP client:
//! the content-path discovery engine, the descriptor parser, the package
//! partitioner, vault artifact writing and the package-manager transfer
//! pipeline. Transport is injected through the traits in [`contract`].
//!
//! # Usage
//! The CLI crate implements [`contract::ContentFetcher`] and
//! [`contract::PackageManager`] on top of reqwest and drives
//! [`export::create_packages`] and [`transfer::TransferPipeline`].

pub mod artifact;
pub mod config;
pub mod contract;
pub mod discovery;
pub mod error;
pub mod export;
pub mod parser;
pub mod partition;
pub mod transfer;

pub use config::{DepthLimits, PACKAGE_GROUP};
pub use discovery::{ContentSet, DiscoveryEngine};
pub use partition::{partition, Partition, MAXIMUM_PACKAGE_CONTENT_PATHS};
