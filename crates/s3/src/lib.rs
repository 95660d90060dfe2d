//! hbp-s3: S3 backend for hbp-archive
//!
//! Implements the `Session` and `ObjectStore` traits from hbp-core over
//! aws-sdk-s3, for the S3-compatible gateway of the object store. It is the
//! only crate that directly depends on the AWS SDK.

pub mod client;
pub mod session;

pub use client::S3Store;
pub use session::{S3Session, open_archive};
