//! Taskhub Image Hosting Library
//!
//! This crate provides the [`ImageHost`] abstraction the avatar pipeline
//! publishes through, with a Cloudinary-compatible HTTP implementation and a
//! local filesystem implementation for development and tests.
//!
//! # Public id format
//!
//! Public ids are `/`-separated paths without a file extension, for example
//! `main/storages/users/ava_alice`. They must not contain `..` or start with
//! `/`. Hosts report back the staged file's name without extension as
//! `original_filename`, which callers use to correlate the upload.

#[cfg(feature = "host-cloudinary")]
pub mod cloudinary;
pub mod factory;
#[cfg(feature = "host-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "host-cloudinary")]
pub use cloudinary::CloudinaryImageHost;
pub use factory::create_image_host;
#[cfg(feature = "host-local")]
pub use local::LocalImageHost;
pub use taskhub_core::ImageHostBackend;
pub use traits::{ImageHost, ImageHostError, ImageHostResult, UploadOptions, UploadedImage};
