//! Package index clients.
//!
//! Only the PyPI JSON API is supported. Lookups go through the
//! [`RegistryClient`] trait so the audit can run against any index.
//!
//! # Example
//!
//! ```ignore
//! use crate::registry::{PypiClient, RegistryClient};
//!
//! let client = PypiClient::new();
//! let info = client.get_package("requests").await?;
//! println!("latest: {:?}", info.latest_version);
//! ```

mod client;
mod error;
mod pypi;

pub use client::{PackageInfo, RegistryClient, ReleaseInfo};
pub use error::RegistryError;
pub use pypi::PypiClient;
