//! Pagesmith Core Library
//!
//! Project layout, configuration documents and error handling shared by the
//! pagesmith build pipeline and development server.

pub mod config;
pub mod error;
pub mod layout;
pub mod pages;

pub use config::SiteConfig;
pub use error::{CoreError, Result};
pub use layout::ProjectLayout;
pub use pages::{PageConfig, PageMeta};
