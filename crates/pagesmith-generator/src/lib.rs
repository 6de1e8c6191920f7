//! Pagesmith Generator Library
//!
//! Static site build pipeline for pagesmith.
//!
//! # Modules
//!
//! - [`template`] - Template loading and rendering (tera)
//! - [`pages`] - Page rendering from content templates and page metadata
//! - [`minify`] - HTML and JavaScript minification
//! - [`assets`] - Static asset copying
//! - [`css`] - External CSS compiler invocation
//! - [`sitemap`] - XML sitemap generation
//! - [`robots`] - robots.txt generation
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod css;
pub mod minify;
pub mod pages;
pub mod robots;
pub mod sitemap;
pub mod template;

pub use assets::AssetProcessor;
pub use build::{BuildError, BuildStats, Builder};
pub use css::CssCompiler;
pub use pages::{PageRenderer, RenderSummary};
pub use robots::RobotsGenerator;
pub use sitemap::SitemapGenerator;
pub use template::{TemplateError, TemplateSet};
