//! End-to-end tests for the build pipeline.
//!
//! These tests lay out a small site in a temporary directory and run a full
//! build over it.

use std::{
    fs,
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use pagesmith_core::{PageMeta, ProjectLayout};
use pagesmith_generator::Builder;
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

const BASE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>{{ title }}</title>
  <meta name="description" content="{{ description }}">
</head>
<body>
{% block body %}{% endblock body %}
<footer>v{{ version }}</footer>
</body>
</html>
"#;

const PAGES: &str = r#"
index:
  title: Home
  description: Welcome
contact:
  title: Contact us
  description: Get in touch
  last_mod: "2024-01-15"
"404":
  title: Not found
  description: Missing
"#;

fn write(root: &Path, file: &str, content: &str) {
    let path = root.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_site(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "config.yaml", config);
    write(root, "data/pages.yaml", PAGES);
    write(root, "src/templates/base.html", BASE);
    write(
        root,
        "src/content/index.html",
        r#"{% extends "base.html" %}{% block body %}<h1>Home</h1>{% endblock body %}"#,
    );
    write(
        root,
        "src/content/contact.html",
        r#"{% extends "base.html" %}{% block body %}<h1>{{ title }}</h1>{% endblock body %}"#,
    );
    write(
        root,
        "src/content/404.html",
        r#"{% extends "base.html" %}{% block body %}<h1>404</h1>{% endblock body %}"#,
    );
    write(root, "assets/images/logo.svg", "<svg></svg>");
    write(root, "assets/js/app.js", "function greet(name) {\n  return name;\n}\n");

    dir
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn builder(root: &Path) -> Builder {
    Builder::new(ProjectLayout::new(root)).with_css_program("pagesmith-no-such-css-tool")
}

#[test]
fn test_contact_page_and_sitemap() {
    let site = sample_site(
        "version: 1.2.3\nbase_url: https://example.com\ngenerate_sitemap: true\ngenerate_robots: true\n",
    );

    let stats = builder(site.path()).build().expect("build should succeed");
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.failed_pages, 0);
    assert_eq!(stats.assets, 2);

    let contact = fs::read_to_string(site.path().join("public/contact.html")).unwrap();
    assert!(contact.contains("<title>Contact us</title>"));
    assert!(contact.contains("<h1>Contact us</h1>"));
    assert!(contact.contains("v1.2.3"));

    let sitemap = fs::read_to_string(site.path().join("public/sitemap.xml")).unwrap();
    let entry = sitemap
        .split("<url>")
        .find(|u| u.contains("<loc>https://example.com/contact</loc>"))
        .expect("contact should be listed");
    assert!(entry.contains("<priority>0.8</priority>"));
    assert!(entry.contains("<lastmod>2024-01-15</lastmod>"));
    assert!(sitemap.contains("<loc>https://example.com/</loc>"));

    let robots = fs::read_to_string(site.path().join("public/robots.txt")).unwrap();
    assert!(robots.ends_with("Sitemap: https://example.com/sitemap.xml\n"));
}

#[test]
fn test_page_without_metadata_entry() {
    let site = sample_site(
        "base_url: \"https://example.com\"\ngenerate_sitemap: true\nsitemap_exclude_list: []\n",
    );
    write(
        site.path(),
        "data/pages.yaml",
        "index:\n  title: Home\n  description: Welcome\n",
    );

    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let stats = tracing::subscriber::with_default(subscriber, || builder(site.path()).build())
        .expect("build should succeed");
    assert_eq!(stats.failed_pages, 0);

    let contact = fs::read_to_string(site.path().join("public/contact.html")).unwrap();
    assert!(contact.contains("<title></title>"));
    assert!(contact.contains("<h1></h1>"));
    assert!(contact.contains("v1.0.0"));

    let sitemap = fs::read_to_string(site.path().join("public/sitemap.xml")).unwrap();
    let entry = sitemap
        .split("<url>")
        .find(|u| u.contains("<loc>https://example.com/contact</loc>"))
        .expect("contact should be listed");
    assert!(entry.contains("<priority>0.8</priority>"));

    let logs = logs.contents();
    assert!(
        logs.lines()
            .any(|l| l.contains("no page metadata found") && l.contains("page=contact"))
    );
    let warning = logs
        .lines()
        .find(|l| l.contains("page metadata is missing fields") && l.contains("page=contact"))
        .expect("missing-field warning for contact");
    for field in PageMeta::FIELDS {
        assert!(warning.contains(field), "warning should name {field}: {warning}");
    }
}

#[test]
fn test_list_valued_metadata_renders() {
    let site = sample_site("");
    write(
        site.path(),
        "data/pages.yaml",
        "index:\n  title: Home\n  keywords: [rust, web]\ncontact:\n  title: Contact us\n",
    );
    write(
        site.path(),
        "src/content/index.html",
        r#"{% extends "base.html" %}{% block body %}<p>{{ keywords | join(sep=", ") }}</p>{% endblock body %}"#,
    );

    builder(site.path()).build().unwrap();

    let index = fs::read_to_string(site.path().join("public/index.html")).unwrap();
    assert!(index.contains("<p>rust, web</p>"));
    let contact = fs::read_to_string(site.path().join("public/contact.html")).unwrap();
    assert!(contact.contains("<title>Contact us</title>"));
}

#[test]
fn test_excluded_pages_stay_out_of_sitemap() {
    let site = sample_site(
        "base_url: https://example.com\ngenerate_sitemap: true\nsitemap_exclude_list:\n  - \"404\"\n",
    );

    builder(site.path()).build().unwrap();

    let sitemap = fs::read_to_string(site.path().join("public/sitemap.xml")).unwrap();
    assert!(!sitemap.contains("https://example.com/404"));
    assert!(sitemap.contains("https://example.com/contact"));
    assert!(site.path().join("public/404.html").exists());
    assert!(!site.path().join("public/robots.txt").exists());
}

#[test]
fn test_failed_css_compiler_does_not_abort_build() {
    let site = sample_site("base_url: https://example.com\n");
    write(site.path(), "assets/css/styles.css", "@tailwind base;");

    let stats = builder(site.path()).build().unwrap();

    assert!(!stats.css);
    assert_eq!(stats.pages, 3);
    assert!(site.path().join("public/images/logo.svg").exists());
}

#[test]
fn test_minified_output() {
    let site = sample_site("");
    builder(site.path()).build().unwrap();
    let plain = fs::read_to_string(site.path().join("public/index.html")).unwrap();

    write(site.path(), "config.yaml", "minify_html: true\nminify_js: true\n");
    builder(site.path()).build().unwrap();

    let index = fs::read_to_string(site.path().join("public/index.html")).unwrap();
    assert!(index.len() < plain.len());
    assert!(index.contains("<h1>Home</h1>"));

    let js = fs::read_to_string(site.path().join("public/js/app.js")).unwrap();
    assert!(js.contains("function greet"));
    assert!(js.len() < "function greet(name) {\n  return name;\n}\n".len());
}

#[test]
fn test_rebuild_overwrites_output() {
    let site = sample_site("version: 1.0.0\n");
    builder(site.path()).build().unwrap();

    write(site.path(), "config.yaml", "version: 2.0.0\n");
    builder(site.path()).build().unwrap();

    let index = fs::read_to_string(site.path().join("public/index.html")).unwrap();
    assert!(index.contains("v2.0.0"));
}
