//! HTML and JavaScript minification.

/// Minify an HTML document.
///
/// Opening and closing tags are kept so that later passes can still locate
/// `</body>`.
#[must_use]
pub fn minify_html(html: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;

    let minified = minify_html::minify(html.as_bytes(), &cfg);
    String::from_utf8_lossy(&minified).into_owned()
}

/// Minify a JavaScript source file.
#[must_use]
pub fn minify_js(source: &str) -> String {
    minifier::js::minify(source).to_string()
}
