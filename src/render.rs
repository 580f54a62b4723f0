use comrak::{ComrakOptions, markdown_to_html};
use once_cell::sync::Lazy;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    // Replies come from a remote model; raw HTML stays escaped.
    options.render.unsafe_ = false;
    options
});

/// Renders assistant markdown for display.
pub fn reply_to_html(md: &str) -> String {
    markdown_to_html(md, &MARKDOWN_OPTIONS)
}
