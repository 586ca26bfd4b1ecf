use crate::metadata::Metadata;

/// Longest slug used for file names, in characters
const MAX_SLUG_LEN: usize = 80;

/// Render the document header: title heading, metadata lines and a
/// thematic break.
///
/// ```text
/// # <title>
///
/// **Source:** <url>
/// **Site:** <site name>
/// **Author:** <author>        (only when known)
/// **Section:** <section>      (only when known)
/// **Extracted:** <timestamp>
///
/// ---
/// ```
pub fn render_header(metadata: &Metadata) -> String {
    let mut lines = vec![
        format!("**Source:** {}", metadata.url),
        format!("**Site:** {}", metadata.site_name),
    ];
    if let Some(author) = &metadata.author {
        lines.push(format!("**Author:** {}", author));
    }
    if let Some(section) = &metadata.section {
        lines.push(format!("**Section:** {}", section));
    }
    lines.push(format!("**Extracted:** {}", metadata.extracted_at));

    let mut header = format!("# {}\n\n", metadata.title);
    for line in lines {
        header.push_str(&line);
        header.push('\n');
    }
    header.push_str("\n---\n\n");
    header
}

/// Header followed by the converted body, before post-processing.
pub fn assemble_document(metadata: &Metadata, body: &str) -> String {
    let mut document = render_header(metadata);
    document.push_str(body);
    document
}

/// A filesystem-safe `<slug>.md` name for a document title.
pub fn suggested_filename(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { "untitled.md".to_string() } else { format!("{slug}.md") }
}
