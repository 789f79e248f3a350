//! Reference block appended to replies

const HEADING: &str = "\n\n**Related References:**\n";

/// Format up to `limit` links as a markdown list. Empty when there are none.
pub fn format_reference_block(links: &[String], limit: usize) -> String {
    let links = &links[..links.len().min(limit)];
    if links.is_empty() {
        return String::new();
    }

    let mut block = String::from(HEADING);
    for link in links {
        block.push_str("- ");
        block.push_str(link);
        block.push('\n');
    }
    block
}
