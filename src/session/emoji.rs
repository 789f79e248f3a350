//! Emoji shorthand expansion
//!
//! Replaces `:code:` sequences with the Unicode glyph they name. Both
//! GitHub-style shortcodes (`:+1:`, `:smile:`) and CLDR names written with
//! underscores (`:thumbs_up:`, `:red_heart:`) are recognised. Unknown codes
//! are left as typed.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_+\-]+):").expect("shortcode pattern is valid"));

/// Expand emoji shorthand codes in `text`
pub fn expand_shortcodes(text: &str) -> Cow<'_, str> {
    if !text.contains(':') {
        return Cow::Borrowed(text);
    }

    SHORTCODE.replace_all(text, |caps: &Captures<'_>| match lookup(&caps[1]) {
        Some(glyph) => glyph.to_string(),
        None => caps[0].to_string(),
    })
}

fn lookup(code: &str) -> Option<&'static str> {
    if let Some(emoji) = emojis::get_by_shortcode(code) {
        return Some(emoji.as_str());
    }

    let name = code.replace('_', " ");
    emojis::iter()
        .find(|emoji| emoji.name().eq_ignore_ascii_case(&name))
        .map(emojis::Emoji::as_str)
}
