use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::TextRun;

// One alternation pass; leftmost match wins, and `**` is tried before `*`.
static EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*([^*]+?)\*\*|\*([^*]+?)\*|__([^_]+?)__|_([^_]+?)_")
        .expect("emphasis pattern is valid")
});

/// Split a single line into text runs, stripping `**`/`__` (bold) and
/// `*`/`_` (italic) delimiter pairs. Unpaired delimiters stay as literal
/// text and nested emphasis is not interpreted.
pub fn parse_inline_formatting(text: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in EMPHASIS.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            runs.push(TextRun::plain(&text[last..whole.start()]));
        }

        let run = if let Some(m) = caps.get(1).or_else(|| caps.get(3)) {
            TextRun::bold(m.as_str())
        } else if let Some(m) = caps.get(2).or_else(|| caps.get(4)) {
            TextRun::italic(m.as_str())
        } else {
            TextRun::plain(whole.as_str())
        };
        runs.push(run);
        last = whole.end();
    }

    if last < text.len() {
        runs.push(TextRun::plain(&text[last..]));
    }
    runs
}
