//! Cleanup applied to scraped puzzle text before it is parsed.

/// Inline element the puzzle page uses for a blank to fill in.
pub const BLANK_LINE_MARKUP: &str = r#"<span class="blank-line"></span>"#;
/// Everything from here on is page chrome, not puzzle.
pub const END_MARKER: &str = " [enter]";
/// Separates the date label from the puzzle text.
pub const START_MARKER: char = '→';

const BLANK: &str = "___";
const DASHES: [char; 3] = ['\u{2014}', '\u{2013}', '\u{2015}'];

/// Normalises copied page text into the plain bracket text the parser
/// expects: blanks become `___`, trailing chrome and the leading label are
/// cut, dash variants become spaces, and surrounding whitespace is trimmed.
///
/// The input is the page's visible text, not its HTML. The blank-line marker
/// is the only markup recognised; any other tag or entity is kept as typed.
pub fn clean_puzzle_text(raw: &str) -> String {
    let text = raw.replace(BLANK_LINE_MARKUP, &format!(" {BLANK} "));
    let text = collapse_underscores(&text);

    let text = match text.find(END_MARKER) {
        Some(idx) => &text[..idx],
        None => text.as_str(),
    };
    let text = match text.find(START_MARKER) {
        Some(idx) => &text[idx + START_MARKER.len_utf8()..],
        None => text,
    };

    text.chars()
        .map(|ch| if DASHES.contains(&ch) { ' ' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Any run of two or more underscores becomes exactly three.
fn collapse_underscores(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '_' {
            run += 1;
            continue;
        }
        flush_run(&mut out, run);
        run = 0;
        out.push(ch);
    }
    flush_run(&mut out, run);
    out
}

fn flush_run(out: &mut String, run: usize) {
    match run {
        0 => {}
        1 => out.push('_'),
        _ => out.push_str(BLANK),
    }
}
