use regex::RegexBuilder;
use tracing::warn;

/// One run of narrated text, tagged with how it should be emphasized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    /// Matches a highlight term, compared case-insensitively.
    Highlight(&'a str),
    /// Matches a sound term exactly.
    Sound(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match *self {
            Segment::Plain(s) | Segment::Highlight(s) | Segment::Sound(s) => s,
        }
    }
}

/// Split `text` into plain and emphasized segments.
///
/// Terms are tried leftmost-first in the order highlights then sounds, and
/// matched case-insensitively. A match whose lowercase form is a highlight
/// is a `Highlight`; otherwise an exact sound term is a `Sound`; anything
/// else stays `Plain`.
pub fn segments<'a>(text: &'a str, highlights: &[String], sounds: &[String]) -> Vec<Segment<'a>> {
    if text.is_empty() {
        return Vec::new();
    }

    let terms: Vec<String> = highlights
        .iter()
        .chain(sounds)
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect();
    if terms.is_empty() {
        return vec![Segment::Plain(text)];
    }

    let re = match RegexBuilder::new(&terms.join("|"))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            warn!("highlight pattern rejected: {e}");
            return vec![Segment::Plain(text)];
        }
    };

    let mut out = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            out.push(Segment::Plain(&text[last..m.start()]));
        }
        let part = m.as_str();
        let lower = part.to_lowercase();
        if highlights.iter().any(|h| *h == lower) {
            out.push(Segment::Highlight(part));
        } else if sounds.iter().any(|s| s == part) {
            out.push(Segment::Sound(part));
        } else {
            out.push(Segment::Plain(part));
        }
        last = m.end();
    }
    if last < text.len() {
        out.push(Segment::Plain(&text[last..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_terms_is_single_plain_segment() {
        let segs = segments("hola mundo", &[], &[]);
        assert_eq!(segs, vec![Segment::Plain("hola mundo")]);
    }

    #[test]
    fn test_highlight_is_case_insensitive() {
        let segs = segments("Mi Mamá me mima", &terms(&["mamá"]), &[]);
        assert_eq!(
            segs,
            vec![
                Segment::Plain("Mi "),
                Segment::Highlight("Mamá"),
                Segment::Plain(" me mima"),
            ]
        );
    }

    #[test]
    fn test_sound_requires_exact_case() {
        let segs = segments("ma MA", &[], &terms(&["ma"]));
        assert_eq!(
            segs,
            vec![
                Segment::Sound("ma"),
                Segment::Plain(" "),
                Segment::Plain("MA"),
            ]
        );
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let segs = segments("a.b axb", &terms(&["a.b"]), &[]);
        assert_eq!(segs[0], Segment::Highlight("a.b"));
        assert_eq!(segs[1], Segment::Plain(" axb"));
    }

    #[test]
    fn test_segments_cover_whole_text() {
        let text = "la luna lila";
        let segs = segments(text, &terms(&["l"]), &terms(&["u"]));
        let joined: String = segs.iter().map(|s| s.text()).collect();
        assert_eq!(joined, text);
    }
}
