use lazy_static::lazy_static;
use linre::{quote_meta, Regex};
use quickcheck::quickcheck;

/// A fixed set of patterns exercised against random inputs. Anchor-free so
/// that the find/is_match agreement law applies.
const PATTERNS: &[&str] = &[
    "a*b",
    "(a|b)+",
    "[a-z]{2,3}",
    r"\d+",
    "a*?b",
    r"\w+@\w+",
    "(ab|a)(b?)",
    r"[^\s]+",
];

lazy_static! {
    static ref COMPILED: Vec<Regex> =
        PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect();
    static ref ANCHORED: Vec<Regex> = PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("^(?:{})$", p)).unwrap())
        .collect();
}

quickcheck! {
    /// Matching the whole input equals matching the anchored pattern.
    fn full_match_is_anchored_match(s: String) -> bool {
        COMPILED
            .iter()
            .zip(ANCHORED.iter())
            .all(|(re, anchored)| re.is_full_match(&s) == anchored.is_match(&s))
    }

    /// A search finds a match exactly when a match exists.
    fn find_agrees_with_is_match(s: String) -> bool {
        COMPILED
            .iter()
            .all(|re| re.find(&s).is_some() == re.is_match(&s))
    }

    /// The span reported by find is the span of capture group 0.
    fn find_agrees_with_captures(s: String) -> bool {
        COMPILED.iter().all(|re| {
            let found = re.find(&s);
            let caps = re.captures(&s).and_then(|c| c.pos(0));
            found == caps
        })
    }

    /// A quoted string compiles and matches exactly itself.
    fn quoted_matches_literal(s: String) -> bool {
        let re = match Regex::new(&quote_meta(&s)) {
            Ok(re) => re,
            Err(_) => return false,
        };
        re.is_full_match(&s)
    }

    /// Quoting is the identity on text without metacharacters.
    fn quote_identity_on_plain_text(s: String) -> bool {
        let plain: String = s
            .chars()
            .filter(|c| !r"\.+*?()|[]{}^$".contains(*c))
            .collect();
        quote_meta(&plain) == plain
    }

    /// Successive matches from the iterator never overlap and always
    /// advance.
    fn find_iter_is_monotonic(s: String) -> bool {
        COMPILED.iter().all(|re| {
            let mut last_end = 0;
            let mut last: Option<(usize, usize)> = None;
            for (start, end) in re.find_iter(&s) {
                if start > end || end > s.len() {
                    return false;
                }
                if let Some(prev) = last {
                    if (start, end) <= prev || start < last_end {
                        return false;
                    }
                }
                last = Some((start, end));
                last_end = end;
            }
            true
        })
    }

    /// Stream matching agrees with string matching on the same text.
    fn stream_agrees_with_str(s: String) -> bool {
        COMPILED.iter().all(|re| {
            re.is_match_stream(s.chars()) == re.is_match(&s)
                && re.find_stream(s.chars()) == re.find(&s)
        })
    }
}
