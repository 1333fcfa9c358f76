use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use memchr::memchr;

use crate::error::Error;
use crate::expand::expand;
use crate::parse;
use crate::prog::Program;
use crate::vm::Vm;

/// Escapes all regular expression metacharacters in `text`.
///
/// The returned string can be used as a pattern matching exactly the
/// literal `text`.
pub fn quote_meta(text: &str) -> String {
    // Every metacharacter is ASCII, so scanning bytes finds the first one
    // exactly.
    fn special(b: u8) -> bool {
        br"\.+*?()|[]{}^$".contains(&b)
    }
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && !special(bytes[i]) {
        i += 1;
    }
    if i >= bytes.len() {
        return text.to_owned();
    }
    let mut quoted = String::with_capacity(2 * text.len() - i);
    quoted.push_str(&text[..i]);
    for c in text[i..].chars() {
        if c.is_ascii() && special(c as u8) {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted
}

/// A compiled regular expression.
///
/// Searching is done with an implicit `.*?` at the beginning and end of a
/// pattern; use `^`/`$` (or `\A`/`\z`) to anchor, or [`Regex::is_full_match`]
/// to require the entire input. All positions reported are byte offsets
/// into the UTF-8 text, and always fall on code point boundaries.
///
/// Matching runs in time linear in the size of the input for every pattern.
/// A compiled `Regex` is immutable and can be shared between threads; every
/// search allocates its own simulation state.
pub struct Regex {
    prog: Program,
}

impl Clone for Regex {
    fn clone(&self) -> Regex {
        Regex { prog: self.prog.clone() }
    }
}

impl fmt::Display for Regex {
    /// Shows the original pattern.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Regex {
    /// Shows the original pattern.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Regex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Regex, Error> {
        Regex::new(s)
    }
}

/// Equality is by source pattern. `\d+` and `\d\d*` match the same strings
/// but compare unequal.
impl PartialEq for Regex {
    fn eq(&self, other: &Regex) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Regex {}

/// Configures how a pattern is compiled.
#[derive(Clone, Debug)]
pub struct RegexBuilder {
    pattern: String,
    posix: bool,
    longest: Option<bool>,
    optimize: bool,
}

impl RegexBuilder {
    /// Start configuring a compilation of `pattern` with default options.
    pub fn new(pattern: &str) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.to_owned(),
            posix: false,
            longest: None,
            optimize: true,
        }
    }

    /// POSIX mode: prefer the leftmost-longest match, as `egrep` does.
    pub fn posix(mut self, yes: bool) -> RegexBuilder {
        self.posix = yes;
        self
    }

    /// Set the leftmost-longest preference independently of POSIX mode.
    pub fn longest(mut self, yes: bool) -> RegexBuilder {
        self.longest = Some(yes);
        self
    }

    /// When disabled, the compiled program keeps its ε-placeholder
    /// instructions instead of routing past them. Useful for inspecting
    /// the raw construction; matching behaves identically.
    pub fn optimize(mut self, yes: bool) -> RegexBuilder {
        self.optimize = yes;
        self
    }

    /// Compile the pattern with the configured options.
    pub fn build(self) -> Result<Regex, Error> {
        let prog = parse::parse(&self.pattern, self.optimize)?;
        prog.set_longest(self.longest.unwrap_or(self.posix));
        Ok(Regex { prog })
    }
}

impl Regex {
    /// Compiles a pattern with Perl-style leftmost-first match semantics:
    /// among matches starting at the leftmost position, the one a
    /// backtracking search trying alternatives left to right would find
    /// first.
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        RegexBuilder::new(pattern).build()
    }

    /// Compiles a pattern with POSIX leftmost-longest match semantics:
    /// among matches starting at the leftmost position, the longest.
    pub fn new_posix(pattern: &str) -> Result<Regex, Error> {
        RegexBuilder::new(pattern).posix(true).build()
    }

    /// The original pattern.
    pub fn as_str(&self) -> &str {
        &self.prog.src
    }

    /// Make future searches prefer the leftmost-longest match. The flag may
    /// be toggled while other threads are matching; searches already in
    /// progress keep the semantics they started with.
    pub fn set_longest(&self, yes: bool) {
        self.prog.set_longest(yes);
    }

    /// Whether searches prefer the leftmost-longest match.
    pub fn is_longest(&self) -> bool {
        self.prog.is_longest()
    }

    /// The number of capture groups, including the implicit group 0 for
    /// the whole match.
    pub fn captures_len(&self) -> usize {
        self.prog.groups
    }

    /// An iterator over the capture group names. The first position
    /// corresponds to group 0, which is never named; anonymous groups
    /// yield `None`.
    pub fn capture_names(&self) -> CaptureNames {
        CaptureNames { it: self.prog.group_names.iter() }
    }

    /// The literal that any match must start with, and whether that
    /// literal is the entire pattern.
    pub fn literal_prefix(&self) -> (&str, bool) {
        (&self.prog.prefix, self.prog.complete)
    }

    /// Returns true iff the regex matches somewhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.search_at(text, 0, true).is_some()
    }

    /// Returns true iff the regex matches `text` in its entirety.
    pub fn is_full_match(&self, text: &str) -> bool {
        Vm::new(&self.prog, text.chars()).is_full_match()
    }

    /// Returns the start and end byte offsets of the leftmost match in
    /// `text`.
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        self.search_at(text, 0, false)
            .map(|locs| (locs[0].unwrap(), locs[1].unwrap()))
    }

    /// Returns an iterator over the start and end offsets of successive
    /// non-overlapping matches. Empty matches abutting a preceding
    /// non-empty match are skipped.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindMatches<'r, 't> {
        FindMatches {
            re: self,
            text,
            at: 0,
            prev: None,
            done: false,
        }
    }

    /// Returns the capture groups of the leftmost match in `text`.
    pub fn captures<'r, 't>(&'r self, text: &'t str) -> Option<Captures<'r, 't>> {
        self.search_at(text, 0, false)
            .map(|locs| self.make_captures(text, locs))
    }

    /// Returns an iterator over the capture groups of successive
    /// non-overlapping matches.
    pub fn captures_iter<'r, 't>(&'r self, text: &'t str) -> CaptureMatches<'r, 't> {
        CaptureMatches { it: self.find_iter(text) }
    }

    /// Returns an iterator over the substrings of `text` between matches,
    /// following the splitting rules of `splitn` with no limit.
    pub fn split<'r, 't>(&'r self, text: &'t str) -> Split<'r, 't> {
        self.splitn_inner(text, None)
    }

    /// Like `split`, but yields at most `limit` substrings, the last one
    /// being the unsplit remainder. A limit of 0 yields nothing.
    pub fn splitn<'r, 't>(&'r self, text: &'t str, limit: usize) -> Split<'r, 't> {
        self.splitn_inner(text, Some(limit))
    }

    fn splitn_inner<'r, 't>(&'r self, text: &'t str, limit: Option<usize>) -> Split<'r, 't> {
        let empty_text = !self.as_str().is_empty() && text.is_empty();
        Split {
            finder: self.find_iter(text),
            text,
            beg: 0,
            last_start: None,
            limit,
            count: 0,
            yield_empty: empty_text && limit != Some(0),
            done: limit == Some(0),
        }
    }

    /// Replaces the leftmost match in `text` with `rep`.
    pub fn replace<R: Replacer>(&self, text: &str, rep: R) -> String {
        self.replacen(text, 1, rep)
    }

    /// Replaces all non-overlapping matches in `text` with `rep`.
    pub fn replace_all<R: Replacer>(&self, text: &str, rep: R) -> String {
        self.replacen(text, 0, rep)
    }

    /// Replaces at most `limit` matches, or all of them when `limit` is 0.
    pub fn replacen<R: Replacer>(&self, text: &str, limit: usize, mut rep: R) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (i, caps) in self.captures_iter(text).enumerate() {
            if limit > 0 && i >= limit {
                break;
            }
            let (s, e) = caps.pos(0).expect("group 0 is set on every match");
            out.push_str(&text[last..s]);
            out.push_str(&rep.replace(&caps));
            last = e;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Returns true iff the regex matches somewhere in the stream.
    /// Offsets and boundaries are those of the stream's UTF-8 encoding.
    pub fn is_match_stream<I>(&self, stream: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        Vm::new(&self.prog, stream.into_iter()).is_match()
    }

    /// Returns true iff the regex matches the entire stream.
    pub fn is_full_match_stream<I>(&self, stream: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        Vm::new(&self.prog, stream.into_iter()).is_full_match()
    }

    /// Returns the byte range of the leftmost match in the stream.
    pub fn find_stream<I>(&self, stream: I) -> Option<(usize, usize)>
    where
        I: IntoIterator<Item = char>,
    {
        Vm::new(&self.prog, stream.into_iter())
            .find()
            .map(|locs| (locs[0].unwrap(), locs[1].unwrap()))
    }

    /// Returns the byte ranges of all capture groups of the leftmost match
    /// in the stream; `None` entries are unmatched groups.
    pub fn captures_stream<I>(&self, stream: I) -> Option<Vec<Option<(usize, usize)>>>
    where
        I: IntoIterator<Item = char>,
    {
        Vm::new(&self.prog, stream.into_iter()).find().map(|locs| {
            (0..locs.len() / 2)
                .map(|i| match (locs[2 * i], locs[2 * i + 1]) {
                    (Some(s), Some(e)) => Some((s, e)),
                    _ => None,
                })
                .collect()
        })
    }

    /// Run one search starting at byte offset `start`. When the program has
    /// a literal prefix, candidate positions are found with a byte scan
    /// before the simulation is seeded.
    fn search_at(
        &self,
        text: &str,
        start: usize,
        earliest: bool,
    ) -> Option<Vec<Option<usize>>> {
        let mut at = start;
        if !self.prog.prefix.is_empty() {
            let first_byte = self.prog.prefix.as_bytes()[0];
            match memchr(first_byte, &text.as_bytes()[at..]) {
                None => return None,
                Some(i) => at += i,
            }
        }
        let prev = text[..at].chars().next_back();
        let mut vm = Vm::with_context(&self.prog, text[at..].chars(), at, prev);
        if earliest {
            vm.run(self.prog.start1, false, true)
        } else {
            vm.find()
        }
    }

    fn make_captures<'r, 't>(&'r self, text: &'t str, locs: Vec<Option<usize>>) -> Captures<'r, 't> {
        Captures {
            text,
            locs,
            names: &self.prog.group_names,
        }
    }
}

/// An iterator over capture group names.
#[derive(Clone, Debug)]
pub struct CaptureNames<'r> {
    it: std::slice::Iter<'r, String>,
}

impl<'r> Iterator for CaptureNames<'r> {
    type Item = Option<&'r str>;

    fn next(&mut self) -> Option<Option<&'r str>> {
        self.it
            .next()
            .map(|name| if name.is_empty() { None } else { Some(name.as_str()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// The capture groups of a single match.
///
/// Group 0 is the whole match. Groups that did not participate in the
/// match report `None`.
#[derive(Debug)]
pub struct Captures<'r, 't> {
    text: &'t str,
    locs: Vec<Option<usize>>,
    names: &'r [String],
}

impl<'r, 't> Captures<'r, 't> {
    /// The start and end byte offsets of the group at index `i`.
    pub fn pos(&self, i: usize) -> Option<(usize, usize)> {
        if 2 * i + 1 >= self.locs.len() {
            return None;
        }
        match (self.locs[2 * i], self.locs[2 * i + 1]) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }

    /// The text of the group at index `i`.
    pub fn at(&self, i: usize) -> Option<&'t str> {
        self.pos(i).map(|(s, e)| &self.text[s..e])
    }

    /// The text of the first matched group with this name.
    pub fn name(&self, name: &str) -> Option<&'t str> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_str() == name)
            .find_map(|(i, _)| self.at(i))
    }

    /// The number of groups, including the whole-match group.
    pub fn len(&self) -> usize {
        self.locs.len() / 2
    }

    /// True iff there are no groups, which cannot happen for a real match.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand a replacement template against these captures. See the crate
    /// documentation for the template syntax.
    pub fn expand(&self, template: &str) -> String {
        let mut dst = String::new();
        expand(self, template, &mut dst);
        dst
    }
}

/// Access a group by index, panicking if it did not match. Use
/// [`Captures::at`] for a fallible lookup.
impl<'r, 't> Index<usize> for Captures<'r, 't> {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.at(i) {
            Some(s) => s,
            None => panic!("no group at index {}", i),
        }
    }
}

/// Access a group by name, panicking if it did not match. Use
/// [`Captures::name`] for a fallible lookup.
impl<'r, 't, 'i> Index<&'i str> for Captures<'r, 't> {
    type Output = str;

    fn index(&self, name: &'i str) -> &str {
        match self.name(name) {
            Some(s) => s,
            None => panic!("no group named {:?}", name),
        }
    }
}

/// An iterator over successive non-overlapping matches, yielding start and
/// end byte offsets.
#[derive(Debug)]
pub struct FindMatches<'r, 't> {
    re: &'r Regex,
    text: &'t str,
    at: usize,
    /// The previous match found, reported or not, for the empty-match
    /// suppression rule.
    prev: Option<(usize, usize)>,
    done: bool,
}

impl<'r, 't> FindMatches<'r, 't> {
    /// Find the next reportable match and return its capture slots.
    ///
    /// An empty match abutting a preceding non-empty match is suppressed,
    /// and the scan advances one code point after every empty match so it
    /// always makes progress.
    fn next_locs(&mut self) -> Option<Vec<Option<usize>>> {
        while !self.done {
            if self.at > self.text.len() {
                self.done = true;
                break;
            }
            let locs = match self.re.search_at(self.text, self.at, false) {
                None => {
                    self.done = true;
                    break;
                }
                Some(locs) => locs,
            };
            let (s, e) = (locs[0].unwrap(), locs[1].unwrap());
            if s == e {
                let width = self.text[e..].chars().next().map_or(1, char::len_utf8);
                self.at = e + width;
            } else {
                self.at = e;
            }
            let keep = match self.prev {
                None => true,
                Some((ps, pe)) => s != e || ps == pe,
            };
            self.prev = Some((s, e));
            if keep {
                return Some(locs);
            }
        }
        None
    }
}

impl<'r, 't> Iterator for FindMatches<'r, 't> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        self.next_locs()
            .map(|locs| (locs[0].unwrap(), locs[1].unwrap()))
    }
}

/// An iterator over the capture groups of successive non-overlapping
/// matches.
#[derive(Debug)]
pub struct CaptureMatches<'r, 't> {
    it: FindMatches<'r, 't>,
}

impl<'r, 't> Iterator for CaptureMatches<'r, 't> {
    type Item = Captures<'r, 't>;

    fn next(&mut self) -> Option<Captures<'r, 't>> {
        let locs = self.it.next_locs()?;
        Some(self.it.re.make_captures(self.it.text, locs))
    }
}

/// An iterator over the substrings between successive matches.
#[derive(Debug)]
pub struct Split<'r, 't> {
    finder: FindMatches<'r, 't>,
    text: &'t str,
    beg: usize,
    /// The start of the last match consumed, which decides whether a final
    /// remainder piece is produced.
    last_start: Option<usize>,
    limit: Option<usize>,
    count: usize,
    yield_empty: bool,
    done: bool,
}

impl<'r, 't> Iterator for Split<'r, 't> {
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        if self.done {
            return None;
        }
        if self.yield_empty {
            // A non-empty pattern splits empty text into one empty piece.
            self.done = true;
            return Some("");
        }
        loop {
            if let Some(n) = self.limit {
                if self.count + 1 >= n {
                    self.done = true;
                    self.count += 1;
                    return Some(&self.text[self.beg..]);
                }
            }
            match self.finder.next() {
                Some((s, e)) => {
                    self.last_start = Some(s);
                    if e != 0 {
                        let piece = &self.text[self.beg..s];
                        self.beg = e;
                        self.count += 1;
                        return Some(piece);
                    }
                    // An empty match at the very beginning produces no
                    // leading piece.
                    self.beg = e;
                }
                None => {
                    self.done = true;
                    if self.last_start != Some(self.text.len()) {
                        return Some(&self.text[self.beg..]);
                    }
                    return None;
                }
            }
        }
    }
}

/// A type that decides what replaces each match.
pub trait Replacer {
    /// Produce the replacement text for one match.
    fn replace(&mut self, caps: &Captures) -> String;
}

/// Replaces matches with the template expanded against each match's
/// captures.
impl<'a> Replacer for &'a str {
    fn replace(&mut self, caps: &Captures) -> String {
        caps.expand(self)
    }
}

impl<F> Replacer for F
where
    F: FnMut(&Captures) -> String,
{
    fn replace(&mut self, caps: &Captures) -> String {
        (*self)(caps)
    }
}

/// A replacement string used literally, with no `$` expansion.
#[derive(Clone, Copy, Debug)]
pub struct NoExpand<'t>(pub &'t str);

impl<'t> Replacer for NoExpand<'t> {
    fn replace(&mut self, _: &Captures) -> String {
        self.0.to_owned()
    }
}
