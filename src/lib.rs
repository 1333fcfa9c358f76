//! This crate provides a regular expression engine whose searching is
//! guaranteed to run in time linear in the size of the input, for every
//! pattern. Patterns are compiled into a small instruction program which a
//! virtual machine simulates as a nondeterministic finite automaton: all
//! candidate paths advance in lockstep over the input, so there is no
//! backtracking and no pathological blow-up. In exchange, backreferences
//! and general lookaround are not supported.
//!
//! # Usage
//!
//! Compile a pattern once, then match it against as many inputs as needed:
//!
//! ```rust
//! use linre::Regex;
//!
//! let re = Regex::new(r"^[a-z]+\[[0-9]+\]$").unwrap();
//! assert!(re.is_match("adam[23]"));
//! assert!(!re.is_match("snakey"));
//! ```
//!
//! Submatches are reported as byte offsets into the input:
//!
//! ```rust
//! use linre::Regex;
//!
//! let re = Regex::new(r"(?P<key>\w+):(?P<value>\w+)").unwrap();
//! let caps = re.captures("host:earth").unwrap();
//! assert_eq!(caps.name("key"), Some("host"));
//! assert_eq!(caps.name("value"), Some("earth"));
//! assert_eq!(caps.pos(0), Some((0, 10)));
//! ```
//!
//! Searches normally use leftmost-first semantics, like Perl: among the
//! matches beginning at the leftmost position, the one a backtracker
//! trying alternatives left to right would find first. [`Regex::new_posix`]
//! selects leftmost-longest semantics instead:
//!
//! ```rust
//! use linre::Regex;
//!
//! let first = Regex::new("a|ab").unwrap();
//! let longest = Regex::new_posix("a|ab").unwrap();
//! assert_eq!(first.find("ab"), Some((0, 1)));
//! assert_eq!(longest.find("ab"), Some((0, 2)));
//! ```
//!
//! Besides `&str` inputs, every matching operation is available on
//! arbitrary streams of code points (`Iterator<Item = char>`), in which
//! case reported offsets refer to the UTF-8 encoding of the stream.
//!
//! # Syntax
//!
//! ```text
//! .              any code point except newline (`s` flag lifts the rule)
//! ^  $           beginning / end of text (with `m`, also of line)
//! \A \z          beginning / end of text, unconditionally
//! \b \B          ASCII word boundary / non-boundary
//! \d \D \s \S \w \W   ASCII digit / space / word classes and negations
//! [abc] [^abc] [a-z]  character classes, ranges, negation
//! xy             concatenation
//! x|y            alternation, preferring x
//! x* x+ x?       greedy repetition
//! x*? x+? x??    non-greedy repetition
//! x{n} x{n,} x{n,m}   bounded repetition (each bound at most 1000)
//! (x)            capturing group
//! (?P<name>x)    named capturing group
//! (?:x)          non-capturing group
//! (?ims) (?ims:x)     set flags; clear with `-`, e.g. `(?i-s:x)`
//! \*             literal punctuation
//! \a \f \n \r \t \v   control character escapes
//! ```
//!
//! Escapes such as `\p` or `\x` are reserved and rejected. Compiled
//! programs are capped at 10 000 instructions.
//!
//! # Replacement templates
//!
//! The replacement methods interpret `$name` and `${name}` in the
//! replacement text: a purely numeric name is a group index, anything else
//! a group name. `$$` inserts a literal `$`. In the unbraced form the name
//! extends as far as possible: `$1x` means `${1x}`, not `${1}x`. Use
//! [`NoExpand`] to suppress expansion.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub use crate::error::{Error, ErrorKind};
pub use crate::re::{
    quote_meta, CaptureMatches, CaptureNames, Captures, FindMatches, NoExpand, Regex,
    RegexBuilder, Replacer, Split,
};

mod error;
mod expand;
mod inst;
mod parse;
mod prog;
mod re;
mod sparse;
mod vm;
