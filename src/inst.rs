/// InstPtr represents the index of an instruction in a compiled program.
pub type InstPtr = usize;

/// Inst is a single instruction in a compiled program.
///
/// Instructions fall into two groups: consuming instructions (`Char`, `Dot`,
/// `DotNl`, `Class`, `NotClass`) advance the input by one code point when
/// they match, while ε-instructions (`EmptyLook`, `Save`, `Split`, `Nop`,
/// `Accept`) transition without consuming input.
#[derive(Clone, Debug)]
pub enum Inst {
    /// The program has found a match.
    Accept,
    /// Match one specific code point.
    Char(InstChar),
    /// Match any code point except `\n`.
    Dot(InstGoto),
    /// Match any code point, including `\n`.
    DotNl(InstGoto),
    /// Match one code point contained in a slice of the class pool.
    Class(InstClass),
    /// Match one code point not contained in a slice of the class pool.
    NotClass(InstClass),
    /// A zero-width assertion.
    EmptyLook(InstEmptyLook),
    /// Record the current input position in a capture slot.
    Save(InstSave),
    /// Branch to one of two instructions, preferring `goto1`.
    Split(InstSplit),
    /// An ε-transition placeholder. Route compaction removes every
    /// reachable occurrence; the simulation only sees them when
    /// compaction is disabled.
    Nop(InstGoto),
}

/// Representation of the Char instruction.
#[derive(Clone, Debug)]
pub struct InstChar {
    /// The next instruction to execute if this one matches.
    pub goto: InstPtr,
    /// The code point to match.
    pub c: char,
}

/// Representation of instructions whose only operand is a successor.
#[derive(Clone, Debug)]
pub struct InstGoto {
    /// The next instruction to execute.
    pub goto: InstPtr,
}

/// Representation of the Class and NotClass instructions.
///
/// `start..end` index the program's class pool. The slice is never empty.
#[derive(Clone, Debug)]
pub struct InstClass {
    /// The next instruction to execute if this one matches.
    pub goto: InstPtr,
    /// Start of this instruction's slice of the class pool.
    pub start: usize,
    /// End (exclusive) of this instruction's slice of the class pool.
    pub end: usize,
}

/// Representation of the EmptyLook instruction.
#[derive(Clone, Debug)]
pub struct InstEmptyLook {
    /// The next instruction to execute if the assertion holds.
    pub goto: InstPtr,
    /// The zero-width predicate to check.
    pub look: Look,
}

/// Representation of the Save instruction.
#[derive(Clone, Debug)]
pub struct InstSave {
    /// The next instruction to execute.
    pub goto: InstPtr,
    /// The capture slot to write. Slot `2g` is where group `g` begins and
    /// slot `2g + 1` is where it ends.
    pub slot: usize,
}

/// Representation of the Split instruction.
#[derive(Clone, Debug)]
pub struct InstSplit {
    /// The first branch. A match found through `goto1` takes precedence
    /// over a match found through `goto2`.
    pub goto1: InstPtr,
    /// The second branch.
    pub goto2: InstPtr,
}

/// One entry in a program's class pool.
///
/// A class instruction matches when any entry of its pool slice matches the
/// current code point.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassItem {
    /// An inclusive code point range. `lo <= hi` always holds.
    Range(char, char),
    /// A predicate entry, written `[\d]` and friends. The predicate is
    /// evaluated against the code point the class is about to consume.
    Look(Look),
}

impl ClassItem {
    fn matches(&self, first: bool, prev: Option<char>, cur: Option<char>) -> bool {
        match *self {
            ClassItem::Range(lo, hi) => match cur {
                Some(c) => lo <= c && c <= hi,
                None => false,
            },
            ClassItem::Look(look) => look.matches(first, prev, cur),
        }
    }
}

/// Test whether any entry of a class pool slice matches at the current
/// position.
pub fn class_matches(
    items: &[ClassItem],
    first: bool,
    prev: Option<char>,
    cur: Option<char>,
) -> bool {
    items.iter().any(|item| item.matches(first, prev, cur))
}

/// The set of zero-width predicates.
///
/// Each predicate is a function of the step number (whether the simulation
/// is at its very first position), the previous code point and the current
/// code point, where `None` stands for the text boundaries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Look {
    /// `\A`, and `^` outside multiline mode.
    StartText,
    /// `\z`, and `$` outside multiline mode.
    EndText,
    /// `^` in multiline mode.
    StartLine,
    /// `$` in multiline mode.
    EndLine,
    /// `\b`.
    WordBoundary,
    /// `\B`.
    NotWordBoundary,
    /// `\d`.
    Digit,
    /// `\D`.
    NotDigit,
    /// `\s`.
    Space,
    /// `\S`.
    NotSpace,
    /// `\w`.
    Word,
    /// `\W`.
    NotWord,
}

impl Look {
    /// Evaluate this predicate. `prev` is the code point just before the
    /// current position and `cur` the code point at it; `None` means the
    /// position borders the start or end of the text.
    pub fn matches(&self, first: bool, prev: Option<char>, cur: Option<char>) -> bool {
        use self::Look::*;
        match *self {
            StartText => first,
            EndText => cur.is_none(),
            StartLine => first || prev == Some('\n'),
            EndLine => cur.is_none() || cur == Some('\n'),
            WordBoundary => is_word(prev) != is_word(cur),
            NotWordBoundary => is_word(prev) == is_word(cur),
            Digit => opt(cur, is_digit_char),
            NotDigit => !opt(cur, is_digit_char),
            Space => opt(cur, is_space_char),
            NotSpace => !opt(cur, is_space_char),
            Word => is_word(cur),
            NotWord => !is_word(cur),
        }
    }
}

fn opt(c: Option<char>, f: fn(char) -> bool) -> bool {
    c.map_or(false, f)
}

fn is_word(c: Option<char>) -> bool {
    opt(c, is_word_char)
}

/// Returns true iff `c` is an ASCII word character: `[0-9A-Za-z_]`.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Returns true iff `c` is an ASCII decimal digit.
pub fn is_digit_char(c: char) -> bool {
    c.is_ascii_digit()
}

/// Returns true iff `c` is ASCII whitespace as matched by `\s`:
/// `[\t\n\f\r ]`.
pub fn is_space_char(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n' || c == '\x0C' || c == '\r'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_chars() {
        for c in ['a', 'b', 'z', 'A', 'Z', '0', '9', '_'] {
            assert!(is_word_char(c), "{:?} should be a word char", c);
        }
        for c in ['-', ' ', '\n', 'é', '['] {
            assert!(!is_word_char(c), "{:?} should not be a word char", c);
        }
    }

    #[test]
    fn boundary_at_text_edges() {
        let b = Look::WordBoundary;
        assert!(b.matches(true, None, Some('w')));
        assert!(b.matches(false, Some('d'), None));
        assert!(!b.matches(false, Some('d'), Some('w')));
        assert!(!b.matches(false, Some(' '), Some('-')));
        assert!(Look::NotWordBoundary.matches(false, Some('d'), Some('w')));
    }

    #[test]
    fn line_anchors() {
        assert!(Look::StartLine.matches(true, None, Some('a')));
        assert!(Look::StartLine.matches(false, Some('\n'), Some('a')));
        assert!(!Look::StartLine.matches(false, Some('a'), Some('b')));
        assert!(Look::EndLine.matches(false, Some('a'), None));
        assert!(Look::EndLine.matches(false, Some('a'), Some('\n')));
    }

    #[test]
    fn class_pool_entries() {
        let items = [ClassItem::Range('a', 'f'), ClassItem::Look(Look::Digit)];
        assert!(class_matches(&items, false, None, Some('c')));
        assert!(class_matches(&items, false, None, Some('7')));
        assert!(!class_matches(&items, false, None, Some('z')));
        assert!(!class_matches(&items, false, None, None));
    }
}
