use crate::error::{Error, ErrorKind};
use crate::inst::{
    ClassItem, Inst, InstChar, InstClass, InstEmptyLook, InstGoto, InstPtr, InstSave, InstSplit,
    Look,
};
use crate::prog::{Program, MAX_REPEAT};

/// Compile a pattern into a program.
///
/// With `optimize` set (the default), route compaction rewrites every
/// out-edge to skip Nop placeholders after construction.
pub fn parse(pattern: &str, optimize: bool) -> Result<Program, Error> {
    let mut re = Program::new(pattern);
    Parser::new(pattern, &mut re).parse()?;
    if optimize {
        re.optimize();
    }
    re.find_prefix();
    Ok(re)
}

/// Inline flag state, `(?ims)` and scoped `(?ims:…)`.
#[derive(Clone, Copy, Debug, Default)]
struct Flags {
    /// `i`: ASCII case-insensitive literals and classes.
    casei: bool,
    /// `m`: `^` and `$` also match at line boundaries.
    multi: bool,
    /// `s`: `.` also matches `\n`.
    dotnl: bool,
}

/// The result of parsing one escape sequence.
enum Esc {
    Literal(char),
    Look(Look),
}

/// A recursive-descent parser that emits instructions directly into the
/// program under construction.
///
/// The grammar is
///
/// ```text
/// expr   := term ('|' term)*
/// term   := factor*
/// factor := atom quantifier?
/// ```
///
/// Every production returns an `(in, out)` pair of state indices: the entry
/// state, and the dangling exit state whose successor the caller patches.
struct Parser<'p, 's> {
    re: &'p mut Program,
    src: &'s str,
    /// Byte offset of the current code point.
    pos: usize,
    /// UTF-8 length of the current code point.
    sz: usize,
    /// The current code point; `None` at end of pattern.
    c: Option<char>,
    flags: Flags,
    flag_stack: Vec<Flags>,
}

impl<'p, 's> Parser<'p, 's> {
    fn new(src: &'s str, re: &'p mut Program) -> Parser<'p, 's> {
        Parser {
            re,
            src,
            pos: 0,
            sz: 0,
            c: None,
            flags: Flags::default(),
            flag_stack: vec![],
        }
    }

    /// Advance to the next code point and return it.
    fn bump(&mut self) -> Option<char> {
        let n = self.pos + self.sz;
        if n < self.src.len() {
            self.pos = n;
            let c = self.src[n..].chars().next().expect("pattern is valid UTF-8");
            self.sz = c.len_utf8();
            self.c = Some(c);
        } else {
            self.pos = n;
            self.sz = 0;
            self.c = None;
        }
        self.c
    }

    fn bump_if(&mut self, c: char) -> bool {
        if self.c == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn err(&self, kind: ErrorKind) -> Error {
        Error::new(kind)
    }

    fn parse(mut self) -> Result<(), Error> {
        self.bump();
        let (in_, out) = self.expr(true)?;
        self.re.start = in_;
        let accept = self.re.add(Inst::Accept)?;
        self.re.accept = accept;
        self.re.patch(out, accept);
        if let Some(c) = self.c {
            return Err(self.err(ErrorKind::UnexpectedChar(c, self.src.to_owned())));
        }
        // The unanchored entry point: try the pattern here, or consume one
        // code point (newlines included, so line anchors stay reachable)
        // and try again.
        let find = self.re.add(Inst::DotNl(InstGoto { goto: 0 }))?;
        let start1 = self.re.add(Inst::Split(InstSplit { goto1: self.re.start, goto2: find }))?;
        self.re.patch(find, start1);
        self.re.start1 = start1;
        self.re.groups += 1;
        Ok(())
    }

    fn expr(&mut self, capturing: bool) -> Result<(InstPtr, InstPtr), Error> {
        let n = 2 * self.re.groups;
        let (mut in_, mut out) = self.term(capturing)?;
        loop {
            match self.c {
                None | Some(')') => {
                    if capturing {
                        in_ = self.re.add(Inst::Save(InstSave { goto: in_, slot: n }))?;
                        let o = self.re.add(Inst::Save(InstSave { goto: 0, slot: n + 1 }))?;
                        self.re.patch(out, o);
                        out = o;
                    }
                    return Ok((in_, out));
                }
                Some('|') => {
                    self.bump();
                    let (i, o) = self.term(capturing)?;
                    let a = self.re.add(Inst::Split(InstSplit { goto1: in_, goto2: i }))?;
                    let b = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
                    self.re.patch(out, b);
                    self.re.patch(o, b);
                    in_ = a;
                    out = b;
                }
                _ => unreachable!("term stops only at `|`, `)` or end of pattern"),
            }
        }
    }

    fn term(&mut self, capturing: bool) -> Result<(InstPtr, InstPtr), Error> {
        let (in_, mut out) = self.factor(capturing)?;
        loop {
            match self.c {
                None | Some(')') | Some('|') => return Ok((in_, out)),
                _ => {
                    let (i, o) = self.factor(capturing)?;
                    self.re.patch(out, i);
                    out = o;
                }
            }
        }
    }

    fn factor(&mut self, capturing: bool) -> Result<(InstPtr, InstPtr), Error> {
        let pos0 = self.pos;
        let (mut in_, mut out) = match self.c {
            None | Some(')') | Some('|') => {
                let nop = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
                (nop, nop)
            }
            Some('.') => {
                self.bump();
                let i = if self.flags.dotnl {
                    self.re.add(Inst::DotNl(InstGoto { goto: 0 }))?
                } else {
                    self.re.add(Inst::Dot(InstGoto { goto: 0 }))?
                };
                (i, i)
            }
            Some('^') => {
                self.bump();
                let look = if self.flags.multi { Look::StartLine } else { Look::StartText };
                let i = self.re.add(Inst::EmptyLook(InstEmptyLook { goto: 0, look }))?;
                (i, i)
            }
            Some('$') => {
                self.bump();
                let look = if self.flags.multi { Look::EndLine } else { Look::EndText };
                let i = self.re.add(Inst::EmptyLook(InstEmptyLook { goto: 0, look }))?;
                (i, i)
            }
            Some('(') => self.group(capturing)?,
            Some('[') => {
                self.bump();
                self.set(pos0)?
            }
            Some('\\') => {
                self.bump();
                match self.esc()? {
                    Esc::Literal(c) => self.literal(c)?,
                    Esc::Look(
                        look @ (Look::StartText
                        | Look::EndText
                        | Look::WordBoundary
                        | Look::NotWordBoundary),
                    ) => {
                        let i = self.re.add(Inst::EmptyLook(InstEmptyLook { goto: 0, look }))?;
                        (i, i)
                    }
                    Esc::Look(look) => {
                        // A class shorthand: one consuming class whose pool
                        // slice is the predicate itself.
                        let start = self.re.classes.len();
                        self.re.classes.push(ClassItem::Look(look));
                        let end = self.re.classes.len();
                        let i = self.re.add(Inst::Class(InstClass { goto: 0, start, end }))?;
                        (i, i)
                    }
                }
            }
            Some(c @ ('*' | '+' | '?' | '{')) => {
                return Err(self.err(ErrorKind::MissingOperand(c)));
            }
            Some(c) => {
                self.bump();
                self.literal(c)?
            }
        };

        loop {
            match self.c {
                Some('*') => {
                    if let Some(c2 @ ('*' | '+')) = self.bump() {
                        return Err(
                            self.err(ErrorKind::InvalidQuantifier(format!("*{}", c2)))
                        );
                    }
                    let greedy = !self.bump_if('?');
                    let r = self.star(in_, out, greedy)?;
                    in_ = r.0;
                    out = r.1;
                }
                Some('+') => {
                    self.bump();
                    let greedy = !self.bump_if('?');
                    let r = self.plus(in_, out, greedy)?;
                    in_ = r.0;
                    out = r.1;
                }
                Some('?') => {
                    self.bump();
                    let greedy = !self.bump_if('?');
                    let r = self.opt(in_, out, greedy)?;
                    in_ = r.0;
                    out = r.1;
                }
                Some('{') => {
                    let pos = self.pos;
                    self.bump();
                    let n = self.counted_num(pos)?;
                    let mut comma = false;
                    let mut m = None;
                    if self.bump_if(',') {
                        comma = true;
                        if self.c != Some('}') {
                            m = Some(self.counted_num(pos)?);
                        }
                    }
                    if self.c != Some('}') {
                        let frag = self.src[pos..self.pos + self.sz].to_owned();
                        return Err(self.err(ErrorKind::InvalidQuantifier(frag)));
                    }
                    self.bump();
                    let frag = self.src[pos..self.pos].to_owned();
                    let greedy = !self.bump_if('?');
                    if n > MAX_REPEAT || m.map_or(false, |m| m < n || m > MAX_REPEAT) {
                        return Err(self.err(ErrorKind::InvalidQuantifier(frag)));
                    }
                    let src = self.src;
                    let factor_src = &src[pos0..pos];
                    let r = match (comma, m) {
                        // {n,}
                        (true, None) => match n {
                            0 => self.star(in_, out, greedy)?,
                            1 => self.plus(in_, out, greedy)?,
                            _ => self.repeat_min(in_, out, n, greedy, factor_src)?,
                        },
                        // {n,m}
                        (true, Some(m)) => {
                            if m == 0 {
                                let nop = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
                                (nop, nop)
                            } else if n == 0 {
                                let (a, b) = self.opt(in_, out, greedy)?;
                                self.repeat_max(a, b, 0, m - 1, greedy, factor_src)?
                            } else {
                                self.repeat_max(in_, out, n, m, greedy, factor_src)?
                            }
                        }
                        // {n}
                        (false, _) => match n {
                            0 => {
                                let nop = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
                                (nop, nop)
                            }
                            1 => (in_, out),
                            _ => self.repeat_count(in_, out, n, factor_src)?,
                        },
                    };
                    in_ = r.0;
                    out = r.1;
                }
                _ => return Ok((in_, out)),
            }
        }
    }

    /// A single literal code point, widened to a two-range class under the
    /// `i` flag.
    fn literal(&mut self, c: char) -> Result<(InstPtr, InstPtr), Error> {
        let i = if self.flags.casei && c.is_ascii_alphabetic() {
            let start = self.re.classes.len();
            let lo = c.to_ascii_lowercase();
            let up = c.to_ascii_uppercase();
            self.re.classes.push(ClassItem::Range(lo, lo));
            self.re.classes.push(ClassItem::Range(up, up));
            let end = self.re.classes.len();
            self.re.add(Inst::Class(InstClass { goto: 0, start, end }))?
        } else {
            self.re.add(Inst::Char(InstChar { goto: 0, c }))?
        };
        Ok((i, i))
    }

    /// Parse a group. The current code point is `(`.
    fn group(&mut self, mut capturing: bool) -> Result<(InstPtr, InstPtr), Error> {
        let gpos = self.pos;
        self.bump();
        let mut name = String::new();
        let mut restore = false;
        if self.c == Some('?') {
            capturing = false;
            match self.bump() {
                Some('P') => match self.bump() {
                    Some('<') => {
                        loop {
                            match self.bump() {
                                None => {
                                    let frag = self.src[gpos..].to_owned();
                                    return Err(self.err(ErrorKind::UnexpectedEnd(frag)));
                                }
                                Some('>') => break,
                                Some(c) => name.push(c),
                            }
                        }
                        self.bump();
                        capturing = true;
                    }
                    Some(c) => {
                        let frag = self.src[gpos..].to_owned();
                        return Err(self.err(ErrorKind::UnexpectedChar(c, frag)));
                    }
                    None => {
                        let frag = self.src[gpos..].to_owned();
                        return Err(self.err(ErrorKind::UnexpectedEnd(frag)));
                    }
                },
                _ => restore = self.parse_flags(gpos)?,
            }
        }
        if capturing {
            self.re.groups += 1;
            self.re.group_names.push(name);
        }
        let (in_, out) = self.expr(capturing)?;
        if self.c == Some(')') {
            self.bump();
            if restore {
                self.pop_flags();
            }
            return Ok((in_, out));
        }
        Err(self.err(ErrorKind::UnexpectedEnd(self.src[gpos..].to_owned())))
    }

    /// Parse the flag clause of `(?flags)` or `(?flags:`. Returns true for
    /// the scoped form, whose previous flag state must be restored at the
    /// closing parenthesis.
    fn parse_flags(&mut self, gpos: usize) -> Result<bool, Error> {
        let mut flags = self.flags;
        let mut minus = false;
        loop {
            match self.c {
                None => {
                    return Err(self.err(ErrorKind::UnexpectedEnd(self.src[gpos..].to_owned())));
                }
                Some(')') => {
                    // Inline form `(?i)`: applies to the rest of the
                    // enclosing expression.
                    self.flags = flags;
                    return Ok(false);
                }
                Some('-') => {
                    self.bump();
                    minus = true;
                }
                Some('i') => {
                    self.bump();
                    flags.casei = !minus;
                }
                Some('m') => {
                    self.bump();
                    flags.multi = !minus;
                }
                Some('s') => {
                    self.bump();
                    flags.dotnl = !minus;
                }
                Some(':') => {
                    self.bump();
                    self.flag_stack.push(self.flags);
                    self.flags = flags;
                    return Ok(true);
                }
                Some(c) => {
                    return Err(
                        self.err(ErrorKind::UnexpectedChar(c, self.src[gpos..].to_owned()))
                    );
                }
            }
        }
    }

    fn pop_flags(&mut self) {
        if let Some(flags) = self.flag_stack.pop() {
            self.flags = flags;
        }
    }

    /// Parse a character class. The current code point is the one after
    /// `[`; `pos0` is the byte offset of `[` itself.
    fn set(&mut self, pos0: usize) -> Result<(InstPtr, InstPtr), Error> {
        let lo = self.re.classes.len();
        let negated = self.bump_if('^');
        let mut first = true;
        loop {
            match self.c {
                None => {
                    return Err(self.err(ErrorKind::UnexpectedEnd(self.src[pos0..].to_owned())));
                }
                Some(']') if !first => {
                    self.bump();
                    let (start, end) = (lo, self.re.classes.len());
                    let inst = if negated {
                        Inst::NotClass(InstClass { goto: 0, start, end })
                    } else {
                        Inst::Class(InstClass { goto: 0, start, end })
                    };
                    let i = self.re.add(inst)?;
                    return Ok((i, i));
                }
                _ => {}
            }
            first = false;
            // One member: a literal (a leading `]` included), an escape, or
            // the start of a range.
            let r = match self.c {
                Some('\\') => {
                    self.bump();
                    match self.esc()? {
                        Esc::Look(look) => {
                            self.re.classes.push(ClassItem::Look(look));
                            continue;
                        }
                        Esc::Literal(c) => c,
                    }
                }
                Some(c) => {
                    self.bump();
                    c
                }
                None => unreachable!("checked at the top of the loop"),
            };
            if self.c == Some('-') {
                self.bump();
                match self.c {
                    None => {
                        return Err(
                            self.err(ErrorKind::UnexpectedEnd(self.src[pos0..].to_owned()))
                        );
                    }
                    Some(']') => {
                        // A trailing `-` is a literal.
                        self.push_range(r, r);
                        self.push_range('-', '-');
                    }
                    Some(c2) => {
                        let hi = if c2 == '\\' {
                            self.bump();
                            match self.esc()? {
                                Esc::Literal(c) => c,
                                Esc::Look(_) => {
                                    let frag = self.src[pos0..].to_owned();
                                    return Err(self.err(ErrorKind::InvalidEscape(frag)));
                                }
                            }
                        } else {
                            self.bump();
                            c2
                        };
                        if r > hi {
                            return Err(self.err(ErrorKind::InvalidClassRange(r, hi)));
                        }
                        self.push_range(r, hi);
                    }
                }
            } else {
                self.push_range(r, r);
            }
        }
    }

    /// Append a range to the class pool, mirroring the ASCII-letter overlap
    /// under the `i` flag.
    fn push_range(&mut self, lo: char, hi: char) {
        self.re.classes.push(ClassItem::Range(lo, hi));
        if self.flags.casei {
            if let Some((l, h)) = overlap(lo, hi, 'a', 'z') {
                self.re.classes.push(ClassItem::Range(
                    l.to_ascii_uppercase(),
                    h.to_ascii_uppercase(),
                ));
            }
            if let Some((l, h)) = overlap(lo, hi, 'A', 'Z') {
                self.re.classes.push(ClassItem::Range(
                    l.to_ascii_lowercase(),
                    h.to_ascii_lowercase(),
                ));
            }
        }
    }

    /// Parse one escape sequence; the current code point is the one after
    /// the backslash.
    fn esc(&mut self) -> Result<Esc, Error> {
        let c = match self.c {
            None => {
                return Err(self.err(ErrorKind::UnexpectedEnd(self.src.to_owned())));
            }
            Some(c) => c,
        };
        let esc = match c {
            'a' => Esc::Literal('\x07'),
            'f' => Esc::Literal('\x0C'),
            'n' => Esc::Literal('\n'),
            'r' => Esc::Literal('\r'),
            't' => Esc::Literal('\t'),
            'v' => Esc::Literal('\x0B'),
            'A' => Esc::Look(Look::StartText),
            'z' => Esc::Look(Look::EndText),
            'b' => Esc::Look(Look::WordBoundary),
            'B' => Esc::Look(Look::NotWordBoundary),
            'd' => Esc::Look(Look::Digit),
            'D' => Esc::Look(Look::NotDigit),
            's' => Esc::Look(Look::Space),
            'S' => Esc::Look(Look::NotSpace),
            'w' => Esc::Look(Look::Word),
            'W' => Esc::Look(Look::NotWord),
            // Reserved; not implemented.
            'x' => return Err(self.err(ErrorKind::InvalidEscape("\\x".to_owned()))),
            c if c.is_ascii_punctuation() => Esc::Literal(c),
            c => return Err(self.err(ErrorKind::InvalidEscape(format!("\\{}", c)))),
        };
        self.bump();
        Ok(esc)
    }

    /// Parse the decimal count of a `{…}` quantifier.
    fn counted_num(&mut self, pos: usize) -> Result<usize, Error> {
        let mut n: usize = 0;
        let mut any = false;
        while let Some(d) = self.c.and_then(|c| c.to_digit(10)) {
            any = true;
            n = n.saturating_mul(10).saturating_add(d as usize);
            self.bump();
        }
        if !any {
            return Err(self.err(ErrorKind::InvalidQuantifier(self.src[pos..].to_owned())));
        }
        Ok(n)
    }

    /// Zero or more: an entry split around the body and a loop-back split
    /// after it, both sharing a fresh exit Nop.
    fn star(
        &mut self,
        in_: InstPtr,
        out: InstPtr,
        greedy: bool,
    ) -> Result<(InstPtr, InstPtr), Error> {
        let c = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
        let (g1, g2) = if greedy { (in_, c) } else { (c, in_) };
        let b = self.re.add(Inst::Split(InstSplit { goto1: g1, goto2: g2 }))?;
        self.re.patch(out, b);
        let a = self.re.add(Inst::Split(InstSplit { goto1: g1, goto2: g2 }))?;
        Ok((a, c))
    }

    /// One or more: the body runs once, then a split loops back or exits.
    fn plus(
        &mut self,
        in_: InstPtr,
        out: InstPtr,
        greedy: bool,
    ) -> Result<(InstPtr, InstPtr), Error> {
        let b = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
        let (g1, g2) = if greedy { (in_, b) } else { (b, in_) };
        let a = self.re.add(Inst::Split(InstSplit { goto1: g1, goto2: g2 }))?;
        self.re.patch(out, a);
        Ok((in_, b))
    }

    /// Zero or one: a split between the body and a fresh exit Nop.
    fn opt(
        &mut self,
        in_: InstPtr,
        out: InstPtr,
        greedy: bool,
    ) -> Result<(InstPtr, InstPtr), Error> {
        let b = self.re.add(Inst::Nop(InstGoto { goto: 0 }))?;
        self.re.patch(out, b);
        let (g1, g2) = if greedy { (in_, b) } else { (b, in_) };
        let a = self.re.add(Inst::Split(InstSplit { goto1: g1, goto2: g2 }))?;
        Ok((a, b))
    }

    /// Re-parse the source text of a factor once, appending a fresh copy of
    /// its instructions. Copies are compiled non-capturing so that group
    /// numbering and slots stay those of the first instance.
    fn parse_factor_fragment(&mut self, frag: &str) -> Result<(InstPtr, InstPtr), Error> {
        let mut q = Parser {
            re: &mut *self.re,
            src: frag,
            pos: 0,
            sz: 0,
            c: None,
            flags: self.flags,
            flag_stack: vec![],
        };
        q.bump();
        q.factor(false)
    }

    /// `{n}`: splice `n - 1` more copies of the factor after the first.
    fn repeat_count(
        &mut self,
        in_: InstPtr,
        mut out: InstPtr,
        n: usize,
        frag: &str,
    ) -> Result<(InstPtr, InstPtr), Error> {
        for _ in 1..n {
            let (a, b) = self.parse_factor_fragment(frag)?;
            self.re.patch(out, a);
            out = b;
        }
        Ok((in_, out))
    }

    /// `{n,}` with `n >= 2`: `n - 1` more copies, the last one looped.
    fn repeat_min(
        &mut self,
        in_: InstPtr,
        mut out: InstPtr,
        n: usize,
        greedy: bool,
        frag: &str,
    ) -> Result<(InstPtr, InstPtr), Error> {
        for i in 1..n {
            let (mut a, mut b) = self.parse_factor_fragment(frag)?;
            if i == n - 1 {
                let r = self.plus(a, b, greedy)?;
                a = r.0;
                b = r.1;
            }
            self.re.patch(out, a);
            out = b;
        }
        Ok((in_, out))
    }

    /// `{n,m}`: `n - 1` more mandatory copies, then `m - n` optional ones.
    fn repeat_max(
        &mut self,
        in_: InstPtr,
        mut out: InstPtr,
        n: usize,
        m: usize,
        greedy: bool,
        frag: &str,
    ) -> Result<(InstPtr, InstPtr), Error> {
        for _ in 1..n {
            let (a, b) = self.parse_factor_fragment(frag)?;
            self.re.patch(out, a);
            out = b;
        }
        for _ in n..m {
            let (a0, b0) = self.parse_factor_fragment(frag)?;
            let (a, b) = self.opt(a0, b0, greedy)?;
            self.re.patch(out, a);
            out = b;
        }
        Ok((in_, out))
    }
}

fn overlap(lo: char, hi: char, a: char, b: char) -> Option<(char, char)> {
    let l = if lo > a { lo } else { a };
    let h = if hi < b { hi } else { b };
    if l <= h {
        Some((l, h))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::inst::Inst;
    use crate::prog::{Program, MAX_PROGRAM};

    fn compile(pattern: &str) -> Program {
        match parse(pattern, true) {
            Ok(re) => re,
            Err(err) => panic!("`{}` failed to compile: {}", pattern, err),
        }
    }

    fn compile_err(pattern: &str) -> Error {
        match parse(pattern, true) {
            Ok(_) => panic!("`{}` compiled but should not have", pattern),
            Err(err) => err,
        }
    }

    #[test]
    fn good_patterns() {
        let patterns = [
            "",
            ".",
            "^.$",
            "a",
            "a*",
            "a+",
            "a?",
            "a|b",
            "a*|b*",
            "(a*|b)(c*|d)",
            "[a-z]",
            r"[a-abc-c\-\]\[]",
            "[a-z]+",
            "[abc]",
            "[^1234]",
            r"[^\n]",
            r"\!\\",
            "[]]",
            "[-]",
            "[-a-]",
            "[--z-a]",
            "[^-]",
            "(|)",
            "(|b)",
            "a{1000}",
            "a{1000,}",
            "a{1000,1000}",
            "a{0,0}",
            "^*",
            "$*",
            r"(?P<name>a+)b",
            "(?i:abc)|(?s:.)|(?m:^)",
            "(?i)xyz",
            r"a*?b+?c??d{1,2}?",
        ];
        for p in patterns {
            compile(p);
        }
    }

    #[test]
    fn bad_patterns() {
        let cases: &[(&str, &str)] = &[
            ("*", "missing argument to repetition operator: `*`"),
            ("+", "missing argument to repetition operator: `+`"),
            ("?", "missing argument to repetition operator: `?`"),
            ("(abc", "missing closing ): `(abc`"),
            ("abc)", "unexpected ): `abc)`"),
            ("x[a-z", "missing closing ]: `[a-z`"),
            ("x[^a-z", "missing closing ]: `[^a-z`"),
            ("[z-a]", "invalid character class range: `z-a`"),
            ("abc\\", "trailing backslash at end of expression"),
            ("a**", "invalid nested repetition operator: `**`"),
            ("a*+", "invalid nested repetition operator: `*+`"),
            (r"\x", "invalid escape sequence: `\\x`"),
            (r"\q", "invalid escape sequence: `\\q`"),
            ("a{1001}", "invalid repeat count: `{1001}`"),
            ("a{1001,}", "invalid repeat count: `{1001,}`"),
            ("a{2,1}", "invalid repeat count: `{2,1}`"),
            ("a{1000,1001}", "invalid repeat count: `{1000,1001}`"),
            ("[", "missing closing ]: `[`"),
            ("[]", "missing closing ]: `[]`"),
            ("a(b", "missing closing ): `(b`"),
        ];
        for &(pattern, want) in cases {
            let err = compile_err(pattern);
            let got = err.to_string();
            assert!(
                got.contains(want),
                "`{}`: error `{}` does not contain `{}`",
                pattern,
                got,
                want
            );
        }
    }

    #[test]
    fn program_size_cap() {
        let err = compile_err("(?:x{1000}){1000}");
        assert!(matches!(err.kind(), ErrorKind::ProgramTooLarge(_)));
        // The cap holds for every compiled program.
        let re = compile("(?:ab){1000}");
        assert!(re.insts.len() <= MAX_PROGRAM);
    }

    #[test]
    fn no_reachable_nop_after_compaction() {
        let patterns =
            ["", "a*b+c?", "(a|b|c)*", "a{2,5}", "(?:a|)(b)", "^a$", "[a-z]+|[0-9]?"];
        for p in patterns {
            let re = compile(p);
            for entry in [re.start, re.start1] {
                for pc in re.reachable(entry) {
                    assert!(
                        !matches!(re.insts[pc], Inst::Nop(_)),
                        "`{}`: reachable Nop at {}",
                        p,
                        pc
                    );
                }
            }
        }
    }

    #[test]
    fn nops_kept_without_compaction() {
        let re = parse("a|b", false).expect("compiles");
        let has_nop = re.insts.iter().any(|i| matches!(i, Inst::Nop(_)));
        assert!(has_nop, "uncompacted program should contain a Nop");
    }

    #[test]
    fn class_pool_invariants() {
        let patterns = [r"[a-z0-9\-]", r"[^\d\s]", "[]a-c]", r"(?i)[p-t]", r"\w\d[x]"];
        for p in patterns {
            let re = compile(p);
            for inst in &re.insts {
                let (start, end) = match *inst {
                    Inst::Class(ref i) | Inst::NotClass(ref i) => (i.start, i.end),
                    _ => continue,
                };
                assert!(start < end, "`{}`: empty class slice", p);
                assert!(end <= re.classes.len(), "`{}`: slice out of bounds", p);
                for item in &re.classes[start..end] {
                    if let ClassItem::Range(lo, hi) = *item {
                        assert!(lo <= hi, "`{}`: inverted range {}-{}", p, lo, hi);
                    }
                }
            }
        }
    }

    #[test]
    fn group_bookkeeping() {
        let re = compile(r"(?P<foo>.*)(?P<bar>(a)b)(?P<foo>.*)a");
        assert_eq!(re.groups, 5);
        assert_eq!(re.group_names, vec!["", "foo", "bar", "", "foo"]);

        let re = compile("abba");
        assert_eq!(re.groups, 1);
        assert_eq!(re.group_names, vec![""]);
    }

    #[test]
    fn literal_prefix_extraction() {
        let re = compile("foo");
        assert_eq!(re.prefix, "foo");
        assert!(re.complete);

        let re = compile("foo.*");
        assert_eq!(re.prefix, "foo");
        assert!(!re.complete);

        let re = compile("^foo");
        assert_eq!(re.prefix, "");

        let re = compile("(a|b)c");
        assert_eq!(re.prefix, "");
    }

    #[test]
    fn entry_points() {
        let re = compile("ab");
        assert!(matches!(re.insts[re.accept], Inst::Accept));
        assert!(matches!(re.insts[re.start], Inst::Save(_)));
        match re.insts[re.start1] {
            Inst::Split(ref i) => assert_eq!(i.goto1, re.start),
            ref other => panic!("start1 is {:?}, want Split", other),
        }
    }
}
