use std::mem;
use std::rc::Rc;

use crate::inst::{class_matches, Inst, InstPtr};
use crate::prog::Program;
use crate::sparse::{Thread, ThreadList};

/// The simulation virtual machine: a parallel NFA interpretation of a
/// compiled program over a stream of code points.
///
/// The machine keeps two thread lists. At each step it scans the current
/// list: consuming instructions are tested against the current code point
/// and, on success, enqueue their successor into the next list; zero-width
/// assertions are tested against the position the list stands at and, on
/// success, enqueue their successors into the *current* list, which grows
/// while it is being scanned. ε-transitions (Split, Save, Nop) are resolved
/// when a thread is enqueued, never during the scan.
///
/// Exploration order defines leftmost-first match priority: a Split's first
/// branch is explored before its second, and the sparse-set deduplication
/// lets earlier threads dominate later ones.
pub struct Vm<'r, I> {
    re: &'r Program,
    chars: I,
    /// Byte offset of the current code point.
    pos: usize,
    /// UTF-8 length of the current code point.
    sz: usize,
    /// The current code point; `None` at end of input.
    c: Option<char>,
    /// The code point before the current position; `None` at the beginning
    /// of the text.
    last: Option<char>,
    /// True until the cursor advances for the first time.
    first: bool,
    /// True once the cursor has been advanced past the end of input.
    past_end: bool,
    longest: bool,
    saved: Option<Rc<Vec<Option<usize>>>>,
    clist: ThreadList,
    nlist: ThreadList,
    stack: Vec<Thread>,
}

impl<'r, I: Iterator<Item = char>> Vm<'r, I> {
    pub fn new(re: &'r Program, chars: I) -> Vm<'r, I> {
        Vm::with_context(re, chars, 0, None)
    }

    /// Create a machine whose stream begins mid-text: `base` is the byte
    /// offset of the stream's first code point and `prev` the code point
    /// just before it. Anchors and word boundaries see the surrounding
    /// text rather than an artificial beginning.
    pub fn with_context(re: &'r Program, mut chars: I, base: usize, prev: Option<char>) -> Vm<'r, I> {
        let (c, sz) = match chars.next() {
            Some(c) => (Some(c), c.len_utf8()),
            None => (None, 0),
        };
        Vm {
            re,
            chars,
            pos: base,
            sz,
            c,
            last: prev,
            first: base == 0,
            past_end: false,
            longest: re.is_longest(),
            saved: None,
            clist: ThreadList::new(re.insts.len()),
            nlist: ThreadList::new(re.insts.len()),
            stack: vec![],
        }
    }

    /// Unanchored leftmost search. On a match, returns the capture slots of
    /// the winning thread.
    pub fn find(&mut self) -> Option<Vec<Option<usize>>> {
        self.run(self.re.start1, false, false)
    }

    /// Report whether a match exists anywhere, returning at the first
    /// committed match.
    pub fn is_match(&mut self) -> bool {
        self.run(self.re.start1, false, true).is_some()
    }

    /// Anchored match that must consume the entire stream.
    pub fn is_full_match(&mut self) -> bool {
        self.run(self.re.start, true, false).is_some()
    }

    fn advance(&mut self) {
        if self.c.is_none() {
            self.past_end = true;
            self.first = false;
            return;
        }
        self.last = self.c;
        self.pos += self.sz;
        match self.chars.next() {
            Some(c) => {
                self.c = Some(c);
                self.sz = c.len_utf8();
            }
            None => {
                self.c = None;
                self.sz = 0;
            }
        }
        self.first = false;
    }

    pub(crate) fn run(
        &mut self,
        entry: InstPtr,
        full: bool,
        earliest: bool,
    ) -> Option<Vec<Option<usize>>> {
        self.saved = None;
        self.clist.clear();
        self.nlist.clear();
        let seed = Thread {
            pc: entry,
            saved: Rc::new(vec![None; self.re.num_slots()]),
        };
        Self::add_thread(self.re, &mut self.stack, &mut self.clist, seed, self.pos);
        while !self.clist.is_empty() && !self.past_end {
            self.scan(full);
            if earliest && self.saved.is_some() {
                break;
            }
            if self.nlist.is_empty() {
                break;
            }
            if self.longest {
                if let Some(ref committed) = self.saved {
                    // Stop once no surviving thread can extend the
                    // leftmost match.
                    let start = committed[0];
                    if !self.nlist.iter().any(|t| t.saved[0] == start) {
                        break;
                    }
                }
            }
            self.advance();
            mem::swap(&mut self.clist, &mut self.nlist);
        }
        self.saved.take().map(|rc| (*rc).clone())
    }

    /// Process every thread of the current list against the current code
    /// point, building the next list.
    fn scan(&mut self, full: bool) {
        let (c, sz, pos, first, last) = (self.c, self.sz, self.pos, self.first, self.last);
        let longest = self.longest;
        let re = self.re;
        let clist = &mut self.clist;
        let nlist = &mut self.nlist;
        let stack = &mut self.stack;
        let saved = &mut self.saved;
        nlist.clear();
        let mut i = 0;
        while i < clist.len() {
            if !longest && !full && nlist.matched {
                // A higher-priority thread has a match pending; the
                // remaining threads can only do worse.
                break;
            }
            let t = clist.get(i).clone();
            match re.insts[t.pc] {
                Inst::Accept => {
                    if !full || c.is_none() {
                        let commit = match *saved {
                            None => true,
                            Some(ref prev) => {
                                if longest {
                                    // Replace only an extension of the
                                    // leftmost match.
                                    prev[0] == t.saved[0] && t.saved[1] > prev[1]
                                } else {
                                    // Every later commit comes from a
                                    // higher-priority surviving thread.
                                    true
                                }
                            }
                        };
                        if commit {
                            *saved = Some(t.saved.clone());
                        }
                        if !longest {
                            break;
                        }
                    }
                }
                Inst::Char(ref x) => {
                    if c == Some(x.c) {
                        let t = Thread { pc: x.goto, saved: t.saved };
                        Self::add_thread(re, stack, nlist, t, pos + sz);
                    }
                }
                Inst::Dot(ref x) => {
                    if c.is_some() && c != Some('\n') {
                        let t = Thread { pc: x.goto, saved: t.saved };
                        Self::add_thread(re, stack, nlist, t, pos + sz);
                    }
                }
                Inst::DotNl(ref x) => {
                    if c.is_some() {
                        let t = Thread { pc: x.goto, saved: t.saved };
                        Self::add_thread(re, stack, nlist, t, pos + sz);
                    }
                }
                Inst::Class(ref x) => {
                    if c.is_some() && class_matches(&re.classes[x.start..x.end], first, last, c) {
                        let t = Thread { pc: x.goto, saved: t.saved };
                        Self::add_thread(re, stack, nlist, t, pos + sz);
                    }
                }
                Inst::NotClass(ref x) => {
                    if c.is_some() && !class_matches(&re.classes[x.start..x.end], first, last, c) {
                        let t = Thread { pc: x.goto, saved: t.saved };
                        Self::add_thread(re, stack, nlist, t, pos + sz);
                    }
                }
                Inst::EmptyLook(ref x) => {
                    // The predicate brackets exactly the position this list
                    // stands at; successors join the current list and are
                    // scanned later in this same pass.
                    if x.look.matches(first, last, c) {
                        let t = Thread { pc: x.goto, saved: t.saved };
                        Self::add_thread(re, stack, clist, t, pos);
                    }
                }
                Inst::Save(_) | Inst::Split(_) | Inst::Nop(_) => {}
            }
            i += 1;
        }
    }

    /// Enqueue a thread, resolving ε-transitions without advancing the
    /// input. `pos` is written by any Save instruction crossed on the way.
    /// The explicit stack bounds recursion depth to one frame.
    fn add_thread(
        re: &Program,
        stack: &mut Vec<Thread>,
        list: &mut ThreadList,
        t: Thread,
        pos: usize,
    ) {
        stack.push(t);
        while let Some(mut t) = stack.pop() {
            loop {
                if list.has(t.pc) {
                    break;
                }
                match re.insts[t.pc] {
                    Inst::Split(ref i) => {
                        list.include(Thread { pc: t.pc, saved: t.saved.clone() });
                        stack.push(Thread { pc: i.goto2, saved: t.saved.clone() });
                        t.pc = i.goto1;
                    }
                    Inst::Save(ref i) => {
                        list.include(Thread { pc: t.pc, saved: t.saved.clone() });
                        if i.slot < t.saved.len() {
                            let mut sub = (*t.saved).clone();
                            sub[i.slot] = Some(pos);
                            t.saved = Rc::new(sub);
                        }
                        t.pc = i.goto;
                    }
                    Inst::Nop(ref i) => {
                        list.include(Thread { pc: t.pc, saved: t.saved.clone() });
                        t.pc = i.goto;
                    }
                    Inst::Accept => {
                        list.matched = true;
                        list.include(t);
                        break;
                    }
                    _ => {
                        list.include(t);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::vm::Vm;

    fn prog(pattern: &str) -> crate::prog::Program {
        parse::parse(pattern, true).expect("test pattern compiles")
    }

    fn find(pattern: &str, text: &str) -> Option<Vec<Option<usize>>> {
        let re = prog(pattern);
        Vm::new(&re, text.chars()).find()
    }

    #[test]
    fn stream_offsets_are_utf8_byte_offsets() {
        let locs = find("[0-9]+", "価格1200円").unwrap();
        assert_eq!(locs[0], Some(6));
        assert_eq!(locs[1], Some(10));
    }

    #[test]
    fn full_match_requires_exhaustion() {
        let re = prog("a|ab");
        assert!(Vm::new(&re, "ab".chars()).is_full_match());
        assert!(Vm::new(&re, "a".chars()).is_full_match());
        assert!(!Vm::new(&re, "abc".chars()).is_full_match());
    }

    #[test]
    fn earliest_stops_at_first_commit() {
        let re = prog("a+");
        assert!(Vm::new(&re, "xxab".chars()).is_match());
        assert!(!Vm::new(&re, "xxb".chars()).is_match());
    }

    #[test]
    fn context_controls_anchors() {
        let re = prog("^b");
        assert!(!Vm::with_context(&re, "bc".chars(), 1, Some('a')).find().is_some());
        assert!(Vm::new(&re, "bc".chars()).find().is_some());

        let re = prog(r"\bcat");
        assert!(Vm::with_context(&re, "cat".chars(), 3, Some(' ')).find().is_some());
        assert!(Vm::with_context(&re, "cat".chars(), 3, Some('x')).find().is_none());
    }

    #[test]
    fn leftmost_first_prefers_earlier_alternative() {
        let locs = find("a|ab", "ab").unwrap();
        assert_eq!((locs[0], locs[1]), (Some(0), Some(1)));
        let locs = find("ab|a", "ab").unwrap();
        assert_eq!((locs[0], locs[1]), (Some(0), Some(2)));
    }

    #[test]
    fn longest_prefers_longer_alternative() {
        let re = prog("a|ab");
        re.set_longest(true);
        let locs = Vm::new(&re, "ab".chars()).find().unwrap();
        assert_eq!((locs[0], locs[1]), (Some(0), Some(2)));
    }

    #[test]
    fn longest_still_leftmost() {
        let re = prog("a+");
        re.set_longest(true);
        let locs = Vm::new(&re, "ba".chars()).find().unwrap();
        assert_eq!((locs[0], locs[1]), (Some(1), Some(2)));
    }
}
