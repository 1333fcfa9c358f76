use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, ErrorKind};
use crate::inst::{ClassItem, Inst, InstPtr};
use crate::sparse::{Thread, ThreadList};

/// The maximum number of instructions in a compiled program. Guards
/// against blow-ups like `x{1000}{1000}`.
pub const MAX_PROGRAM: usize = 10_000;

/// The maximum bound of a counted repetition, `x{1000}`.
pub const MAX_REPEAT: usize = 1_000;

/// A compiled regular expression program.
///
/// A program is immutable once compilation returns and is safe to share
/// among concurrent matchers; each match allocates its own simulation
/// state. The single mutable field is the `longest` toggle, a lone boolean
/// written atomically.
#[derive(Debug)]
pub struct Program {
    /// The original pattern, kept for diagnostics.
    pub src: String,
    /// The instruction arena. Instructions refer to each other by index.
    pub insts: Vec<Inst>,
    /// The class pool. Class instructions hold `start..end` slices of it.
    pub classes: Vec<ClassItem>,
    /// Capture group names, one entry per group. Index 0 is the implicit
    /// whole-match group and is always the empty string, as are anonymous
    /// groups.
    pub group_names: Vec<String>,
    /// The number of capture groups, including the implicit group 0.
    pub groups: usize,
    /// Entry point for anchored, full-pattern matching.
    pub start: InstPtr,
    /// Entry point for unanchored searching: a split between `start` and a
    /// consume-anything loop back to itself.
    pub start1: InstPtr,
    /// The single Accept instruction.
    pub accept: InstPtr,
    /// Prefer leftmost-longest over leftmost-first match selection.
    longest: AtomicBool,
    /// The literal every match must start with (possibly empty).
    pub prefix: String,
    /// True iff `prefix` is the entire pattern.
    pub complete: bool,
}

impl Program {
    pub fn new(src: &str) -> Program {
        Program {
            src: src.to_owned(),
            insts: vec![],
            classes: vec![],
            group_names: vec![String::new()],
            groups: 0,
            start: 0,
            start1: 0,
            accept: 0,
            longest: AtomicBool::new(false),
            prefix: String::new(),
            complete: false,
        }
    }

    /// Append an instruction and return its index, enforcing the program
    /// size cap.
    pub fn add(&mut self, inst: Inst) -> Result<InstPtr, Error> {
        if self.insts.len() >= MAX_PROGRAM {
            return Err(Error::new(ErrorKind::ProgramTooLarge(MAX_PROGRAM)));
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    /// Set the successor of the dangling instruction `s` to `t`.
    pub fn patch(&mut self, s: InstPtr, t: InstPtr) {
        match self.insts[s] {
            Inst::Char(ref mut i) => i.goto = t,
            Inst::Dot(ref mut i) | Inst::DotNl(ref mut i) | Inst::Nop(ref mut i) => i.goto = t,
            Inst::Class(ref mut i) | Inst::NotClass(ref mut i) => i.goto = t,
            Inst::EmptyLook(ref mut i) => i.goto = t,
            Inst::Save(ref mut i) => i.goto = t,
            Inst::Split(_) | Inst::Accept => {
                unreachable!("patch applied to a non-patchable instruction")
            }
        }
    }

    pub fn is_longest(&self) -> bool {
        self.longest.load(Ordering::Relaxed)
    }

    pub fn set_longest(&self, yes: bool) {
        self.longest.store(yes, Ordering::Relaxed);
    }

    /// Follow a chain of Nop instructions to the first state that is not a
    /// Nop.
    fn route(&self, mut s: InstPtr) -> InstPtr {
        while let Inst::Nop(ref i) = self.insts[s] {
            s = i.goto;
        }
        s
    }

    /// Rewrite every out-edge to skip past Nop placeholders so the
    /// simulation never observes one. After this pass no state reachable
    /// from `start` or `start1` is a Nop.
    pub fn optimize(&mut self) {
        for pc in 0..self.insts.len() {
            match self.insts[pc] {
                Inst::Accept => {}
                Inst::Char(ref i) => {
                    let t = self.route(i.goto);
                    self.patch(pc, t);
                }
                Inst::Dot(ref i) | Inst::DotNl(ref i) | Inst::Nop(ref i) => {
                    let t = self.route(i.goto);
                    self.patch(pc, t);
                }
                Inst::Class(ref i) | Inst::NotClass(ref i) => {
                    let t = self.route(i.goto);
                    self.patch(pc, t);
                }
                Inst::EmptyLook(ref i) => {
                    let t = self.route(i.goto);
                    self.patch(pc, t);
                }
                Inst::Save(ref i) => {
                    let t = self.route(i.goto);
                    self.patch(pc, t);
                }
                Inst::Split(ref i) => {
                    let (t1, t2) = (self.route(i.goto1), self.route(i.goto2));
                    if let Inst::Split(ref mut i) = self.insts[pc] {
                        i.goto1 = t1;
                        i.goto2 = t2;
                    }
                }
            }
        }
        self.start = self.route(self.start);
        self.start1 = self.route(self.start1);
    }

    /// Collect every state reachable from `entry`, in no particular order.
    /// This is a debugging aid used by invariant checks.
    pub fn reachable(&self, entry: InstPtr) -> Vec<InstPtr> {
        let mut seen = ThreadList::new(self.insts.len());
        let mut stack = vec![entry];
        while let Some(pc) = stack.pop() {
            if seen.has(pc) {
                continue;
            }
            seen.include(Thread { pc, saved: Rc::new(vec![]) });
            match self.insts[pc] {
                Inst::Accept => {}
                Inst::Char(ref i) => stack.push(i.goto),
                Inst::Dot(ref i) | Inst::DotNl(ref i) | Inst::Nop(ref i) => stack.push(i.goto),
                Inst::Class(ref i) | Inst::NotClass(ref i) => stack.push(i.goto),
                Inst::EmptyLook(ref i) => stack.push(i.goto),
                Inst::Save(ref i) => stack.push(i.goto),
                Inst::Split(ref i) => {
                    stack.push(i.goto1);
                    stack.push(i.goto2);
                }
            }
        }
        seen.iter().map(|t| t.pc).collect()
    }

    /// Compute the literal prefix of the program: the sequence of `Char`
    /// instructions on the unique path from `start` before the first
    /// branch, class or assertion. If the walk reaches Accept, the prefix
    /// is the entire pattern.
    pub fn find_prefix(&mut self) {
        let mut prefix = String::new();
        let mut ip = self.start;
        self.complete = loop {
            match self.insts[ip] {
                Inst::Accept => break true,
                Inst::Char(ref i) => {
                    prefix.push(i.c);
                    ip = i.goto;
                }
                Inst::Save(ref i) => ip = i.goto,
                Inst::Nop(ref i) => ip = i.goto,
                _ => break false,
            }
        };
        self.prefix = prefix;
    }

    /// The total number of capture slots threads carry: two per group.
    pub fn num_slots(&self) -> usize {
        2 * self.groups
    }
}

impl Clone for Program {
    fn clone(&self) -> Program {
        Program {
            src: self.src.clone(),
            insts: self.insts.clone(),
            classes: self.classes.clone(),
            group_names: self.group_names.clone(),
            groups: self.groups,
            start: self.start,
            start1: self.start1,
            accept: self.accept,
            longest: AtomicBool::new(self.is_longest()),
            prefix: self.prefix.clone(),
            complete: self.complete,
        }
    }
}

/// Renders the instruction listing, one line per state.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn with_goto(pc: usize, goto: usize, s: String) -> String {
            if goto == pc + 1 {
                s
            } else {
                format!("{} (goto: {})", s, goto)
            }
        }

        writeln!(f, "--------------------------------")?;
        for (pc, inst) in self.insts.iter().enumerate() {
            let marker = if pc == self.start1 {
                "=>"
            } else if pc == self.start {
                "->"
            } else {
                "  "
            };
            let line = match *inst {
                Inst::Accept => "Accept".to_string(),
                Inst::Char(ref i) => with_goto(pc, i.goto, format!("{:?}", i.c)),
                Inst::Dot(ref i) => with_goto(pc, i.goto, "Dot".to_string()),
                Inst::DotNl(ref i) => with_goto(pc, i.goto, "DotNl".to_string()),
                Inst::Class(ref i) => with_goto(
                    pc,
                    i.goto,
                    format!("Class({:?})", &self.classes[i.start..i.end]),
                ),
                Inst::NotClass(ref i) => with_goto(
                    pc,
                    i.goto,
                    format!("NotClass({:?})", &self.classes[i.start..i.end]),
                ),
                Inst::EmptyLook(ref i) => with_goto(pc, i.goto, format!("{:?}", i.look)),
                Inst::Save(ref i) => with_goto(pc, i.goto, format!("Save({})", i.slot)),
                Inst::Split(ref i) => format!("Split({}, {})", i.goto1, i.goto2),
                Inst::Nop(ref i) => with_goto(pc, i.goto, "Nop".to_string()),
            };
            writeln!(f, "{} {:04} {}", marker, pc, line)?;
        }
        writeln!(f, "--------------------------------")?;
        Ok(())
    }
}
