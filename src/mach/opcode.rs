use super::{Builtin, UserFunction, Val};
use crate::lang::{Ident, Label};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// ## Bytecode
///
/// Each statement compiles to its own short list of opcodes working on
/// one operand stack, in reverse Polish order. `LET A=3*B` becomes
/// `[Literal(3), Push(B), Mul, Pop(A)]`.
///
/// Jumps move the program counter between statements, never inside a
/// list.

#[derive(Clone, Serialize, Deserialize)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push a constant.
    Literal(Val),
    /// Push a DEF parameter of the function being evaluated.
    Local(usize),
    /// Push stack value of named variable. Errors when unset.
    Push(Ident),
    /// Pop indices and push the array element.
    PushArr(Ident, usize),
    /// Pop positions and push a piece of a string variable.
    PushSlice(Ident, usize),

    // *** Stores
    /// Pop into a scalar variable.
    Pop(Ident),
    /// Pop indices, then the value, and store in the array.
    PopArr(Ident, usize),
    /// Pop positions, then the value, and overwrite part of a string.
    PopSlice(Ident, usize),
    /// Pop bounds and dimension the array.
    DimArr(Ident, usize),

    // *** Expression operations
    Neg,
    Pow,
    Mul,
    Div,
    DivInt,
    Mod,
    Add,
    Sub,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Not,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Imp,
    Eqv,
    Min,
    Max,

    // *** Functions
    /// Pop arguments and evaluate a DEF function.
    Fn(Rc<str>, usize),
    /// Pop arguments and call a built-in function.
    Builtin(Builtin, usize),

    // *** Branch control
    /// Pop step (when flagged), target and initial value; start a loop.
    For(Ident, bool),
    Next(Option<Ident>),
    /// Pop condition; when false skip to ELSE or end of line.
    IfNot,
    /// Reached after a true IF; skip to end of line.
    Else,
    /// Pop condition; when false skip past the matching WEND.
    While,
    Wend,
    /// Pop label and branch to it.
    Goto,
    Gosub,
    /// Branch to the address on the return stack or else error:
    /// RETURN WITHOUT GOSUB.
    Return,
    /// Pop index and branch to the selected label, if any.
    On(Rc<[Label]>, bool),
    /// Drop one return address without branching.
    PopReturn,
    End,

    // *** Statements
    DefFn(Rc<str>, Rc<UserFunction>),
    Print,
    /// Pop prompt and suspend for this many values.
    Input(usize),
    /// Suspend for a single value.
    Get,
    /// Push the next supplied input converted for the variable.
    InputValue(Ident),
    /// Push the next DATA value converted for the variable.
    Read(Ident),
    Restore(Option<Label>),
    Clear,
    Randomize,
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Literal(Val::Number(n)) => write!(f, "{}", n),
            Literal(Val::String(s)) => write!(f, "{:?}", s),
            Local(i) => write!(f, "LOCAL({})", i),
            Push(s) => write!(f, "PUSH({})", s),
            PushArr(s, n) => write!(f, "PUSHARR({},{})", s, n),
            PushSlice(s, n) => write!(f, "PUSHSLICE({},{})", s, n),
            Pop(s) => write!(f, "POP({})", s),
            PopArr(s, n) => write!(f, "POPARR({},{})", s, n),
            PopSlice(s, n) => write!(f, "POPSLICE({},{})", s, n),
            DimArr(s, n) => write!(f, "DIMARR({},{})", s, n),

            Neg => write!(f, "NEG"),
            Pow => write!(f, "POW"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            DivInt => write!(f, "DIVINT"),
            Mod => write!(f, "MOD"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Eq => write!(f, "EQ"),
            NotEq => write!(f, "NOTEQ"),
            Lt => write!(f, "LT"),
            LtEq => write!(f, "LTEQ"),
            Gt => write!(f, "GT"),
            GtEq => write!(f, "GTEQ"),
            And => write!(f, "AND"),
            Or => write!(f, "OR"),
            Not => write!(f, "NOT"),
            BitAnd => write!(f, "BITAND"),
            BitOr => write!(f, "BITOR"),
            BitXor => write!(f, "BITXOR"),
            BitNot => write!(f, "BITNOT"),
            Imp => write!(f, "IMP"),
            Eqv => write!(f, "EQV"),
            Min => write!(f, "MIN"),
            Max => write!(f, "MAX"),

            Fn(s, n) => write!(f, "FN({},{})", s, n),
            Builtin(b, n) => write!(f, "{}({})", b, n),

            For(s, step) => write!(f, "FOR({},{})", s, step),
            Next(Some(s)) => write!(f, "NEXT({})", s),
            Next(None) => write!(f, "NEXT"),
            IfNot => write!(f, "IFNOT"),
            Else => write!(f, "ELSE"),
            While => write!(f, "WHILE"),
            Wend => write!(f, "WEND"),
            Goto => write!(f, "GOTO"),
            Gosub => write!(f, "GOSUB"),
            Return => write!(f, "RETURN"),
            On(labels, gosub) => write!(
                f,
                "ON{}({})",
                if *gosub { "GOSUB" } else { "GOTO" },
                labels.join(",")
            ),
            PopReturn => write!(f, "POPRETURN"),
            End => write!(f, "END"),

            DefFn(s, _) => write!(f, "DEFFN({})", s),
            Print => write!(f, "PRINT"),
            Input(n) => write!(f, "INPUT({})", n),
            Get => write!(f, "GET"),
            InputValue(s) => write!(f, "INPUTVALUE({})", s),
            Read(s) => write!(f, "READ({})", s),
            Restore(Some(l)) => write!(f, "RESTORE({})", l),
            Restore(None) => write!(f, "RESTORE"),
            Clear => write!(f, "CLEAR"),
            Randomize => write!(f, "RANDOMIZE"),
        }
    }
}
