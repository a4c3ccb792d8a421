use super::rng::Rng;
use super::val::{format_number, parse_number};
use super::Val;
use crate::error;
use crate::lang::{Dialect, Error};
use chrono::{Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Abs,
    Asc,
    Atn,
    Chr,
    Cint,
    Cos,
    Cot,
    Ctl,
    Exp,
    Fix,
    Hex,
    Instr,
    Int,
    Left,
    Len,
    Lin,
    Log,
    Mid,
    Oct,
    Pos,
    Right,
    Rnd,
    Round,
    Sgn,
    Sin,
    Space,
    Spc,
    Sqr,
    Str,
    StringOf,
    Tab,
    Tan,
    Tim,
    Timer,
    Ups,
    Value,
}

/// Every built-in with its BASIC name and accepted argument counts.
const REGISTRY: &[(&str, Builtin, RangeInclusive<usize>)] = &[
    ("ABS", Builtin::Abs, 1..=1),
    ("ASC", Builtin::Asc, 1..=1),
    ("ATN", Builtin::Atn, 1..=1),
    ("CHR$", Builtin::Chr, 1..=1),
    ("CINT", Builtin::Cint, 1..=1),
    ("COS", Builtin::Cos, 1..=1),
    ("COT", Builtin::Cot, 1..=1),
    ("CTL", Builtin::Ctl, 1..=1),
    ("EXP", Builtin::Exp, 1..=1),
    ("FIX", Builtin::Fix, 1..=1),
    ("HEX$", Builtin::Hex, 1..=1),
    ("INSTR", Builtin::Instr, 2..=3),
    ("INT", Builtin::Int, 1..=1),
    ("LEFT$", Builtin::Left, 2..=2),
    ("LEN", Builtin::Len, 1..=1),
    ("LIN", Builtin::Lin, 1..=1),
    ("LOG", Builtin::Log, 1..=1),
    ("MID$", Builtin::Mid, 2..=3),
    ("OCT$", Builtin::Oct, 1..=1),
    ("POS", Builtin::Pos, 1..=1),
    ("RIGHT$", Builtin::Right, 2..=2),
    ("RND", Builtin::Rnd, 0..=1),
    ("ROUND", Builtin::Round, 1..=1),
    ("SGN", Builtin::Sgn, 1..=1),
    ("SIN", Builtin::Sin, 1..=1),
    ("SPACE$", Builtin::Space, 1..=1),
    ("SPC", Builtin::Spc, 1..=1),
    ("SQR", Builtin::Sqr, 1..=1),
    ("STR$", Builtin::Str, 1..=1),
    ("STRING$", Builtin::StringOf, 2..=2),
    ("TAB", Builtin::Tab, 1..=1),
    ("TAN", Builtin::Tan, 1..=1),
    ("TIM", Builtin::Tim, 1..=1),
    ("TIMER", Builtin::Timer, 0..=0),
    ("UPS$", Builtin::Ups, 1..=1),
    ("VAL", Builtin::Value, 1..=1),
];

impl Builtin {
    pub fn name(self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, b, _)| *b == self)
            .map(|(name, _, _)| *name)
            .unwrap_or("?")
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The built-ins one program may call.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    table: HashMap<Rc<str>, (Builtin, RangeInclusive<usize>)>,
}

impl Builtins {
    /// Names in the allow-list that are not built-ins are ignored.
    pub fn new(dialect: &Dialect) -> Builtins {
        let table = REGISTRY
            .iter()
            .filter(|(name, _, _)| match &dialect.valid_functions {
                Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
                None => true,
            })
            .map(|(name, b, arity)| (Rc::from(*name), (*b, arity.clone())))
            .collect();
        Builtins { table }
    }

    pub fn get(&self, name: &str) -> Option<(Builtin, RangeInclusive<usize>)> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

/// What a built-in may see of the running machine.
pub struct Env<'a> {
    pub dialect: &'a Dialect,
    pub column: usize,
    pub rng: &'a mut Rng,
}

pub struct Function {}

impl Function {
    pub fn call(builtin: Builtin, args: Vec<Val>, env: &mut Env) -> Result<Val> {
        use Builtin::*;
        let mut args = args.into_iter();
        let mut arg = || args.next();
        let dialect = env.dialect;
        let val = match builtin {
            Abs => num(number(arg())?.abs()),
            Asc => match string(arg(), dialect)?.chars().next() {
                Some(c) => Val::Number(c as u32 as f64),
                None => return Err(error!(IllegalFunctionCall; "ASC OF EMPTY STRING")),
            },
            Atn => num(number(arg())?.atan()),
            Chr | Ctl => Val::String(chr(number(arg())?)?.to_string().into()),
            Cint | Round => num(Function::round(number(arg())?)),
            Cos => num(number(arg())?.cos()),
            Cot => num(1.0 / number(arg())?.tan()),
            Exp => num(number(arg())?.exp()),
            Fix => num(number(arg())?.trunc()),
            Hex => Val::String(radix(number(arg())?, 16).into()),
            Instr => {
                let a = arg();
                let b = arg();
                match arg() {
                    Some(c) => {
                        let from = number(a)?;
                        let hay = string(Some(c), dialect)?;
                        let needle = string(b, dialect)?;
                        Val::Number(instr(&hay, &needle, from) as f64)
                    }
                    None => {
                        let needle = string(a, dialect)?;
                        let hay = string(b, dialect)?;
                        Val::Number(instr(&hay, &needle, 0.0) as f64)
                    }
                }
            }
            Int => num(number(arg())?.floor()),
            Left => {
                let s = string(arg(), dialect)?;
                let count = length(number(arg())?);
                Val::String(s.chars().take(count).collect::<String>().into())
            }
            Len => Val::Number(string(arg(), dialect)?.chars().count() as f64),
            Lin => repeat('\n', number(arg())?, dialect)?,
            Log => {
                let n = number(arg())?;
                if n == 0.0 {
                    return Err(error!(IllegalFunctionCall; "LOGARITHM OF ZERO"));
                }
                if n < 0.0 {
                    return Err(error!(IllegalFunctionCall; "LOGARITHM OF NEGATIVE NUMBER"));
                }
                num(n.ln())
            }
            Mid => {
                let s = string(arg(), dialect)?;
                let start = number(arg())?;
                if start < 1.0 {
                    return Err(error!(IllegalFunctionCall; "MID$ START BELOW 1"));
                }
                let len = s.chars().count();
                let count = match arg() {
                    Some(v) => match number(Some(v))? {
                        n if n == 0.0 => len,
                        n => length(n),
                    },
                    None => len,
                };
                let skip = length(start - 1.0);
                Val::String(s.chars().skip(skip).take(count).collect::<String>().into())
            }
            Oct => Val::String(radix(number(arg())?, 8).into()),
            Pos => Val::Number(env.column as f64 + 1.0),
            Right => {
                let s = string(arg(), dialect)?;
                let len = s.chars().count();
                let count = length(number(arg())?).min(len);
                Val::String(s.chars().skip(len - count).collect::<String>().into())
            }
            Rnd => Val::Number(env.rng.next()),
            Sgn => {
                let n = number(arg())?;
                Val::Number(if n < 0.0 {
                    -1.0
                } else if n > 0.0 {
                    1.0
                } else {
                    0.0
                })
            }
            Sin => num(number(arg())?.sin()),
            Space | Spc => repeat(' ', number(arg())?, dialect)?,
            Sqr => {
                let n = number(arg())?;
                if n < 0.0 {
                    return Err(error!(IllegalFunctionCall; "SQUARE ROOT OF NEGATIVE NUMBER"));
                }
                num(n.sqrt())
            }
            Str => {
                let n = check_num(number(arg())?)?;
                Val::String(
                    format_number(n, dialect.print_zone_length, dialect.numeric_padding).into(),
                )
            }
            StringOf => {
                let len = number(arg())?;
                let c = match arg() {
                    Some(Val::String(s)) => match s.chars().next() {
                        Some(c) => c,
                        None => return Ok(Val::String("".into())),
                    },
                    Some(Val::Number(n)) => chr(n)?,
                    None => return Err(error!(InternalError; "MISSING ARGUMENT")),
                };
                repeat(c, len, dialect)?
            }
            Tab => {
                let mut n = number(arg())?;
                if n < 1.0 {
                    n = 1.0;
                }
                let spaces = Function::round(n) - 1.0 - env.column as f64;
                repeat(' ', spaces, dialect)?
            }
            Tan => num(number(arg())?.tan()),
            Tim => Val::Number(tim(Function::round(number(arg())?))),
            Timer => Val::Number(Utc::now().timestamp_millis() as f64 / 1000.0),
            Ups => Val::String(string(arg(), dialect)?.to_uppercase().into()),
            Value => Val::Number(parse_number(&string(arg(), dialect)?).unwrap_or(0.0)),
        };
        match val {
            Val::Number(n) => Ok(Val::Number(check_num(n)?)),
            Val::String(s) => check_string(s, dialect).map(Val::String),
        }
    }

    /// Halves round up, as BASIC rounds subscripts and ON indexes.
    pub fn round(n: f64) -> f64 {
        (n + 0.5).floor()
    }
}

/// Rejects values no variable may hold.
pub fn check_num(n: f64) -> Result<f64> {
    if n.is_infinite() {
        return Err(error!(Overflow; "NUMBER TOO BIG"));
    }
    if n.is_nan() {
        return Err(error!(IllegalFunctionCall; "INVALID NUMBER"));
    }
    Ok(n)
}

pub fn check_string(s: Rc<str>, dialect: &Dialect) -> Result<Rc<str>> {
    if s.chars().count() > dialect.max_string_length {
        return Err(too_long(dialect));
    }
    Ok(s)
}

fn too_long(dialect: &Dialect) -> Error {
    error!(Dialect; format!(
        "STRINGS LONGER THAN {} CHARACTERS",
        dialect.max_string_length
    ))
}

fn num(n: f64) -> Val {
    Val::Number(n)
}

fn number(val: Option<Val>) -> Result<f64> {
    match val {
        Some(Val::Number(n)) => Ok(n),
        Some(Val::String(_)) => Err(error!(TypeMismatch; "EXPECTED A NUMBER")),
        None => Err(error!(InternalError; "MISSING ARGUMENT")),
    }
}

fn string(val: Option<Val>, dialect: &Dialect) -> Result<Rc<str>> {
    match val {
        Some(Val::String(s)) => check_string(s, dialect),
        Some(Val::Number(_)) => Err(error!(TypeMismatch; "EXPECTED A STRING")),
        None => Err(error!(InternalError; "MISSING ARGUMENT")),
    }
}

fn chr(n: f64) -> Result<char> {
    let code = check_num(n)?.trunc();
    if code < 0.0 {
        return Err(error!(IllegalFunctionCall; "INVALID CHARACTER CODE"));
    }
    char::from_u32(code as u32).ok_or_else(|| error!(IllegalFunctionCall; "INVALID CHARACTER CODE"))
}

fn length(n: f64) -> usize {
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc() as usize
    }
}

/// Checked against the length limit before anything is allocated.
fn repeat(c: char, n: f64, dialect: &Dialect) -> Result<Val> {
    let n = Function::round(n);
    if n > dialect.max_string_length as f64 {
        return Err(too_long(dialect));
    }
    if n > 0.0 {
        Ok(Val::String(std::iter::repeat(c).take(n as usize).collect::<String>().into()))
    } else {
        Ok(Val::String("".into()))
    }
}

fn radix(n: f64, radix: u32) -> String {
    let n = Function::round(n) as i64;
    let digits = match radix {
        16 => format!("{:X}", n.unsigned_abs()),
        _ => format!("{:o}", n.unsigned_abs()),
    };
    if n < 0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

/// One-based position of `needle` in `hay` searching from character
/// offset `from`, or 0.
fn instr(hay: &str, needle: &str, from: f64) -> usize {
    let from = length(from);
    let start = match hay.char_indices().nth(from) {
        Some((i, _)) => i,
        None if from == hay.chars().count() => hay.len(),
        None => return 0,
    };
    match hay[start..].find(needle) {
        Some(i) => hay[..start + i].chars().count() + 1,
        None => 0,
    }
}

fn tim(selector: f64) -> f64 {
    let now = Local::now();
    match selector as i64 {
        0 => now.minute() as f64,
        1 => now.hour() as f64,
        2 => now.ordinal() as f64,
        3 => (now.year() % 100) as f64,
        4 => now.second() as f64,
        _ => 0.0,
    }
}
