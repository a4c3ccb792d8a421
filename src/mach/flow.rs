use super::function::Function;
use super::{Address, Program};
use crate::error;
use crate::lang::ast::Command;
use crate::lang::{Error, Ident};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, Error>;

/// ## Control flow
///
/// Loop records and the forward scans used to skip over code that
/// must not run: the rest of a line, an IF's THEN part, a loop body.

/// An active FOR. `body` is the address right after the FOR statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForLoop {
    pub var: Ident,
    pub target: f64,
    pub step: f64,
    pub body: Address,
}

impl ForLoop {
    pub fn is_done(&self, value: f64) -> bool {
        if self.step >= 0.0 {
            value > self.target
        } else {
            value < self.target
        }
    }
}

/// First address of the next line, or the end of the program.
pub fn skip_to_eol(prog: &Program, mut pc: Address) -> Address {
    while pc < prog.len() && !prog.is_line_start(pc) {
        pc += 1;
    }
    pc
}

/// Address after the ELSE on this line. A nested IF owns any ELSE that
/// follows it, so meeting one means the rest of the line is skipped.
pub fn skip_to_else(prog: &Program, mut pc: Address) -> Address {
    while pc < prog.len() && !prog.is_line_start(pc) {
        match prog.statement(pc).map(|s| &s.command) {
            Some(Command::Else) => return pc + 1,
            Some(Command::If { .. }) => return skip_to_eol(prog, pc + 1),
            _ => pc += 1,
        }
    }
    pc
}

/// Address after the NEXT that closes a FOR of `var`. Inner loops are
/// counted so their NEXT statements are passed over.
pub fn skip_past_next(prog: &Program, mut pc: Address, var: &Ident) -> Result<Address> {
    let mut depth = 0;
    while let Some(statement) = prog.statement(pc) {
        match &statement.command {
            Command::For { .. } => depth += 1,
            Command::Next { lexpr: Some(r) } => {
                if Ident::new(&r.name) == *var {
                    return Ok(pc + 1);
                }
                if depth > 0 {
                    depth -= 1;
                }
            }
            Command::Next { lexpr: None } => {
                if depth == 0 {
                    return Ok(pc + 1);
                }
                depth -= 1;
            }
            _ => {}
        }
        pc += 1;
    }
    Err(error!(ForWithoutNext; format!("{}", var)))
}

/// Address after the WEND matching the WHILE at `pc`.
pub fn skip_past_wend(prog: &Program, mut pc: Address) -> Result<Address> {
    let mut nesting = 0;
    while let Some(statement) = prog.statement(pc) {
        match statement.command {
            Command::While { .. } => nesting += 1,
            Command::Wend => {
                nesting -= 1;
                if nesting == 0 {
                    return Ok(pc + 1);
                }
            }
            _ => {}
        }
        pc += 1;
    }
    Err(error!(WhileWithoutWend))
}

/// Which entry `ON X GOTO` picks. Negative is always an error; past
/// either end is an error only when `strict`, otherwise no jump.
pub fn on_index(value: f64, len: usize, strict: bool) -> Result<Option<usize>> {
    let value = Function::round(value);
    let out_of_range = || error!(IllegalFunctionCall; format!("EXPECTED 1 TO {}, GOT {}", len, value));
    if value < 0.0 || value.is_nan() {
        return Err(out_of_range());
    }
    if value < 1.0 || value > len as f64 {
        if strict {
            return Err(out_of_range());
        }
        return Ok(None);
    }
    Ok(Some(value as usize - 1))
}
