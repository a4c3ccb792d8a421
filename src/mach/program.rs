use super::{Address, Val};
use crate::error;
use crate::lang::ast::{self, AcceptVisitor, Command, Expression, Statement};
use crate::lang::{Error, Label};
use std::collections::{HashMap, HashSet};

type Result<T> = std::result::Result<T, Error>;

/// ## Loaded program
///
/// All statements of all lines in one list. A program counter is an
/// index into that list and stays valid until the next load.

#[derive(Debug, Default)]
pub struct Program {
    statements: Vec<Statement>,
    line_starts: HashSet<Address>,
    labels: HashMap<Label, Address>,
    data: Vec<Val>,
    data_labels: HashMap<Label, usize>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn load(ast: &ast::Program) -> Result<Program> {
        let mut loader = Loader {
            prog: Program::new(),
            error: None,
        };
        ast.accept(&mut loader);
        match loader.error {
            Some(error) => Err(error),
            None => Ok(loader.prog),
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statement(&self, pc: Address) -> Option<&Statement> {
        self.statements.get(pc)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// True when `pc` is the first statement of a line.
    pub fn is_line_start(&self, pc: Address) -> bool {
        self.line_starts.contains(&pc)
    }

    pub fn address(&self, label: &str) -> Result<Address> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| error!(UndefinedLine; label.to_string()))
    }

    pub fn label_at(&self, pc: Address) -> Option<Label> {
        self.statements.get(pc).and_then(|s| s.loc.label.clone())
    }

    pub fn datum(&self, ptr: usize) -> Option<&Val> {
        self.data.get(ptr)
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Pool offset of the first DATA value at or after the labelled line.
    pub fn data_offset(&self, label: &str) -> Result<usize> {
        self.data_labels
            .get(label)
            .copied()
            .ok_or_else(|| error!(UndefinedLine; label.to_string()))
    }
}

struct Loader {
    prog: Program,
    error: Option<Error>,
}

impl ast::Visitor for Loader {
    fn visit_line(&mut self, _idx: usize, line: &ast::Line) {
        let pc = self.prog.statements.len();
        self.prog.line_starts.insert(pc);
        if let Some(label) = &line.label {
            self.prog.labels.insert(label.clone(), pc);
            self.prog
                .data_labels
                .insert(label.clone(), self.prog.data.len());
        }
    }

    fn visit_statement(&mut self, statement: &Statement) {
        if let Command::Data { datums } = &statement.command {
            for datum in datums {
                match constant(datum) {
                    Ok(val) => self.prog.data.push(val),
                    Err(e) => {
                        if self.error.is_none() {
                            self.error = Some(e.in_location(&statement.loc));
                        }
                    }
                }
            }
        }
        self.prog.statements.push(statement.clone());
    }
}

/// Literal value of a constant expression. Negated number literals
/// count as constants.
pub fn constant(expr: &Expression) -> Result<Val> {
    match expr {
        Expression::Literal { value } => Ok(Val::from(value)),
        Expression::Unary {
            op: ast::UnaryOp::Neg,
            expr,
        } => match constant(expr)? {
            Val::Number(n) => Ok(Val::Number(-n)),
            Val::String(_) => Err(error!(TypeMismatch)),
        },
        _ => Err(error!(SyntaxError; "EXPECTED A CONSTANT")),
    }
}
