use super::{Dialect, Label, SourceLocation};
use crate::mach::Code;
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::OnceCell;
use std::rc::Rc;

/// ## Program tree
///
/// The runtime does not parse BASIC. A front-end hands over this tree,
/// usually as JSON, already checked for syntax. Statements carry a
/// `command` tag and a `$loc` for diagnostics:
///
/// ```text
/// {"command":"LET","lexpr":{"name":"A"},"right":{"value":3},"$loc":{...}}
/// ```

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default, alias = "opts", deserialize_with = "super::dialect::preset")]
    pub dialect: Dialect,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    #[serde(default, deserialize_with = "label")]
    pub label: Option<Label>,
    #[serde(alias = "stmts")]
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(flatten)]
    pub command: Command,
    #[serde(rename = "$loc", default)]
    pub loc: SourceLocation,
    #[serde(skip)]
    compiled: OnceCell<Code>,
}

impl Statement {
    pub fn new(command: Command, loc: SourceLocation) -> Statement {
        Statement {
            command,
            loc,
            compiled: OnceCell::new(),
        }
    }

    pub fn compiled(&self) -> Option<&Code> {
        self.compiled.get()
    }

    /// Compiles at most once. Later calls return the first result.
    pub fn cache<F, E>(&self, compile: F) -> Result<Code, E>
    where
        F: FnOnce(&Statement) -> Result<Code, E>,
    {
        if let Some(code) = self.compiled.get() {
            return Ok(code.clone());
        }
        let code = compile(self)?;
        Ok(self.compiled.get_or_init(|| code).clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "UPPERCASE")]
pub enum Command {
    Let {
        lexpr: Reference,
        right: Expression,
    },
    Print {
        #[serde(default)]
        args: Vec<Expression>,
    },
    Input {
        #[serde(default)]
        prompt: Option<Expression>,
        args: Vec<Reference>,
    },
    Get {
        lexpr: Reference,
    },
    For {
        lexpr: Reference,
        initial: Expression,
        target: Expression,
        #[serde(default)]
        step: Option<Expression>,
    },
    Next {
        #[serde(default)]
        lexpr: Option<Reference>,
    },
    If {
        cond: Expression,
    },
    Else,
    While {
        cond: Expression,
    },
    Wend,
    Goto {
        label: Expression,
    },
    Gosub {
        label: Expression,
    },
    Return,
    #[serde(rename = "ONGOTO")]
    OnGoto {
        expr: Expression,
        labels: Vec<Expression>,
    },
    #[serde(rename = "ONGOSUB")]
    OnGosub {
        expr: Expression,
        labels: Vec<Expression>,
    },
    Def {
        lexpr: Reference,
        def: Expression,
    },
    Dim {
        args: Vec<Reference>,
    },
    Data {
        datums: Vec<Expression>,
    },
    Read {
        args: Vec<Reference>,
    },
    Restore {
        #[serde(default)]
        label: Option<Expression>,
    },
    End,
    Stop,
    Option,
    Pop,
    Clear,
    Randomize,
    #[serde(other)]
    Unknown,
}

impl Command {
    /// Statement keyword, for diagnostics and traces.
    pub fn keyword(&self) -> &'static str {
        use Command::*;
        match self {
            Let { .. } => "LET",
            Print { .. } => "PRINT",
            Input { .. } => "INPUT",
            Get { .. } => "GET",
            For { .. } => "FOR",
            Next { .. } => "NEXT",
            If { .. } => "IF",
            Else => "ELSE",
            While { .. } => "WHILE",
            Wend => "WEND",
            Goto { .. } => "GOTO",
            Gosub { .. } => "GOSUB",
            Return => "RETURN",
            OnGoto { .. } => "ONGOTO",
            OnGosub { .. } => "ONGOSUB",
            Def { .. } => "DEF",
            Dim { .. } => "DIM",
            Data { .. } => "DATA",
            Read { .. } => "READ",
            Restore { .. } => "RESTORE",
            End => "END",
            Stop => "STOP",
            Option => "OPTION",
            Pop => "POP",
            Clear => "CLEAR",
            Randomize => "RANDOMIZE",
            Unknown => "?",
        }
    }
}

/// A name with optional arguments. Whether it is a variable, an array
/// element or a function call is decided by the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: Rc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Expression>>,
}

impl Reference {
    pub fn var(name: &str) -> Reference {
        Reference {
            name: name.into(),
            args: None,
        }
    }

    pub fn indexed(name: &str, args: Vec<Expression>) -> Reference {
        Reference {
            name: name.into(),
            args: Some(args),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    String(Rc<str>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },
    Reference(Reference),
    Literal {
        value: Literal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LAnd,
    LOr,
    BAnd,
    BOr,
    BXor,
    BImp,
    BEqv,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    Neg,
    LNot,
    BNot,
}

/// Labels arrive as strings or numbers. Numbers are stored in
/// canonical text so `100`, `100.0` and `"100"` are the same line.
pub(crate) fn label<'de, D>(deserializer: D) -> Result<Option<Label>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(n)) => Some(format!("{}", n).into()),
        Some(Raw::Text(s)) => Some(s.into()),
    })
}

pub trait Visitor {
    fn visit_line(&mut self, _: usize, _: &Line) {}
    fn visit_statement(&mut self, _: &Statement) {}
}

pub trait AcceptVisitor {
    fn accept<V: Visitor>(&self, visitor: &mut V);
}

impl AcceptVisitor for Program {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        for (idx, line) in self.lines.iter().enumerate() {
            visitor.visit_line(idx, line);
            for statement in &line.statements {
                statement.accept(visitor);
            }
        }
    }
}

impl AcceptVisitor for Statement {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_statement(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_json() {
        let json = r#"{
            "command": "LET",
            "lexpr": {"name": "A", "args": [{"value": 1}]},
            "right": {"op": "add", "left": {"value": 2}, "right": {"name": "B"}},
            "$loc": {"line": 3, "label": "30", "offset": 7}
        }"#;
        let stmt: Statement = serde_json::from_str(json).expect("statement");
        assert_eq!(stmt.loc, SourceLocation::new(3, Some("30".into()), 7));
        match stmt.command {
            Command::Let { lexpr, right } => {
                assert_eq!(lexpr.name.as_ref(), "A");
                assert_eq!(
                    lexpr.args,
                    Some(vec![Expression::Literal {
                        value: Literal::Number(1.0)
                    }])
                );
                assert!(matches!(right, Expression::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_unknown_command() {
        let stmt: Statement = serde_json::from_str(r#"{"command":"TRON"}"#).expect("statement");
        assert!(matches!(stmt.command, Command::Unknown));
    }

    #[test]
    fn test_numeric_label() {
        let line: Line =
            serde_json::from_str(r#"{"label":100,"statements":[{"command":"END"}]}"#)
                .expect("line");
        assert_eq!(line.label.as_deref(), Some("100"));
    }
}
