#![allow(dead_code)]

use basic::lang::ast::{
    BinaryOp, Command, Expression, Line, Literal, Program, Reference, Statement, UnaryOp,
};
use basic::lang::{Dialect, SourceLocation};
use basic::mach::{Event, Runtime};

pub fn exec(runtime: &mut Runtime) -> String {
    exec_n(runtime, 5000)
}

/// Steps until the program stops, fails or asks for input. Errors are
/// shown the way a terminal would show them.
pub fn exec_n(runtime: &mut Runtime, cycles: usize) -> String {
    let mut s = String::new();
    for _ in 0..cycles {
        match runtime.step(&mut s) {
            Event::Running => {}
            Event::Stopped => return s,
            Event::Input(prompt, _) => {
                s.push_str(&format!("{}? ", prompt));
                return s;
            }
            Event::Error(error) => {
                s.push_str(&format!("?{}\n", error));
                return s;
            }
        }
    }
    s.push_str(&format!("\n{} Execution cycles exceeded.\n", cycles));
    s
}

/// Loads and resets; panics when the program is rejected.
pub fn runtime(dialect: Dialect, lines: Vec<Line>) -> Runtime {
    let mut r = Runtime::default();
    r.load(program(dialect, lines)).expect("load");
    r.reset().expect("reset");
    r
}

pub fn run(dialect: Dialect, lines: Vec<Line>) -> String {
    exec(&mut runtime(dialect, lines))
}

pub fn program(dialect: Dialect, mut lines: Vec<Line>) -> Program {
    for (idx, line) in lines.iter_mut().enumerate() {
        for (offset, statement) in line.statements.iter_mut().enumerate() {
            statement.loc = SourceLocation::new(idx + 1, line.label.clone(), offset);
        }
    }
    Program { dialect, lines }
}

pub fn line(label: usize, commands: Vec<Command>) -> Line {
    Line {
        label: Some(label.to_string().into()),
        statements: commands
            .into_iter()
            .map(|c| Statement::new(c, SourceLocation::default()))
            .collect(),
    }
}

// *** Expressions

pub fn num(n: f64) -> Expression {
    Expression::Literal {
        value: Literal::Number(n),
    }
}

pub fn text(s: &str) -> Expression {
    Expression::Literal {
        value: Literal::String(s.into()),
    }
}

pub fn var(name: &str) -> Expression {
    Expression::Reference(Reference::var(name))
}

/// Array element, function call or string slice.
pub fn call(name: &str, args: Vec<Expression>) -> Expression {
    Expression::Reference(Reference::indexed(name, args))
}

pub fn bin(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn neg(expr: Expression) -> Expression {
    Expression::Unary {
        op: UnaryOp::Neg,
        expr: Box::new(expr),
    }
}

// *** Statements

pub fn assign(name: &str, right: Expression) -> Command {
    Command::Let {
        lexpr: Reference::var(name),
        right,
    }
}

pub fn assign_at(name: &str, args: Vec<Expression>, right: Expression) -> Command {
    Command::Let {
        lexpr: Reference::indexed(name, args),
        right,
    }
}

/// PRINT with a trailing newline.
pub fn print(mut args: Vec<Expression>) -> Command {
    args.push(text("\n"));
    Command::Print { args }
}

/// PRINT that leaves the cursor on the line.
pub fn print_on(args: Vec<Expression>) -> Command {
    Command::Print { args }
}

pub fn goto(label: usize) -> Command {
    Command::Goto {
        label: num(label as f64),
    }
}

pub fn gosub(label: usize) -> Command {
    Command::Gosub {
        label: num(label as f64),
    }
}

pub fn for_loop(name: &str, initial: f64, target: f64, step: Option<f64>) -> Command {
    Command::For {
        lexpr: Reference::var(name),
        initial: num(initial),
        target: num(target),
        step: step.map(num),
    }
}

pub fn next(name: Option<&str>) -> Command {
    Command::Next {
        lexpr: name.map(Reference::var),
    }
}

pub fn if_then(cond: Expression) -> Command {
    Command::If { cond }
}

pub fn on_goto(expr: Expression, labels: &[usize]) -> Command {
    Command::OnGoto {
        expr,
        labels: labels.iter().map(|l| num(*l as f64)).collect(),
    }
}

pub fn on_gosub(expr: Expression, labels: &[usize]) -> Command {
    Command::OnGosub {
        expr,
        labels: labels.iter().map(|l| num(*l as f64)).collect(),
    }
}

pub fn data(values: Vec<Expression>) -> Command {
    Command::Data { datums: values }
}

pub fn read(names: &[&str]) -> Command {
    Command::Read {
        args: names.iter().map(|n| Reference::var(n)).collect(),
    }
}

pub fn restore(label: Option<usize>) -> Command {
    Command::Restore {
        label: label.map(|l| num(l as f64)),
    }
}

pub fn dim(name: &str, bounds: Vec<Expression>) -> Command {
    Command::Dim {
        args: vec![Reference::indexed(name, bounds)],
    }
}

pub fn input(prompt: Option<&str>, names: &[&str]) -> Command {
    Command::Input {
        prompt: prompt.map(text),
        args: names.iter().map(|n| Reference::var(n)).collect(),
    }
}
