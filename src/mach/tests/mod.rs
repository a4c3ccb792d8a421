use crate::lang::ast::{self, Command, Expression, Literal, Reference, Statement};
use crate::lang::SourceLocation;
use crate::mach::Program;

mod flow_test;

fn load(lines: Vec<(&str, Vec<Command>)>) -> Program {
    let lines = lines
        .into_iter()
        .map(|(label, commands)| ast::Line {
            label: Some(label.into()),
            statements: commands
                .into_iter()
                .map(|c| {
                    let loc = SourceLocation::new(0, Some(label.into()), 0);
                    Statement::new(c, loc)
                })
                .collect(),
        })
        .collect();
    let prog = ast::Program {
        dialect: Default::default(),
        lines,
    };
    Program::load(&prog).unwrap()
}

fn num(n: f64) -> Expression {
    Expression::Literal {
        value: Literal::Number(n),
    }
}

fn r#for(name: &str) -> Command {
    Command::For {
        lexpr: Reference::var(name),
        initial: num(1.0),
        target: num(2.0),
        step: None,
    }
}

fn next(name: Option<&str>) -> Command {
    Command::Next {
        lexpr: name.map(Reference::var),
    }
}

fn r#if() -> Command {
    Command::If { cond: num(1.0) }
}

fn print() -> Command {
    Command::Print { args: vec![] }
}
