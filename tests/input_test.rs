mod common;
use basic::lang::ast::{BinaryOp, Command, Reference};
use basic::lang::{Dialect, ErrorCode};
use basic::mach::{Event, Host, Val};
use common::*;

fn answer(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_input_number() {
    let mut r = runtime(
        Dialect::modern(),
        vec![
            line(10, vec![input(Some("N"), &["N"])]),
            line(20, vec![print(vec![bin(BinaryOp::Mul, var("N"), num(2.0))])]),
        ],
    );
    assert_eq!(exec(&mut r), "N? ");
    let mut out = String::new();
    r.input(answer(&["21"]), &mut out).unwrap();
    assert_eq!(exec(&mut r), "42\n");
}

#[test]
fn test_input_asks_again() {
    let mut r = runtime(
        Dialect::modern(),
        vec![
            line(10, vec![input(None, &["A", "B"])]),
            line(20, vec![print(vec![var("A"), text(","), var("B")])]),
        ],
    );
    assert_eq!(exec(&mut r), "? ");
    let mut out = String::new();
    r.input(answer(&["1", "X"]), &mut out).unwrap();
    assert_eq!(r.variable("A"), None);
    assert_eq!(exec(&mut r), "? ");
    r.input(answer(&["1", "2"]), &mut out).unwrap();
    assert_eq!(exec(&mut r), "1,2\n");
}

#[test]
fn test_input_missing_strings_are_empty() {
    let mut r = runtime(
        Dialect::modern(),
        vec![
            line(10, vec![input(None, &["A$", "B$"])]),
            line(20, vec![print(vec![var("A$"), text("|"), var("B$")])]),
        ],
    );
    assert_eq!(exec(&mut r), "? ");
    let mut out = String::new();
    r.input(answer(&["HI"]), &mut out).unwrap();
    assert_eq!(exec(&mut r), "HI|\n");
}

#[test]
fn test_input_into_array() {
    let mut r = runtime(
        Dialect::altair(),
        vec![
            line(
                10,
                vec![Command::Input {
                    prompt: None,
                    args: vec![Reference::indexed("A", vec![num(2.0)])],
                }],
            ),
            line(20, vec![print(vec![call("A", vec![num(2.0)])])]),
        ],
    );
    assert_eq!(exec(&mut r), "? ");
    let mut out = String::new();
    r.input(answer(&["9"]), &mut out).unwrap();
    assert_eq!(exec(&mut r), " 9 \n");
}

#[test]
fn test_get_accepts_anything() {
    let mut r = runtime(
        Dialect::modern(),
        vec![
            line(10, vec![Command::Get { lexpr: Reference::var("K$") }]),
            line(20, vec![print(vec![var("K$")])]),
        ],
    );
    assert_eq!(r.step(&mut String::new()), Event::Input(String::new(), 1));
    assert!(r.is_waiting());
    let mut out = String::new();
    r.input(answer(&["Q"]), &mut out).unwrap();
    assert_eq!(r.variable("K$"), Some(Val::from("Q")));
    assert_eq!(exec(&mut r), "Q\n");
}

#[test]
fn test_get_number_asks_again() {
    let mut r = runtime(
        Dialect::modern(),
        vec![
            line(10, vec![Command::Get { lexpr: Reference::var("K") }]),
            line(20, vec![print(vec![bin(BinaryOp::Add, var("K"), num(1.0))])]),
        ],
    );
    assert_eq!(exec(&mut r), "? ");
    let mut out = String::new();
    r.input(answer(&["X"]), &mut out).unwrap();
    assert_eq!(r.variable("K"), None);
    assert_eq!(r.step(&mut out), Event::Input(String::new(), 1));
    r.input(answer(&["5"]), &mut out).unwrap();
    assert_eq!(r.variable("K"), Some(Val::Number(5.0)));
    assert_eq!(exec(&mut r), "6\n");
}

#[derive(Default)]
struct Counter {
    out: String,
    resumes: usize,
}

impl Host for Counter {
    fn print(&mut self, text: &str) {
        self.out.push_str(text);
    }
    fn resume(&mut self) {
        self.resumes += 1;
    }
}

#[test]
fn test_input_calls_resume() {
    let mut r = runtime(
        Dialect::modern(),
        vec![
            line(10, vec![input(None, &["A"])]),
            line(20, vec![print(vec![var("A")])]),
        ],
    );
    let mut host = Counter::default();
    assert_eq!(r.step(&mut host), Event::Input(String::new(), 1));
    r.input(answer(&["X"]), &mut host).unwrap();
    assert_eq!(host.resumes, 1);
    assert_eq!(r.step(&mut host), Event::Input(String::new(), 1));
    r.input(answer(&["7"]), &mut host).unwrap();
    assert_eq!(host.resumes, 2);
    while r.step(&mut host) == Event::Running {}
    assert_eq!(host.out, "7\n");
}

#[test]
fn test_input_without_request() {
    let mut r = runtime(Dialect::modern(), vec![line(10, vec![print(vec![])])]);
    let error = r.input(answer(&["1"]), &mut String::new()).unwrap_err();
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[test]
fn test_interrupt_while_waiting() {
    let mut r = runtime(
        Dialect::modern(),
        vec![line(10, vec![input(None, &["A"])])],
    );
    assert_eq!(exec(&mut r), "? ");
    let error = r.interrupt();
    assert_eq!(error.to_string(), "BREAK IN 10");
    assert!(!r.is_waiting());
    assert_eq!(exec(&mut r), "");
}
