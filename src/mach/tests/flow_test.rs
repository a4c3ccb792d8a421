use super::*;
use crate::lang::{Dialect, ErrorCode, Ident};
use crate::mach::compile;
use crate::mach::flow::{on_index, skip_past_next, skip_past_wend, skip_to_else, skip_to_eol};
use crate::mach::Builtins;
use std::rc::Rc;

#[test]
fn test_skip_to_eol() {
    let prog = load(vec![
        ("10", vec![print(), print(), print()]),
        ("20", vec![print()]),
    ]);
    assert_eq!(skip_to_eol(&prog, 1), 3);
    assert_eq!(skip_to_eol(&prog, 3), 3);
    assert_eq!(skip_to_eol(&prog, 4), 4);
}

#[test]
fn test_skip_to_else() {
    let prog = load(vec![
        ("10", vec![r#if(), print(), Command::Else, print()]),
        ("20", vec![r#if(), r#if(), print(), Command::Else, print()]),
        ("30", vec![print()]),
    ]);
    assert_eq!(skip_to_else(&prog, 1), 3);
    // The inner IF owns the ELSE.
    assert_eq!(skip_to_else(&prog, 5), 9);
}

#[test]
fn test_skip_past_next() {
    let prog = load(vec![
        ("10", vec![r#for("I")]),
        ("20", vec![r#for("J"), next(None)]),
        ("30", vec![r#for("K"), next(Some("K"))]),
        ("40", vec![next(Some("I"))]),
        ("50", vec![print()]),
    ]);
    assert_eq!(skip_past_next(&prog, 1, &Ident::new("I")), Ok(6));
    assert_eq!(skip_past_next(&prog, 4, &Ident::new("K")), Ok(5));
    let e = skip_past_next(&prog, 6, &Ident::new("I")).unwrap_err();
    assert_eq!(e.code(), ErrorCode::ForWithoutNext);
}

#[test]
fn test_skip_past_wend() {
    let while_ = || Command::While { cond: num(0.0) };
    let prog = load(vec![
        ("10", vec![while_()]),
        ("20", vec![while_(), Command::Wend]),
        ("30", vec![Command::Wend]),
        ("40", vec![while_()]),
    ]);
    assert_eq!(skip_past_wend(&prog, 0), Ok(4));
    assert_eq!(skip_past_wend(&prog, 1), Ok(3));
    let e = skip_past_wend(&prog, 4).unwrap_err();
    assert_eq!(e.code(), ErrorCode::WhileWithoutWend);
}

#[test]
fn test_on_index() {
    assert_eq!(on_index(1.0, 3, true), Ok(Some(0)));
    assert_eq!(on_index(2.6, 3, true), Ok(Some(2)));
    assert_eq!(on_index(0.0, 3, false), Ok(None));
    assert_eq!(on_index(4.0, 3, false), Ok(None));
    assert!(on_index(0.0, 3, true).is_err());
    assert!(on_index(4.0, 3, true).is_err());
    assert!(on_index(-1.0, 3, false).is_err());
}

#[test]
fn test_statement_compiles_once() {
    let prog = load(vec![("10", vec![print()])]);
    let dialect = Dialect::default();
    let builtins = Builtins::new(&dialect);
    let stmt = match prog.statement(0) {
        Some(stmt) => stmt,
        None => panic!("no statement"),
    };
    assert!(stmt.compiled().is_none());
    let first = stmt.cache(|s| compile(&dialect, &builtins, s)).unwrap();
    let second = stmt
        .cache(|_| -> Result<_, crate::lang::Error> { panic!("compiled twice") })
        .unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_data_labels() {
    let data = |n: f64| Command::Data {
        datums: vec![num(n), num(n + 1.0)],
    };
    let prog = load(vec![
        ("10", vec![data(1.0)]),
        ("20", vec![print()]),
        ("30", vec![data(3.0)]),
    ]);
    assert_eq!(prog.data_len(), 4);
    assert_eq!(prog.data_offset("20"), Ok(2));
    assert_eq!(prog.data_offset("30"), Ok(2));
    assert!(prog.data_offset("99").is_err());
    assert_eq!(prog.address("30"), Ok(2));
}
