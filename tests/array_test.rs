mod common;
use basic::lang::Dialect;
use common::*;

#[test]
fn test_out_of_bounds_with_base_zero() {
    let lines = vec![
        line(10, vec![dim("A", vec![num(3.0)])]),
        line(20, vec![print(vec![call("A", vec![num(3.0)])])]),
        line(30, vec![print(vec![call("A", vec![num(5.0)])])]),
    ];
    assert_eq!(
        run(Dialect::modern(), lines),
        "0\n?SUBSCRIPT OUT OF RANGE IN 30; A(5)\n"
    );
}

#[test]
fn test_base_one() {
    let lines = vec![
        line(10, vec![dim("A", vec![num(5.0)])]),
        line(20, vec![print(vec![call("A", vec![num(5.0)])])]),
        line(30, vec![print(vec![call("A", vec![num(0.0)])])]),
    ];
    assert_eq!(
        run(Dialect::hp(), lines),
        " 0 \n?SUBSCRIPT OUT OF RANGE IN 30; A(0)\n"
    );
}

#[test]
fn test_two_dimensions() {
    let lines = vec![
        line(10, vec![dim("B", vec![num(2.0), num(3.0)])]),
        line(20, vec![assign_at("B", vec![num(1.0), num(2.0)], num(5.0))]),
        line(
            30,
            vec![print(vec![
                call("B", vec![num(1.0), num(2.0)]),
                call("B", vec![num(2.0), num(3.0)]),
            ])],
        ),
        line(40, vec![print(vec![call("B", vec![num(1.0)])])]),
    ];
    let out = run(Dialect::modern(), lines);
    assert!(out.starts_with("50\n?SUBSCRIPT OUT OF RANGE IN 40; TOO FEW DIMENSIONS FOR B"));
}

#[test]
fn test_auto_dimension() {
    let lines = || {
        vec![
            line(10, vec![assign_at("A", vec![num(10.0)], num(7.0))]),
            line(20, vec![print(vec![call("A", vec![num(10.0)])])]),
            line(30, vec![print(vec![call("A", vec![num(11.0)])])]),
        ]
    };
    assert_eq!(
        run(Dialect::altair(), lines()),
        " 7 \n?SUBSCRIPT OUT OF RANGE IN 30; A(11)\n"
    );
    assert_eq!(
        run(Dialect::modern(), lines()),
        "?NOT IN THIS DIALECT IN 10; ARRAY A USED WITHOUT DIM\n"
    );
}

#[test]
fn test_redimension() {
    let lines = || {
        vec![
            line(10, vec![dim("A", vec![num(3.0)])]),
            line(20, vec![dim("A", vec![num(3.0)])]),
            line(30, vec![print(vec![text("OK")])]),
        ]
    };
    assert_eq!(
        run(Dialect::modern(), lines()),
        "?REDIMENSIONED ARRAY IN 20; A\n"
    );
    assert_eq!(run(Dialect::ecma55(), lines()), "OK\n");
}

#[test]
fn test_string_arrays() {
    let lines = vec![
        line(10, vec![dim("A$", vec![num(2.0)])]),
        line(20, vec![assign_at("A$", vec![num(1.0)], text("X"))]),
        line(30, vec![print(vec![call("A$", vec![num(1.0)])])]),
        line(40, vec![print(vec![call("A$", vec![num(2.0)])])]),
    ];
    assert_eq!(
        run(Dialect::modern(), lines),
        "X\n?UNSET VALUE IN 40; A$\n"
    );
}

#[test]
fn test_hp_string_slices() {
    let lines = vec![
        line(10, vec![dim("A$", vec![num(20.0)])]),
        line(20, vec![assign("A$", text("HELLO"))]),
        line(30, vec![print(vec![call("A$", vec![num(2.0), num(4.0)])])]),
        line(40, vec![assign_at("A$", vec![num(2.0), num(3.0)], text("IPP"))]),
        line(50, vec![print(vec![var("A$")])]),
    ];
    assert_eq!(run(Dialect::hp(), lines), "ELL\nHIPPLO\n");
}

#[test]
fn test_static_dim_runs_at_reset() {
    let lines = vec![
        line(10, vec![assign_at("A", vec![num(15.0)], num(1.0))]),
        line(20, vec![dim("A", vec![num(20.0)])]),
        line(30, vec![dim("A", vec![num(20.0)])]),
        line(40, vec![print(vec![call("A", vec![num(15.0)])])]),
    ];
    assert_eq!(run(Dialect::ecma55(), lines), " 1 \n");
}

#[test]
fn test_huge_dim_is_out_of_memory() {
    let lines = vec![line(10, vec![dim("A", vec![num(1e10), num(1e10)])])];
    assert_eq!(
        run(Dialect::modern(), lines),
        "?OUT OF MEMORY IN 10; A TOO LARGE\n"
    );
}
