use super::function::{check_num, check_string, Function};
use super::Val;
use crate::error;
use crate::lang::{Dialect, Error};

type Result<T> = std::result::Result<T, Error>;

/// ## Operators
///
/// Results that no variable could hold are errors at the operator.
/// Comparisons and logic answer with the dialect's true value.

pub struct Operation {}

impl Operation {
    pub fn negate(val: Val) -> Result<Val> {
        let n = number(val)?;
        Ok(Val::Number(-n))
    }

    pub fn sum(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Number(l), Number(r)) => Ok(Number(check_num(l + r)?)),
            (String(l), String(r)) => {
                if !dialect.string_concat {
                    return Err(error!(Dialect; "STRING CONCATENATION WITH +"));
                }
                let s = format!("{}{}", l, r);
                Ok(String(check_string(s.into(), dialect)?))
            }
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        Ok(Val::Number(check_num(l - r)?))
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        Ok(Val::Number(check_num(l * r)?))
    }

    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Number(check_num(l / r)?))
    }

    pub fn divide_int(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        let (l, r) = (l.floor(), r.floor());
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Number(check_num((l / r).trunc())?))
    }

    pub fn remainder(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Number(check_num(l % r)?))
    }

    pub fn power(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        if l == 0.0 && r < 0.0 {
            return Err(error!(DivisionByZero; "ZERO TO A NEGATIVE POWER"));
        }
        Ok(Val::Number(check_num(l.powf(r))?))
    }

    pub fn equal(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        compare(lhs, rhs, dialect, |o| o == std::cmp::Ordering::Equal)
    }

    pub fn not_equal(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        compare(lhs, rhs, dialect, |o| o != std::cmp::Ordering::Equal)
    }

    pub fn less(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        compare(lhs, rhs, dialect, |o| o == std::cmp::Ordering::Less)
    }

    pub fn less_equal(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        compare(lhs, rhs, dialect, |o| o != std::cmp::Ordering::Greater)
    }

    pub fn greater(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        compare(lhs, rhs, dialect, |o| o == std::cmp::Ordering::Greater)
    }

    pub fn greater_equal(lhs: Val, rhs: Val, dialect: &Dialect) -> Result<Val> {
        compare(lhs, rhs, dialect, |o| o != std::cmp::Ordering::Less)
    }

    pub fn and(lhs: Val, rhs: Val, dialect: &Dialect) -> Val {
        truth(lhs.is_truthy() && rhs.is_truthy(), dialect)
    }

    pub fn or(lhs: Val, rhs: Val, dialect: &Dialect) -> Val {
        truth(lhs.is_truthy() || rhs.is_truthy(), dialect)
    }

    pub fn not(val: Val, dialect: &Dialect) -> Val {
        truth(!val.is_truthy(), dialect)
    }

    pub fn bit_and(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = words(lhs, rhs)?;
        Ok(Val::Number((l & r) as f64))
    }

    pub fn bit_or(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = words(lhs, rhs)?;
        Ok(Val::Number((l | r) as f64))
    }

    pub fn bit_xor(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = words(lhs, rhs)?;
        Ok(Val::Number((l ^ r) as f64))
    }

    pub fn bit_not(val: Val) -> Result<Val> {
        Ok(Val::Number(!word(number(val)?) as f64))
    }

    pub fn implication(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = words(lhs, rhs)?;
        Ok(Val::Number((!l | r) as f64))
    }

    pub fn equivalence(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = words(lhs, rhs)?;
        Ok(Val::Number(!(l ^ r) as f64))
    }

    pub fn min(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        Ok(Val::Number(if l < r { l } else { r }))
    }

    pub fn max(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = numbers(lhs, rhs)?;
        Ok(Val::Number(if l > r { l } else { r }))
    }

    /// Rounds an index or subscript the way every BASIC statement does.
    pub fn index(val: Val) -> Result<f64> {
        Ok(Function::round(number(val)?))
    }
}

fn truth(b: bool, dialect: &Dialect) -> Val {
    Val::Number(if b { dialect.true_value() } else { 0.0 })
}

fn number(val: Val) -> Result<f64> {
    match val {
        Val::Number(n) => Ok(n),
        Val::String(_) => Err(error!(TypeMismatch)),
    }
}

fn numbers(lhs: Val, rhs: Val) -> Result<(f64, f64)> {
    Ok((number(lhs)?, number(rhs)?))
}

/// 32-bit two's complement view of a number, wrapping like a register.
fn word(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

fn words(lhs: Val, rhs: Val) -> Result<(i32, i32)> {
    let (l, r) = numbers(lhs, rhs)?;
    Ok((word(l), word(r)))
}

fn compare<F>(lhs: Val, rhs: Val, dialect: &Dialect, test: F) -> Result<Val>
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    use Val::*;
    let ordering = match (&lhs, &rhs) {
        (Number(l), Number(r)) => l.partial_cmp(r),
        (String(l), String(r)) => Some(l.cmp(r)),
        _ => return Err(error!(TypeMismatch)),
    };
    Ok(truth(ordering.map(test).unwrap_or(false), dialect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(
            Operation::divide(5.0.into(), 0.0.into()).unwrap_err().code(),
            crate::lang::ErrorCode::DivisionByZero
        );
        assert!(Operation::power(0.0.into(), (-1.0).into()).is_err());
        assert_eq!(Operation::power(2.0.into(), 10.0.into()), Ok(1024.0.into()));
        assert_eq!(
            Operation::multiply(1e300.into(), 1e300.into()).unwrap_err().code(),
            crate::lang::ErrorCode::Overflow
        );
        assert_eq!(Operation::divide_int(7.5.into(), 2.0.into()), Ok(3.0.into()));
    }

    #[test]
    fn test_truth_values() {
        let ecma = Dialect::ecma55();
        let ms = Dialect::altair();
        assert_eq!(Operation::less(1.0.into(), 2.0.into(), &ecma), Ok(1.0.into()));
        assert_eq!(Operation::less(1.0.into(), 2.0.into(), &ms), Ok((-1.0).into()));
        assert_eq!(Operation::equal("A".into(), "B".into(), &ms), Ok(0.0.into()));
        assert_eq!(Operation::not(0.0.into(), &ms), (-1.0).into());
        assert!(Operation::equal("A".into(), 1.0.into(), &ms).is_err());
    }

    #[test]
    fn test_concat_is_a_dialect_switch() {
        let s = Operation::sum("AB".into(), "CD".into(), &Dialect::altair());
        assert_eq!(s, Ok("ABCD".into()));
        let e = Operation::sum("AB".into(), "CD".into(), &Dialect::ecma55()).unwrap_err();
        assert!(e.is_dialect());
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(Operation::bit_and(12.0.into(), 10.0.into()), Ok(8.0.into()));
        assert_eq!(Operation::bit_not(0.0.into()), Ok((-1.0).into()));
        assert_eq!(Operation::equivalence(5.0.into(), 5.0.into()), Ok((-1.0).into()));
        assert_eq!(Operation::implication(0.0.into(), 0.0.into()), Ok((-1.0).into()));
    }
}
