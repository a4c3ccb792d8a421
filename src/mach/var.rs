use super::function::{check_num, check_string, Function};
use super::val::{number_to_string, parse_number};
use super::{Code, Val};
use crate::error;
use crate::lang::{Dialect, Error, Ident};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Most cells one array may hold.
const MAX_CELLS: usize = u16::MAX as usize * 16;

/// A DEF function: parameter names and the compiled body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFunction {
    pub params: Vec<Rc<str>>,
    pub code: Code,
}

/// One or two dimensions, each `bound + 1` cells long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    dims: Vec<usize>,
    cells: Vec<Option<Val>>,
}

impl Array {
    fn new(ident: &Ident, bounds: &[usize]) -> Array {
        let dims: Vec<usize> = bounds.iter().map(|b| b + 1).collect();
        let len = dims.iter().product();
        let init = if ident.is_string() {
            None
        } else {
            Some(Val::Number(0.0))
        };
        Array {
            dims,
            cells: vec![init; len],
        }
    }

    fn offset(&self, ident: &Ident, indices: &[f64], base: usize) -> Result<usize> {
        if indices.len() > self.dims.len() {
            return Err(error!(SubscriptOutOfRange; format!("TOO MANY DIMENSIONS FOR {}", ident)));
        }
        if indices.len() < self.dims.len() {
            return Err(error!(SubscriptOutOfRange; format!("TOO FEW DIMENSIONS FOR {}", ident)));
        }
        let mut offset = 0;
        for (idx, len) in indices.iter().zip(&self.dims) {
            let idx = Function::round(*idx);
            if idx < base as f64 || idx >= *len as f64 {
                return Err(error!(SubscriptOutOfRange; format!("{}({})", ident, idx)));
            }
            offset = offset * len + idx as usize;
        }
        Ok(offset)
    }
}

/// ## Variable memory
///
/// Scalars, arrays and DEF functions, keyed by normalized name.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Var {
    vars: HashMap<Rc<str>, Val>,
    arrays: HashMap<Rc<str>, Array>,
    #[serde(default)]
    defs: HashMap<Rc<str>, Rc<UserFunction>>,
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
        self.arrays.clear();
        self.defs.clear();
    }

    /// Raw lookup, no validation.
    pub fn get(&self, ident: &Ident) -> Option<&Val> {
        self.vars.get(ident.name())
    }

    pub fn fetch(&self, ident: &Ident, dialect: &Dialect) -> Result<Val> {
        Var::check_value(ident, self.vars.get(ident.name()).cloned(), dialect)
    }

    pub fn store(&mut self, ident: &Ident, value: Val) {
        self.vars.insert(ident.name().clone(), value);
    }

    /// Every read passes through here. Unset values error unless the
    /// dialect supplies defaults.
    pub fn check_value(ident: &Ident, value: Option<Val>, dialect: &Dialect) -> Result<Val> {
        match value {
            Some(Val::Number(n)) if n.is_nan() => {
                Err(error!(IllegalFunctionCall; format!("INVALID VALUE FOR {}", ident)))
            }
            Some(Val::Number(n)) if n.is_infinite() && dialect.check_overflow => {
                Err(error!(Overflow; format!("INVALID VALUE FOR {}", ident)))
            }
            Some(val) => Ok(val),
            None if dialect.default_values => Ok(Var::default_value(ident)),
            None => Err(error!(UnsetValue; format!("{}", ident))),
        }
    }

    pub fn default_value(ident: &Ident) -> Val {
        if ident.is_string() {
            Val::String("".into())
        } else {
            Val::Number(0.0)
        }
    }

    /// True when INPUT or GET may accept the value.
    pub fn is_valid(value: &Val, dialect: &Dialect) -> bool {
        match value {
            Val::Number(n) => n.is_finite(),
            Val::String(s) => s.chars().count() <= dialect.max_string_length,
        }
    }

    /// Converts whatever arrives to the variable's type. Text that is not
    /// a number becomes NaN, which fails validation.
    pub fn convert(ident: &Ident, value: Val) -> Val {
        match value {
            Val::Number(n) if ident.is_string() => Val::String(number_to_string(n).into()),
            Val::String(s) if !ident.is_string() => Val::Number(parse_number(&s).unwrap_or(f64::NAN)),
            value => value,
        }
    }

    /// Coerces a value about to be stored. READ always converts into a
    /// string variable; otherwise conversion is a dialect switch.
    pub fn assign(ident: &Ident, value: Val, dialect: &Dialect, is_read: bool) -> Result<Val> {
        if dialect.type_convert || (is_read && ident.is_string()) {
            return Ok(match Var::convert(ident, value) {
                Val::Number(n) if n.is_nan() => Val::Number(0.0),
                value => value,
            });
        }
        match value {
            Val::String(s) if ident.is_string() => Ok(Val::String(s)),
            Val::Number(n) if !ident.is_string() => Ok(Val::Number(check_num(n)?)),
            Val::String(s) => Err(error!(TypeMismatch; format!("CAN'T CONVERT {:?} TO A NUMBER", s))),
            Val::Number(n) => Err(error!(TypeMismatch; format!(
                "CAN'T CONVERT {} TO A STRING",
                number_to_string(n)
            ))),
        }
    }

    pub fn dimension_array(&mut self, ident: &Ident, bounds: &[f64], dialect: &Dialect) -> Result<()> {
        if self.arrays.contains_key(ident.name()) {
            if dialect.static_arrays {
                return Ok(());
            }
            return Err(error!(RedimensionedArray; format!("{}", ident)));
        }
        if bounds.is_empty() || bounds.len() > 2 {
            return Err(error!(SubscriptOutOfRange; "ONLY ONE OR TWO DIMENSIONS"));
        }
        let too_large = || error!(OutOfMemory; format!("{} TOO LARGE", ident));
        let mut dims = vec![];
        let mut cells: usize = 1;
        for b in bounds {
            let b = Function::round(check_num(*b)?);
            if b < 0.0 {
                return Err(error!(IllegalFunctionCall; format!("NEGATIVE BOUND FOR {}", ident)));
            }
            if b >= MAX_CELLS as f64 {
                return Err(too_large());
            }
            let b = b as usize;
            cells = cells
                .checked_mul(b + 1)
                .filter(|&n| n <= MAX_CELLS)
                .ok_or_else(too_large)?;
            dims.push(b);
        }
        self.arrays
            .insert(ident.name().clone(), Array::new(ident, &dims));
        Ok(())
    }

    fn array(&mut self, ident: &Ident, order: usize, dialect: &Dialect) -> Result<&mut Array> {
        if !self.arrays.contains_key(ident.name()) {
            if dialect.default_array_size == 0 {
                return Err(error!(Dialect; format!("ARRAY {} USED WITHOUT DIM", ident)));
            }
            if order == 0 || order > 2 {
                return Err(error!(SubscriptOutOfRange; "ONLY ONE OR TWO DIMENSIONS"));
            }
            let bound = (dialect.default_array_size - 1) as f64;
            self.dimension_array(ident, &vec![bound; order], dialect)?;
        }
        self.arrays
            .get_mut(ident.name())
            .ok_or_else(|| error!(InternalError; "ARRAY VANISHED"))
    }

    pub fn fetch_array(&mut self, ident: &Ident, indices: &[f64], dialect: &Dialect) -> Result<Val> {
        let base = dialect.default_array_base;
        let arr = self.array(ident, indices.len(), dialect)?;
        let offset = arr.offset(ident, indices, base)?;
        let value = arr.cells.get(offset).cloned().flatten();
        Var::check_value(ident, value, dialect)
    }

    pub fn store_array(
        &mut self,
        ident: &Ident,
        indices: &[f64],
        value: Val,
        dialect: &Dialect,
    ) -> Result<()> {
        let base = dialect.default_array_base;
        let arr = self.array(ident, indices.len(), dialect)?;
        let offset = arr.offset(ident, indices, base)?;
        match arr.cells.get_mut(offset) {
            Some(cell) => {
                *cell = Some(value);
                Ok(())
            }
            None => Err(error!(SubscriptOutOfRange)),
        }
    }

    /// `A$(S)` runs to the end of the string, `A$(S,E)` is positions S
    /// through E, both one-based.
    pub fn fetch_slice(&self, ident: &Ident, positions: &[f64], dialect: &Dialect) -> Result<Val> {
        let s = match self.fetch(ident, dialect)? {
            Val::String(s) => s,
            Val::Number(_) => return Err(error!(TypeMismatch)),
        };
        let (start, end) = slice_range(ident, positions, s.chars().count())?;
        let piece: String = s.chars().skip(start).take(end.saturating_sub(start)).collect();
        Ok(Val::String(piece.into()))
    }

    /// Replaces positions S through E (or S to the end) with `value`.
    pub fn store_slice(
        &mut self,
        ident: &Ident,
        positions: &[f64],
        value: Val,
        dialect: &Dialect,
    ) -> Result<Rc<str>> {
        let add = match value {
            Val::String(s) => s,
            Val::Number(_) => return Err(error!(TypeMismatch)),
        };
        let orig: Rc<str> = match self.vars.get(ident.name()) {
            Some(Val::String(s)) => s.clone(),
            _ => "".into(),
        };
        let len = orig.chars().count();
        let (start, end) = slice_range(ident, positions, len)?;
        let mut s: String = orig.chars().take(start).collect();
        s.push_str(&add);
        s.extend(orig.chars().skip(end));
        let s = check_string(s.into(), dialect)?;
        self.vars.insert(ident.name().clone(), Val::String(s.clone()));
        Ok(s)
    }

    pub fn define(&mut self, name: &Rc<str>, function: Rc<UserFunction>) {
        self.defs.insert(name.clone(), function);
    }

    pub fn function(&self, name: &str) -> Result<Rc<UserFunction>> {
        self.defs
            .get(name)
            .cloned()
            .ok_or_else(|| error!(UndefinedUserFunction; name.to_string()))
    }
}

/// Zero-based half-open character range for a one-based slice.
fn slice_range(ident: &Ident, positions: &[f64], len: usize) -> Result<(usize, usize)> {
    let start = match positions.first() {
        Some(p) => Function::round(*p),
        None => return Err(error!(SubscriptOutOfRange; format!("{}", ident))),
    };
    if start < 1.0 || positions.len() > 2 {
        return Err(error!(SubscriptOutOfRange; format!("{}", ident)));
    }
    let end = match positions.get(1) {
        Some(e) => Function::round(*e).max(0.0) as usize,
        None => len,
    };
    let start = start as usize - 1;
    Ok((start, end.max(start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_and_defaults() {
        let var = Var::new();
        let a = Ident::new("A");
        let e = var.fetch(&a, &Dialect::ecma55()).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::UnsetValue);
        assert_eq!(var.fetch(&a, &Dialect::altair()), Ok(Val::Number(0.0)));
        assert_eq!(
            var.fetch(&Ident::new("A$"), &Dialect::altair()),
            Ok(Val::String("".into()))
        );
    }

    #[test]
    fn test_assign() {
        let n = Ident::new("N");
        let s = Ident::new("S$");
        let strict = Dialect::default();
        let loose = Dialect {
            type_convert: true,
            ..Dialect::default()
        };
        assert!(Var::assign(&n, "12".into(), &strict, false).is_err());
        assert_eq!(Var::assign(&n, "12".into(), &loose, false), Ok(12.0.into()));
        assert_eq!(Var::assign(&n, "X".into(), &loose, false), Ok(0.0.into()));
        assert_eq!(Var::assign(&s, 1.5.into(), &strict, true), Ok("1.5".into()));
        assert!(Var::assign(&n, "1".into(), &strict, true).is_err());
    }

    #[test]
    fn test_array_bounds() {
        let mut var = Var::new();
        let a = Ident::new("A");
        let d = Dialect::default();
        var.dimension_array(&a, &[3.0], &d).unwrap();
        assert_eq!(var.fetch_array(&a, &[3.0], &d), Ok(0.0.into()));
        assert!(var.fetch_array(&a, &[4.0], &d).is_err());
        assert!(var.fetch_array(&a, &[1.0, 1.0], &d).is_err());
        var.store_array(&a, &[2.6], 9.0.into(), &d).unwrap();
        assert_eq!(var.fetch_array(&a, &[3.0], &d), Ok(9.0.into()));
        assert!(var.dimension_array(&a, &[3.0], &d).is_err());
    }

    #[test]
    fn test_huge_array() {
        let mut var = Var::new();
        let a = Ident::new("A");
        let d = Dialect::default();
        let e = var.dimension_array(&a, &[1e10, 1e10], &d).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::OutOfMemory);
        let e = var.dimension_array(&a, &[1e300], &d).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::OutOfMemory);
        assert!(var.dimension_array(&a, &[2000.0, 2000.0], &d).is_err());
        assert!(var.dimension_array(&a, &[1000.0, 1000.0], &d).is_ok());
    }

    #[test]
    fn test_auto_dimension() {
        let mut var = Var::new();
        let b = Ident::new("B");
        let e = var.fetch_array(&b, &[1.0], &Dialect::modern()).unwrap_err();
        assert!(e.is_dialect());
        let ecma = Dialect::ecma55();
        assert_eq!(var.fetch_array(&b, &[10.0], &ecma), Ok(0.0.into()));
        assert!(var.fetch_array(&b, &[11.0], &ecma).is_err());
    }

    #[test]
    fn test_slices() {
        let mut var = Var::new();
        let a = Ident::new("A$");
        let d = Dialect::hp();
        var.store(&a, "HELLO".into());
        assert_eq!(var.fetch_slice(&a, &[2.0, 4.0], &d), Ok("ELL".into()));
        assert_eq!(var.fetch_slice(&a, &[4.0], &d), Ok("LO".into()));
        var.store_slice(&a, &[2.0, 3.0], "IPP".into(), &d).unwrap();
        assert_eq!(var.get(&a), Some(&Val::from("HIPPLO")));
    }
}
