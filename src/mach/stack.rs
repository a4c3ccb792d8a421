use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Bounded stack
///
/// Operand stack of the machine and the WHILE and GOSUB return stacks.
/// Going past the limit is an `OUT OF MEMORY` error carrying the
/// message given at construction. Popping an empty stack means the
/// compiler emitted bad code, so it is an internal error.

#[derive(Clone)]
pub struct Stack<T> {
    overflow: &'static str,
    limit: usize,
    items: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T> Stack<T> {
    pub fn new(overflow: &'static str) -> Stack<T> {
        Stack::with_limit(overflow, u16::MAX as usize)
    }

    pub fn with_limit(overflow: &'static str, limit: usize) -> Stack<T> {
        Stack {
            overflow,
            limit,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, item: T) -> Result<()> {
        if self.items.len() >= self.limit {
            return Err(error!(OutOfMemory; self.overflow));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T> {
        self.items
            .pop()
            .ok_or_else(|| error!(InternalError; "STACK UNDERFLOW"))
    }

    /// Pops two, returned in push order.
    pub fn pop_2(&mut self) -> Result<(T, T)> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        Ok((lhs, rhs))
    }

    /// Pops the top `n` items, returned in push order.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<T>> {
        match self.items.len().checked_sub(n) {
            Some(start) => Ok(self.items.split_off(start)),
            None => Err(error!(InternalError; "STACK UNDERFLOW")),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Replaces the contents, as when restoring a snapshot.
    pub fn replace(&mut self, items: Vec<T>) -> Result<()> {
        if items.len() > self.limit {
            return Err(error!(OutOfMemory; self.overflow));
        }
        self.items = items;
        Ok(())
    }
}

impl<T: Clone> Stack<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        let mut s: Stack<usize> = Stack::with_limit("TOO DEEP", 2);
        assert!(s.push(1).is_ok());
        assert!(s.push(2).is_ok());
        let e = s.push(3).unwrap_err();
        assert_eq!(e.to_string(), "OUT OF MEMORY; TOO DEEP");
        assert_eq!(s.len(), 2);
        assert_eq!(s.pop_2().unwrap(), (1, 2));
        assert!(s.pop().is_err());
    }

    #[test]
    fn test_pop_n_and_replace() {
        let mut s: Stack<usize> = Stack::new("FULL");
        s.replace(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(s.pop_n(3).unwrap(), vec![2, 3, 4]);
        assert!(s.pop_n(2).is_err());
        assert_eq!(s.to_vec(), vec![1]);
        let mut small: Stack<usize> = Stack::with_limit("FULL", 1);
        assert!(small.replace(vec![1, 2]).is_err());
    }
}
