use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A variable, array or function name with its declared type.
///
/// The trailing `$` of the source name decides the type once, here.
/// Everything past the compiler asks the identifier instead of
/// looking at the spelling again.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub enum Ident {
    Plain(Rc<str>),
    String(Rc<str>),
}

impl Ident {
    pub fn new(name: &str) -> Ident {
        let name: Rc<str> = name.trim().to_ascii_uppercase().into();
        if name.ends_with('$') {
            Ident::String(name)
        } else {
            Ident::Plain(name)
        }
    }

    pub fn name(&self) -> &Rc<str> {
        match self {
            Ident::Plain(s) | Ident::String(s) => s,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Ident::String(_))
    }

    /// User functions are spelled `FN...`.
    pub fn is_user_function(&self) -> bool {
        self.name().starts_with("FN")
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil() {
        assert!(Ident::new("a$").is_string());
        assert!(!Ident::new("A").is_string());
        assert_eq!(Ident::new("name$").name().as_ref(), "NAME$");
        assert_ne!(Ident::new("A"), Ident::new("A$"));
        assert!(Ident::new("FNA").is_user_function());
    }
}
