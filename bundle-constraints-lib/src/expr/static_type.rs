use core::fmt;

/// The statically inferred type of an expression.
///
/// `Dyn` stands for a value whose type is only known at evaluation time, such as the `value` of
/// a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticType {
    Bool,
    Int,
    UInt,
    Double,
    String,
    Bytes,
    Null,
    List(Box<Self>),
    Map(Box<Self>),

    /// A `{type, value}` property record.
    Property,
    Dyn,
}

impl StaticType {
    #[must_use]
    pub const fn is_dyn(&self) -> bool {
        matches!(self, Self::Dyn)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::UInt | Self::Double)
    }

    /// Whether a value of this type may be used where `expected` is required.
    #[must_use]
    pub fn is_assignable_to(&self, expected: &Self) -> bool {
        self.is_dyn() || expected.is_dyn() || self == expected
    }

    /// The most specific type covering both `self` and `other`.
    #[must_use]
    pub fn unify(self, other: Self) -> Self {
        if self == other { self } else { Self::Dyn }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::UInt => f.write_str("uint"),
            Self::Double => f.write_str("double"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Null => f.write_str("null"),
            Self::List(elem) => write!(f, "list({elem})"),
            Self::Map(value) => write!(f, "map(string, {value})"),
            Self::Property => f.write_str("property"),
            Self::Dyn => f.write_str("dyn"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(StaticType::List(Box::new(StaticType::Property)).to_string(), "list(property)");
        assert_eq!(StaticType::Map(Box::new(StaticType::Dyn)).to_string(), "map(string, dyn)");
    }

    #[test]
    fn test_unify() {
        assert_eq!(StaticType::Int.unify(StaticType::Int), StaticType::Int);
        assert_eq!(StaticType::Int.unify(StaticType::String), StaticType::Dyn);
    }

    #[test]
    fn test_assignable() {
        assert!(StaticType::Dyn.is_assignable_to(&StaticType::String));
        assert!(StaticType::String.is_assignable_to(&StaticType::Dyn));
        assert!(!StaticType::Int.is_assignable_to(&StaticType::String));
    }
}
