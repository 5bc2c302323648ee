//! Declared parameter kinds and their inheritance chain

use std::borrow::Cow;
use std::fmt;

/// Declared type of a parameter.
///
/// Built-in kinds form a fixed hierarchy rooted at [`ParamKind::Parameter`];
/// `Custom` kinds name their own parent so user-defined parameter types slot
/// into the same lookup as the built-ins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Universal base kind, always present at the end of every chain
    Parameter,
    Boolean,
    String,
    Color,
    Dict,
    Number,
    Integer,
    Date,
    Tuple,
    NumericTuple,
    Range,
    DateRange,
    Selector,
    ObjectSelector,
    FileSelector,
    ListSelector,
    Callable,
    Action,
    Custom {
        name: Cow<'static, str>,
        parent: Box<ParamKind>,
    },
}

impl ParamKind {
    /// Define a custom kind deriving from `parent`
    pub fn custom(name: impl Into<Cow<'static, str>>, parent: ParamKind) -> Self {
        ParamKind::Custom {
            name: name.into(),
            parent: Box::new(parent),
        }
    }

    /// Immediate parent kind, `None` only for the universal base
    pub fn parent(&self) -> Option<ParamKind> {
        use ParamKind::*;
        match self {
            Parameter => None,
            Boolean | String | Color | Dict | Number | Tuple | Selector | Callable => {
                Some(Parameter)
            }
            Integer | Date => Some(Number),
            NumericTuple => Some(Tuple),
            Range => Some(NumericTuple),
            DateRange => Some(Range),
            ObjectSelector => Some(Selector),
            FileSelector | ListSelector => Some(ObjectSelector),
            Action => Some(Callable),
            Custom { parent, .. } => Some((**parent).clone()),
        }
    }

    /// The kind followed by every ancestor, most specific first
    pub fn ancestors(&self) -> Vec<ParamKind> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(kind) = current {
            current = kind.parent();
            chain.push(kind);
        }
        chain
    }

    /// Whether `self` is `other` or derives from it
    pub fn is_a(&self, other: &ParamKind) -> bool {
        self.ancestors().iter().any(|k| k == other)
    }

    pub fn name(&self) -> &str {
        use ParamKind::*;
        match self {
            Parameter => "Parameter",
            Boolean => "Boolean",
            String => "String",
            Color => "Color",
            Dict => "Dict",
            Number => "Number",
            Integer => "Integer",
            Date => "Date",
            Tuple => "Tuple",
            NumericTuple => "NumericTuple",
            Range => "Range",
            DateRange => "DateRange",
            Selector => "Selector",
            ObjectSelector => "ObjectSelector",
            FileSelector => "FileSelector",
            ListSelector => "ListSelector",
            Callable => "Callable",
            Action => "Action",
            Custom { name, .. } => name,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestors_most_specific_first() {
        assert_eq!(
            ParamKind::FileSelector.ancestors(),
            vec![
                ParamKind::FileSelector,
                ParamKind::ObjectSelector,
                ParamKind::Selector,
                ParamKind::Parameter
            ]
        );
        assert_eq!(ParamKind::Parameter.ancestors(), vec![ParamKind::Parameter]);
    }

    #[test]
    fn test_custom_kind_chain() {
        let percent = ParamKind::custom("Percent", ParamKind::Integer);
        let chain = percent.ancestors();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[1], ParamKind::Integer);
        assert!(percent.is_a(&ParamKind::Number));
        assert!(!percent.is_a(&ParamKind::Boolean));
    }
}
