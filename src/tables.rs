use crate::error::{DuckError, Span};
use std::collections::HashMap;
use std::fmt;

/// Scalar variables. A name exists once it has been assigned and is never removed.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    values: HashMap<String, f64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    InvalidSize(f64),
    FractionalSize(f64),
    Redeclared(String),
    Undeclared(String),
    FractionalIndex(f64),
    NegativeIndex(f64),
    OutOfBounds {
        name: String,
        index: usize,
        size: usize,
    },
}

impl TableError {
    pub fn at(self, span: Span) -> DuckError {
        let help = match &self {
            TableError::Undeclared(name) => Some(format!("declare it first with 'dim {}[<size>];'", name)),
            TableError::OutOfBounds { size, .. } => {
                Some(format!("valid indices run from 0 to {}", size.saturating_sub(1)))
            }
            _ => None,
        };
        match help {
            Some(help) => DuckError::semantic_error_with_help(span, self.to_string(), help),
            None => DuckError::semantic_error(span, self.to_string()),
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableError::InvalidSize(size) => {
                write!(f, "Size of array is invalid. Got {}, expected a positive number.", size)
            }
            TableError::FractionalSize(size) => {
                write!(f, "Size of array must be a whole number. Got {}.", size)
            }
            TableError::Redeclared(_) => write!(f, "Cannot redeclare an existing array."),
            TableError::Undeclared(name) => write!(f, "'{}' has not been declared as an array", name),
            TableError::FractionalIndex(index) => write!(
                f,
                "The given array index, {}, is not a whole number. Index must be a whole number.",
                index
            ),
            TableError::NegativeIndex(index) => write!(
                f,
                "The given array index, {}, is negative. Index must be a positive number.",
                index
            ),
            TableError::OutOfBounds { name, index, size } => write!(
                f,
                "Array index '{}' is out of bounds of the array '{}', which is of size {}.",
                index, name, size
            ),
        }
    }
}

/// Fixed-size arrays. Sizes never change after `declare`; elements are
/// tracked individually so an unassigned slot is distinguishable from zero.
#[derive(Debug, Clone, Default)]
pub struct ArrayTable {
    sizes: HashMap<String, usize>,
    elements: HashMap<(String, usize), f64>,
}

impl ArrayTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, size: f64) -> Result<usize, TableError> {
        if size.is_nan() || size <= 0.0 {
            return Err(TableError::InvalidSize(size));
        }
        if size.fract() != 0.0 {
            return Err(TableError::FractionalSize(size));
        }
        if self.sizes.contains_key(name) {
            return Err(TableError::Redeclared(name.to_string()));
        }

        let size = size as usize;
        self.sizes.insert(name.to_string(), size);
        Ok(size)
    }

    pub fn assign(&mut self, name: &str, index: f64, value: f64) -> Result<(), TableError> {
        let slot = self.verify_index(name, index)?;
        self.elements.insert((name.to_string(), slot), value);
        Ok(())
    }

    /// `Ok(None)` means the index is valid but nothing was stored there yet.
    pub fn get(&self, name: &str, index: f64) -> Result<Option<f64>, TableError> {
        let slot = self.verify_index(name, index)?;
        Ok(self.elements.get(&(name.to_string(), slot)).copied())
    }

    pub fn size(&self, name: &str) -> Option<usize> {
        self.sizes.get(name).copied()
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.sizes.contains_key(name)
    }

    fn verify_index(&self, name: &str, index: f64) -> Result<usize, TableError> {
        let size = self
            .size(name)
            .ok_or_else(|| TableError::Undeclared(name.to_string()))?;

        if !index.is_finite() || index.fract() != 0.0 {
            return Err(TableError::FractionalIndex(index));
        }
        if index < 0.0 {
            return Err(TableError::NegativeIndex(index));
        }

        let slot = index as usize;
        if slot >= size {
            return Err(TableError::OutOfBounds {
                name: name.to_string(),
                index: slot,
                size,
            });
        }
        Ok(slot)
    }
}
