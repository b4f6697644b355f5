/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

//! This module contains the [`DataValue`], the value part of [`crate::AnnotationData`], and the
//! [`DataOperator`] used to test values in searches.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StamError;

/// This type encapsulates a value and its type.
/// It is held by [`crate::AnnotationData`] alongside a reference to a [`crate::DataKey`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "@type", content = "value")]
pub enum DataValue {
    ///No value
    Null,
    String(String),
    Bool(bool),
    Int(isize),
    Float(f64),

    /// Value is an ordered list
    List(Vec<DataValue>),
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::String(s) => write!(f, "{}", s),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::List(v) => {
                let items: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", items.join(", "))
            }
        }
    }
}

impl DataValue {
    /// Tests the value against a [`DataOperator`]
    pub fn test(&self, operator: &DataOperator) -> bool {
        match (self, operator) {
            (_, DataOperator::Any) => true,
            (_, DataOperator::Not(operator)) => !self.test(operator),
            (_, DataOperator::And(operators)) => operators.iter().all(|op| self.test(op)),
            (_, DataOperator::Or(operators)) => operators.iter().any(|op| self.test(op)),
            (Self::Null, DataOperator::Null) => true,
            (Self::String(s), DataOperator::Equals(s2)) => s.as_str() == *s2,
            (Self::Int(n), DataOperator::EqualsInt(n2)) => *n == *n2,
            (Self::Float(n), DataOperator::EqualsFloat(n2)) => *n == *n2,
            (Self::Bool(true), DataOperator::True) => true,
            (Self::Bool(false), DataOperator::False) => true,
            (Self::Int(n), DataOperator::GreaterThan(n2)) => *n > *n2,
            (Self::Int(n), DataOperator::GreaterThanOrEqual(n2)) => *n >= *n2,
            (Self::Int(n), DataOperator::LessThan(n2)) => *n < *n2,
            (Self::Int(n), DataOperator::LessThanOrEqual(n2)) => *n <= *n2,
            (Self::Float(n), DataOperator::GreaterThanFloat(n2)) => *n > *n2,
            (Self::Float(n), DataOperator::GreaterThanOrEqualFloat(n2)) => *n >= *n2,
            (Self::Float(n), DataOperator::LessThanFloat(n2)) => *n < *n2,
            (Self::Float(n), DataOperator::LessThanOrEqualFloat(n2)) => *n <= *n2,
            //integers and floats are comparable to each other
            (Self::Int(n), DataOperator::GreaterThanFloat(n2)) => (*n as f64) > *n2,
            (Self::Int(n), DataOperator::LessThanFloat(n2)) => (*n as f64) < *n2,
            (Self::Float(n), DataOperator::GreaterThan(n2)) => *n > *n2 as f64,
            (Self::Float(n), DataOperator::LessThan(n2)) => *n < *n2 as f64,
            (Self::List(v), DataOperator::HasElement(element)) => v.iter().any(|x| x.test(element)),
            _ => false,
        }
    }

    /// Returns the string value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A data operator expresses a test on a [`DataValue`]. It is used in searches for data.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOperator<'a> {
    /// Matches any value
    Any,
    Null,
    Equals(&'a str),
    EqualsInt(isize),
    EqualsFloat(f64),
    True,
    False,
    GreaterThan(isize),
    GreaterThanOrEqual(isize),
    GreaterThanFloat(f64),
    GreaterThanOrEqualFloat(f64),
    LessThan(isize),
    LessThanOrEqual(isize),
    LessThanFloat(f64),
    LessThanOrEqualFloat(f64),
    /// Matches lists that have an element satisfying the inner operator
    HasElement(Box<DataOperator<'a>>),
    Not(Box<DataOperator<'a>>),
    And(Vec<DataOperator<'a>>),
    Or(Vec<DataOperator<'a>>),
}

impl<'a> DataOperator<'a> {
    /// Negates this operator
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Returns the equality operator for a value, for data types where one exists
    pub fn equals_value(value: &'a DataValue) -> Result<Self, StamError> {
        match value {
            DataValue::Null => Ok(Self::Null),
            DataValue::String(s) => Ok(Self::Equals(s.as_str())),
            DataValue::Int(n) => Ok(Self::EqualsInt(*n)),
            DataValue::Float(n) => Ok(Self::EqualsFloat(*n)),
            DataValue::Bool(true) => Ok(Self::True),
            DataValue::Bool(false) => Ok(Self::False),
            DataValue::List(_) => Err(StamError::ValueError(
                value.to_string(),
                "DataOperator::equals_value: lists can not be compared directly",
            )),
        }
    }
}

impl From<&str> for DataValue {
    fn from(item: &str) -> Self {
        Self::String(item.to_string())
    }
}

impl From<String> for DataValue {
    fn from(item: String) -> Self {
        Self::String(item)
    }
}

impl From<&String> for DataValue {
    fn from(item: &String) -> Self {
        Self::String(item.clone())
    }
}

impl From<f64> for DataValue {
    fn from(item: f64) -> Self {
        Self::Float(item)
    }
}

impl From<f32> for DataValue {
    fn from(item: f32) -> Self {
        Self::Float(item as f64)
    }
}

impl From<isize> for DataValue {
    fn from(item: isize) -> Self {
        Self::Int(item)
    }
}

impl From<i64> for DataValue {
    fn from(item: i64) -> Self {
        Self::Int(item as isize)
    }
}

impl From<i32> for DataValue {
    fn from(item: i32) -> Self {
        Self::Int(item as isize)
    }
}

impl From<i16> for DataValue {
    fn from(item: i16) -> Self {
        Self::Int(item as isize)
    }
}

impl From<i8> for DataValue {
    fn from(item: i8) -> Self {
        Self::Int(item as isize)
    }
}

impl From<u32> for DataValue {
    fn from(item: u32) -> Self {
        Self::Int(item as isize)
    }
}

impl From<u16> for DataValue {
    fn from(item: u16) -> Self {
        Self::Int(item as isize)
    }
}

impl From<u8> for DataValue {
    fn from(item: u8) -> Self {
        Self::Int(item as isize)
    }
}

impl From<bool> for DataValue {
    fn from(item: bool) -> Self {
        Self::Bool(item)
    }
}

impl From<Vec<DataValue>> for DataValue {
    fn from(item: Vec<DataValue>) -> Self {
        Self::List(item)
    }
}

impl TryFrom<usize> for DataValue {
    type Error = StamError;
    fn try_from(item: usize) -> Result<Self, Self::Error> {
        isize::try_from(item).map(Self::Int).map_err(|_| {
            StamError::ValueError(
                item.to_string(),
                "DataValue: integer out of bounds (usize -> isize failed)",
            )
        })
    }
}

// These PartialEq implementation allow for more direct comparisons

impl PartialEq<str> for DataValue {
    fn eq(&self, other: &str) -> bool {
        match self {
            Self::String(v) => v == other,
            _ => false,
        }
    }
}

impl PartialEq<&str> for DataValue {
    fn eq(&self, other: &&str) -> bool {
        match self {
            Self::String(v) => v == *other,
            _ => false,
        }
    }
}

impl PartialEq<DataValue> for str {
    fn eq(&self, other: &DataValue) -> bool {
        match other {
            DataValue::String(v) => v.as_str() == self,
            _ => false,
        }
    }
}

impl PartialEq<f64> for DataValue {
    fn eq(&self, other: &f64) -> bool {
        match self {
            Self::Float(v) => v == other,
            _ => false,
        }
    }
}

impl PartialEq<DataValue> for f64 {
    fn eq(&self, other: &DataValue) -> bool {
        match other {
            DataValue::Float(v) => v == self,
            _ => false,
        }
    }
}

impl PartialEq<isize> for DataValue {
    fn eq(&self, other: &isize) -> bool {
        match self {
            Self::Int(v) => v == other,
            _ => false,
        }
    }
}

impl PartialEq<DataValue> for isize {
    fn eq(&self, other: &DataValue) -> bool {
        match other {
            DataValue::Int(v) => v == self,
            _ => false,
        }
    }
}

impl PartialEq<bool> for DataValue {
    fn eq(&self, other: &bool) -> bool {
        match self {
            Self::Bool(v) => v == other,
            _ => false,
        }
    }
}
