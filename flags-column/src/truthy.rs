//! Conversion of loosely typed setter input into a flag state.
//!
//! A value turns a flag on when its string form, lowercased, is one of
//! `true`, `1`, `yes` or `ok`. Everything else, including `nil`, `0` and the
//! empty string, turns it off. Native `bool`s skip the string round trip.

use serde::{
    Deserialize,
    Serialize,
};

use std::fmt;

const TRUTHY_WORDS: [&'static str; 4] = ["true", "1", "yes", "ok"];

pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

#[inline]
fn truthy_str(s: &str) -> bool {
    let s = s.to_lowercase();
    TRUTHY_WORDS.iter().any(|&w| w == s)
}

impl Truthy for bool {
    #[inline(always)]
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for str {
    #[inline]
    fn is_truthy(&self) -> bool {
        truthy_str(self)
    }
}

impl Truthy for String {
    #[inline]
    fn is_truthy(&self) -> bool {
        truthy_str(self.as_str())
    }
}

macro_rules! impl_truthy_int {
    ($($t:ty),*) => {
        $(
            impl Truthy for $t {
                #[inline(always)]
                fn is_truthy(&self) -> bool {
                    *self == 1
                }
            }
        )*
    };
}

impl_truthy_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: Truthy> Truthy for Option<T> {
    #[inline]
    fn is_truthy(&self) -> bool {
        self.as_ref().map(Truthy::is_truthy).unwrap_or(false)
    }
}

impl<'a, T: Truthy + ?Sized> Truthy for &'a T {
    #[inline(always)]
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

/// An untyped setter argument, as it arrives from forms or documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Truthy for FlagValue {
    fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Nil => false,
            FlagValue::Bool(b) => *b,
            FlagValue::Int(i) => i.is_truthy(),
            FlagValue::Str(s) => s.is_truthy(),
        }
    }
}

impl Default for FlagValue {
    #[inline]
    fn default() -> Self {
        FlagValue::Nil
    }
}

impl From<bool> for FlagValue {
    #[inline]
    fn from(v: bool) -> Self {
        FlagValue::Bool(v)
    }
}

impl From<i64> for FlagValue {
    #[inline]
    fn from(v: i64) -> Self {
        FlagValue::Int(v)
    }
}

impl From<i32> for FlagValue {
    #[inline]
    fn from(v: i32) -> Self {
        FlagValue::Int(v as i64)
    }
}

impl<'a> From<&'a str> for FlagValue {
    #[inline]
    fn from(v: &'a str) -> Self {
        FlagValue::Str(v.to_owned())
    }
}

impl From<String> for FlagValue {
    #[inline]
    fn from(v: String) -> Self {
        FlagValue::Str(v)
    }
}

impl<T: Into<FlagValue>> From<Option<T>> for FlagValue {
    #[inline]
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FlagValue::Nil)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Nil => Ok(()),
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Int(i) => write!(f, "{}", i),
            FlagValue::Str(s) => f.write_str(s),
        }
    }
}
