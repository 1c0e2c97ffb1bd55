//! String accessors such as `visible_to_admins?` or
//! `notify_when_created_and_deleted=`, for callers that only have a name.
//!
//! Per-flag and aggregate names are known once a column is declared and live
//! in an [`AccessorTable`]. Conjunctions (`<column>_<a>_and_<b>...`) are parsed
//! when they are asked for.

use crate::{
    column::{
        Column,
        ColumnMut,
    },
    definition::FlagDefinition,
    error::{
        Error,
        Result,
    },
    store::FlagStore,
    truthy::Truthy,
};

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use std::collections::BTreeMap;

const AND_SEPARATOR: &'static str = "_and_";

lazy_static! {
    static ref ACCESSOR_NAME: Regex = Regex::new(r"^(?P<base>[A-Za-z0-9_]+?)(?P<suffix>[?=])?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Flag(String),
    AllOf(Vec<String>),
    All,
    None,
    Flags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    column: String,
    target: Target,
    mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Bool(bool),
    Flags(Vec<String>),
    Unit,
}

impl Response {
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            &Response::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_flags(&self) -> Option<&[String]> {
        match self {
            Response::Flags(flags) => Some(flags.as_slice()),
            _ => None,
        }
    }
}

impl Accessor {
    #[inline]
    fn new<S: Into<String>>(column: S, target: Target, mode: Mode) -> Self {
        Accessor {
            column: column.into(),
            target: target,
            mode: mode,
        }
    }

    #[inline(always)]
    pub fn column(&self) -> &str {
        self.column.as_ref()
    }

    #[inline(always)]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[inline(always)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Runs the accessor against `store`, which must hold `definition`'s column.
    pub fn invoke<S>(&self, definition: &FlagDefinition, store: &mut S, name: &str, value: Option<&dyn Truthy>) -> Result<Response>
    where
        S: FlagStore + ?Sized,
    {
        match (self.mode, value) {
            (Mode::Set, None) => return Err(Error::MissingValue(name.to_owned())),
            (Mode::Get, Some(_)) => return Err(Error::UnexpectedValue(name.to_owned())),
            _ => {},
        }
        trace!("dispatching {} to {:?}", name, self);
        if let Some(value) = value {
            let mut column = ColumnMut::new(definition, store);
            match &self.target {
                Target::Flag(flag) => column.set(flag, value)?,
                Target::AllOf(flags) => column.set_all_of(flags, value)?,
                _ => return Err(Error::UnrecognizedAccessor(name.to_owned())),
            }
            return Ok(Response::Unit);
        }
        let column = Column::new(definition, &*store);
        let response = match &self.target {
            Target::Flag(flag) => Response::Bool(column.get(flag)?),
            Target::AllOf(flags) => Response::Bool(column.get_all_of(flags)?),
            Target::All => Response::Bool(column.all()),
            Target::None => Response::Bool(column.none()),
            Target::Flags => Response::Flags(column.flags().into_iter().map(String::from).collect()),
        };
        Ok(response)
    }
}

/// Accessor names that can be listed up front.
#[derive(Debug, Clone, Default)]
pub struct AccessorTable(BTreeMap<String, Accessor>);

impl AccessorTable {
    pub fn insert_column(&mut self, definition: &FlagDefinition) {
        let column = definition.column();
        for flag in definition.flag_names() {
            let base = format!("{}_{}", column, flag);
            let target = Target::Flag(flag.to_owned());
            self.0.insert(format!("{}?", &base), Accessor::new(column, target.clone(), Mode::Get));
            self.0.insert(format!("{}=", &base), Accessor::new(column, target.clone(), Mode::Set));
            self.0.insert(base, Accessor::new(column, target, Mode::Get));
        }
        for &(suffix, ref target) in [("all", Target::All), ("none", Target::None)].iter() {
            let base = format!("{}_{}", column, suffix);
            self.0.insert(format!("{}?", &base), Accessor::new(column, target.clone(), Mode::Get));
            self.0.insert(base, Accessor::new(column, target.clone(), Mode::Get));
        }
        self.0.insert(format!("{}_flags", column), Accessor::new(column, Target::Flags, Mode::Get));
    }

    pub fn remove_column(&mut self, column: &str) {
        self.0.retain(|_, accessor| accessor.column() != column);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.0.get(name)
    }

    #[inline]
    pub fn names<'a>(&'a self) -> impl Iterator<Item=&'a str> + 'a {
        self.0.keys().map(String::as_str)
    }

    /// Looks `name` up in the table, then tries it as a conjunction over each
    /// column in turn.
    pub fn resolve<'a, I>(&self, name: &str, definitions: I) -> Result<Accessor>
    where
        I: IntoIterator<Item=&'a FlagDefinition>,
    {
        if let Some(accessor) = self.get(name) {
            return Ok(accessor.clone());
        }
        let unrecognized = || Error::UnrecognizedAccessor(name.to_owned());
        let captures = ACCESSOR_NAME.captures(name).ok_or_else(unrecognized)?;
        let base = captures.name("base").map(|m| m.as_str()).ok_or_else(unrecognized)?;
        let mode = match captures.name("suffix").map(|m| m.as_str()) {
            Some("=") => Mode::Set,
            _ => Mode::Get,
        };
        definitions.into_iter()
            .filter_map(|definition| parse_conjunction(definition, base).map(|flags| {
                Accessor::new(definition.column(), Target::AllOf(flags), mode)
            }))
            .next()
            .ok_or_else(unrecognized)
    }
}

fn parse_conjunction(definition: &FlagDefinition, base: &str) -> Option<Vec<String>> {
    let rest = base.strip_prefix(definition.column())?.strip_prefix('_')?;
    let flags: Vec<String> = rest.split(AND_SEPARATOR).map(String::from).collect();
    if flags.len() < 2 || !flags.iter().all(|flag| definition.contains(flag)) {
        return None;
    }
    Some(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notify_when() -> FlagDefinition {
        FlagDefinition::builder("notify_when")
            .flags(vec![("created", 2), ("updated", 4), ("deleted", 7), ("purged", 13)])
            .build()
            .unwrap()
    }

    fn table(definition: &FlagDefinition) -> AccessorTable {
        let mut table = AccessorTable::default();
        table.insert_column(definition);
        table
    }

    #[test]
    fn table_lists_every_simple_accessor() {
        let def = notify_when();
        let table = table(&def);
        assert_eq!(table.names().count(), 4 * 3 + 2 * 2 + 1);
        assert_eq!(table.get("notify_when_created=").unwrap().mode(), Mode::Set);
        assert_eq!(table.get("notify_when_none?").unwrap().target(), &Target::None);
    }

    #[test]
    fn resolves_conjunctions() {
        let def = notify_when();
        let table = table(&def);
        let accessor = table.resolve("notify_when_created_and_purged=", Some(&def)).unwrap();
        assert_eq!(accessor.column(), "notify_when");
        assert_eq!(accessor.mode(), Mode::Set);
        assert_eq!(accessor.target(), &Target::AllOf(vec!["created".to_string(), "purged".to_string()]));

        let accessor = table.resolve("notify_when_created_and_updated_and_deleted", Some(&def)).unwrap();
        assert_eq!(accessor.mode(), Mode::Get);
    }

    #[test]
    fn rejects_unknown_names() {
        let def = notify_when();
        let table = table(&def);
        for name in &[
            "notify_when_created_and_viewed?",
            "notify_when_viewed",
            "notify_when_created_and",
            "notify_when_all=",
            "visible_to_admins",
            "notify_when_created!",
        ] {
            match table.resolve(name, Some(&def)) {
                Err(Error::UnrecognizedAccessor(n)) => assert_eq!(&n, name),
                other => panic!("{} resolved to {:?}", name, other),
            }
        }
    }
}
