use crate::error::{
    Error,
    Result,
};

use log::{
    debug,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    convert::TryFrom,
};

/// Storage type of a flag column.
pub type Bits = u64;

pub const MAX_BIT_POSITION: u32 = Bits::BITS - 1;

/// The immutable description of one flag column: which names live at which
/// bit, and what a brand-new record starts with.
///
/// Serialized as its declaration; deserializing goes through the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FlagDefinitionBuilder", into = "FlagDefinitionBuilder")]
pub struct FlagDefinition {
    column: String,
    flags: Vec<(String, u32)>,
    masks: BTreeMap<String, Bits>,
    inverse: Vec<(Bits, String)>,
    initial: Option<Vec<String>>,
    default_mask: Bits,
    accessible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDefinitionBuilder {
    column: String,
    #[serde(default)]
    flags: Vec<(String, u32)>,
    #[serde(default)]
    initial: Option<Vec<String>>,
    #[serde(default)]
    accessible: bool,
}

impl TryFrom<FlagDefinitionBuilder> for FlagDefinition {
    type Error = Error;

    #[inline]
    fn try_from(builder: FlagDefinitionBuilder) -> Result<Self> {
        builder.build()
    }
}

impl From<FlagDefinition> for FlagDefinitionBuilder {
    fn from(definition: FlagDefinition) -> Self {
        FlagDefinitionBuilder {
            column: definition.column,
            flags: definition.flags,
            initial: definition.initial,
            accessible: definition.accessible,
        }
    }
}

impl FlagDefinitionBuilder {
    pub fn flag<S: Into<String>>(mut self, name: S, position: u32) -> Self {
        self.flags.push((name.into(), position));
        self
    }

    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item=(S, u32)>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(|(name, position)| (name.into(), position)));
        self
    }

    pub fn initial<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item=S>,
        S: Into<String>,
    {
        self.initial = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn accessible(mut self, v: bool) -> Self {
        self.accessible = v;
        self
    }

    pub fn build(self) -> Result<FlagDefinition> {
        let FlagDefinitionBuilder { column, flags, initial, accessible } = self;
        let mut masks = BTreeMap::new();
        let mut inverse: Vec<(Bits, String)> = Vec::with_capacity(flags.len());

        for (name, position) in flags.iter() {
            if *position > MAX_BIT_POSITION {
                return Err(Error::BitPositionOutOfRange {
                    column: column.clone(),
                    flag: name.clone(),
                    position: *position,
                });
            }
            let mask: Bits = 1 << position;
            if masks.insert(name.clone(), mask).is_some() {
                return Err(Error::DuplicateFlag {
                    column: column.clone(),
                    flag: name.clone(),
                });
            }
            match inverse.iter_mut().find(|(bits, _)| *bits == mask) {
                Some(entry) => {
                    warn!("{}: flag {:?} shares bit {} with {:?}", &column, name, position, &entry.1);
                    entry.1 = name.clone();
                },
                None => inverse.push((mask, name.clone())),
            }
        }

        let default_mask = initial.iter()
            .flatten()
            .filter_map(|name| {
                let mask = masks.get(name).cloned();
                if mask.is_none() {
                    warn!("{}: initial flag {:?} is not declared", &column, name);
                }
                mask
            })
            .fold(0, |acc, mask| acc | mask);

        debug!("declared flag column {} with {} flags, default mask {:#x}", &column, flags.len(), default_mask);

        Ok(FlagDefinition {
            column: column,
            flags: flags,
            masks: masks,
            inverse: inverse,
            initial: initial,
            default_mask: default_mask,
            accessible: accessible,
        })
    }
}

impl FlagDefinition {
    pub fn builder<S: Into<String>>(column: S) -> FlagDefinitionBuilder {
        FlagDefinitionBuilder {
            column: column.into(),
            flags: Vec::new(),
            initial: None,
            accessible: false,
        }
    }

    #[inline(always)]
    pub fn column(&self) -> &str {
        self.column.as_ref()
    }

    /// Declared flag names, in declaration order.
    #[inline]
    pub fn flag_names<'a>(&'a self) -> impl Iterator<Item=&'a str> + 'a {
        self.flags.iter().map(|(name, _)| name.as_str())
    }

    #[inline]
    pub fn positions(&self) -> &[(String, u32)] {
        &self.flags
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.masks.contains_key(name)
    }

    #[inline(always)]
    pub fn bit_flags(&self) -> &BTreeMap<String, Bits> {
        &self.masks
    }

    #[inline(always)]
    pub fn bit_flags_inverted(&self) -> &[(Bits, String)] {
        &self.inverse
    }

    #[inline]
    pub fn initial(&self) -> Option<&[String]> {
        self.initial.as_ref().map(Vec::as_slice)
    }

    #[inline(always)]
    pub fn default_mask(&self) -> Bits {
        self.default_mask
    }

    #[inline(always)]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// Setter names a host may admit to bulk assignment.
    pub fn accessible_setters(&self) -> Vec<String> {
        if !self.accessible {
            return Vec::new();
        }
        self.flag_names()
            .map(|name| format!("{}_{}", &self.column, name))
            .collect()
    }

    pub fn mask_of_flag(&self, name: &str) -> Result<Bits> {
        self.masks.get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_flag(self.column.as_str(), name))
    }

    pub fn mask_of<I, S>(&self, names: I) -> Result<Bits>
    where
        I: IntoIterator<Item=S>,
        S: AsRef<str>,
    {
        names.into_iter()
            .try_fold(0, |acc, name| self.mask_of_flag(name.as_ref()).map(|mask| acc | mask))
    }

    /// Mask with every declared flag set.
    #[inline]
    pub fn full_mask(&self) -> Bits {
        self.masks.values().fold(0, |acc, mask| acc | mask)
    }

    /// Names whose bit is fully present in `bits`, in declaration order.
    pub fn unmask(&self, bits: Bits) -> Vec<&str> {
        self.inverse.iter()
            .filter(|&&(mask, _)| (bits & mask) == mask)
            .map(|(_, name)| name.as_str())
            .collect()
    }
}
