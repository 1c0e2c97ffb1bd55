use crate::{
    definition::{
        Bits,
        FlagDefinition,
    },
    error::Result,
    store::FlagStore,
    truthy::Truthy,
};

use log::trace;

#[inline(always)]
fn apply(bits: Bits, mask: Bits, on: bool) -> Bits {
    if on {
        bits | mask
    } else {
        bits & !mask
    }
}

/// Read access to one flag column of one record.
pub struct Column<'a, S: ?Sized> {
    definition: &'a FlagDefinition,
    store: &'a S,
}

impl<'a, S: FlagStore + ?Sized> Column<'a, S> {
    #[inline(always)]
    pub fn new(definition: &'a FlagDefinition, store: &'a S) -> Self {
        Column {
            definition: definition,
            store: store,
        }
    }

    #[inline(always)]
    pub fn definition(&self) -> &'a FlagDefinition {
        self.definition
    }

    /// The stored integer, or 0 while unset.
    #[inline]
    pub fn bits(&self) -> Bits {
        self.store.read_bits(self.definition.column()).unwrap_or(0)
    }

    pub fn get(&self, flag: &str) -> Result<bool> {
        let mask = self.definition.mask_of_flag(flag)?;
        Ok((self.bits() & mask) != 0)
    }

    /// True only when every named flag is on.
    pub fn get_all_of<I, T>(&self, flags: I) -> Result<bool>
    where
        I: IntoIterator<Item=T>,
        T: AsRef<str>,
    {
        let mask = self.definition.mask_of(flags)?;
        Ok((self.bits() & mask) == mask)
    }

    /// Exact comparison with the full declared mask; stray bits make this false.
    #[inline]
    pub fn all(&self) -> bool {
        self.bits() == self.definition.full_mask()
    }

    #[inline]
    pub fn none(&self) -> bool {
        self.bits() == 0
    }

    #[inline]
    pub fn flags(&self) -> Vec<&'a str> {
        self.definition.unmask(self.bits())
    }
}

/// Read-write access to one flag column of one record.
pub struct ColumnMut<'a, S: ?Sized> {
    definition: &'a FlagDefinition,
    store: &'a mut S,
}

impl<'a, S: FlagStore + ?Sized> ColumnMut<'a, S> {
    #[inline(always)]
    pub fn new(definition: &'a FlagDefinition, store: &'a mut S) -> Self {
        ColumnMut {
            definition: definition,
            store: store,
        }
    }

    #[inline]
    pub fn view(&self) -> Column<'_, S> {
        Column::new(self.definition, &*self.store)
    }

    #[inline]
    pub fn bits(&self) -> Bits {
        self.view().bits()
    }

    #[inline]
    pub fn get(&self, flag: &str) -> Result<bool> {
        self.view().get(flag)
    }

    #[inline]
    pub fn get_all_of<I, T>(&self, flags: I) -> Result<bool>
    where
        I: IntoIterator<Item=T>,
        T: AsRef<str>,
    {
        self.view().get_all_of(flags)
    }

    #[inline]
    pub fn all(&self) -> bool {
        self.view().all()
    }

    #[inline]
    pub fn none(&self) -> bool {
        self.view().none()
    }

    #[inline]
    pub fn flags(&self) -> Vec<&'a str> {
        self.definition.unmask(self.bits())
    }

    pub fn set<V: Truthy + ?Sized>(&mut self, flag: &str, value: &V) -> Result<()> {
        let mask = self.definition.mask_of_flag(flag)?;
        self.write(mask, value.is_truthy());
        Ok(())
    }

    /// Turns every named flag on or off at once.
    pub fn set_all_of<I, T, V>(&mut self, flags: I, value: &V) -> Result<()>
    where
        I: IntoIterator<Item=T>,
        T: AsRef<str>,
        V: Truthy + ?Sized,
    {
        let mask = self.definition.mask_of(flags)?;
        self.write(mask, value.is_truthy());
        Ok(())
    }

    fn write(&mut self, mask: Bits, on: bool) {
        let column = self.definition.column();
        let bits = apply(self.bits(), mask, on);
        trace!("{}: {} {:#x} -> {:#x}", column, if on { "set" } else { "clear" }, mask, bits);
        self.store.write_bits(column, bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;

    fn abc() -> FlagDefinition {
        FlagDefinition::builder("letters")
            .flags(vec![("a", 0), ("b", 1), ("c", 2)])
            .build()
            .unwrap()
    }

    #[test]
    fn unset_slot_reads_as_zero() {
        let def = abc();
        let record = Record::persisted(Vec::<(String, Bits)>::new());
        let column = Column::new(&def, &record);
        assert_eq!(column.bits(), 0);
        assert!(column.none());
        assert!(!column.get("a").unwrap());
    }

    #[test]
    fn combined_getter_needs_every_bit() {
        let def = abc();
        let mut record = Record::new();
        let mut column = ColumnMut::new(&def, &mut record);
        column.set("a", &true).unwrap();
        column.set("b", "yes").unwrap();
        column.set("c", &false).unwrap();
        assert!(column.get_all_of(&["a", "b"]).unwrap());
        assert!(!column.get_all_of(&["a", "c"]).unwrap());

        column.set_all_of(&["a", "c"], "OK").unwrap();
        assert_eq!(column.bits(), 0b111);
        column.set_all_of(&["a", "b"], &0).unwrap();
        assert_eq!(column.flags(), vec!["c"]);
    }

    #[test]
    fn stray_bits_are_kept_and_break_all() {
        let def = abc();
        let mut record = Record::persisted(vec![("letters", 0b1000)]);
        let mut column = ColumnMut::new(&def, &mut record);
        column.set_all_of(def.flag_names(), &true).unwrap();
        assert_eq!(column.bits(), 0b1111);
        assert!(column.get_all_of(&["a", "b", "c"]).unwrap());
        assert!(!column.all());
        assert_eq!(column.flags(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_flag_fails() {
        let def = abc();
        let mut record = Record::new();
        let mut column = ColumnMut::new(&def, &mut record);
        assert!(column.set("d", &true).is_err());
        assert!(column.get("d").is_err());
        assert!(column.get_all_of(&["a", "d"]).is_err());
        assert_eq!(column.bits(), 0);
    }
}
