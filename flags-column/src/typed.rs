use crate::{
    definition::{
        Bits,
        FlagDefinition,
    },
    error::Result,
    store::FlagStore,
};

/// A flag column known at compile time, usually produced by
/// `#[flags_column(..)]`.
pub trait TypedColumn: Sized {
    const COLUMN: &'static str;
    const FLAG_POSITIONS: &'static [(&'static str, u32)];
    const INITIAL: Option<&'static [&'static str]>;
    const ACCESSIBLE: bool;
    /// Slot bits the typed value can hold; everything above is left as stored.
    const REPR_MASK: Bits;

    fn from_bits(bits: Bits) -> Self;

    fn into_bits(self) -> Bits;

    fn definition() -> Result<FlagDefinition> {
        let mut builder = FlagDefinition::builder(Self::COLUMN)
            .flags(Self::FLAG_POSITIONS.iter().cloned())
            .accessible(Self::ACCESSIBLE);
        if let Some(initial) = Self::INITIAL {
            builder = builder.initial(initial.iter().cloned());
        }
        builder.build()
    }

    /// Reads the column from `store`; unset reads as empty.
    #[inline]
    fn load<S: FlagStore + ?Sized>(store: &S) -> Self {
        Self::from_bits(store.read_bits(Self::COLUMN).unwrap_or(0))
    }

    /// Writes the column back, keeping stored bits wider than the typed value.
    #[inline]
    fn save<S: FlagStore + ?Sized>(self, store: &mut S) {
        let existing = store.read_bits(Self::COLUMN).unwrap_or(0);
        let bits = (existing & !Self::REPR_MASK) | (self.into_bits() & Self::REPR_MASK);
        store.write_bits(Self::COLUMN, bits)
    }
}
