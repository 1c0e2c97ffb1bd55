use crate::{
    column::{
        Column,
        ColumnMut,
    },
    definition::{
        Bits,
        FlagDefinition,
    },
    dispatch::{
        Accessor,
        AccessorTable,
        Response,
    },
    error::{
        Error,
        Result,
    },
    store::FlagStore,
    truthy::Truthy,
};

use log::debug;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    sync::Arc,
};

/// Runs once per new record.
pub type Initializer = Arc<dyn Fn(&mut dyn FlagStore) + Send + Sync>;

/// Declaration options for one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOptions {
    #[serde(default)]
    pub initial: Option<Vec<String>>,
    #[serde(default)]
    pub accessible: bool,
}

#[derive(Clone)]
enum Hook {
    Column(String),
    Custom(Initializer),
}

/// Every flag column a record type declares, in declaration order.
#[derive(Clone, Default)]
pub struct FlagRegistry {
    columns: Vec<Arc<FlagDefinition>>,
    initializers: Vec<Hook>,
    accessors: AccessorTable,
}

fn initialize_column(definition: &FlagDefinition, store: &mut dyn FlagStore) {
    let column = definition.column();
    if !store.is_new_record() || definition.initial().is_none() || store.read_bits(column).is_some() {
        return;
    }
    debug!("{}: initializing new record with {:#x}", column, definition.default_mask());
    store.write_bits(column, definition.default_mask());
}

impl FlagRegistry {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts a registry from `parent`'s columns and initializers. Later
    /// declarations only affect the new registry.
    #[inline]
    pub fn extend(parent: &FlagRegistry) -> Self {
        parent.clone()
    }

    /// Adds `definition`, replacing a column of the same name in place.
    pub fn declare(&mut self, definition: FlagDefinition) -> &mut Self {
        let column = definition.column().to_owned();
        self.accessors.remove_column(&column);
        self.accessors.insert_column(&definition);
        let definition = Arc::new(definition);
        match self.columns.iter_mut().find(|d| d.column() == column) {
            Some(existing) => {
                debug!("redeclaring flag column {}", &column);
                *existing = definition;
            },
            None => {
                self.columns.push(definition);
                self.initializers.push(Hook::Column(column));
            },
        }
        self
    }

    pub fn flags_column<C, I, S>(&mut self, column: C, flags: I, options: ColumnOptions) -> Result<&mut Self>
    where
        C: Into<String>,
        I: IntoIterator<Item=(S, u32)>,
        S: Into<String>,
    {
        let ColumnOptions { initial, accessible } = options;
        let mut builder = FlagDefinition::builder(column)
            .flags(flags)
            .accessible(accessible);
        if let Some(initial) = initial {
            builder = builder.initial(initial);
        }
        let definition = builder.build()?;
        Ok(self.declare(definition))
    }

    /// Appends a host initializer; it runs after the columns declared so far.
    pub fn after_initialize<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut dyn FlagStore) + Send + Sync + 'static,
    {
        self.initializers.push(Hook::Custom(Arc::new(f)));
        self
    }

    /// The "new record" signal.
    pub fn initialize(&self, store: &mut dyn FlagStore) {
        for hook in self.initializers.iter() {
            match hook {
                Hook::Column(column) => {
                    if let Ok(definition) = self.definition(column) {
                        initialize_column(definition, store);
                    }
                },
                Hook::Custom(f) => f(store),
            }
        }
    }

    #[inline]
    pub fn columns<'a>(&'a self) -> impl Iterator<Item=&'a FlagDefinition> + 'a {
        self.columns.iter().map(|d| &**d)
    }

    #[inline]
    pub fn column_names<'a>(&'a self) -> impl Iterator<Item=&'a str> + 'a {
        self.columns().map(FlagDefinition::column)
    }

    pub fn definition(&self, column: &str) -> Result<&FlagDefinition> {
        self.columns()
            .find(|d| d.column() == column)
            .ok_or_else(|| Error::UnknownColumn(column.to_owned()))
    }

    #[inline]
    pub fn mask<I, S>(&self, column: &str, flags: I) -> Result<Bits>
    where
        I: IntoIterator<Item=S>,
        S: AsRef<str>,
    {
        self.definition(column)?.mask_of(flags)
    }

    #[inline]
    pub fn unmask(&self, column: &str, bits: Bits) -> Result<Vec<&str>> {
        self.definition(column).map(|d| d.unmask(bits))
    }

    pub fn column<'a, S>(&'a self, store: &'a S, column: &str) -> Result<Column<'a, S>>
    where
        S: FlagStore + ?Sized,
    {
        self.definition(column).map(|d| Column::new(d, store))
    }

    pub fn column_mut<'a, S>(&'a self, store: &'a mut S, column: &str) -> Result<ColumnMut<'a, S>>
    where
        S: FlagStore + ?Sized,
    {
        self.definition(column).map(move |d| ColumnMut::new(d, store))
    }

    /// Setters from `accessible` columns, for a host's bulk assignment.
    pub fn accessible_setters(&self) -> Vec<String> {
        self.columns()
            .flat_map(FlagDefinition::accessible_setters)
            .collect()
    }

    pub fn accessor(&self, name: &str) -> Result<Accessor> {
        self.accessors.resolve(name, self.columns())
    }

    #[inline]
    pub fn responds_to(&self, name: &str) -> bool {
        self.accessor(name).is_ok()
    }

    /// Calls an accessor by name. Setters (`...=`) need `value`, getters refuse one.
    pub fn call<S>(&self, store: &mut S, name: &str, value: Option<&dyn Truthy>) -> Result<Response>
    where
        S: FlagStore + ?Sized,
    {
        let accessor = self.accessor(name)?;
        let definition = self.definition(accessor.column())?;
        accessor.invoke(definition, store, name, value)
    }
}

impl fmt::Debug for FlagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagRegistry")
            .field("columns", &self.columns)
            .field("initializers", &self.initializers.len())
            .finish()
    }
}
