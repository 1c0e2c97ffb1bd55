use crate::{
    error::{
        Error,
        Result,
    },
    registry::{
        ColumnOptions,
        FlagRegistry,
    },
};

use log::debug;
use serde::{
    de::{
        MapAccess,
        Visitor,
    },
    ser::SerializeMap,
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use std::{
    collections::BTreeMap,
    env,
    fmt,
    fs,
    io,
    path::Path,
};

pub const SCHEMA_ENV: &'static str = "FLAGS_COLUMN_SCHEMA";

/// Flag name to bit position, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagPositions(Vec<(String, u32)>);

impl FlagPositions {
    #[inline]
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(&'a str, u32)> + 'a {
        self.0.iter().map(|(name, position)| (name.as_str(), *position))
    }
}

impl Serialize for FlagPositions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, position) in self.0.iter() {
            map.serialize_entry(name, position)?;
        }
        map.end()
    }
}

struct FlagPositionsVisitor;

impl<'de> Visitor<'de> for FlagPositionsVisitor {
    type Value = FlagPositions;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of flag names to bit positions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut flags = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, u32>()? {
            flags.push(entry);
        }
        Ok(FlagPositions(flags))
    }
}

impl<'de> Deserialize<'de> for FlagPositions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(FlagPositionsVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    column: String,
    flags: FlagPositions,
    #[serde(flatten)]
    options: ColumnOptions,
}

impl ColumnConfig {
    #[inline(always)]
    pub fn column(&self) -> &str {
        self.column.as_ref()
    }

    #[inline(always)]
    pub fn flags(&self) -> &FlagPositions {
        &self.flags
    }

    #[inline(always)]
    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }
}

/// Flag columns per record type, as read from YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    types: BTreeMap<String, Vec<ColumnConfig>>,
}

#[inline]
fn open_schema<P>(path: P) -> io::Result<fs::File>
where
    P: AsRef<Path>,
{
    fs::OpenOptions::new()
        .read(true)
        .open(path)
}

impl Schema {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        serde_yaml::from_reader(reader).map_err(Error::from)
    }

    pub fn from_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(Error::from)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading flag schema from {}", path.display());
        Schema::from_reader(open_schema(path)?)
    }

    /// Reads the schema named by `FLAGS_COLUMN_SCHEMA`, which then has to
    /// exist. Without it, merges whichever of the user and system schema
    /// files are present.
    pub fn load() -> Result<Self> {
        if let Some(schema_file) = env::var_os(SCHEMA_ENV) {
            return Schema::from_path(schema_file);
        }
        let mut schema = Schema::new();
        if let Some(mut schema_path) = dirs::config_dir() {
            schema_path.push("flags-column/schema.yml");
            if schema_path.is_file() {
                schema.merge(Schema::from_path(&schema_path)?);
            }
        }
        #[cfg(target_os = "linux")]
        {
            let system_path = Path::new("/etc/flags-column/schema.yml");
            if system_path.is_file() {
                schema.merge(Schema::from_path(system_path)?);
            }
        }
        Ok(schema)
    }

    /// Appends `other`'s columns after ours, type by type.
    pub fn merge(&mut self, other: Schema) {
        for (ty, columns) in other.types {
            self.types.entry(ty).or_insert_with(Vec::new).extend(columns);
        }
    }

    #[inline]
    pub fn type_names<'a>(&'a self) -> impl Iterator<Item=&'a str> + 'a {
        self.types.keys().map(String::as_str)
    }

    #[inline]
    pub fn columns(&self, ty: &str) -> Option<&[ColumnConfig]> {
        self.types.get(ty).map(Vec::as_slice)
    }

    /// Declares every column of `ty` on a fresh registry.
    pub fn registry(&self, ty: &str) -> Result<FlagRegistry> {
        let columns = self.columns(ty).ok_or_else(|| Error::UnknownType(ty.to_owned()))?;
        let mut registry = FlagRegistry::new();
        for config in columns {
            registry.flags_column(config.column.clone(), config.flags.iter(), config.options.clone())?;
        }
        Ok(registry)
    }
}
