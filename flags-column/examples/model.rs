extern crate flags_column;

use flags_column::{
    FlagRegistry,
    FlagValue,
    Record,
    Schema,
};
use log::info;

const SCHEMA: &'static str = r#"
types:
  Model:
    - column: visible_to
      flags: { admins: 0, members: 1, friends: 2 }
      initial: [members, friends]
    - column: notify_when
      flags: { created: 2, updated: 4, deleted: 7, purged: 13 }
"#;

fn main() -> flags_column::Result<()> {
    env_logger::init();

    let schema = match std::env::var_os(flags_column::schema::SCHEMA_ENV) {
        Some(_) => Schema::load()?,
        None => Schema::from_str(SCHEMA)?,
    };
    let registry: FlagRegistry = schema.registry("Model")?;

    let mut record = Record::new();
    registry.initialize(&mut record);
    info!("new record: {:?}", record.slots());

    let form = vec![
        ("visible_to_admins=", FlagValue::from("yes")),
        ("visible_to_friends=", FlagValue::from("0")),
        ("notify_when_created_and_deleted=", FlagValue::from(true)),
    ];
    for (name, value) in form.iter() {
        registry.call(&mut record, name, Some(value))?;
    }

    for column in registry.column_names() {
        let flags = registry.column(&record, column)?.flags();
        println!("{}: {:?}", column, flags);
    }
    println!("{:?}", registry.call(&mut record, "notify_when_created_and_deleted?", None)?);
    Ok(())
}
