use flags_column::{
    Bits,
    ColumnOptions,
    Error,
    FlagRegistry,
    FlagStore,
    FlagValue,
    Record,
    Response,
};

use std::collections::BTreeSet;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn model() -> FlagRegistry {
    init_logging();
    let mut registry = FlagRegistry::new();
    registry
        .flags_column("visible_to", vec![("admins", 0), ("members", 1), ("friends", 2)], ColumnOptions {
            initial: Some(vec!["members".into(), "friends".into()]),
            accessible: false,
        })
        .unwrap()
        .flags_column("notify_when", vec![("created", 2), ("updated", 4), ("deleted", 7), ("purged", 13)], ColumnOptions::default())
        .unwrap();
    registry
}

fn new_record(registry: &FlagRegistry) -> Record {
    let mut record = Record::new();
    registry.initialize(&mut record);
    record
}

fn set_of<'a, I: IntoIterator<Item=&'a str>>(names: I) -> BTreeSet<String> {
    names.into_iter().map(String::from).collect()
}

fn choose<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let (first, rest) = items.split_first().unwrap();
    let mut with_first: Vec<Vec<T>> = choose(rest, k - 1)
        .into_iter()
        .map(|mut c| {
            c.insert(0, first.clone());
            c
        })
        .collect();
    with_first.extend(choose(rest, k));
    with_first
}

fn reset_all_flags_to_false(registry: &FlagRegistry, record: &mut Record) {
    for definition in registry.columns() {
        let mut column = registry.column_mut(record, definition.column()).unwrap();
        for flag in definition.flag_names() {
            column.set(flag, &false).unwrap();
        }
    }
}

#[test]
fn flagged_columns_have_expected_flags() {
    let registry = model();
    assert_eq!(registry.column_names().collect::<Vec<_>>(), vec!["visible_to", "notify_when"]);
    let visible_to = registry.definition("visible_to").unwrap();
    assert_eq!(visible_to.flag_names().collect::<Vec<_>>(), vec!["admins", "members", "friends"]);
    assert_eq!(visible_to.initial().map(|i| i.len()), Some(2));
    let notify_when = registry.definition("notify_when").unwrap();
    assert_eq!(notify_when.flag_names().collect::<Vec<_>>(), vec!["created", "updated", "deleted", "purged"]);
    assert!(notify_when.initial().is_none());
    assert_eq!(notify_when.default_mask(), 0);
}

#[test]
fn instance_responds_to_generated_accessors() {
    let registry = model();
    for definition in registry.columns() {
        let column = definition.column();
        for suffix in &["flags", "all", "all?", "none", "none?"] {
            assert!(registry.responds_to(&format!("{}_{}", column, suffix)));
        }
        for flag in definition.flag_names() {
            for suffix in &["", "?", "="] {
                assert!(registry.responds_to(&format!("{}_{}{}", column, flag, suffix)));
            }
        }
        let anded = definition.flag_names().collect::<Vec<_>>().join("_and_");
        for suffix in &["", "?", "="] {
            assert!(registry.responds_to(&format!("{}_{}{}", column, anded, suffix)));
        }
    }
}

#[test]
fn new_instance_has_initial_flags() {
    let registry = model();
    let record = new_record(&registry);
    assert_eq!(
        set_of(registry.column(&record, "visible_to").unwrap().flags()),
        set_of(vec!["members", "friends"])
    );
    assert!(registry.column(&record, "notify_when").unwrap().flags().is_empty());
    assert_eq!(record.read_bits("notify_when"), None);
}

#[test]
fn persisted_instance_is_not_initialized() {
    let registry = model();
    let mut record = Record::persisted(Vec::<(String, Bits)>::new());
    registry.initialize(&mut record);
    assert!(registry.column(&record, "visible_to").unwrap().flags().is_empty());
}

#[test]
fn all_and_none_follow_full_assignments() {
    let registry = model();
    let mut record = new_record(&registry);
    for definition in registry.columns() {
        let mut column = registry.column_mut(&mut record, definition.column()).unwrap();
        for flag in definition.flag_names() {
            column.set(flag, &false).unwrap();
        }
        assert!(!column.all());
        assert!(column.none());

        for flag in definition.flag_names() {
            column.set(flag, &true).unwrap();
        }
        assert!(column.all());
        assert!(!column.none());
    }
}

#[test]
fn only_one_flag_set() {
    let registry = model();
    let mut record = new_record(&registry);
    reset_all_flags_to_false(&registry, &mut record);
    for definition in registry.columns() {
        let first = definition.flag_names().next().unwrap();
        let mut column = registry.column_mut(&mut record, definition.column()).unwrap();
        column.set(first, &true).unwrap();
        assert!(!column.all());
        assert!(!column.none());
    }
}

#[test]
fn assigned_flags_equal_expected_flags() {
    let registry = model();
    let mut record = new_record(&registry);
    for definition in registry.columns() {
        let flags: Vec<&str> = definition.flag_names().collect();
        for k in 1..=flags.len() {
            for combination in choose(&flags, k) {
                reset_all_flags_to_false(&registry, &mut record);
                let mut column = registry.column_mut(&mut record, definition.column()).unwrap();
                for flag in combination.iter() {
                    column.set(flag, &true).unwrap();
                }
                assert_eq!(set_of(column.flags()), set_of(combination.iter().cloned()), "{:?}", combination);
                assert!(column.get_all_of(&combination).unwrap());

                let name = format!("{}_{}?", definition.column(), combination.join("_and_"));
                assert_eq!(registry.call(&mut record, &name, None).unwrap(), Response::Bool(true), "{}", name);
            }
        }
    }
}

#[test]
fn mask_and_unmask_are_inverse() {
    let registry = model();
    for definition in registry.columns() {
        let flags: Vec<&str> = definition.flag_names().collect();
        for k in 0..=flags.len() {
            for combination in choose(&flags, k) {
                let bits = registry.mask(definition.column(), &combination).unwrap();
                let names = registry.unmask(definition.column(), bits).unwrap();
                assert_eq!(set_of(names), set_of(combination.iter().cloned()));
            }
        }
    }
    assert_eq!(registry.mask("notify_when", &["created", "deleted"]).unwrap(), 0b1000_0100);
}

#[test]
fn combined_accessors_require_every_flag() {
    init_logging();
    let mut registry = FlagRegistry::new();
    registry.flags_column("letters", vec![("a", 0), ("b", 1), ("c", 2)], ColumnOptions::default()).unwrap();
    let mut record = Record::new();
    registry.call(&mut record, "letters_a=", Some(&true)).unwrap();
    registry.call(&mut record, "letters_b=", Some(&true)).unwrap();
    registry.call(&mut record, "letters_c=", Some(&false)).unwrap();

    assert_eq!(registry.call(&mut record, "letters_a_and_b", None).unwrap(), Response::Bool(true));
    assert_eq!(registry.call(&mut record, "letters_a_and_c?", None).unwrap(), Response::Bool(false));

    registry.call(&mut record, "letters_b_and_c=", Some(&"yes")).unwrap();
    assert_eq!(record.read_bits("letters"), Some(0b111));
    registry.call(&mut record, "letters_a_and_b=", Some(&0)).unwrap();
    assert_eq!(record.read_bits("letters"), Some(0b100));
}

#[test]
fn truthiness_table() {
    let registry = model();
    let mut record = new_record(&registry);
    let truthy: Vec<FlagValue> = vec!["yes".into(), "OK".into(), "1".into(), true.into(), FlagValue::Int(1)];
    let falsy: Vec<FlagValue> = vec!["no".into(), "".into(), FlagValue::Int(0), false.into(), FlagValue::Nil];

    for value in truthy.iter() {
        registry.call(&mut record, "visible_to_admins=", Some(&false)).unwrap();
        registry.call(&mut record, "visible_to_admins=", Some(value)).unwrap();
        assert_eq!(registry.call(&mut record, "visible_to_admins?", None).unwrap(), Response::Bool(true), "{:?}", value);
    }
    for value in falsy.iter() {
        registry.call(&mut record, "visible_to_admins=", Some(&true)).unwrap();
        registry.call(&mut record, "visible_to_admins=", Some(value)).unwrap();
        assert_eq!(registry.call(&mut record, "visible_to_admins?", None).unwrap(), Response::Bool(false), "{:?}", value);
    }
}

#[test]
fn unknown_names_fail() {
    let registry = model();
    let mut record = new_record(&registry);
    let before = record.clone();

    assert!(matches!(
        registry.column_mut(&mut record, "visible_to").unwrap().set("strangers", &true),
        Err(Error::UnknownFlag { .. })
    ));
    assert!(matches!(registry.mask("visible_to", &["admins", "strangers"]), Err(Error::UnknownFlag { .. })));
    assert!(matches!(
        registry.call(&mut record, "visible_to_admins_and_strangers=", Some(&true)),
        Err(Error::UnrecognizedAccessor(_))
    ));
    assert!(matches!(registry.call(&mut record, "visible_to_strangers?", None), Err(Error::UnrecognizedAccessor(_))));
    assert!(matches!(registry.column(&record, "hidden_from"), Err(Error::UnknownColumn(_))));
    assert_eq!(record, before);
}
