//! Invariants over whole types.

use covenant::{hooks, invariant, Call, Eligibility, Member, TypeDef, Value};

use crate::common::{
    assert_postcondition, assert_precondition, counter_type, nonempty_list_type, Counter, Items,
};

fn checked_list() -> TypeDef<Items> {
    nonempty_list_type()
        .attach(invariant(|l: &Items| !l.items.is_empty()).describe("list is nonempty"))
        .unwrap()
}

#[test]
fn test_counter_example() {
    let checked = counter_type()
        .attach(invariant(|c: &Counter| c.value >= 0).describe("counter >= 0"))
        .unwrap();
    let counter = checked.instantiate(Call::positional([10])).unwrap();

    assert_postcondition(
        counter.call("increment", Call::positional([-100])),
        "counter >= 0",
    );
}

#[test]
fn test_initializer_is_checked_after_only() {
    // The blank state is empty, which the invariant forbids; the initializer
    // must still be allowed to run on it.
    let list = checked_list().instantiate(Call::positional([7])).unwrap();
    assert_eq!(list.read(|l| l.items.clone()), [7]);
}

#[test]
fn test_pop_to_empty_fails_after() {
    let list = checked_list().instantiate(Call::positional([1])).unwrap();
    list.call("push", Call::positional([2])).unwrap();

    assert_eq!(list.call("pop", Call::new()).unwrap(), Value::Int(2));
    assert_postcondition(list.call("pop", Call::new()), "list is nonempty");

    // Once broken, every checked method refuses to start.
    assert_precondition(list.call("push", Call::positional([3])), "list is nonempty");
    assert_precondition(
        list.call(hooks::INDEX_GET, Call::positional([0])),
        "list is nonempty",
    );
    // The private length hook is not checked.
    assert_eq!(list.call("__len__", Call::new()).unwrap(), Value::Int(0));
}

#[test]
fn test_allow_listed_hook_is_checked() {
    let list = checked_list().instantiate(Call::positional([4])).unwrap();
    assert_eq!(
        list.call(hooks::INDEX_GET, Call::positional([0])).unwrap(),
        Value::Int(4)
    );
}

#[test]
fn test_derived_table_eligibility() {
    let checked = checked_list();
    let mut seen: Vec<(String, Eligibility)> = checked
        .members()
        .map(|(name, member)| (name.to_string(), covenant::invariant::eligibility(name, member)))
        .collect();
    seen.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        seen,
        [
            ("__getitem__".to_string(), Eligibility::Checked),
            ("__init__".to_string(), Eligibility::Initializer),
            ("__len__".to_string(), Eligibility::Private),
            ("pop".to_string(), Eligibility::Checked),
            ("push".to_string(), Eligibility::Checked),
        ]
    );
    // Checked methods gained one layer, the private one none.
    let depth = |name: &str| match checked.member(name) {
        Some(Member::Method(function)) => function.depth(),
        _ => usize::MAX,
    };
    assert_eq!(depth("push"), 1);
    assert_eq!(depth("__len__"), 0);
}

#[test]
fn test_original_type_is_not_mutated() {
    let plain = nonempty_list_type();
    let _checked = plain
        .clone()
        .attach(invariant(|l: &Items| !l.items.is_empty()).describe("list is nonempty"))
        .unwrap();

    let list = plain.instantiate(Call::positional([1])).unwrap();
    list.call("pop", Call::new()).unwrap();
    assert!(list.call("pop", Call::new()).is_err());
    assert_eq!(list.read(|l| l.items.len()), 0);
}
