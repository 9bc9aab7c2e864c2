use locreg_core::{compute_plan, District};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn child_values() -> impl Strategy<Value = Vec<String>> {
    let value = prop_oneof![
        4 => "[A-E][a-c]{0,2}",
        1 => " {0,2}",
        1 => " [A-E] ",
    ];
    proptest::collection::vec(value, 0..8)
}

fn district(panchayaths: &[String], pincodes: &[String]) -> District {
    let mut district = District::with_id("d1", "Kollam");
    district.panchayaths = panchayaths.iter().cloned().collect();
    district.pincodes = pincodes.iter().cloned().collect();
    district
}

fn normalized(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn applied(persisted: &[String], adds: &[String], removes: &[String]) -> BTreeSet<String> {
    let remaining: Vec<String> = persisted
        .iter()
        .filter(|value| !removes.contains(value))
        .cloned()
        .collect();
    let mut values = normalized(&remaining);
    values.extend(adds.iter().cloned());
    values
}

proptest! {
    #[test]
    fn applying_plan_reaches_desired_state(
        old_p in child_values(),
        old_z in child_values(),
        new_p in child_values(),
        new_z in child_values(),
    ) {
        let plan = compute_plan(&district(&old_p, &old_z), &district(&new_p, &new_z));

        let adds: Vec<String> = plan.panchayaths_to_add.iter().cloned().collect();
        let removes: Vec<String> = plan.panchayaths_to_remove.iter().cloned().collect();
        prop_assert_eq!(applied(&old_p, &adds, &removes), normalized(&new_p));

        let adds: Vec<String> = plan.pincodes_to_add.iter().cloned().collect();
        let removes: Vec<String> = plan.pincodes_to_remove.iter().cloned().collect();
        prop_assert_eq!(applied(&old_z, &adds, &removes), normalized(&new_z));
    }

    #[test]
    fn plan_is_minimal(
        old_p in child_values(),
        new_p in child_values(),
    ) {
        let plan = compute_plan(&district(&old_p, &[]), &district(&new_p, &[]));
        let persisted = normalized(&old_p);
        let desired = normalized(&new_p);

        for value in &plan.panchayaths_to_add {
            prop_assert!(!persisted.contains(value));
            prop_assert!(desired.contains(value));
        }
        for value in &plan.panchayaths_to_remove {
            prop_assert!(old_p.contains(value));
            prop_assert!(!desired.contains(value.trim()));
        }
    }

    #[test]
    fn unchanged_district_yields_empty_plan(
        panchayaths in child_values(),
        pincodes in child_values(),
    ) {
        let current = district(&panchayaths, &pincodes);
        let plan = compute_plan(&current, &current.clone());
        prop_assert!(plan.is_empty());
        prop_assert!(!plan.name_changed);
    }

    #[test]
    fn blank_values_never_become_operations(
        old_p in child_values(),
        new_p in child_values(),
        new_z in child_values(),
    ) {
        let plan = compute_plan(&district(&old_p, &[]), &district(&new_p, &new_z));
        let adds = plan.panchayaths_to_add.iter().chain(&plan.pincodes_to_add);
        for value in adds {
            prop_assert!(!value.trim().is_empty());
            prop_assert_eq!(value.trim(), value.as_str());
        }
        let removes = plan.panchayaths_to_remove.iter().chain(&plan.pincodes_to_remove);
        for value in removes {
            prop_assert!(!value.trim().is_empty());
        }
    }
}
