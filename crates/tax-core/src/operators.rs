use crate::model::ConditionOperator;
use crate::value::ScalarValue;

/// Applies a single condition operator to a profile value and its resolved
/// operand(s). `secondary` is only consulted by [`ConditionOperator::Between`];
/// every other operator ignores it.
///
/// Exhaustive over [`ConditionOperator`] — there is no "unknown operator"
/// branch here because the enum is closed. Untyped input that doesn't match
/// a known operator name is rejected earlier, at parse time
/// (see `ConditionOperator::from_str`).
pub fn apply_operator(
    operator: ConditionOperator,
    profile_value: &ScalarValue,
    operand: &ScalarValue,
    secondary: Option<&ScalarValue>,
) -> bool {
    match operator {
        ConditionOperator::Gt => op_gt(profile_value, operand),
        ConditionOperator::Gte => op_gte(profile_value, operand),
        ConditionOperator::Lt => op_lt(profile_value, operand),
        ConditionOperator::Lte => op_lte(profile_value, operand),
        ConditionOperator::Eq => op_eq(profile_value, operand),
        ConditionOperator::Neq => !op_eq(profile_value, operand),
        ConditionOperator::In => op_in(profile_value, operand),
        ConditionOperator::NotIn => !op_in(profile_value, operand),
        ConditionOperator::Between => op_between(profile_value, operand, secondary),
        ConditionOperator::IsTrue => profile_value.as_bool_lossy(),
        ConditionOperator::IsFalse => op_is_false(profile_value),
    }
}

/// `is_false` is not the negation of `is_true` — a null/absent field or an
/// unrecognized string must not pass it. Matches the explicit `{false, 0, no}`
/// membership test.
pub fn op_is_false(profile_value: &ScalarValue) -> bool {
    profile_value.is_false_lossy()
}

pub fn op_gt(profile_value: &ScalarValue, operand: &ScalarValue) -> bool {
    match (profile_value.as_decimal(), operand.as_decimal()) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

pub fn op_gte(profile_value: &ScalarValue, operand: &ScalarValue) -> bool {
    match (profile_value.as_decimal(), operand.as_decimal()) {
        (Some(a), Some(b)) => a >= b,
        _ => false,
    }
}

pub fn op_lt(profile_value: &ScalarValue, operand: &ScalarValue) -> bool {
    match (profile_value.as_decimal(), operand.as_decimal()) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}

pub fn op_lte(profile_value: &ScalarValue, operand: &ScalarValue) -> bool {
    match (profile_value.as_decimal(), operand.as_decimal()) {
        (Some(a), Some(b)) => a <= b,
        _ => false,
    }
}

pub fn op_eq(profile_value: &ScalarValue, operand: &ScalarValue) -> bool {
    if let (Some(a), Some(b)) = (profile_value.as_decimal(), operand.as_decimal()) {
        return a == b;
    }
    profile_value.as_text_lossy() == operand.as_text_lossy()
}

pub fn op_in(profile_value: &ScalarValue, operand: &ScalarValue) -> bool {
    let needle = profile_value.as_text_lossy();
    operand.as_list_lossy().iter().any(|item| item == &needle)
}

pub fn op_between(
    profile_value: &ScalarValue,
    low: &ScalarValue,
    high: Option<&ScalarValue>,
) -> bool {
    let high = match high {
        Some(h) => h,
        None => return false,
    };
    match (profile_value.as_decimal(), low.as_decimal(), high.as_decimal()) {
        (Some(v), Some(lo), Some(hi)) => v >= lo && v <= hi,
        _ => false,
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn scalar(v: i64) -> ScalarValue {
        ScalarValue::Decimal(v.into())
    }

    proptest! {
        #[test]
        fn gte_agrees_with_gt_or_eq(a: i64, b: i64) {
            let gte = op_gte(&scalar(a), &scalar(b));
            let gt_or_eq = op_gt(&scalar(a), &scalar(b)) || op_eq(&scalar(a), &scalar(b));
            prop_assert_eq!(gte, gt_or_eq);
        }

        #[test]
        fn lt_is_the_negation_of_gte(a: i64, b: i64) {
            prop_assert_eq!(op_lt(&scalar(a), &scalar(b)), !op_gte(&scalar(a), &scalar(b)));
        }

        #[test]
        fn between_agrees_with_gte_and_lte(v: i64, lo: i64, hi: i64) {
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            let between = op_between(&scalar(v), &scalar(lo), Some(&scalar(hi)));
            let bounded = op_gte(&scalar(v), &scalar(lo)) && op_lte(&scalar(v), &scalar(hi));
            prop_assert_eq!(between, bounded);
        }

        #[test]
        fn neq_is_always_the_negation_of_eq(a: i64, b: i64) {
            prop_assert_eq!(
                apply_operator(ConditionOperator::Neq, &scalar(a), &scalar(b), None),
                !apply_operator(ConditionOperator::Eq, &scalar(a), &scalar(b), None)
            );
        }
    }
}
