//! Column rules
//!
//! A rule turns one column of source values into one column of target values
//! of the same length and order.

use std::collections::HashMap;

use crate::error::{RuleError, RuleResult};
use crate::models::{CellValue, ElementPair, Rule, RuleSpec};

/// Apply a rule to a column of values.
///
/// - [`Rule::Copy`] returns the values unchanged.
/// - [`Rule::Translate`] substitutes every value through `element_pairs`;
///   values without a pair (and null values) become [`CellValue::Null`].
///   When a source element appears twice, the later pair wins.
/// - Any other rule fails with [`RuleError::UnknownRule`].
pub fn apply(
    elements: &[CellValue],
    rule: &Rule,
    element_pairs: &[ElementPair],
) -> RuleResult<Vec<CellValue>> {
    match rule {
        Rule::Copy => Ok(elements.to_vec()),
        Rule::Translate => Ok(translate(elements, element_pairs)),
        Rule::Unknown(name) => Err(RuleError::UnknownRule(name.clone())),
    }
}

/// Apply a [`RuleSpec`] to a column of values.
pub fn apply_spec(elements: &[CellValue], spec: &RuleSpec) -> RuleResult<Vec<CellValue>> {
    apply(elements, &spec.rule, &spec.elements)
}

fn translate(elements: &[CellValue], element_pairs: &[ElementPair]) -> Vec<CellValue> {
    let dictionary: HashMap<&str, &str> = element_pairs
        .iter()
        .map(|pair| (pair.source.as_str(), pair.target.as_str()))
        .collect();

    elements
        .iter()
        .map(|value| {
            value
                .as_str()
                .and_then(|s| dictionary.get(s))
                .map(|target| CellValue::text(*target))
                .unwrap_or(CellValue::Null)
        })
        .collect()
}

/// Get a description of the rules and the configuration layout for operators.
pub fn rules_description() -> String {
    r#"Available mapping rules:

| Rule      | Description                                   | Element cells        |
|-----------|-----------------------------------------------|----------------------|
| Copy      | Copy every value unchanged                    | ignored              |
| Translate | Substitute values through the element pairs;  | "source-target", one |
|           | values without a pair become empty            | pair per cell        |

Configuration workbook layout:

- One sheet per sheet pair, named "<SourceSheet> - <TargetSheet>".
- Header row: LeftTitle | RightTitle | TransType | (element cells...)
- One row per column pair:

  | LeftTitle | RightTitle | TransType | D         | E           |
  |-----------|------------|-----------|-----------|-------------|
  | Name      | FullName   | Copy      |           |             |
  | Gender    | Sex        | Translate | M-Male    | F-Female    |

Rule names are case-sensitive. Any other TransType aborts the run when a
column using it is transformed."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::text(*v)).collect()
    }

    #[test]
    fn test_copy() {
        let values = vec![CellValue::text("a"), CellValue::Null, CellValue::text("")];
        assert_eq!(apply(&values, &Rule::Copy, &[]).unwrap(), values);
        assert_eq!(apply(&[], &Rule::Copy, &[]).unwrap(), Vec::<CellValue>::new());
    }

    #[test]
    fn test_translate_nulls_unknown_elements() {
        let pairs = vec![ElementPair::new("a", "x"), ElementPair::new("b", "y")];
        let result = apply(&column(&["a", "b", "c"]), &Rule::Translate, &pairs).unwrap();
        assert_eq!(
            result,
            vec![CellValue::text("x"), CellValue::text("y"), CellValue::Null]
        );
    }

    #[test]
    fn test_translate_gender() {
        let pairs = vec![ElementPair::new("M", "Male"), ElementPair::new("F", "Female")];
        let result = apply(&column(&["M", "F", "U"]), &Rule::Translate, &pairs).unwrap();
        assert_eq!(
            result,
            vec![CellValue::text("Male"), CellValue::text("Female"), CellValue::Null]
        );
    }

    #[test]
    fn test_translate_last_duplicate_wins() {
        let pairs = vec![ElementPair::new("M", "Man"), ElementPair::new("M", "Male")];
        let result = apply(&column(&["M"]), &Rule::Translate, &pairs).unwrap();
        assert_eq!(result, vec![CellValue::text("Male")]);
    }

    #[test]
    fn test_translate_null_stays_null() {
        let pairs = vec![ElementPair::new("null", "nothing")];
        let result = apply(&[CellValue::Null], &Rule::Translate, &pairs).unwrap();
        assert_eq!(result, vec![CellValue::Null]);
    }

    #[test]
    fn test_unknown_rule() {
        let err = apply(&column(&["a"]), &Rule::Unknown("Uppercase".into()), &[]).unwrap_err();
        assert_eq!(err, RuleError::UnknownRule("Uppercase".into()));
        assert!(err.to_string().contains("Uppercase"));
    }

    #[test]
    fn test_apply_spec() {
        let spec = RuleSpec::new(Rule::Translate).with_element("1", "one");
        let result = apply_spec(&column(&["1", "2"]), &spec).unwrap();
        assert_eq!(result, vec![CellValue::text("one"), CellValue::Null]);
    }
}
