//! Mapping reversal
//!
//! Turns a left-to-right mapping into the right-to-left one: every sheet
//! pair, column pair and element pair is swapped, rules are kept as-is.

use crate::models::{Direction, RuleSpec};

use super::table::MappingTable;

/// Produce the inverse of a mapping table.
///
/// The input is left untouched. Lookup indexes are rebuilt for the swapped
/// keys, so a source sheet that appears as the target of several pairs
/// resolves to the first of them in configuration order.
pub fn reverse(mapping: &MappingTable) -> MappingTable {
    let mut reversed = MappingTable::new();

    for (sheets, columns) in mapping.iter() {
        let swapped = sheets.swapped();
        reversed.group_mut(swapped.clone());

        for (pair, spec) in columns.iter() {
            reversed.insert_spec(
                swapped.clone(),
                pair.swapped(),
                RuleSpec {
                    rule: spec.rule.clone(),
                    elements: spec.elements.iter().map(|e| e.swapped()).collect(),
                },
            );
        }
    }

    reversed
}

impl MappingTable {
    /// See [`reverse`].
    pub fn reversed(&self) -> MappingTable {
        reverse(self)
    }

    /// The mapping to use for a given direction.
    pub fn oriented(self, direction: Direction) -> MappingTable {
        match direction {
            Direction::Forward => self,
            Direction::Reverse => reverse(&self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigRow, ConfigTable, ElementPair, Rule, SheetPair};
    use crate::transform::mapping::table::build_mapping;
    use pretty_assertions::assert_eq;

    fn sample() -> MappingTable {
        build_mapping(&[
            ConfigTable::new("People - Staff")
                .with_row(ConfigRow::new("Name", "FullName", "Copy"))
                .with_row(ConfigRow::new("Gender", "Sex", "Translate").with_element("M-Male")),
            ConfigTable::new("Orders - Sales")
                .with_row(ConfigRow::new("Id", "OrderId", "Copy")),
        ])
        .unwrap()
    }

    #[test]
    fn test_reverse_swaps_everything() {
        let reversed = reverse(&sample());

        assert!(reversed.lookup_sheet("People").is_none());
        let resolved = reversed.lookup("Staff", "Sex").unwrap();
        assert_eq!(resolved.target_sheet, "People");
        assert_eq!(resolved.target_column, "Gender");
        assert_eq!(resolved.spec.rule, Rule::Translate);
        assert_eq!(resolved.spec.elements, vec![ElementPair::new("Male", "M")]);

        let resolved = reversed.lookup("Sales", "OrderId").unwrap();
        assert_eq!(resolved.target_column, "Id");
        assert_eq!(resolved.spec.rule, Rule::Copy);
    }

    #[test]
    fn test_double_reverse_is_identity() {
        let mapping = sample();
        assert_eq!(reverse(&reverse(&mapping)), mapping);
    }

    #[test]
    fn test_reverse_keeps_order() {
        let reversed = reverse(&sample());
        let pairs: Vec<&SheetPair> = reversed.sheet_pairs().collect();
        assert_eq!(
            pairs,
            vec![
                &SheetPair::new("Staff", "People"),
                &SheetPair::new("Sales", "Orders")
            ]
        );
    }

    #[test]
    fn test_shared_target_resolves_to_first() {
        let mapping = build_mapping(&[
            ConfigTable::new("A - T").with_row(ConfigRow::new("x", "v", "Copy")),
            ConfigTable::new("B - T").with_row(ConfigRow::new("y", "v", "Copy")),
        ])
        .unwrap();

        let reversed = mapping.reversed();
        assert_eq!(reversed.lookup("T", "v").unwrap().target_sheet, "A");
        assert_eq!(reversed.len(), 2);
    }

    #[test]
    fn test_oriented() {
        let mapping = sample();
        assert_eq!(mapping.clone().oriented(Direction::Forward), mapping);
        assert_eq!(mapping.clone().oriented(Direction::Reverse), mapping.reversed());
    }
}
