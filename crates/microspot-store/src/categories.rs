//! The closed three-level listing taxonomy.
//!
//! One definition of which sub-categories each main category accepts,
//! consumed by both input validation and the search query builder.  A
//! specific type is a free string but only meaningful under a valid
//! `(main, sub)` pair.

use crate::models::{MainCategory, SubCategory};

/// The sub-categories a main category accepts.  Empty slice means the
/// category carries a direct specific type with no intermediate level.
pub fn allowed_sub_categories(main: MainCategory) -> &'static [SubCategory] {
    match main {
        MainCategory::VendingMachine => &[
            SubCategory::Food,
            SubCategory::Farm,
            SubCategory::Goods,
            SubCategory::Pet,
        ],
        MainCategory::Kiosk => &[SubCategory::Food, SubCategory::Other, SubCategory::Wellness],
        MainCategory::Arcade | MainCategory::Logistics | MainCategory::Misc => &[],
    }
}

/// A rejected category selection, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSelection(pub String);

impl std::fmt::Display for InvalidSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvalidSelection {}

/// Validate a `(main, sub, specific)` selection against the closed set.
///
/// Rules:
/// - a sub-category must belong to the main category's allowed set;
/// - categories without sub-categories must not carry one;
/// - under `VendingMachine` and `Kiosk`, a specific type requires a
///   sub-category to scope it.
pub fn validate_selection(
    main: MainCategory,
    sub: Option<SubCategory>,
    specific: Option<&str>,
) -> Result<(), InvalidSelection> {
    let allowed = allowed_sub_categories(main);

    match sub {
        Some(sub) if allowed.is_empty() => {
            return Err(InvalidSelection(format!(
                "category {} does not take a sub-category (got {})",
                main.as_str(),
                sub.as_str()
            )));
        }
        Some(sub) if !allowed.contains(&sub) => {
            return Err(InvalidSelection(format!(
                "sub-category {} is not valid for category {}",
                sub.as_str(),
                main.as_str()
            )));
        }
        None if specific.is_some() && !allowed.is_empty() => {
            return Err(InvalidSelection(format!(
                "a specific type under category {} requires a sub-category",
                main.as_str()
            )));
        }
        _ => {}
    }

    if let Some(specific) = specific {
        if specific.trim().is_empty() {
            return Err(InvalidSelection("specific type must not be blank".into()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vending_machine_accepts_its_four_subs() {
        for sub in [
            SubCategory::Food,
            SubCategory::Farm,
            SubCategory::Goods,
            SubCategory::Pet,
        ] {
            validate_selection(MainCategory::VendingMachine, Some(sub), Some("PIZZA")).unwrap();
        }
    }

    #[test]
    fn kiosk_rejects_vending_subs() {
        let err = validate_selection(MainCategory::Kiosk, Some(SubCategory::Farm), None);
        assert!(err.is_err());
    }

    #[test]
    fn arcade_takes_direct_specific_type() {
        validate_selection(MainCategory::Arcade, None, Some("CLAW_MACHINE")).unwrap();
        assert!(validate_selection(MainCategory::Arcade, Some(SubCategory::Food), None).is_err());
    }

    #[test]
    fn specific_type_needs_sub_under_two_level_categories() {
        assert!(validate_selection(MainCategory::VendingMachine, None, Some("PIZZA")).is_err());
        assert!(validate_selection(MainCategory::Kiosk, None, Some("CREPES")).is_err());
    }

    #[test]
    fn blank_specific_type_rejected() {
        assert!(
            validate_selection(MainCategory::Misc, None, Some("  ")).is_err()
        );
    }

    #[test]
    fn bare_main_category_is_fine() {
        validate_selection(MainCategory::VendingMachine, None, None).unwrap();
        validate_selection(MainCategory::Misc, None, None).unwrap();
    }
}
