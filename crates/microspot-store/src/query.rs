//! The listing search filter builder.
//!
//! Translates an arbitrary subset of recognized search parameters into a
//! SQL `WHERE` clause plus a parameter vector, evaluated over the
//! `listings` table.  The base predicate always restricts to `ACTIVE`
//! listings with a non-empty title; every supplied filter narrows the
//! result further (free text and location are conjoined, not last-one-wins).

use rusqlite::types::Value;

use crate::models::{ListingStatus, MainCategory, SpaceType, SubCategory};

/// The access-hours filter a client can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessFilter {
    /// Only listings accessible around the clock.
    #[serde(rename = "24_7")]
    RoundTheClock,
    /// Only listings with fixed opening hours.
    Scheduled,
}

/// An optional subset of search parameters.  `Default` is the empty filter,
/// which matches every active listing.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Free-text search over title and description.
    pub query: Option<String>,
    /// Substring match over city and postal code.
    pub location: Option<String>,
    pub main_category: Option<MainCategory>,
    pub sub_category: Option<SubCategory>,
    pub specific_type: Option<String>,
    pub space_type: Option<SpaceType>,
    pub min_surface: Option<f64>,
    pub max_surface: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Amenity flags only filter when explicitly requested.
    pub has_concrete_slab: bool,
    pub has_electricity: bool,
    pub has_water: bool,
    /// Matches listings whose internet type is set to anything.
    pub has_internet: bool,
    pub access: Option<AccessFilter>,
    /// Requires listings open at or before this `"HH:MM"` time (24/7
    /// listings always match).
    pub open_before: Option<String>,
    /// Requires listings open at or after this `"HH:MM"` time.
    pub open_after: Option<String>,
}

impl ListingFilter {
    /// Build the `WHERE` clause body and its positional parameters.
    ///
    /// The clause references the `listings` table under the alias `l` and
    /// uses `?` placeholders in parameter order.
    pub fn build_where(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        clauses.push("l.status = ?".into());
        params.push(Value::from(ListingStatus::Active.as_str().to_string()));
        clauses.push("l.title <> ''".into());

        if let Some(query) = non_blank(&self.query) {
            clauses.push("(l.title LIKE ? OR l.description LIKE ?)".into());
            let pattern = like_pattern(query);
            params.push(pattern.clone().into());
            params.push(pattern.into());
        }

        if let Some(location) = non_blank(&self.location) {
            clauses.push("(l.city LIKE ? OR l.postal_code LIKE ?)".into());
            let pattern = like_pattern(location);
            params.push(pattern.clone().into());
            params.push(pattern.into());
        }

        if let Some(main) = self.main_category {
            clauses.push("l.main_category = ?".into());
            params.push(Value::from(main.as_str().to_string()));
        }
        if let Some(sub) = self.sub_category {
            clauses.push("l.sub_category = ?".into());
            params.push(Value::from(sub.as_str().to_string()));
        }
        if let Some(specific) = non_blank(&self.specific_type) {
            clauses.push("l.specific_type = ?".into());
            params.push(Value::from(specific.to_string()));
        }
        if let Some(space) = self.space_type {
            clauses.push("l.space_type = ?".into());
            params.push(Value::from(space.as_str().to_string()));
        }

        if let Some(min) = self.min_surface {
            clauses.push("l.surface >= ?".into());
            params.push(min.into());
        }
        if let Some(max) = self.max_surface {
            clauses.push("l.surface <= ?".into());
            params.push(max.into());
        }
        if let Some(min) = self.min_price {
            clauses.push("l.price >= ?".into());
            params.push(min.into());
        }
        if let Some(max) = self.max_price {
            clauses.push("l.price <= ?".into());
            params.push(max.into());
        }

        if self.has_concrete_slab {
            clauses.push("l.has_concrete_slab = 1".into());
        }
        if self.has_electricity {
            clauses.push("l.has_electricity = 1".into());
        }
        if self.has_water {
            clauses.push("l.has_water = 1".into());
        }
        if self.has_internet {
            clauses.push("l.internet_type IS NOT NULL".into());
        }

        match self.access {
            Some(AccessFilter::RoundTheClock) => clauses.push("l.is_24_7 = 1".into()),
            Some(AccessFilter::Scheduled) => clauses.push("l.is_24_7 = 0".into()),
            None => {}
        }

        if let Some(open_before) = non_blank(&self.open_before) {
            clauses.push("(l.is_24_7 = 1 OR l.opening_time <= ?)".into());
            params.push(Value::from(open_before.to_string()));
        }
        if let Some(open_after) = non_blank(&self.open_after) {
            clauses.push("(l.is_24_7 = 1 OR l.closing_time >= ?)".into());
            params.push(Value::from(open_after.to_string()));
        }

        (clauses.join(" AND "), params)
    }
}

/// Treat empty and whitespace-only parameters as absent.
fn non_blank(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Substring pattern for a case-insensitive LIKE.
///
/// SQLite's LIKE is ASCII case-insensitive by default; `%` and `_` in user
/// input are not escaped, matching the substring semantics of the search
/// endpoints.
fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_keeps_base_predicate_only() {
        let (sql, params) = ListingFilter::default().build_where();
        assert_eq!(sql, "l.status = ? AND l.title <> ''");
        assert_eq!(params, vec![Value::from("ACTIVE".to_string())]);
    }

    #[test]
    fn text_and_location_conjoin() {
        let filter = ListingFilter {
            query: Some("pizza".into()),
            location: Some("Lyon".into()),
            ..Default::default()
        };
        let (sql, params) = filter.build_where();
        assert!(sql.contains("(l.title LIKE ? OR l.description LIKE ?)"));
        assert!(sql.contains("(l.city LIKE ? OR l.postal_code LIKE ?)"));
        // Both groups present, joined with AND.
        assert_eq!(sql.matches(" AND ").count(), 3);
        assert_eq!(params.len(), 5);
        assert_eq!(params[1], Value::from("%pizza%".to_string()));
        assert_eq!(params[3], Value::from("%Lyon%".to_string()));
    }

    #[test]
    fn blank_parameters_are_ignored() {
        let filter = ListingFilter {
            query: Some("   ".into()),
            specific_type: Some(String::new()),
            ..Default::default()
        };
        let (sql, _) = filter.build_where();
        assert_eq!(sql, "l.status = ? AND l.title <> ''");
    }

    #[test]
    fn range_bounds_are_independent() {
        let filter = ListingFilter {
            min_price: Some(100.0),
            ..Default::default()
        };
        let (sql, params) = filter.build_where();
        assert!(sql.contains("l.price >= ?"));
        assert!(!sql.contains("l.price <= ?"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn amenity_flags_only_filter_when_set() {
        let (sql, _) = ListingFilter::default().build_where();
        assert!(!sql.contains("has_electricity"));

        let filter = ListingFilter {
            has_electricity: true,
            has_internet: true,
            ..Default::default()
        };
        let (sql, _) = filter.build_where();
        assert!(sql.contains("l.has_electricity = 1"));
        assert!(sql.contains("l.internet_type IS NOT NULL"));
    }

    #[test]
    fn access_filter_maps_to_flag() {
        let filter = ListingFilter {
            access: Some(AccessFilter::RoundTheClock),
            ..Default::default()
        };
        assert!(filter.build_where().0.contains("l.is_24_7 = 1"));

        let filter = ListingFilter {
            access: Some(AccessFilter::Scheduled),
            ..Default::default()
        };
        assert!(filter.build_where().0.contains("l.is_24_7 = 0"));
    }

    #[test]
    fn open_window_admits_round_the_clock() {
        let filter = ListingFilter {
            open_before: Some("09:00".into()),
            open_after: Some("18:00".into()),
            ..Default::default()
        };
        let (sql, params) = filter.build_where();
        assert!(sql.contains("(l.is_24_7 = 1 OR l.opening_time <= ?)"));
        assert!(sql.contains("(l.is_24_7 = 1 OR l.closing_time >= ?)"));
        assert_eq!(params.len(), 3);
    }
}
