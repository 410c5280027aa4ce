//! Sort expression parsing.
//!
//! A raw sort expression is a list of `"<field> [asc|desc]"` entries; a
//! single entry may itself be a comma-separated list, matching the documented
//! wire format (`"name desc, updatedAt asc"`). Fields are checked against a
//! per-resource allow-list; direction defaults to ascending when omitted or
//! unrecognized. Repositories apply the resulting pairs in order as primary,
//! secondary, ... tie-breakers with NULLS LAST.

use sea_orm::Order;

use crate::errors::ServiceError;

pub type SortSpec = Vec<(String, Order)>;

pub fn parse_sort(raw: &[String], allowed: &[&str]) -> Result<SortSpec, ServiceError> {
    let mut spec = Vec::new();
    for entry in raw {
        for segment in entry.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let mut parts = segment.split_whitespace();
            let key = parts.next().unwrap_or_default();
            if !allowed.contains(&key) {
                return Err(ServiceError::InvalidSort(key.to_string()));
            }
            let order = match parts.next() {
                Some(direction) if direction.eq_ignore_ascii_case("desc") => Order::Desc,
                _ => Order::Asc,
            };
            spec.push((key.to_string(), order));
        }
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["name", "updatedAt"];

    fn owned(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input_yields_empty_spec() {
        assert!(parse_sort(&[], ALLOWED).unwrap().is_empty());
    }

    #[test]
    fn single_entry_with_direction() {
        let spec = parse_sort(&owned(&["name desc"]), ALLOWED).unwrap();
        assert_eq!(spec, vec![("name".to_string(), Order::Desc)]);

        let spec = parse_sort(&owned(&["updatedAt asc"]), ALLOWED).unwrap();
        assert_eq!(spec, vec![("updatedAt".to_string(), Order::Asc)]);
    }

    #[test]
    fn multiple_entries_keep_order() {
        let spec = parse_sort(&owned(&["name desc", "updatedAt asc"]), ALLOWED).unwrap();
        assert_eq!(
            spec,
            vec![
                ("name".to_string(), Order::Desc),
                ("updatedAt".to_string(), Order::Asc),
            ]
        );
    }

    #[test]
    fn comma_separated_entry_is_split() {
        let spec = parse_sort(&owned(&["name desc, updatedAt asc"]), ALLOWED).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0].0, "name");
        assert_eq!(spec[1].0, "updatedAt");
    }

    #[test]
    fn unsupported_key_names_the_offender() {
        let err = parse_sort(&owned(&["bogus asc"]), ALLOWED).unwrap_err();
        match err {
            ServiceError::InvalidSort(key) => assert_eq!(key, "bogus"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn direction_defaults_to_ascending() {
        let spec = parse_sort(&owned(&["name"]), ALLOWED).unwrap();
        assert_eq!(spec, vec![("name".to_string(), Order::Asc)]);

        // unrecognized direction falls back to ascending too
        let spec = parse_sort(&owned(&["name sideways"]), ALLOWED).unwrap();
        assert_eq!(spec, vec![("name".to_string(), Order::Asc)]);
    }

    #[test]
    fn duplicate_keys_are_both_applied() {
        let spec = parse_sort(&owned(&["name asc", "name desc"]), ALLOWED).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec[1], ("name".to_string(), Order::Desc));
    }
}
