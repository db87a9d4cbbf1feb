//! Capture matrix builder.
//!
//! Expands multiplexing parameters into the cartesian product of parameter
//! combinations, one capture group each:
//!
//! ```text
//! {host: [h1, h2], disk: [sda, sdb]}
//!   -> {host: h1, disk: sda}, {host: h2, disk: sda},
//!      {host: h1, disk: sdb}, {host: h2, disk: sdb}
//! ```
//!
//! This exists to support captures multiplexed across hosts and devices.

use capmux_proto::{Error, MultiParams, Result};
use std::collections::BTreeMap;

/// Expands `params` into all parameter combinations.
///
/// Builds the product by folding one parameter at a time over the
/// accumulated partial combinations, following insertion order (which
/// determines output ordering only). Zero parameters produce exactly one
/// empty combination.
///
/// # Errors
///
/// [`Error::InvalidConfiguration`] when any parameter has no candidate
/// values, since that would silently produce an empty matrix.
pub fn build_capture_matrix(params: &MultiParams) -> Result<Vec<BTreeMap<String, String>>> {
    let mut matrix: Vec<BTreeMap<String, String>> = vec![BTreeMap::new()];

    for (name, values) in params.iter() {
        if values.is_empty() {
            return Err(Error::invalid_config(format!(
                "parameter '{name}' has no candidate values"
            )));
        }

        let mut expanded = Vec::with_capacity(matrix.len() * values.len());
        for value in values {
            for combination in &matrix {
                let mut next = combination.clone();
                next.insert(name.to_string(), value.clone());
                expanded.push(next);
            }
        }
        matrix = expanded;
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn combo(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_two_by_two_product() {
        let params = MultiParams::new()
            .with("host", ["h1", "h2"])
            .with("disk", ["sda", "sdb"]);

        let matrix = build_capture_matrix(&params).unwrap();
        assert_eq!(matrix.len(), 4);

        let expected: BTreeSet<_> = [
            combo(&[("host", "h1"), ("disk", "sda")]),
            combo(&[("host", "h1"), ("disk", "sdb")]),
            combo(&[("host", "h2"), ("disk", "sda")]),
            combo(&[("host", "h2"), ("disk", "sdb")]),
        ]
        .into_iter()
        .collect();
        let actual: BTreeSet<_> = matrix.into_iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_product_size_matches_candidate_counts() {
        let params = MultiParams::new()
            .with("a", ["1", "2", "3"])
            .with("b", ["x", "y"])
            .with("c", ["p", "q", "r", "s"]);

        let matrix = build_capture_matrix(&params).unwrap();
        assert_eq!(matrix.len(), 3 * 2 * 4);

        // All combinations are unique
        let unique: BTreeSet<_> = matrix.iter().cloned().collect();
        assert_eq!(unique.len(), matrix.len());
    }

    #[test]
    fn test_zero_parameters_yield_one_empty_group() {
        let matrix = build_capture_matrix(&MultiParams::new()).unwrap();
        assert_eq!(matrix, vec![BTreeMap::new()]);
    }

    #[test]
    fn test_single_parameter() {
        let params = MultiParams::new().with("host", ["h1", "h2", "h3"]);
        let matrix = build_capture_matrix(&params).unwrap();

        let hosts: BTreeSet<&str> = matrix.iter().map(|c| c["host"].as_str()).collect();
        assert_eq!(hosts, BTreeSet::from(["h1", "h2", "h3"]));
    }

    #[test]
    fn test_empty_candidate_list_is_invalid() {
        let params = MultiParams::new()
            .with("host", ["h1"])
            .with("disk", Vec::<String>::new());

        let err = build_capture_matrix(&params).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert!(err.to_string().contains("disk"));
    }
}
