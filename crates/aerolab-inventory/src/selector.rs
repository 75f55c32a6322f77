//! Node and target selector syntax
//!
//! Nodes: comma-separated tokens, each a positive number or an inclusive
//! `A-B` range with `A <= B`, e.g. `1,3,5-7`. The empty string selects every
//! node and is kept distinct from an empty set.
//!
//! Targets: comma-separated exact names, e.g. `mydc,mydc2`.

use crate::error::{InventoryError, Result};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Widest `A-B` range a selector may expand to
pub const MAX_RANGE_SPAN: u32 = 10_000;

/// Parsed node selector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeSelector {
    /// No restriction on node number
    #[default]
    All,
    /// Exactly these node numbers
    Only(BTreeSet<u32>),
}

impl NodeSelector {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(NodeSelector::All);
        }

        let mut nodes = BTreeSet::new();
        for token in input.split(',') {
            let token = token.trim();
            match token.split_once('-') {
                Some((start, end)) => {
                    let start = parse_node_number(start, token)?;
                    let end = parse_node_number(end, token)?;
                    if start > end {
                        return Err(InventoryError::invalid_selector(
                            token,
                            "range start is greater than range end",
                        ));
                    }
                    if end - start >= MAX_RANGE_SPAN {
                        return Err(InventoryError::invalid_selector(
                            token,
                            format!("range spans more than {} nodes", MAX_RANGE_SPAN),
                        ));
                    }
                    nodes.extend(start..=end);
                }
                None => {
                    nodes.insert(parse_node_number(token, token)?);
                }
            }
        }
        Ok(NodeSelector::Only(nodes))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, NodeSelector::All)
    }

    /// Requested node numbers, `None` when unrestricted
    pub fn nodes(&self) -> Option<&BTreeSet<u32>> {
        match self {
            NodeSelector::All => None,
            NodeSelector::Only(nodes) => Some(nodes),
        }
    }
}

impl std::fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeSelector::All => Ok(()),
            NodeSelector::Only(nodes) => {
                let parts: Vec<String> = nodes.iter().map(u32::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl FromStr for NodeSelector {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        NodeSelector::parse(s)
    }
}

fn parse_node_number(part: &str, token: &str) -> Result<u32> {
    let part = part.trim();
    if part.is_empty() {
        return Err(InventoryError::invalid_selector(token, "expected a node number"));
    }
    let number: u32 = part
        .parse()
        .map_err(|_| InventoryError::invalid_selector(token, "not a positive number"))?;
    if number == 0 {
        return Err(InventoryError::invalid_selector(token, "node numbers start at 1"));
    }
    Ok(number)
}

/// Expand a node selector string into node numbers; `Ok(None)` means unrestricted
pub fn expand_node_selector(input: &str) -> Result<Option<BTreeSet<u32>>> {
    Ok(NodeSelector::parse(input)?.nodes().cloned())
}

/// Split a comma-separated target list, trimming blanks and dropping empty entries
pub fn expand_target_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_list_and_ranges() {
        let nodes = expand_node_selector("1,3,5-7").unwrap().unwrap();
        assert_eq!(nodes, BTreeSet::from([1, 3, 5, 6, 7]));
    }

    #[test]
    fn test_empty_is_unrestricted() {
        assert_eq!(NodeSelector::parse("").unwrap(), NodeSelector::All);
        assert_eq!(expand_node_selector("  ").unwrap(), None);
        assert!(NodeSelector::parse("").unwrap().is_all());
    }

    #[test]
    fn test_duplicates_and_order_collapse() {
        let a = NodeSelector::parse("3,1-3,2").unwrap();
        let b = NodeSelector::parse("1,2,3").unwrap();
        assert_eq!(a, b);
        assert_eq!(NodeSelector::parse("4-4").unwrap().nodes().unwrap().len(), 1);
        assert_eq!(a.to_string(), "1,2,3");
    }

    #[test]
    fn test_whitespace_around_tokens() {
        let nodes = expand_node_selector(" 1 , 2 - 3 ").unwrap().unwrap();
        assert_eq!(nodes, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_invalid_tokens_name_the_token() {
        for (input, token) in [
            ("3-1", "3-1"),
            ("abc", "abc"),
            ("1,x", "x"),
            ("0", "0"),
            ("-2", "-2"),
            ("1,,2", ""),
            ("1-", "1-"),
            ("2-a", "2-a"),
        ] {
            match NodeSelector::parse(input) {
                Err(InventoryError::InvalidSelector { token: t, .. }) => {
                    assert_eq!(t, token, "input {input:?}")
                }
                other => panic!("expected validation error for {input:?}, got {other:?}"),
            }
        }
        assert!(NodeSelector::parse("abc").unwrap_err().is_validation());
    }

    #[test]
    fn test_oversized_range_is_rejected() {
        match NodeSelector::parse("1,1-4000000000") {
            Err(InventoryError::InvalidSelector { token, reason }) => {
                assert_eq!(token, "1-4000000000");
                assert!(reason.contains("10000"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let widest = NodeSelector::parse("1-10000").unwrap();
        assert_eq!(widest.nodes().unwrap().len(), 10_000);
    }

    #[test]
    fn test_expand_target_list() {
        assert_eq!(expand_target_list("mydc,mydc2"), vec!["mydc", "mydc2"]);
        assert_eq!(expand_target_list(" mydc , , mydc2 "), vec!["mydc", "mydc2"]);
        assert!(expand_target_list("").is_empty());
        assert_eq!(expand_target_list("single"), vec!["single"]);
    }
}
