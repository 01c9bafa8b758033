//! Numeric range selectors.
//!
//! Parses loosely typed selectors such as `"1-5, 7, 9-12"` into the set of
//! numbers they denote. Parsing never fails: malformed tokens (non-numeric,
//! negative, reversed ranges, empty tokens, oversized ranges) contribute
//! nothing and the rest of the input is still honoured.

use std::collections::BTreeSet;

/// Largest number of values a single `start-end` token may expand to.
pub const MAX_RANGE_SPAN: u32 = 10_000;

/// Parse a selector into a strictly ascending list of unique numbers.
pub fn parse_range_input(input: &str) -> Vec<u32> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let mut numbers = BTreeSet::new();

    for token in compact.split(',') {
        match token.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) else {
                    continue;
                };
                if start > end || end - start >= MAX_RANGE_SPAN {
                    continue;
                }
                numbers.extend(start..=end);
            }
            None => {
                if let Ok(n) = token.parse::<u32>() {
                    numbers.insert(n);
                }
            }
        }
    }

    numbers.into_iter().collect()
}
