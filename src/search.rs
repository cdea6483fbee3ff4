//! Pattern search over the memory regions of a document. Regions are the
//! contiguity unit, so matches never span a gap.

use crate::region::MemoryRegion;
use regex::bytes::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchType {
    Hex(Vec<u8>),
    Ascii(String),
    Regex(String),
}

/// Searches for a pattern in the region data.
/// Returns the absolute starting addresses of all matches.
pub fn search(regions: &[MemoryRegion], search_type: &SearchType) -> Vec<u64> {
    match search_type {
        SearchType::Hex(p) => search_bytes(regions, p),
        SearchType::Ascii(s) => search_bytes(regions, s.as_bytes()),
        SearchType::Regex(p) => search_regex(regions, p),
    }
}

/// Sliding window search within each region.
fn search_bytes(regions: &[MemoryRegion], pattern: &[u8]) -> Vec<u64> {
    let size = pattern.len();
    if size == 0 {
        return vec![];
    }

    let mut matches = Vec::new();

    for region in regions {
        for (offset, window) in region.data.windows(size).enumerate() {
            if window == pattern {
                matches.push(region.start + offset as u64);
            }
        }
    }

    matches
}

/// Regex search within each region.
fn search_regex(regions: &[MemoryRegion], pattern: &str) -> Vec<u64> {
    let Ok(re) = Regex::new(pattern) else {
        return vec![];
    };
    let mut matches = Vec::new();

    for region in regions {
        for mtch in re.find_iter(&region.data) {
            matches.push(region.start + mtch.start() as u64);
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn region_with(start: u64, data: Vec<u8>) -> MemoryRegion {
        let end = start + data.len() as u64;
        MemoryRegion { start, end, data }
    }

    #[test]
    fn test_search_bytes() {
        // Arrange
        let mut rng = rand::rng();
        let start_addr = 0x1000;
        let pattern = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE];

        let mut data: Vec<u8> = (0..256).map(|_| rng.random()).collect();
        let insert_at = 100;
        data.splice(insert_at..insert_at + pattern.len(), pattern.clone());
        let regions = [region_with(start_addr, data)];

        // Act
        let matches = search(&regions, &SearchType::Hex(pattern));

        // Assert
        assert!(matches.contains(&(start_addr + insert_at as u64)));
    }

    #[test]
    fn test_search_ascii() {
        // Arrange
        let regions = [region_with(0x200, b"...firmware v1.2...".to_vec())];

        // Act
        let matches = search(&regions, &SearchType::Ascii(String::from("firmware")));

        // Assert
        assert_eq!(matches, vec![0x203]);
    }

    #[test]
    fn test_search_does_not_cross_region_gap() {
        // Pattern split across two regions must not match
        let regions = [
            region_with(0x00, vec![0xAA, 0xBB]),
            region_with(0x10, vec![0xCC, 0xDD]),
        ];

        let matches = search(&regions, &SearchType::Hex(vec![0xBB, 0xCC]));

        assert!(matches.is_empty());
    }

    #[test]
    fn test_search_regex() {
        let regions = [region_with(0x40, b"ver=1.9 ver=2.0".to_vec())];

        let matches = search(&regions, &SearchType::Regex(String::from(r"ver=\d\.\d")));

        assert_eq!(matches, vec![0x40, 0x48]);
    }

    #[test]
    fn test_search_empty_pattern() {
        let regions = [region_with(0, vec![1, 2, 3])];
        assert!(search(&regions, &SearchType::Hex(vec![])).is_empty());
    }

    #[test]
    fn test_search_invalid_regex() {
        let regions = [region_with(0, vec![1, 2, 3])];
        assert!(search(&regions, &SearchType::Regex(String::from("["))).is_empty());
    }
}
