//! Golden hash tests for grading output.
//!
//! The expected hashes come from an independent float model of the same
//! lookup, so any change to coordinate mapping, tetrahedron selection,
//! summation order or output encoding shows up as a hash mismatch.
//!
//! # Architecture
//!
//! 1. `parity/generate_golden.py` rebuilds the fixtures and grades them
//! 2. It writes SHA256 hashes of the output bytes to `golden/hashes.json`
//! 3. These tests grade the same fixtures and compare hashes
//!
//! # Regenerating
//!
//! ```bash
//! python crates/nightfall-tests/parity/generate_golden.py
//! ```

use sha2::{Digest, Sha256};
use std::collections::HashMap;

const HASHES: &str = include_str!("../golden/hashes.json");

#[derive(Debug, serde::Deserialize)]
struct GoldenData {
    #[allow(dead_code)]
    version: String,
    tests: HashMap<String, String>,
}

fn load_golden() -> GoldenData {
    serde_json::from_str(HASHES).expect("golden/hashes.json is valid")
}

/// Hex SHA256 of a byte buffer.
fn compute_hash(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod grading_tests {
    use super::*;
    use crate::fixtures;
    use nightfall_lut::{
        CubeSampling, LutFormat, TransformOptions, apply_lookup_table_with, parse_lookup_table,
        read_lookup_table,
    };

    fn check(name: &str, output: &[u8]) {
        let golden = load_golden();
        let expected = golden
            .tests
            .get(name)
            .unwrap_or_else(|| panic!("no golden hash for {}", name));
        let actual = compute_hash(output);
        assert_eq!(&actual, expected, "{} output changed", name);
    }

    #[test]
    fn test_sunset_legacy() {
        let lut = parse_lookup_table(&fixtures::sunset_cube(), LutFormat::Cube).unwrap();
        let out =
            apply_lookup_table_with(&lut, &fixtures::ramp(), &TransformOptions::default()).unwrap();
        check("sunset_legacy", &out);
    }

    #[test]
    fn test_sunset_normalized() {
        let lut = parse_lookup_table(&fixtures::sunset_cube(), LutFormat::Cube).unwrap();
        let options = TransformOptions::default().with_sampling(CubeSampling::Normalized);
        let out = apply_lookup_table_with(&lut, &fixtures::ramp(), &options).unwrap();
        check("sunset_normalized", &out);
    }

    #[test]
    fn test_night() {
        let lut = parse_lookup_table(&fixtures::night_3dl(), LutFormat::ThreeDl).unwrap();
        let out =
            apply_lookup_table_with(&lut, &fixtures::ramp(), &TransformOptions::default()).unwrap();
        check("night", &out);
    }

    #[test]
    fn test_night_from_disk_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("night.3dl");
        std::fs::write(&path, fixtures::night_3dl()).unwrap();

        let lut = read_lookup_table(&path).unwrap();
        let options = TransformOptions::default().sequential();
        let out = apply_lookup_table_with(&lut, &fixtures::ramp(), &options).unwrap();
        check("night", &out);
    }

    #[test]
    fn test_hash_format() {
        // SHA256 of the empty input
        assert_eq!(
            compute_hash(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
