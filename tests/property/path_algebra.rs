// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Path Codec and Path Set Algebra
//!
//! These tests check, for arbitrary department sets:
//! - the codec round-trips every dotted path
//! - minimal cover is idempotent and antichain-shaped
//! - full expansion is invariant under taking the minimal cover first

use cim_asset_sync::domain::{DottedPath, PathCodec, PathSet};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Segment without `.`, `/` or `,`; includes non-ASCII department names
fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9_-]{1,8}",
        Just("运维".to_string()),
        Just("研发中心".to_string()),
    ]
}

/// Dotted path drawn from a small alphabet so prefixes collide often
fn dotted_path() -> impl Strategy<Value = DottedPath> {
    prop::collection::vec(prop_oneof![Just("A"), Just("B"), Just("C")], 1..5).prop_map(
        |segments| DottedPath::new(segments.join(".")).expect("generated path is valid"),
    )
}

fn path_set() -> impl Strategy<Value = PathSet> {
    prop::collection::vec(dotted_path(), 0..12).prop_map(|paths| paths.into_iter().collect())
}

// ============================================================================
// Codec
// ============================================================================

proptest! {
    #[test]
    fn prop_codec_round_trip(segments in prop::collection::vec(segment(), 1..6)) {
        let codec = PathCodec::default();
        let path = DottedPath::new(segments.join(".")).unwrap();
        let remote = codec.to_remote(&path);

        prop_assert!(remote.as_str().starts_with("/DEFAULT/C3/"));
        prop_assert_eq!(codec.to_dotted(&remote).unwrap(), path);
    }

    #[test]
    fn prop_remote_name_is_last_segment(segments in prop::collection::vec(segment(), 1..6)) {
        let codec = PathCodec::default();
        let path = DottedPath::new(segments.join(".")).unwrap();
        let remote = codec.to_remote(&path);
        prop_assert_eq!(remote.name(), path.name());
    }
}

// ============================================================================
// Minimal cover and full expansion
// ============================================================================

proptest! {
    #[test]
    fn prop_minimal_cover_idempotent(set in path_set()) {
        let cover = set.minimal_cover();
        prop_assert_eq!(cover.minimal_cover(), cover);
    }

    #[test]
    fn prop_minimal_cover_is_antichain(set in path_set()) {
        let cover = set.minimal_cover();
        for a in cover.iter() {
            for b in cover.iter() {
                prop_assert!(!a.is_strict_prefix_of(b), "{} is a prefix of {}", a, b);
            }
        }
    }

    #[test]
    fn prop_minimal_cover_subset_of_input(set in path_set()) {
        for path in set.minimal_cover().iter() {
            prop_assert!(set.contains(path));
        }
    }

    #[test]
    fn prop_cover_within_expansion(set in path_set()) {
        let expansion = set.full_expansion();
        for path in set.minimal_cover().iter() {
            prop_assert!(expansion.contains(path));
        }
    }

    #[test]
    fn prop_expansion_invariant_under_cover(set in path_set()) {
        prop_assert_eq!(set.minimal_cover().full_expansion(), set.full_expansion());
    }

    #[test]
    fn prop_expansion_closed_under_prefix(set in path_set()) {
        let expansion = set.full_expansion();
        for path in expansion.iter() {
            for prefix in path.prefixes() {
                prop_assert!(expansion.contains(&prefix));
            }
        }
    }

    #[test]
    fn prop_shortest_first_orders_parents_before_children(set in path_set()) {
        let expansion = set.full_expansion();
        let ordered = expansion.shortest_first();
        for (i, earlier) in ordered.iter().enumerate() {
            for later in &ordered[i + 1..] {
                prop_assert!(!later.is_strict_prefix_of(earlier));
            }
        }
    }
}

#[test]
fn test_minimal_cover_example() {
    let set = PathSet::parse("A, A.B, A.C, X").unwrap();
    assert_eq!(set.minimal_cover(), PathSet::parse("A.B, A.C, X").unwrap());
}

#[test]
fn test_full_expansion_example() {
    let set = PathSet::parse("A.B.C").unwrap();
    assert_eq!(set.full_expansion(), PathSet::parse("A, A.B, A.B.C").unwrap());
}
