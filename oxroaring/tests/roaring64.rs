use oxroaring::{Frozen, Portable, Treemap, TreemapView};

fn expected_serialized_treemap() -> Treemap {
    let mut treemap = Treemap::new();

    for i in 0..2u64 {
        let base = i << 32;
        // Run containers
        treemap.add_range(base | 0x0_0000..=base | 0x0_9000);
        treemap.add_range(base | 0x0_A000..=base | 0x1_0000);
        // Array container
        treemap.add(base | 0x2_0000);
        treemap.add(base | 0x2_0005);
        // Bitset container
        for j in (0..0x1_0000).step_by(2) {
            treemap.add(base | (0x8_0000 + j));
        }
    }
    treemap.run_optimize();
    treemap
}

#[test]
fn test_portable_roundtrip() {
    let treemap = expected_serialized_treemap();
    let serialized = treemap.serialize::<Portable>();
    assert_eq!(
        serialized.len(),
        treemap.get_serialized_size_in_bytes::<Portable>()
    );
    let deserialized = Treemap::deserialize::<Portable>(&serialized);
    assert_eq!(deserialized, treemap);
    assert!(deserialized.iter().eq(treemap.iter()));
}

#[test]
fn test_frozen_view() {
    let treemap = expected_serialized_treemap();
    let mut buffer = Vec::new();
    let data = treemap.serialize_into_vec::<Frozen>(&mut buffer);
    assert_eq!(data.len(), treemap.get_serialized_size_in_bytes::<Frozen>());
    assert_eq!(data.as_ptr() as usize % Frozen::REQUIRED_ALIGNMENT, 0);

    let view = TreemapView::deserialize::<Frozen>(data).unwrap();
    assert_eq!(view, treemap);
    assert_eq!(view.cardinality(), treemap.cardinality());
    assert_eq!(view.minimum(), treemap.minimum());
    assert_eq!(view.maximum(), treemap.maximum());
    assert!(view.contains(1 << 32 | 0x2_0005));
    assert!(!view.contains(1 << 32 | 0x2_0006));
    assert_eq!(view.to_treemap(), treemap);
}

#[test]
fn frozen_view_outlives_nothing() {
    // The view borrows the buffer; lifetime rules keep the buffer alive.
    let treemap = Treemap::of(&[1, 2, 3, u64::MAX]);
    let mut buffer = Vec::new();
    let data = treemap.serialize_into_vec::<Frozen>(&mut buffer);
    let view = TreemapView::deserialize::<Frozen>(data).unwrap();
    assert_eq!(view.to_treemap(), treemap);
}

#[test]
fn frozen_truncated_is_refused() {
    let treemap = expected_serialized_treemap();
    let mut buffer = Vec::new();
    let data = treemap.serialize_into_vec::<Frozen>(&mut buffer).to_vec();
    // Keep the alignment of the original buffer by re-serializing into an
    // aligned vec and slicing shorter.
    let mut aligned = Vec::new();
    let full = treemap.serialize_into_vec::<Frozen>(&mut aligned);
    for len in (0..data.len()).step_by(97) {
        assert!(
            TreemapView::deserialize::<Frozen>(&full[..len]).is_err(),
            "prefix of {len} bytes must be refused",
        );
    }
}

#[test]
fn treemap_truncated_portable_is_refused() {
    let treemap = expected_serialized_treemap();
    let serialized = treemap.serialize::<Portable>();
    for len in (0..serialized.len()).step_by(173) {
        assert!(Treemap::try_deserialize::<Portable>(&serialized[..len]).is_err());
    }
}

#[test]
fn iteration_is_ordered_across_boundaries() {
    let values = [
        0u64,
        5,
        0xFFFF_FFFF,
        0x1_0000_0000,
        0x1_0000_0001,
        0xDEAD_BEEF_CAFE,
        u64::MAX - 1,
        u64::MAX,
    ];
    let treemap = Treemap::of(&values);
    assert_eq!(treemap.to_vec(), values);
    assert!(treemap.iter().eq(values.iter().copied()));

    let mut cursor = treemap.cursor();
    for &value in &values {
        assert_eq!(cursor.current(), Some(value));
        cursor.next();
    }
    assert!(!cursor.has_value());
    // Walk back from past-the-end.
    for &value in values.iter().rev() {
        assert_eq!(cursor.prev(), Some(value));
    }
    assert_eq!(cursor.prev(), None);
}

#[test]
fn cursor_matches_reverse_iteration() {
    let mut treemap = Treemap::new();
    treemap.add_range(10..=20);
    treemap.add_range(1 << 40..=(1 << 40) + 5);

    let forward: Vec<u64> = treemap.iter().collect();
    let mut backward = Vec::with_capacity(forward.len());
    let mut cursor = treemap.cursor_to_last();
    while let Some(value) = cursor.current() {
        backward.push(value);
        cursor.prev();
    }
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn subset_across_outer_keys() {
    let big = Treemap::of(&[1, 2, 1 << 36, (1 << 36) + 1, u64::MAX]);
    let small = Treemap::of(&[2, (1 << 36) + 1]);
    assert!(small.is_subset(&big));
    assert!(small.is_strict_subset(&big));
    assert!(!big.is_subset(&small));
    assert!(big.is_subset(&big));
    assert!(!big.is_strict_subset(&big));

    // Strictness is also proven by an extra outer key alone.
    let other = Treemap::of(&[1, 2, 1 << 36, (1 << 36) + 1, u64::MAX, 1 << 50]);
    assert!(big.is_strict_subset(&other));
}

#[test]
fn fastunion_spread_inputs() {
    let a = Treemap::of(&[1, 1 << 33]);
    let b = Treemap::of(&[2, 1 << 33, 1 << 34]);
    let c = Treemap::new();
    let d = Treemap::of(&[u64::MAX]);

    let union = Treemap::fast_or(&[&a, &b, &c, &d]);
    assert_eq!(
        union.to_vec(),
        [1, 2, 1 << 33, 1 << 34, u64::MAX],
    );
    assert_eq!(Treemap::fast_or(&[]), Treemap::new());
    assert_eq!(Treemap::fast_or(&[&a]), a);
}

#[test]
fn treemap_range_spanning_many_outer_keys() {
    let mut treemap = Treemap::new();
    let start = (1u64 << 32) - 2;
    let end = (3u64 << 32) + 2;
    treemap.add_range(start..=end);
    assert_eq!(treemap.cardinality(), end - start + 1);
    assert!(treemap.contains(start));
    assert!(treemap.contains(2 << 32));
    assert!(treemap.contains(end));
    assert!(!treemap.contains(start - 1));
    assert!(!treemap.contains(end + 1));

    treemap.remove_range(start + 1..=end - 1);
    assert_eq!(treemap.to_vec(), [start, end]);
    assert!(treemap.map.values().all(|bitmap| !bitmap.is_empty()));
}
