use std::collections::BTreeMap;

use oxroaring::{Bitmap, BitmapView, Frozen, JvmLegacy, Native, Portable, Treemap};
use proptest::prelude::*;

// borrowed and adapted from https://github.com/Nemo157/roaring-rs/blob/5089f180ca7e17db25f5c58023f4460d973e747f/tests/lib.rs#L7-L37
#[test]
fn smoke1() {
    let mut bitmap = Bitmap::new();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.remove(0);
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.add(1);
    assert!(bitmap.contains(1));
    assert_eq!(bitmap.cardinality(), 1);
    assert!(!bitmap.is_empty());
    bitmap.add(u32::MAX - 2);
    assert!(bitmap.contains(u32::MAX - 2));
    assert_eq!(bitmap.cardinality(), 2);
    bitmap.add(u32::MAX);
    assert!(bitmap.contains(u32::MAX));
    assert_eq!(bitmap.cardinality(), 3);
    bitmap.add(2);
    assert!(bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 4);
    bitmap.remove(2);
    assert!(!bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 3);
    assert!(!bitmap.contains(0));
    assert!(bitmap.contains(1));
    assert!(!bitmap.contains(100));
    assert!(bitmap.contains(u32::MAX - 2));
    assert!(!bitmap.contains(u32::MAX - 1));
    assert!(bitmap.contains(u32::MAX));
    bitmap.clear();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
}

// borrowed and adapted from https://github.com/RoaringBitmap/gocroaring/blob/4a2fc02f79b1c36b904301e7d052f7f0017b6973/gocroaring_test.go#L24-L64
#[test]
fn smoke2() {
    let mut rb1 = Bitmap::new();
    rb1.add(1);
    rb1.add(2);
    rb1.add(3);
    rb1.add(4);
    rb1.add(5);
    rb1.add(100);
    rb1.add(1000);
    rb1.run_optimize();

    let mut rb2 = Bitmap::new();
    rb2.add(3);
    rb2.add(4);
    rb2.add(1000);
    rb2.run_optimize();

    let mut rb3 = Bitmap::new();

    assert_eq!(rb1.cardinality(), 7);
    assert!(rb1.contains(3));

    rb1.and_inplace(&rb2);
    rb3.add(5);
    rb3.or_inplace(&rb1);

    assert_eq!(rb3.to_vec(), [3, 4, 5, 1000]);

    let rb4 = Bitmap::fast_or(&[&rb1, &rb2, &rb3]);
    assert_eq!(rb4.to_vec(), [3, 4, 5, 1000]);
    assert_eq!(Bitmap::fast_or_heap(&[&rb1, &rb2, &rb3]), rb4);
}

fn expected_serialized_bitmap() -> Bitmap {
    let mut bitmap = Bitmap::new();
    // Run containers
    bitmap.add_range(0x0_0000..0x0_9000);
    bitmap.add_range(0x0_A000..0x1_0000);
    // Array container
    bitmap.add(0x2_0000);
    bitmap.add(0x2_0005);
    // Bitset container
    for i in (0x8_0000..0x9_0000).step_by(2) {
        bitmap.add(i);
    }
    bitmap.run_optimize();
    bitmap
}

#[test]
fn empty_cursor() {
    let bitmap = Bitmap::new();
    let mut cursor = bitmap.cursor();
    assert!(!cursor.has_value());
    assert_eq!(cursor.current(), None);
    assert_eq!(cursor.prev(), None);
    assert_eq!(cursor.prev(), None);
    assert_eq!(cursor.next(), None);
    assert_eq!(cursor.next(), None);
}

#[test]
fn cursor_return_from_the_edge() {
    let bitmap = Bitmap::from([1, 2, u32::MAX]);
    let mut cursor = bitmap.cursor_to_last();
    assert_eq!(cursor.current(), Some(u32::MAX));
    assert_eq!(cursor.next(), None);
    assert_eq!(cursor.prev(), Some(u32::MAX));
    assert_eq!(cursor.prev(), Some(2));
    assert_eq!(cursor.prev(), Some(1));

    assert_eq!(cursor.current(), Some(1));
    assert_eq!(cursor.prev(), None);
    assert_eq!(cursor.prev(), None);
    assert_eq!(cursor.next(), Some(1));
}

#[test]
fn cursor_crosses_containers() {
    let bitmap = Bitmap::of(&[5, 0x1_0000, 0x2_0000, 0x2_0001]);
    let mut cursor = bitmap.cursor();
    assert_eq!(cursor.current(), Some(5));
    assert_eq!(cursor.next(), Some(0x1_0000));
    assert_eq!(cursor.next(), Some(0x2_0000));
    assert_eq!(cursor.prev(), Some(0x1_0000));
    assert_eq!(cursor.prev(), Some(5));
    assert_eq!(cursor.reset_to_last(), Some(0x2_0001));
    assert_eq!(cursor.reset_to_first(), Some(5));
}

#[test]
fn test_portable_roundtrip_and_view() {
    let bitmap = expected_serialized_bitmap();
    let serialized = bitmap.serialize::<Portable>();
    assert_eq!(serialized.len(), bitmap.get_serialized_size_in_bytes::<Portable>());

    let deserialized = Bitmap::try_deserialize::<Portable>(&serialized).unwrap();
    assert_eq!(deserialized, bitmap);

    let view = BitmapView::deserialize::<Portable>(&serialized).unwrap();
    assert_eq!(view, bitmap);
    assert!(view.iter().eq(bitmap.iter()));
}

#[test]
fn test_portable_layout_bytes() {
    // One array container, no runs: 12346 cookie, one descriptor, one
    // offset, then the values.
    let bitmap = Bitmap::of(&[1, 2, 0xFFFF]);
    let serialized = bitmap.serialize::<Portable>();
    let expected: Vec<u8> = [
        12346u32.to_le_bytes().as_slice(), // cookie
        1u32.to_le_bytes().as_slice(),     // container count
        0u16.to_le_bytes().as_slice(),     // key
        2u16.to_le_bytes().as_slice(),     // cardinality - 1
        16u32.to_le_bytes().as_slice(),    // offset of the body
        1u16.to_le_bytes().as_slice(),
        2u16.to_le_bytes().as_slice(),
        0xFFFFu16.to_le_bytes().as_slice(),
    ]
    .concat();
    assert_eq!(serialized, expected);
}

#[test]
fn test_native() {
    let bitmap = expected_serialized_bitmap();
    let serialized = bitmap.serialize::<Native>();
    assert_eq!(serialized.len(), bitmap.get_serialized_size_in_bytes::<Native>());
    let deserialized = Bitmap::try_deserialize::<Native>(&serialized).unwrap();
    assert_eq!(deserialized, bitmap);

    // Sparse bitmaps take the raw-list form and beat the portable size.
    let sparse = Bitmap::of(&[1, 0x1_0000, 0x2_0000, u32::MAX]);
    assert!(
        sparse.get_serialized_size_in_bytes::<Native>()
            < sparse.get_serialized_size_in_bytes::<Portable>()
    );
    let serialized = sparse.serialize::<Native>();
    assert_eq!(Bitmap::try_deserialize::<Native>(&serialized).unwrap(), sparse);
}

#[test]
fn test_frozen_view() {
    let bitmap = expected_serialized_bitmap();
    let mut buffer = vec![0; 13];
    let data = bitmap.serialize_into_vec::<Frozen>(&mut buffer);
    assert_eq!(data.len(), bitmap.get_serialized_size_in_bytes::<Frozen>());
    assert_eq!(data.as_ptr() as usize % Frozen::REQUIRED_ALIGNMENT, 0);

    let view = BitmapView::deserialize::<Frozen>(data).unwrap();
    assert_eq!(view, bitmap);
    assert!(view.iter().eq(bitmap.iter()));
    assert_eq!(view.to_bitmap(), bitmap);
}

#[test]
fn serialize_into_existing_vec_frozen() {
    let mut buffer = vec![1; 13];
    let bitmap = Bitmap::of(&[1, 2, 3, 4, 5]);

    let data = bitmap.serialize_into_vec::<Frozen>(&mut buffer);
    assert_eq!(BitmapView::deserialize::<Frozen>(data).unwrap(), bitmap);
    let data_ptr = data.as_ptr() as usize;
    let data_len = data.len();
    let data_range = {
        let start = data_ptr - buffer.as_ptr() as usize;
        start..start + data_len
    };
    assert!(data_range.start >= 13);
    assert!(buffer[..13].iter().all(|&b| b == 1));
}

#[test]
fn serialize_into_aligned_slice_frozen() {
    #[repr(align(32))]
    struct AlignedBuffer {
        data: [u8; 1024],
    }

    let bitmap = Bitmap::of(&[1, 2, 3, 4, 5]);
    let len = bitmap.get_serialized_size_in_bytes::<Frozen>();
    let mut buffer = AlignedBuffer { data: [0; 1024] };

    let data = bitmap.try_serialize_into::<Frozen>(&mut buffer.data).unwrap();
    assert_eq!(data.len(), len);
    assert_eq!(BitmapView::deserialize::<Frozen>(data).unwrap(), bitmap);

    // An unaligned destination is refused.
    assert!(bitmap.try_serialize_into::<Frozen>(&mut buffer.data[1..]).is_none());
}

#[test]
fn frozen_view_rejects_unaligned() {
    let bitmap = Bitmap::of(&[1, 2, 3]);
    let mut buffer = Vec::new();
    let data = bitmap.serialize_into_vec::<Frozen>(&mut buffer);
    let mut shifted = vec![0u8];
    shifted.extend_from_slice(data);
    // One of the two positions must be unaligned.
    let unaligned = if shifted.as_ptr() as usize % 32 == 0 {
        &shifted[1..]
    } else {
        &shifted[..]
    };
    assert!(BitmapView::deserialize::<Frozen>(unaligned).is_err());
}

#[test]
fn read_safe_refuses_any_truncated_prefix() {
    let bitmap = expected_serialized_bitmap();
    let serialized = bitmap.serialize::<Portable>();
    for len in 0..serialized.len() {
        assert!(
            Bitmap::try_deserialize::<Portable>(&serialized[..len]).is_err(),
            "prefix of {len} bytes must be refused",
        );
    }
    let native = bitmap.serialize::<Native>();
    for len in 0..native.len() {
        assert!(Bitmap::try_deserialize::<Native>(&native[..len]).is_err());
    }
}

#[test]
fn test_treemap_roundtrip_portable() {
    let mut treemap = Treemap::new();
    for i in 100..1000 {
        treemap.add(i);
    }
    treemap.add(u64::from(u32::MAX));
    treemap.add(u64::MAX);

    let serialized = treemap.serialize::<Portable>();
    assert_eq!(
        serialized.len(),
        treemap.get_serialized_size_in_bytes::<Portable>()
    );
    let deserialized = Treemap::try_deserialize::<Portable>(&serialized).unwrap();
    for i in 100..1000 {
        assert!(deserialized.contains(i));
    }
    assert!(deserialized.contains(u64::from(u32::MAX)));
    assert!(deserialized.contains(u64::MAX));
    assert_eq!(deserialized, treemap);
}

#[test]
fn test_treemap_roundtrip_jvm() {
    let mut treemap = Treemap::new();
    for i in 100..1000 {
        treemap.add(i);
    }
    treemap.add(u64::from(u32::MAX));
    treemap.add(u64::MAX);

    let serialized = treemap.serialize::<JvmLegacy>();
    assert_eq!(
        serialized.len(),
        treemap.get_serialized_size_in_bytes::<JvmLegacy>()
    );
    let deserialized = Treemap::try_deserialize::<JvmLegacy>(&serialized).unwrap();
    assert_eq!(deserialized, treemap);

    // The stream starts with the signedness byte and a big-endian count.
    assert_eq!(serialized[0], 0);
    assert_eq!(&serialized[1..5], &2u32.to_be_bytes());
}

#[test]
fn test_treemap_max_andnot_empty() {
    let single_max = Treemap::of(&[u64::MAX]);
    let empty = Treemap::new();
    let diff = single_max.andnot(&empty);
    assert_eq!(diff, single_max);

    let mut diff = single_max.clone();
    diff.andnot_inplace(&empty);
    assert_eq!(diff, single_max);
}

#[test]
fn treemap_remove_big_range() {
    let mut treemap = Treemap::new();
    let value = 0xFFFFFFFFFFFF038D;
    let range_end = 0xFFFFFFFFFF25FFFF_u64;
    treemap.add(value);

    assert!(range_end < value);
    treemap.remove_range(..value);
    assert!(treemap.contains(value));
    assert_eq!(treemap.cardinality(), 1);
}

#[test]
fn treemap_run_optimized() {
    let mut initial = Bitmap::new();
    initial.add(1);
    initial.add(2);
    initial.add(3);
    initial.add(4);
    initial.add(5);
    initial.add(100);
    initial.add(1000);
    let optimized = {
        let mut result = initial.clone();
        result.run_optimize();
        result
    };

    let tree_unoptimized = Treemap::from(BTreeMap::from([(1, initial.clone()), (2, initial)]));
    let tree_optimized = Treemap::from(BTreeMap::from([(1, optimized.clone()), (2, optimized)]));

    let mut test = tree_unoptimized.clone();
    test.run_optimize();
    assert_eq!(
        test.get_serialized_size_in_bytes::<JvmLegacy>(),
        tree_optimized.get_serialized_size_in_bytes::<JvmLegacy>()
    );
    test.remove_run_compression();
    assert_eq!(
        test.get_serialized_size_in_bytes::<JvmLegacy>(),
        tree_unoptimized.get_serialized_size_in_bytes::<JvmLegacy>()
    );
}

// Scenario: build a small set with a range tail and check the order
// statistics line up.
#[test]
fn rank_select_scenario() {
    let mut treemap = Treemap::new();
    treemap.add(1);
    treemap.add(2);
    treemap.add(3);
    treemap.add_range(5..=10);
    assert_eq!(treemap.cardinality(), 9);
    assert_eq!(treemap.rank(6), 5);
    assert_eq!(treemap.select(0), Some(1));
    assert_eq!(treemap.maximum(), Some(10));
    assert_eq!(treemap.minimum(), Some(1));
}

// Scenario: values straddling the 32-bit boundary.
#[test]
fn cross_boundary_algebra() {
    let a = Treemap::of(&[4_000_000_000, 4_000_000_001]);
    let b = Treemap::of(&[4_000_000_001, 8_000_000_000]);

    let union = a.or(&b);
    assert_eq!(union.cardinality(), 3);
    assert_eq!(union.maximum(), Some(8_000_000_000));

    let intersection = a.and(&b);
    assert_eq!(intersection.to_vec(), [4_000_000_001]);

    let symmetric = a.xor(&b);
    assert_eq!(symmetric.cardinality(), 2);
    assert_eq!(symmetric.to_vec(), [4_000_000_000, 8_000_000_000]);
}

// Scenario: a long add/remove churn far above 2^32 leaves no debris
// behind.
#[test]
fn add_remove_churn_leaves_single_value() {
    let mut treemap = Treemap::new();
    treemap.add(12345);
    for i in 1..=100_000u64 {
        let value = i * 4_000_000_000;
        treemap.add(value);
        treemap.remove(value);
    }
    assert_eq!(treemap.cardinality(), 1);
    assert_eq!(treemap.maximum(), Some(12345));
    assert!(!treemap.is_empty());
    assert!(treemap.map.values().all(|bitmap| !bitmap.is_empty()));
}

// Scenario: run optimization shrinks the serialized form and survives a
// round trip.
#[test]
fn run_optimize_shrinks_serialized_size() {
    let mut bitmap = Bitmap::new();
    for start in (0..1_000_000u32).step_by(100) {
        bitmap.add_range(start..start + 50);
    }
    let before = bitmap.get_serialized_size_in_bytes::<Portable>();
    assert!(bitmap.run_optimize());
    let after = bitmap.get_serialized_size_in_bytes::<Portable>();
    assert!(after < before, "{after} should shrink below {before}");

    let serialized = bitmap.serialize::<Portable>();
    assert_eq!(Bitmap::try_deserialize::<Portable>(&serialized).unwrap(), bitmap);
}

// Scenario: n-ary union of identical inputs is idempotent.
#[test]
fn fastunion_of_identical_inputs() {
    let base = {
        let mut treemap = Treemap::new();
        treemap.add_range(0..1_000_000);
        treemap
    };
    let inputs: Vec<Treemap> = (0..100).map(|_| base.clone()).collect();
    let refs: Vec<&Treemap> = inputs.iter().collect();
    let union = Treemap::fast_or(&refs);
    assert_eq!(union, base);
    assert_eq!(union.cardinality(), 1_000_000);
}

// Scenario: flipping a range twice is the identity.
#[test]
fn flip_twice_is_identity() {
    let mut treemap = Treemap::new();
    treemap.flip(0..=9);
    assert_eq!(treemap.to_vec(), (0..=9).collect::<Vec<_>>());
    treemap.flip(0..=9);
    assert!(treemap.is_empty());
}

#[test]
fn remove_absent_is_noop() {
    let mut treemap = Treemap::of(&[7]);
    treemap.remove(u64::MAX);
    assert!(!treemap.remove_checked(8));
    assert_eq!(treemap.to_vec(), [7]);
}

#[test]
fn bitmap_full_roundtrip() {
    let mut bitmap = Bitmap::new();
    assert!(!bitmap.is_full());
    bitmap.add_range(..);
    assert!(bitmap.is_full());
    assert_eq!(bitmap.cardinality(), 1 << 32);
    assert!(bitmap.contains(0));
    assert!(bitmap.contains(u32::MAX));
    bitmap.remove(12345);
    assert!(!bitmap.is_full());
    assert_eq!(bitmap.cardinality(), (1 << 32) - 1);
}

#[test]
fn treemap_cardinality_triple() {
    let treemap = Treemap::of(&[1, 2, 3]);
    assert_eq!(treemap.cardinality(), 3);
    assert_eq!(treemap.try_cardinality(), Ok(3));
    assert_eq!(treemap.overflowing_cardinality(), (3, false));
    assert!(!treemap.is_full());
}

#[test]
fn copy_on_write_flag_is_policy_only() {
    let mut treemap = Treemap::of(&[1, 2]);
    assert!(!treemap.get_copy_on_write());
    treemap.set_copy_on_write(true);
    assert!(treemap.get_copy_on_write());
    let copy = treemap.clone();
    assert!(copy.get_copy_on_write());
    assert_eq!(copy, treemap);
}

#[test]
fn lazy_batch_matches_eager() {
    let mut bitmap = Bitmap::of(&[99]);
    let to_or = [Bitmap::of(&[1, 2, 5, 10]), Bitmap::from_range(0..2048)];
    let to_xor = [Bitmap::of(&[5]), Bitmap::of(&[1, 1000, 1001])];
    let total = bitmap.lazy_batch(|lazy| {
        let mut total = 0;
        for b in &to_or {
            lazy.or_inplace(b, true);
            total += b.cardinality();
        }
        for b in &to_xor {
            *lazy ^= b;
        }
        total
    });
    assert_eq!(total, 4 + 2048);

    let mut eager = Bitmap::of(&[99]);
    for b in &to_or {
        eager.or_inplace(b);
    }
    for b in &to_xor {
        eager.xor_inplace(b);
    }
    assert_eq!(bitmap, eager);
}

#[test]
fn subset_and_statistics() {
    let big: Bitmap = (0..10_000).collect();
    let small = Bitmap::of(&[5, 500, 5000]);
    assert!(small.is_subset(&big));
    assert!(small.is_strict_subset(&big));
    assert!(big.is_subset(&big));
    assert!(!big.is_strict_subset(&big));
    assert!(!big.is_subset(&small));

    let stats = big.statistics();
    assert_eq!(stats.cardinality, 10_000);
    assert_eq!(stats.n_containers, 1);
    assert_eq!(stats.n_bitset_containers, 1);
    assert_eq!(stats.min_value, 0);
    assert_eq!(stats.max_value, 9_999);
}

fn sorted_dedup(mut values: Vec<u64>) -> Vec<u64> {
    values.sort_unstable();
    values.dedup();
    values
}

proptest! {
    #[test]
    fn bitmap_cardinality_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices);
        let mut deduped = indices;
        deduped.sort_unstable();
        deduped.dedup();
        prop_assert_eq!(deduped.len() as u64, original.cardinality());
        prop_assert_eq!(original.to_vec(), deduped);
    }

    #[test]
    fn treemap_cardinality_roundtrip(
        indices in prop::collection::vec(proptest::num::u64::ANY, 1..3000)
    ) {
        let original = Treemap::of(&indices);
        let deduped = sorted_dedup(indices);
        prop_assert_eq!(deduped.len() as u64, original.cardinality());
        prop_assert_eq!(original.to_vec(), deduped);
    }

    #[test]
    fn bitmap_serialization_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let mut original = Bitmap::of(&indices);
        original.run_optimize();

        let portable = original.serialize::<Portable>();
        prop_assert_eq!(&Bitmap::try_deserialize::<Portable>(&portable).unwrap(), &original);

        let native = original.serialize::<Native>();
        prop_assert_eq!(&Bitmap::try_deserialize::<Native>(&native).unwrap(), &original);

        let mut buffer = Vec::new();
        let frozen = original.serialize_into_vec::<Frozen>(&mut buffer);
        let view = BitmapView::deserialize::<Frozen>(frozen).unwrap();
        prop_assert_eq!(&view.to_bitmap(), &original);
    }

    #[test]
    fn treemap_serialization_roundtrip(
        indices in prop::collection::vec(proptest::num::u64::ANY, 1..2000)
    ) {
        let mut original = Treemap::of(&indices);
        original.run_optimize();

        let portable = original.serialize::<Portable>();
        prop_assert_eq!(&Treemap::try_deserialize::<Portable>(&portable).unwrap(), &original);

        let jvm = original.serialize::<JvmLegacy>();
        prop_assert_eq!(&Treemap::try_deserialize::<JvmLegacy>(&jvm).unwrap(), &original);
    }

    #[test]
    fn algebraic_laws(
        a in prop::collection::vec(proptest::num::u64::ANY, 0..500),
        b in prop::collection::vec(proptest::num::u64::ANY, 0..500),
        c in prop::collection::vec(proptest::num::u64::ANY, 0..500),
    ) {
        let a = Treemap::of(&a);
        let b = Treemap::of(&b);
        let c = Treemap::of(&c);

        // Idempotence and self-inverse laws
        prop_assert_eq!(&a.or(&a), &a);
        prop_assert_eq!(&a.and(&a), &a);
        prop_assert!(a.andnot(&a).is_empty());
        prop_assert!(a.xor(&a).is_empty());

        // Commutativity
        prop_assert_eq!(a.or(&b), b.or(&a));
        prop_assert_eq!(a.and(&b), b.and(&a));
        prop_assert_eq!(a.xor(&b), b.xor(&a));

        // Associativity
        prop_assert_eq!(a.or(&b).or(&c), a.or(&b.or(&c)));
        prop_assert_eq!(a.and(&b).and(&c), a.and(&b.and(&c)));

        // Distributivity of union over intersection
        prop_assert_eq!(a.or(&b.and(&c)), a.or(&b).and(&a.or(&c)));

        // Inclusion-exclusion
        prop_assert_eq!(
            a.cardinality() + b.cardinality(),
            a.or(&b).cardinality() + a.and(&b).cardinality()
        );
    }

    #[test]
    fn rank_select_inverse(
        values in prop::collection::vec(proptest::num::u64::ANY, 1..500),
    ) {
        let treemap = Treemap::of(&values);
        for &value in &values {
            // contains(v) iff rank increases at v
            let below = if value == 0 { 0 } else { treemap.rank(value - 1) };
            prop_assert_eq!(treemap.rank(value), below + 1);
            // select is the inverse of rank on members
            prop_assert_eq!(treemap.select(treemap.rank(value) - 1), Some(value));
            prop_assert_eq!(treemap.position(value), Some(treemap.rank(value) - 1));
        }
    }

    #[test]
    fn flip_is_symmetric_difference_with_range(
        values in prop::collection::vec(0u32..100_000, 0..300),
        lo in 0u32..100_000,
        len in 0u32..200_000,
    ) {
        let bitmap = Bitmap::of(&values);
        let hi = lo.saturating_add(len);

        let mut flipped = bitmap.clone();
        flipped.flip_inplace(lo..=hi);
        prop_assert_eq!(&flipped, &bitmap.xor(&Bitmap::from_range(lo..=hi)));

        flipped.flip_inplace(lo..=hi);
        prop_assert_eq!(&flipped, &bitmap);
    }

    #[test]
    fn range_ops_match_loops(
        seed in prop::collection::vec(0u32..10_000, 0..200),
        lo in 0u32..10_000,
        len in 0u32..5_000,
    ) {
        let hi = lo + len;
        let mut by_range = Bitmap::of(&seed);
        by_range.add_range(lo..=hi);
        let mut by_loop = Bitmap::of(&seed);
        for v in lo..=hi {
            by_loop.add(v);
        }
        prop_assert_eq!(&by_range, &by_loop);
        prop_assert!(by_range.contains_range(lo..=hi));
        prop_assert_eq!(by_range.range_cardinality(lo..=hi), u64::from(len) + 1);

        by_range.remove_range(lo..=hi);
        for v in lo..=hi {
            by_loop.remove(v);
        }
        prop_assert_eq!(&by_range, &by_loop);
    }

    #[test]
    fn fast_aggregates_match_pairwise(
        a in prop::collection::vec(proptest::num::u32::ANY, 0..400),
        b in prop::collection::vec(0u32..5_000, 0..400),
        c in prop::collection::vec(proptest::num::u32::ANY, 0..400),
    ) {
        let a = Bitmap::of(&a);
        let b = Bitmap::of(&b);
        let c = Bitmap::of(&c);
        let expected_or = a.or(&b).or(&c);
        prop_assert_eq!(&Bitmap::fast_or(&[&a, &b, &c]), &expected_or);
        prop_assert_eq!(&Bitmap::fast_or_heap(&[&a, &b, &c]), &expected_or);
        let expected_xor = a.xor(&b).xor(&c);
        prop_assert_eq!(&Bitmap::fast_xor(&[&a, &b, &c]), &expected_xor);
    }
}
