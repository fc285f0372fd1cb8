use super::*;

#[test]
fn test_same_key_same_partition() {
    let partitioner = KeyPartitioner::new();

    let rec1 = Record::new(0).with_key("St-Jean").with_field("temperature", 1.0);
    let rec2 = Record::new(60_000).with_key("St-Jean").with_field("temperature", 2.0);

    // Same key should go to same partition
    assert_eq!(partitioner.partition(&rec1, 4), partitioner.partition(&rec2, 4));
}

#[test]
fn test_keyless_records_share_a_partition() {
    let partitioner = KeyPartitioner::new();
    let a = partitioner.partition(&Record::new(0), 8);
    let b = partitioner.partition(&Record::new(1_000), 8);
    assert_eq!(a, b);
}

#[test]
fn test_single_partition_always_zero() {
    let partitioner = KeyPartitioner::new();
    for i in 0..100 {
        assert_eq!(partitioner.partition_key(Some(format!("station_{i}").as_str()), 1), 0);
    }
}

#[test]
fn test_partition_distribution() {
    let partitioner = KeyPartitioner::new();

    let mut counts = vec![0; 4];
    for i in 0..1000 {
        let partition = partitioner.partition_key(Some(format!("station_{i}").as_str()), 4);
        counts[partition] += 1;
    }

    // Each partition should get roughly 250 keys (1000 / 4)
    for count in counts {
        assert!(
            count > 150 && count < 350,
            "Unbalanced distribution: {}",
            count
        );
    }
}
