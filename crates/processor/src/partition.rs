//! Partition derivation
//!
//! FNV-1a keeps the mapping stable across processes and restarts, which the
//! per-partition ordered consumption downstream depends on.

/// 32-bit FNV-1a hash
pub fn fnv1a_32(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 16_777_619;

    data.iter()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ u32::from(*byte)).wrapping_mul(PRIME))
}

/// Map a key onto one of `partitions` partitions
pub fn partition_for(key: &str, partitions: u32) -> u32 {
    fnv1a_32(key.as_bytes()) % partitions.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
    }

    #[test]
    fn test_partition_deterministic() {
        assert_eq!(partition_for("orders-1001", 16), partition_for("orders-1001", 16));
    }

    #[test]
    fn test_partition_in_range() {
        for i in 0..1000 {
            let key = format!("key-{i}");
            assert!(partition_for(&key, 8) < 8);
        }
    }

    #[test]
    fn test_zero_partitions_clamped() {
        // Guarded by config validation; clamp keeps the function total
        assert_eq!(partition_for("k", 0), 0);
    }
}
