//! Destination subject composition
//!
//! Downstream consumers depend on the exact subject layout, so the format is
//! part of the frozen contract:
//! `<domain>.DP.<table>.<partition>.EVENT.<event_name>`

/// Compose the broker subject for one record
///
/// Pure and total: same inputs always yield the same subject, and composition
/// never fails for a well-formed record. The partition is rendered as a
/// decimal integer with no leading zeros.
pub fn destination_subject(domain: &str, table: &str, partition: u32, event_name: &str) -> String {
    format!("{domain}.DP.{table}.{partition}.EVENT.{event_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_layout() {
        let subject = destination_subject("ACME", "orders", 3, "created");
        assert_eq!(subject, "ACME.DP.orders.3.EVENT.created");
    }

    #[test]
    fn test_subject_deterministic() {
        let a = destination_subject("ACME", "users", 42, "updated");
        let b = destination_subject("ACME", "users", 42, "updated");
        assert_eq!(a, b);
    }

    #[test]
    fn test_partition_no_leading_zeros() {
        let subject = destination_subject("ACME", "orders", 7, "deleted");
        assert!(subject.contains(".7."));
        let subject = destination_subject("ACME", "orders", 0, "deleted");
        assert_eq!(subject, "ACME.DP.orders.0.EVENT.deleted");
    }

    #[test]
    fn test_large_partition() {
        let subject = destination_subject("ACME", "orders", 1023, "created");
        assert_eq!(subject, "ACME.DP.orders.1023.EVENT.created");
    }
}
