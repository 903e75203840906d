pub const BLOCKS_PER_MINUTE: u64 = 17;
pub const BLOCKS_PER_HOUR: u64 = BLOCKS_PER_MINUTE * 60;
pub const BLOCKS_PER_DAY: u64 = BLOCKS_PER_HOUR * 24;

/// Returns true if `height` is the last block of a period of
/// `blocks_per_period` blocks, i.e. the next block starts a new period.
pub fn is_period_last_block(height: i64, blocks_per_period: u64) -> bool {
    if blocks_per_period == 0 {
        return false;
    }
    (height as u64).wrapping_add(1) % blocks_per_period == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_block() {
        assert!(is_period_last_block(1, 2));
        assert!(!is_period_last_block(2, 2));
        assert!(is_period_last_block(3, 2));
        assert!(is_period_last_block(48_959, BLOCKS_PER_DAY * 2));
        assert!(!is_period_last_block(48_960, BLOCKS_PER_DAY * 2));
        assert!(!is_period_last_block(5, 0));
    }
}
