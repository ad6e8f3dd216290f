//! 轮盘布局
//!
//! 欧式单零轮的物理口袋顺序（顺时针方向）

/// 口袋数量（欧式轮：0-36）
pub const POCKETS: usize = 37;

/// 轮盘口袋顺序
///
/// 预测结果以轮面上的相对位移（index）换算到实际号码
pub const ROULETTE_SEQUENCE: [u8; POCKETS] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

/// 按轮面 index 取口袋号码（自动回绕）
pub fn pocket_at(index: usize) -> u8 {
    ROULETTE_SEQUENCE[index % POCKETS]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_covers_all_pockets() {
        let mut seen = [false; POCKETS];
        for &n in ROULETTE_SEQUENCE.iter() {
            assert!((n as usize) < POCKETS);
            assert!(!seen[n as usize], "pocket {} appears twice", n);
            seen[n as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_pocket_at_wraps() {
        assert_eq!(pocket_at(0), 0);
        assert_eq!(pocket_at(2), 15);
        assert_eq!(pocket_at(POCKETS), 0);
        assert_eq!(pocket_at(POCKETS + 2), 15);
    }
}
