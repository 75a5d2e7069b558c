/// Splitmix64 step: mixes `state` into the next value of a reproducible
/// sequence. Feed the result back in to advance.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_reproducible_and_moves() {
        let a: Vec<u64> = std::iter::successors(Some(7), |s| Some(splitmix64(*s))).take(4).collect();
        let b: Vec<u64> = std::iter::successors(Some(7), |s| Some(splitmix64(*s))).take(4).collect();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] != w[1]));
        assert_ne!(splitmix64(0), 0);
    }
}
