//! Seeded piece picker. Same seed, same piece sequence.

use crate::piece::Piece;

const MULTIPLIER: u32 = 1_103_515_245;
const INCREMENT: u32 = 12_345;
const MODULUS_MASK: u32 = 0x7FFF_FFFF;

/// Linear congruential generator modulo 2^31.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT) & MODULUS_MASK;
        self.state
    }

    pub fn next_piece(&mut self) -> Piece {
        Piece::from_index(self.next_u32())
    }

    /// Eight uppercase hex digits built from four byte-sized draws.
    pub fn hex_seed(&mut self) -> String {
        (0..4).map(|_| format!("{:02X}", self.next_u32() % 256)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sequence() {
        let mut rng = Lcg::new(1);
        assert_eq!(rng.next_u32(), 1_103_527_590);
        let mut zero = Lcg::new(0);
        assert_eq!(zero.next_u32(), 12_345);
        assert_eq!(zero.next_u32(), 1_406_932_606);
    }

    #[test]
    fn test_same_seed_same_pieces() {
        let a: Vec<_> = {
            let mut rng = Lcg::new(0xDEAD_BEEF);
            (0..32).map(|_| rng.next_piece()).collect()
        };
        let mut rng = Lcg::new(0xDEAD_BEEF);
        assert!(a.iter().all(|&p| p == rng.next_piece()));
        assert!(a.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_hex_seed_format() {
        let s = Lcg::new(42).hex_seed();
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(s, Lcg::new(42).hex_seed());
    }
}
