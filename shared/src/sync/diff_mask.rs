/// A 256 bit set of dirty attribute indices.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DiffMask {
    mask: [u8; 32],
}

impl Default for DiffMask {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffMask {
    pub fn new() -> Self {
        Self { mask: [0; 32] }
    }

    pub fn bit(&self, index: u8) -> bool {
        let byte = self.mask[usize::from(index / 8)];
        byte & (1 << (index % 8)) != 0
    }

    pub fn set_bit(&mut self, index: u8, value: bool) {
        let byte = &mut self.mask[usize::from(index / 8)];
        let bit = 1 << (index % 8);
        if value {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
    }

    pub fn clear(&mut self) {
        self.mask = [0; 32];
    }

    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }

    pub fn count(&self) -> usize {
        self.mask
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// Set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |index| self.bit(*index))
    }
}

impl std::fmt::Debug for DiffMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_bits() {
        let mut mask = DiffMask::new();
        assert!(mask.is_clear());

        mask.set_bit(0, true);
        mask.set_bit(9, true);
        mask.set_bit(255, true);
        assert!(mask.bit(9));
        assert!(!mask.bit(8));
        assert_eq!(mask.count(), 3);
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![0, 9, 255]);

        mask.set_bit(9, false);
        assert_eq!(mask.count(), 2);

        mask.clear();
        assert!(mask.is_clear());
    }
}
