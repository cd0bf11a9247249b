use std::fmt;

use crate::utils;

/// Transaction record passed through the pipeline. Stimulus items carry only
/// `reset`; observed items populate all three fields from one clock-edge
/// sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub reset: bool,
    pub led: u8,
    pub counter: u32,
}

impl Item {
    pub fn stimulus(reset: bool) -> Self {
        Item {
            reset,
            led: 0,
            counter: 0,
        }
    }

    pub fn observed(reset: bool, led: u8, counter: u32) -> Self {
        Item {
            reset,
            led,
            counter,
        }
    }

    /// Randomized stimulus, mirroring constrained-random reset toggling.
    pub fn random() -> Self {
        Item::stimulus(utils::rand_int(2) == 1)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item(rst={}, led={}, counter=0x{:07x})",
            self.reset as u8, self.led, self.counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_all_fields() {
        let item = Item::observed(true, 1, 0x400_0000);
        assert_eq!(item.to_string(), "Item(rst=1, led=1, counter=0x4000000)");
    }
}
