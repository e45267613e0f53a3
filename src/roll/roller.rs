use crate::common::{NonZeroUInt, UInt};
use rand::Rng;

/// Source of randomness for dice. Every [`Rng`] is a roller.
pub trait Roller {
    /// A uniform value in `1..=sides`.
    fn roll(&mut self, sides: NonZeroUInt) -> UInt;

    /// A uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: Rng> Roller for R {
    fn roll(&mut self, sides: NonZeroUInt) -> UInt {
        self.gen_range(1..=sides.get())
    }

    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

#[cfg(test)]
pub(crate) use step::StepRoller;

#[cfg(test)]
mod step {
    use super::*;

    /// Yields `initial`, `initial + step`, ... wrapped into range.
    pub(crate) struct StepRoller {
        current: UInt,
        step: UInt,
    }

    impl StepRoller {
        pub fn new(initial: UInt, step: UInt) -> Self {
            Self {
                current: initial.max(1),
                step,
            }
        }
    }

    impl Roller for StepRoller {
        fn roll(&mut self, sides: NonZeroUInt) -> UInt {
            let ret = (self.current - 1) % sides.get() + 1;
            self.current += self.step;
            ret
        }

        fn pick(&mut self, len: usize) -> usize {
            let ret = (self.current as usize - 1) % len;
            self.current += self.step;
            ret
        }
    }

    #[test]
    fn test_step_roller_wraps() {
        let mut roller = StepRoller::new(5, 1);
        let six = NonZeroUInt::new(6).unwrap();
        let rolls: Vec<_> = (0..4).map(|_| roller.roll(six)).collect();
        assert_eq!(rolls, vec![5, 6, 1, 2]);
        assert_eq!(roller.pick(3), 2);
    }
}
