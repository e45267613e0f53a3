use super::ctx::EvalContext;
use crate::common::*;
use crate::error::{DiceError, DiceResult};

/// What a single die rolls over.
#[derive(Debug, Clone, PartialEq)]
pub enum DieSource {
    Standard(NonZeroUInt),
    Custom(NonEmpty<Float>),
    Fudge(FudgeVariant),
}

impl DieSource {
    pub fn standard(sides: Int) -> DiceResult<Self> {
        UInt::try_from(sides)
            .ok()
            .and_then(NonZeroUInt::new)
            .map(Self::Standard)
            .ok_or_else(|| {
                DiceError::validation(format!("Dice must have a positive number of sides, got {}", sides))
            })
    }

    pub fn custom(sides: &[Float]) -> DiceResult<Self> {
        NonEmpty::try_from_vec(sides.to_vec())
            .map(Self::Custom)
            .map_err(|_| DiceError::validation("Custom dice need at least one side"))
    }

    pub fn roll(&self, ctx: &mut EvalContext) -> Float {
        match self {
            Self::Standard(sides) => ctx.roll(*sides) as Float,
            Self::Custom(sides) => sides[ctx.pick(sides.len())],
            Self::Fudge(variant) => {
                let faces = variant.faces();
                faces[ctx.pick(faces.len())]
            }
        }
    }

    /// Rolls `count` dice after checking it against the configured bounds.
    pub fn roll_many(&self, count: Int, ctx: &mut EvalContext) -> DiceResult<Vec<Float>> {
        if count <= 0 {
            return Err(DiceError::validation(format!(
                "Number of dice must be positive, got {}",
                count
            )));
        }
        let max = ctx.config.max_dice;
        let count = usize::try_from(count)
            .ok()
            .filter(|&count| count <= max)
            .ok_or_else(|| {
                DiceError::validation(format!("Cannot roll more than {} dice at once", max))
            })?;
        Ok((0..count).map(|_| self.roll(ctx)).collect())
    }

    /// The face explosions trigger on by default.
    pub fn max_face(&self) -> Float {
        match self {
            Self::Standard(sides) => sides.get() as Float,
            Self::Custom(sides) => sides.iter().copied().fold(Float::NEG_INFINITY, Float::max),
            Self::Fudge(_) => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::roller::StepRoller;

    #[test]
    fn test_invalid_sources() {
        assert!(DieSource::standard(0).is_err());
        assert!(DieSource::standard(-4).is_err());
        assert!(DieSource::custom(&[]).is_err());
        assert_eq!(
            DieSource::custom(&[2.0, 7.0, 3.0]).unwrap().max_face(),
            7.0
        );
    }

    #[test]
    fn test_roll_many() {
        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        let d4 = DieSource::standard(4).unwrap();
        assert_eq!(d4.roll_many(5, &mut ctx).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 1.0]);
        assert!(d4.roll_many(0, &mut ctx).is_err());
        assert!(d4.roll_many(1001, &mut ctx).is_err());

        let fudge = DieSource::Fudge(FudgeVariant::Three);
        // Picks faces 0, 1, 2, 3 of [-1, -1, -1, 1, 1, 1].
        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        assert_eq!(
            fudge.roll_many(4, &mut ctx).unwrap(),
            vec![-1.0, -1.0, -1.0, 1.0]
        );
    }
}
