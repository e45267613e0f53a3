//! Post-roll modifiers and the ordered pipeline that applies them.

use crate::common::*;
use crate::error::DiceResult;
use crate::roll::{Details, DieSource, EvalContext, ExhaustiveDetails, MatchDetails, RollResult};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch::enum_dispatch(Modify)]
pub enum Modifier {
    Keep(Keep),
    Drop(Drop),
    KeepFilter(KeepFilter),
    Reroll(Reroll),
    RerollOnce(RerollOnce),
    Explode(Explode),
    Minimum(Minimum),
    Maximum(Maximum),
    Success(Success),
    Sort(Sort),
    Match(Match),
    RollOnce(RollOnce),
    Exhaustive(Exhaustive),
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep(x) => fmt::Display::fmt(x, f),
            Self::Drop(x) => fmt::Display::fmt(x, f),
            Self::KeepFilter(x) => fmt::Display::fmt(x, f),
            Self::Reroll(x) => fmt::Display::fmt(x, f),
            Self::RerollOnce(x) => fmt::Display::fmt(x, f),
            Self::Explode(x) => fmt::Display::fmt(x, f),
            Self::Minimum(x) => fmt::Display::fmt(x, f),
            Self::Maximum(x) => fmt::Display::fmt(x, f),
            Self::Success(x) => fmt::Display::fmt(x, f),
            Self::Sort(x) => fmt::Display::fmt(x, f),
            Self::Match(_) => f.write_str("m"),
            Self::RollOnce(_) => f.write_str("o"),
            Self::Exhaustive(_) => f.write_str("e"),
        }
    }
}

/// Modifiers are reported in result details by their notation, e.g. `"kh3"`.
impl Serialize for Modifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[enum_dispatch::enum_dispatch]
pub trait Modify {
    fn apply(&self, pool: &mut Pool<'_>, ctx: &mut EvalContext) -> DiceResult<()>;
}

/// The dice a modifier chain works on, plus everything it reports on the way.
pub struct Pool<'s> {
    pub rolls: Vec<Float>,
    source: Option<&'s DieSource>,
    pub warnings: Vec<String>,
    pub details: Details,
}

impl<'s> Pool<'s> {
    pub fn new(rolls: Vec<Float>, source: Option<&'s DieSource>) -> Self {
        Self {
            rolls,
            source,
            warnings: Vec::new(),
            details: Details::default(),
        }
    }

    pub fn warn(&mut self, ctx: &mut EvalContext, msg: impl Into<String>) {
        let msg = msg.into();
        ctx.warn(msg.clone());
        self.warnings.push(msg);
    }

    /// The die to roll for rerolls and explosions. Grouped rolls have none; the modifier is
    /// skipped with a warning.
    fn source_for(&mut self, ctx: &mut EvalContext, modifier: &dyn fmt::Display) -> Option<&'s DieSource> {
        if self.source.is_none() {
            self.warn(
                ctx,
                format!("Modifier '{}' needs dice to roll and was ignored", modifier),
            );
        }
        self.source
    }

    fn finish(self) -> RollResult {
        RollResult {
            total: self.rolls.iter().sum(),
            rolls: self.rolls,
            warnings: self.warnings,
            details: Box::new(self.details),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Extreme {
    Highest,
    Lowest,
}

impl Extreme {
    fn as_char(self) -> char {
        match self {
            Self::Highest => 'h',
            Self::Lowest => 'l',
        }
    }

    /// Indices of `rolls` ordered from the most extreme value inwards; ties keep roll order.
    fn ranked(self, rolls: &[Float]) -> Vec<usize> {
        let mut indices: Vec<_> = (0..rolls.len()).collect();
        indices.sort_by(|&a, &b| {
            let ord = rolls[a].total_cmp(&rolls[b]);
            match self {
                Self::Highest => ord.reverse(),
                Self::Lowest => ord,
            }
        });
        indices
    }
}

fn retain_indices(rolls: &mut Vec<Float>, keep: impl Fn(usize) -> bool) {
    let mut i = 0;
    rolls.retain(|_| {
        let kept = keep(i);
        i += 1;
        kept
    });
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Keep {
    pub end: Extreme,
    pub count: usize,
}

impl Modify for Keep {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        let chosen: Vec<_> = self.end.ranked(&pool.rolls).into_iter().take(self.count).collect();
        retain_indices(&mut pool.rolls, |i| chosen.contains(&i));
        Ok(())
    }
}

impl fmt::Display for Keep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}{}", self.end.as_char(), self.count)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drop {
    pub end: Extreme,
    pub count: usize,
}

impl Modify for Drop {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        let chosen: Vec<_> = self.end.ranked(&pool.rolls).into_iter().take(self.count).collect();
        retain_indices(&mut pool.rolls, |i| !chosen.contains(&i));
        Ok(())
    }
}

impl fmt::Display for Drop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}{}", self.end.as_char(), self.count)
    }
}

/// `k>N` / `k<N`: keeps every die on the given side of `target`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeepFilter {
    pub cmp: Comparator,
    pub target: Float,
}

impl Modify for KeepFilter {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        pool.rolls.retain(|&v| self.cmp.matches(v, self.target));
        Ok(())
    }
}

impl fmt::Display for KeepFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}{}", self.cmp, fmt_number(self.target))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Reroll {
    pub cmp: Comparator,
    pub target: Float,
}

impl Modify for Reroll {
    fn apply(&self, pool: &mut Pool<'_>, ctx: &mut EvalContext) -> DiceResult<()> {
        let source = match pool.source_for(ctx, self) {
            Some(source) => source,
            None => return Ok(()),
        };
        let max_attempts = ctx.config.max_reroll_attempts;

        let mut rerolls = 0;
        for i in 0..pool.rolls.len() {
            let mut attempts = 0;
            while self.cmp.matches(pool.rolls[i], self.target) {
                if attempts == max_attempts {
                    let msg = format!(
                        "Reroll limit of {} attempts reached; keeping {}",
                        max_attempts,
                        fmt_number(pool.rolls[i])
                    );
                    pool.warn(ctx, msg);
                    break;
                }
                pool.rolls[i] = source.roll(ctx);
                attempts += 1;
                rerolls += 1;
            }
        }
        pool.details.rerolls += rerolls;
        Ok(())
    }
}

impl fmt::Display for Reroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}{}", self.cmp, fmt_number(self.target))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RerollOnce {
    pub cmp: Comparator,
    pub target: Float,
}

impl Modify for RerollOnce {
    fn apply(&self, pool: &mut Pool<'_>, ctx: &mut EvalContext) -> DiceResult<()> {
        let source = match pool.source_for(ctx, self) {
            Some(source) => source,
            None => return Ok(()),
        };
        for i in 0..pool.rolls.len() {
            if self.cmp.matches(pool.rolls[i], self.target) {
                pool.rolls[i] = source.roll(ctx);
                pool.details.rerolls += 1;
            }
        }
        Ok(())
    }
}

impl fmt::Display for RerollOnce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ro{}{}", self.cmp, fmt_number(self.target))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ExplodeKind {
    Basic,
    Compound,
    Penetrating,
    Recursive,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Explode {
    pub kind: ExplodeKind,
    /// `None` explodes on the die's highest face.
    pub condition: Option<(Comparator, Float)>,
    /// Maximum number of extra dice per original die.
    pub limit: Option<usize>,
}

impl Modify for Explode {
    fn apply(&self, pool: &mut Pool<'_>, ctx: &mut EvalContext) -> DiceResult<()> {
        let source = match pool.source_for(ctx, self) {
            Some(source) => source,
            None => return Ok(()),
        };
        let (cmp, target) = self
            .condition
            .unwrap_or((Comparator::Eq, source.max_face()));
        let max_rolls = ctx.config.max_rolls;

        let mut exploded = 0;
        let mut capped = false;
        'dice: for i in 0..pool.rolls.len() {
            let mut last = pool.rolls[i];
            let mut chain = 0;
            while cmp.matches(last, target) {
                if self.limit.map_or(false, |limit| chain >= limit) {
                    break;
                }
                if exploded >= max_rolls {
                    capped = true;
                    break 'dice;
                }
                last = source.roll(ctx);
                pool.rolls.push(last);
                exploded += 1;
                chain += 1;
            }
        }

        if capped {
            pool.warn(
                ctx,
                format!("Explosion stopped after reaching the limit of {} rolls", max_rolls),
            );
        }
        pool.details.explosions += exploded;
        Ok(())
    }
}

impl fmt::Display for Explode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.kind {
            ExplodeKind::Basic | ExplodeKind::Recursive => "!",
            ExplodeKind::Compound => "!!",
            ExplodeKind::Penetrating => "!p",
        })?;
        if let Some((cmp, target)) = self.condition {
            write!(f, "{}{}", cmp, fmt_number(target))?;
        }
        if let Some(limit) = self.limit {
            write!(f, "l{}", limit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Minimum(pub Float);

impl Modify for Minimum {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        for v in &mut pool.rolls {
            *v = v.max(self.0);
        }
        Ok(())
    }
}

impl fmt::Display for Minimum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mi{}", fmt_number(self.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Maximum(pub Float);

impl Modify for Maximum {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        for v in &mut pool.rolls {
            *v = v.min(self.0);
        }
        Ok(())
    }
}

impl fmt::Display for Maximum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ma{}", fmt_number(self.0))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SuccessKind {
    /// Bare comparator forms: `>N`, `<N`, `=N`.
    Compare,
    CriticalSuccess,
    CriticalFailure,
    Success,
    Failure,
}

impl SuccessKind {
    fn counts_failures(self) -> bool {
        matches!(self, Self::CriticalFailure | Self::Failure)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Success {
    pub kind: SuccessKind,
    pub cmp: Comparator,
    pub target: Float,
}

impl Success {
    pub fn test(&self, value: Float) -> bool {
        self.cmp.matches(value, self.target)
    }

    fn count(&self, rolls: &[Float]) -> usize {
        rolls.iter().filter(|&&v| self.test(v)).count()
    }
}

impl Modify for Success {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        let count = self.count(&pool.rolls);
        if self.kind.counts_failures() {
            pool.details.failures = Some(pool.details.failures.unwrap_or(0) + count);
        } else {
            pool.details.successes = Some(pool.details.successes.unwrap_or(0) + count);
        }
        pool.rolls = vec![count as Float];
        Ok(())
    }
}

impl fmt::Display for Success {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            SuccessKind::Compare => "",
            SuccessKind::CriticalSuccess => "cs",
            SuccessKind::CriticalFailure => "cf",
            SuccessKind::Success => "s",
            SuccessKind::Failure => "f",
        };
        write!(f, "{}{}{}", prefix, self.cmp, fmt_number(self.target))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Sort {
    pub descending: bool,
}

impl Modify for Sort {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        if self.descending {
            pool.rolls.sort_by(|a, b| b.total_cmp(a));
        } else {
            pool.rolls.sort_by(|a, b| a.total_cmp(b));
        }
        Ok(())
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.descending { "sd" } else { "sa" })
    }
}

/// Reports the most frequent value(s) without touching the rolls.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Match;

impl Modify for Match {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        let mut sorted = pool.rolls.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut runs: Vec<(Float, usize)> = Vec::new();
        for v in sorted {
            match runs.last_mut() {
                Some((last, n)) if *last == v => *n += 1,
                _ => runs.push((v, 1)),
            }
        }

        let count = runs.iter().map(|&(_, n)| n).max().unwrap_or(0);
        let values = runs
            .into_iter()
            .filter(|&(_, n)| n == count)
            .map(|(v, _)| v)
            .collect();
        pool.details.matches = Some(MatchDetails { values, count });
        Ok(())
    }
}

/// Only meaningful on grouped rolls; recorded in the details and otherwise inert.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RollOnce;

impl Modify for RollOnce {
    fn apply(&self, pool: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        pool.details.roll_once = Some(true);
        Ok(())
    }
}

/// Handled by [`apply_modifiers`] after every other modifier has run.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Exhaustive;

impl Modify for Exhaustive {
    fn apply(&self, _: &mut Pool<'_>, _: &mut EvalContext) -> DiceResult<()> {
        Ok(())
    }
}

/// Applies `modifiers` in order to `rolls`.
///
/// A success modifier directly followed by `e` does not collapse the pool; instead the
/// exhaustive pass runs last over the original rolls.
pub fn apply_modifiers(
    rolls: Vec<Float>,
    modifiers: &[Modifier],
    source: Option<&DieSource>,
    ctx: &mut EvalContext,
) -> DiceResult<RollResult> {
    let original = rolls.clone();
    let mut pool = Pool::new(rolls, source);
    let mut exhaustive: Option<Option<&Success>> = None;

    for (i, modifier) in modifiers.iter().enumerate() {
        let exhaustive_next = matches!(modifiers.get(i + 1), Some(Modifier::Exhaustive(_)));
        match modifier {
            Modifier::Exhaustive(_) => {
                let preceding = i.checked_sub(1).and_then(|j| match &modifiers[j] {
                    Modifier::Success(success) => Some(success),
                    _ => None,
                });
                exhaustive = Some(preceding);
            }
            Modifier::Success(_) if exhaustive_next => {}
            _ => modifier.apply(&mut pool, ctx)?,
        }
        pool.details.modifiers.push(modifier.clone());
    }

    match exhaustive {
        Some(Some(success)) => exhaust(&mut pool, success, &original, ctx),
        Some(None) => {
            pool.warn(
                ctx,
                "Exhaustive modifier 'e' must directly follow a success modifier",
            );
            pool.rolls = vec![0.0];
            pool.details.exhaustive = Some(ExhaustiveDetails::default());
        }
        None => {}
    }

    Ok(pool.finish())
}

fn exhaust(pool: &mut Pool<'_>, success: &Success, original: &[Float], ctx: &mut EvalContext) {
    let max_cycles = ctx.config.max_exhaustive_cycles;

    let mut successes = success.count(original);
    let mut total = successes;
    let mut cycles = 0;
    let mut capped = false;
    while successes > 0 {
        if cycles >= max_cycles {
            capped = true;
            break;
        }
        let source = match pool.source_for(ctx, &Exhaustive) {
            Some(source) => source,
            None => break,
        };
        successes = (0..successes)
            .map(|_| source.roll(ctx))
            .filter(|&v| success.test(v))
            .count();
        total += successes;
        cycles += 1;
    }

    if capped {
        pool.warn(
            ctx,
            format!("Exhaustive reroll stopped after {} cycles", max_cycles),
        );
    }
    pool.rolls = vec![total as Float];
    pool.details.exhaustive = Some(ExhaustiveDetails {
        total_successes: total,
        cycles,
        capped,
    });
}

impl fmt::Display for Exhaustive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("e")
    }
}
