//! Arithmetic, functions and every kind of dice.

use crate::common::*;
use crate::error::{DiceError, DiceResult};
use crate::modifier::apply_modifiers;
use crate::parse::{self, ast::*};
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{DieSource, EvalContext, RollResult};

/// The built-in grammar and the evaluator for everything that is not a lookup.
#[derive(Debug, Default, Copy, Clone)]
pub struct CorePlugin;

impl DicePlugin for CorePlugin {
    fn name(&self) -> &'static str {
        "dice"
    }

    fn parse(&self, text: &str) -> Option<DiceResult<Node>> {
        Some(parse::parse_unindexed(text))
    }

    fn evaluate(
        &self,
        registry: &Registry,
        node: &Node,
        ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        let result = match node {
            Node::Number(x) => Ok(RollResult::constant(*x)),
            Node::Unary(op, x) => eval_unary(registry, *op, x, ctx),
            Node::Arithmetic(l, op, r) => eval_arithmetic(registry, l, *op, r, ctx),
            Node::Function(f) => eval_function(registry, f, ctx),
            Node::Dice(dice) => eval_dice(dice, ctx),
            Node::CustomDice(dice) => DieSource::custom(&dice.sides)
                .and_then(|source| roll(&source, dice.count, &dice.modifiers, ctx)),
            Node::FudgeDice(dice) => {
                roll(&DieSource::Fudge(dice.variant), dice.count, &dice.modifiers, ctx)
            }
            Node::Group(group) => eval_group(registry, group, ctx),
            _ => return Ok(None),
        };
        result.map(Some)
    }
}

fn eval_unary(
    registry: &Registry,
    op: UnaryOperator,
    x: &Node,
    ctx: &mut EvalContext,
) -> DiceResult<RollResult> {
    let mut result = registry.evaluate(x, ctx)?;
    if op == UnaryOperator::Neg {
        result.total = -result.total;
    }
    Ok(result)
}

fn eval_dice(dice: &Dice, ctx: &mut EvalContext) -> DiceResult<RollResult> {
    let source = DieSource::standard(dice.sides)?;
    let mut result = roll(&source, dice.count, &dice.modifiers, ctx)?;
    result.details.labels.extend(dice.label.clone());
    Ok(result)
}

fn roll(
    source: &DieSource,
    count: Int,
    modifiers: &[crate::modifier::Modifier],
    ctx: &mut EvalContext,
) -> DiceResult<RollResult> {
    let rolls = source.roll_many(count, ctx)?;
    apply_modifiers(rolls, modifiers, Some(source), ctx)
}

fn eval_arithmetic(
    registry: &Registry,
    l: &Node,
    op: BinaryOperator,
    r: &Node,
    ctx: &mut EvalContext,
) -> DiceResult<RollResult> {
    let mut result = registry.evaluate(l, ctx)?;
    let rhs = registry.evaluate(r, ctx)?;
    let (a, b) = (result.total, rhs.total);

    result.total = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div if b == 0.0 => return Err(DiceError::validation("Division by zero")),
        BinaryOperator::Div => a / b,
        BinaryOperator::Rem if b == 0.0 => return Err(DiceError::validation("Modulo by zero")),
        BinaryOperator::Rem => a % b,
        BinaryOperator::Pow => a.powf(b),
    };
    result.absorb(rhs);
    Ok(result)
}

fn exactly_one(name: &str, values: &[Float]) -> DiceResult<Float> {
    match values {
        [x] => Ok(*x),
        _ => Err(DiceError::validation(format!(
            "{}() takes exactly 1 argument, got {}",
            name,
            values.len()
        ))),
    }
}

fn at_least_one(name: &str, values: &[Float]) -> DiceResult<()> {
    if values.is_empty() {
        Err(DiceError::validation(format!(
            "{}() takes at least 1 argument",
            name
        )))
    } else {
        Ok(())
    }
}

fn eval_function(
    registry: &Registry,
    f: &FunctionCall,
    ctx: &mut EvalContext,
) -> DiceResult<RollResult> {
    const FUNCTIONS: &[&str] = &["floor", "ceil", "round", "abs", "min", "max"];
    let name = f.name.as_str();
    if !FUNCTIONS.contains(&name) {
        return Err(DiceError::syntax(format!("Unknown function: {}", name)));
    }

    let args = f
        .args
        .iter()
        .map(|arg| registry.evaluate(arg, ctx))
        .collect::<DiceResult<Vec<_>>>()?;
    let values: Vec<_> = args.iter().map(|arg| arg.total).collect();

    let total = match name {
        "floor" => exactly_one(name, &values)?.floor(),
        "ceil" => exactly_one(name, &values)?.ceil(),
        // Halves round up, so round(-2.5) is -2.
        "round" => (exactly_one(name, &values)? + 0.5).floor(),
        "abs" => exactly_one(name, &values)?.abs(),
        "min" => {
            at_least_one(name, &values)?;
            values.iter().copied().fold(Float::INFINITY, Float::min)
        }
        _ => {
            at_least_one(name, &values)?;
            values.iter().copied().fold(Float::NEG_INFINITY, Float::max)
        }
    };

    let mut result = RollResult::constant(total);
    result.details.function = Some(name.to_string());
    for arg in args {
        result.absorb(arg);
    }
    Ok(result)
}

/// Each item is evaluated once. Items with dice put their rolls in the pool, others their total.
fn eval_group(
    registry: &Registry,
    group: &GroupedRoll,
    ctx: &mut EvalContext,
) -> DiceResult<RollResult> {
    let mut result = RollResult::default();
    let mut pool = Vec::new();
    let mut sum = 0.0;
    for item in &group.items {
        let item = registry.evaluate(item, ctx)?;
        sum += item.total;
        if item.rolls.is_empty() {
            pool.push(item.total);
        } else {
            pool.extend_from_slice(&item.rolls);
        }
        result.warnings.extend(item.warnings);
        result.details.merge(*item.details);
    }

    if group.modifiers.is_empty() {
        result.total = sum;
        result.rolls = pool;
    } else {
        let modified = apply_modifiers(pool, &group.modifiers, None, ctx)?;
        result.total = modified.total;
        result.absorb(modified);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::*;
    use crate::error::ErrorKind;
    use crate::roll::roller::StepRoller;

    fn eval_with(s: &str, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        Registry::default().process_expression(s, ctx)
    }

    fn check(s: &str, total: Float, rolls: &[Float]) {
        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        let result = eval_with(s, &mut ctx).unwrap_or_else(|e| panic!("{}: {}", s, e));
        assert_eq!(result.total, total, "{}", s);
        assert_eq!(result.rolls, rolls, "{}", s);
    }

    fn eval_step(s: &str, initial: UInt, step: UInt) -> RollResult {
        let mut ctx = EvalContext::with_roller(StepRoller::new(initial, step));
        eval_with(s, &mut ctx).unwrap_or_else(|e| panic!("{}: {}", s, e))
    }

    fn check_err(s: &str, kind: ErrorKind) {
        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        let err = eval_with(s, &mut ctx).unwrap_err();
        assert_eq!(err.kind(), kind, "{}: {}", s, err);
    }

    #[test]
    fn test_arithmetic() {
        check("2 * 3 + 4 / 2", 8.0, &[]);
        check("2**3 + 1", 9.0, &[]);
        check("2**2**3", 256.0, &[]);
        check("2*3**2", 36.0, &[]);
        check("-3 + +2", -1.0, &[]);
        check("7 % 4", 3.0, &[]);
        check("5 / 2", 2.5, &[]);
    }

    #[test]
    fn test_division_by_zero() {
        check_err("5/0", ErrorKind::Validation);
        check_err("5%0", ErrorKind::Validation);
        check_err("5/(1-1)", ErrorKind::Validation);
    }

    #[test]
    fn test_dice() {
        check("4d6", 10.0, &[1.0, 2.0, 3.0, 4.0]);
        check("4d6kh3", 9.0, &[2.0, 3.0, 4.0]);
        check("4d6dl1 + 1", 10.0, &[2.0, 3.0, 4.0]);
        check("(2d6+3)*2", 12.0, &[1.0, 2.0]);
        check("2d{5,10}", 15.0, &[5.0, 10.0]);
        check("3dF", 0.0, &[-1.0, 0.0, 1.0]);
        check("6d6>4", 2.0, &[2.0]);
    }

    #[test]
    fn test_keep_and_drop_pick_extremes() {
        // Six d6 with this roller come up 4, 3, 2, 1, 6, 5.
        let result = eval_step("6d6", 4, 5);
        assert_eq!(result.rolls, vec![4.0, 3.0, 2.0, 1.0, 6.0, 5.0]);

        let result = eval_step("6d6kh3", 4, 5);
        assert_eq!(result.rolls, vec![4.0, 6.0, 5.0]);
        assert_eq!(result.total, 15.0);

        let result = eval_step("6d6kl2", 4, 5);
        assert_eq!(result.rolls, vec![2.0, 1.0]);
        assert_eq!(result.total, 3.0);

        let result = eval_step("6d6dh2", 4, 5);
        assert_eq!(result.rolls, vec![4.0, 3.0, 2.0, 1.0]);

        let result = eval_step("6d6dl1", 4, 5);
        assert_eq!(result.rolls, vec![4.0, 3.0, 2.0, 6.0, 5.0]);
    }

    #[test]
    fn test_keep_filters() {
        check("6d6k<3", 3.0, &[1.0, 2.0]);
        check("6d6k>4", 11.0, &[5.0, 6.0]);
    }

    #[test]
    fn test_success_kinds() {
        let result = eval_step("6d6cs>4", 1, 1);
        assert_eq!((result.total, result.rolls.as_slice()), (2.0, &[2.0][..]));
        assert_eq!(result.details.successes, Some(2));
        assert_eq!(result.details.failures, None);

        let result = eval_step("6d6s=3", 1, 1);
        assert_eq!(result.total, 1.0);
        assert_eq!(result.details.successes, Some(1));

        let result = eval_step("6d6cf<2", 1, 1);
        assert_eq!(result.total, 1.0);
        assert_eq!(result.details.failures, Some(1));
        assert_eq!(result.details.successes, None);

        let result = eval_step("3d1f1", 1, 1);
        assert_eq!(result.total, 3.0);
        assert_eq!(result.details.failures, Some(3));
        assert_eq!(result.details.successes, None);

        let result = eval_step("6d6<=2", 1, 1);
        assert_eq!(result.total, 2.0);
        assert_eq!(result.details.successes, Some(2));
    }

    #[test]
    fn test_explosion_kinds() {
        for s in ["6d6!", "6d6!!", "6d6!p"] {
            let result = eval_step(s, 1, 1);
            assert_eq!(result.rolls, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0], "{}", s);
            assert_eq!(result.total, 22.0, "{}", s);
            assert_eq!(result.details.explosions, 1, "{}", s);
        }

        // Chains continue while the newest die still meets the condition.
        let result = eval_step("1d6!>4", 5, 1);
        assert_eq!(result.rolls, vec![5.0, 6.0, 1.0]);
        assert_eq!(result.details.explosions, 2);

        let result = eval_step("1d6!>4l1", 5, 1);
        assert_eq!(result.rolls, vec![5.0, 6.0]);
    }

    #[test]
    fn test_explosion_on_highest_face() {
        // Basic fudge faces come up -1, 0, +1; +1 explodes into another -1.
        check("3dF!", -1.0, &[-1.0, 0.0, 1.0, -1.0]);
        // The highest custom side is 3, wherever it sits in the list.
        check("2d{1,3,2}!", 6.0, &[1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_invalid_dice() {
        check_err("0d6", ErrorKind::Validation);
        check_err("2d0", ErrorKind::Validation);
        check_err("1001d6", ErrorKind::Validation);
        check_err("2d{}", ErrorKind::Validation);
    }

    #[test]
    fn test_functions() {
        check("floor(7/2)", 3.0, &[]);
        check("ceil(7/2)", 4.0, &[]);
        check("round(2.5) + round(-2.5)", 1.0, &[]);
        check("abs(-4)", 4.0, &[]);
        check("max(1d6, 3, 2)", 3.0, &[1.0]);
        check("min(4, 2d6)", 3.0, &[1.0, 2.0]);
        check_err("floor(1, 2)", ErrorKind::Validation);
        check_err("max()", ErrorKind::Validation);
        check_err("sqrt(4)", ErrorKind::Syntax);
    }

    #[test]
    fn test_groups() {
        check("{1d6, 5}", 6.0, &[1.0, 5.0]);
        check("{1d6, 1d8, 1d10}kh1", 3.0, &[3.0]);
        check("{3, 2d6}sd", 6.0, &[3.0, 2.0, 1.0]);

        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        let result = eval_with("{1d6, 2}r1", &mut ctx).unwrap();
        assert_eq!(result.rolls, vec![1.0, 2.0]);
        assert_eq!(result.warnings.len(), 1);

        let result = eval_with("{1d6, 2}o", &mut ctx).unwrap();
        assert_eq!(result.details.roll_once, Some(true));
    }

    #[test]
    fn test_labels_and_details() {
        let mut ctx = EvalContext::with_roller(StepRoller::new(6, 0));
        let result = eval_with("1d6![fire] + 1d4", &mut ctx).unwrap();
        assert_eq!(result.details.labels, vec!["fire"]);
        assert_eq!(result.details.modifiers.len(), 1);
        assert!(result.warnings.len() == 1 && result.details.explosions == 99);
    }

    #[test]
    fn test_evaluate_without_registry_parse() {
        let node = Node::bin(Node::dice(2, 4), Add, Node::num(1.0));
        let mut ctx = EvalContext::with_roller(StepRoller::new(4, 0));
        let result = Registry::default().evaluate(&node, &mut ctx).unwrap();
        assert_eq!(result.total, 9.0);
        assert_eq!(result.rolls, vec![4.0, 4.0]);
    }
}
