//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Walks a parsed expression tree and produces a Value, threading a
//! Runtime (cell lookups plus a variable map) through the recursion.
//! CONTEXT: Every failure mode a formula can hit at evaluation time — a
//! divide by zero, a type mismatch, an out-of-range cell reference, an
//! unordered aggregate range — surfaces here as a RuntimeError whose message
//! is stored verbatim into the owning cell's error field by the caller.

use parser::{BinaryOperator, ExprKind, Expression, UnaryOperator, Value};

use crate::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError { message: message.into() }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

pub type EvalResult = Result<Value, RuntimeError>;

pub fn evaluate(expr: &Expression, rt: &mut Runtime) -> EvalResult {
    match &expr.kind {
        ExprKind::Literal(value) => Ok(value.clone()),
        ExprKind::Variable(name) => Ok(rt.get_variable(name)),
        ExprKind::Unary { op, inner } => evaluate_unary(*op, inner, rt),
        ExprKind::Binary { op, left, right } => evaluate_binary(*op, left, right, rt),
        ExprKind::Block(statements) => evaluate_block(statements, rt),
        ExprKind::If { cond, then_block, else_block } => match evaluate(cond, rt)? {
            Value::Boolean(true) => evaluate(then_block, rt),
            Value::Boolean(false) => evaluate(else_block, rt),
            _ => Err(RuntimeError::new("Condition must evaluate to a boolean")),
        },
        ExprKind::For { var, start, end, body } => evaluate_for(var, start, end, body, rt),
    }
}

fn evaluate_block(statements: &[Expression], rt: &mut Runtime) -> EvalResult {
    if statements.is_empty() {
        return Ok(Value::String(String::new()));
    }
    let mut last = Value::String(String::new());
    for stmt in statements {
        last = evaluate(stmt, rt)?;
    }
    Ok(last)
}

// A for-range's endpoints are required to be ordered (tl.row <= br.row and
// tl.col <= br.col) before iteration starts, so with inclusive bounds the
// range always covers at least one cell — the loop body always runs at
// least once. The empty-string fallback below exists only as a defensive
// default for that structurally unreachable case, mirroring a block's own
// empty-statement-list fallback.
fn evaluate_for(
    var: &str,
    start: &Expression,
    end: &Expression,
    body: &Expression,
    rt: &mut Runtime,
) -> EvalResult {
    let (top_left, bottom_right) = cell_range(start, end, rt)?;

    let mut last = Value::String(String::new());
    for row in top_left.0..=bottom_right.0 {
        for col in top_left.1..=bottom_right.1 {
            let cell_value = rt.get_cell_value(row, col)?;
            rt.set_variable(var.to_string(), cell_value);
            last = evaluate(body, rt)?;
        }
    }
    Ok(last)
}

fn cell_range(
    start: &Expression,
    end: &Expression,
    rt: &mut Runtime,
) -> Result<((i64, i64), (i64, i64)), RuntimeError> {
    let top_left = as_cell_address(evaluate(start, rt)?)?;
    let bottom_right = as_cell_address(evaluate(end, rt)?)?;
    if top_left.0 > bottom_right.0 || top_left.1 > bottom_right.1 {
        return Err(RuntimeError::new("Cells must be ordered (topLeft, bottomRight)"));
    }
    Ok((top_left, bottom_right))
}

fn as_cell_address(value: Value) -> Result<(i64, i64), RuntimeError> {
    match value {
        Value::CellAddress(row, col) => Ok((row, col)),
        _ => Err(RuntimeError::new("Aggregate range endpoints must be cell addresses")),
    }
}

fn evaluate_unary(op: UnaryOperator, inner: &Expression, rt: &mut Runtime) -> EvalResult {
    let value = evaluate(inner, rt)?;
    match (op, value) {
        (UnaryOperator::Negation, Value::Integer(i)) => Ok(Value::Integer(-i)),
        (UnaryOperator::Negation, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOperator::Negation, _) => Err(RuntimeError::new("Type mismatch in unary '-' operation")),

        (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOperator::Not, _) => Err(RuntimeError::new("Type mismatch in unary '!' operation")),

        (UnaryOperator::BitNot, Value::Integer(i)) => Ok(Value::Integer(!i)),
        (UnaryOperator::BitNot, _) => Err(RuntimeError::new("Type mismatch in unary '~' operation")),

        // FloatToInt backs the `int(...)` cast: truncates a Float toward
        // zero, is the identity on an Integer.
        (UnaryOperator::FloatToInt, Value::Float(f)) => Ok(Value::Integer(f.trunc() as i64)),
        (UnaryOperator::FloatToInt, Value::Integer(i)) => Ok(Value::Integer(i)),
        (UnaryOperator::FloatToInt, _) => Err(RuntimeError::new("Type mismatch in int() cast")),

        // IntToFloat backs the `float(...)` cast: promotes an Integer, is
        // the identity on a Float.
        (UnaryOperator::IntToFloat, Value::Integer(i)) => Ok(Value::Float(i as f64)),
        (UnaryOperator::IntToFloat, Value::Float(f)) => Ok(Value::Float(f)),
        (UnaryOperator::IntToFloat, _) => Err(RuntimeError::new("Type mismatch in float() cast")),
    }
}

fn evaluate_binary(
    op: BinaryOperator,
    left: &Expression,
    right: &Expression,
    rt: &mut Runtime,
) -> EvalResult {
    // And/Or/Assignment evaluate their right side conditionally (or as a
    // side effect), so they branch before the left-hand value is forced.
    match op {
        BinaryOperator::And => return evaluate_and(left, right, rt),
        BinaryOperator::Or => return evaluate_or(left, right, rt),
        BinaryOperator::Assignment => return evaluate_assignment(left, right, rt),
        _ => {}
    }

    let lv = evaluate(left, rt)?;
    let rv = evaluate(right, rt)?;
    match op {
        BinaryOperator::Add => arith(lv, rv, "+", i64::wrapping_add, |a, b| a + b, true),
        BinaryOperator::Subtract => arith(lv, rv, "-", i64::wrapping_sub, |a, b| a - b, false),
        BinaryOperator::Multiply => arith(lv, rv, "*", i64::wrapping_mul, |a, b| a * b, false),
        BinaryOperator::Divide => evaluate_divide(lv, rv),
        BinaryOperator::Modulo => evaluate_modulo(lv, rv),
        BinaryOperator::Exponentiation => evaluate_power(lv, rv),

        BinaryOperator::BitAnd => int_op(lv, rv, "&", |a, b| a & b),
        BinaryOperator::BitOr => int_op(lv, rv, "|", |a, b| a | b),
        BinaryOperator::BitXor => int_op(lv, rv, "^", |a, b| a ^ b),
        BinaryOperator::LeftShift => {
            int_op(lv, rv, "<<", |a, b| a.checked_shl(b as u32).unwrap_or(0))
        }
        BinaryOperator::RightShift => {
            int_op(lv, rv, ">>", |a, b| a.checked_shr(b as u32).unwrap_or(0))
        }

        BinaryOperator::Equals => equality(lv, rv, false),
        BinaryOperator::NotEquals => equality(lv, rv, true),

        BinaryOperator::LessThan => compare(lv, rv, "<", |a, b| a < b, |a, b| a < b),
        BinaryOperator::LessThanEqual => compare(lv, rv, "<=", |a, b| a <= b, |a, b| a <= b),
        BinaryOperator::GreaterThan => compare(lv, rv, ">", |a, b| a > b, |a, b| a > b),
        BinaryOperator::GreaterThanEqual => compare(lv, rv, ">=", |a, b| a >= b, |a, b| a >= b),

        BinaryOperator::LValueRef => lvalue_ref(lv, rv),
        BinaryOperator::RValueRef => rvalue_ref(lv, rv, rt),

        BinaryOperator::Max => aggregate(lv, rv, rt, Aggregate::Max),
        BinaryOperator::Min => aggregate(lv, rv, rt, Aggregate::Min),
        BinaryOperator::Mean => aggregate(lv, rv, rt, Aggregate::Mean),
        BinaryOperator::Sum => aggregate(lv, rv, rt, Aggregate::Sum),

        BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Assignment => unreachable!(),
    }
}

fn evaluate_and(left: &Expression, right: &Expression, rt: &mut Runtime) -> EvalResult {
    match evaluate(left, rt)? {
        Value::Boolean(false) => Ok(Value::Boolean(false)),
        Value::Boolean(true) => match evaluate(right, rt)? {
            Value::Boolean(b) => Ok(Value::Boolean(b)),
            _ => Err(RuntimeError::new("Type mismatch in '&&' operation")),
        },
        _ => Err(RuntimeError::new("Type mismatch in '&&' operation")),
    }
}

fn evaluate_or(left: &Expression, right: &Expression, rt: &mut Runtime) -> EvalResult {
    match evaluate(left, rt)? {
        Value::Boolean(true) => Ok(Value::Boolean(true)),
        Value::Boolean(false) => match evaluate(right, rt)? {
            Value::Boolean(b) => Ok(Value::Boolean(b)),
            _ => Err(RuntimeError::new("Type mismatch in '||' operation")),
        },
        _ => Err(RuntimeError::new("Type mismatch in '||' operation")),
    }
}

fn evaluate_assignment(left: &Expression, right: &Expression, rt: &mut Runtime) -> EvalResult {
    let name = match &left.kind {
        ExprKind::Variable(name) => name.clone(),
        _ => return Err(RuntimeError::new("Assignment target must be a variable")),
    };
    let value = evaluate(right, rt)?;
    rt.set_variable(name, value.clone());
    Ok(value)
}

fn arith(
    l: Value,
    r: Value,
    symbol: &str,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
    allow_string_concat: bool,
) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(int_op(a, b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(float_op(a, b as f64))),
        (Value::String(a), Value::String(b)) if allow_string_concat => Ok(Value::String(a + &b)),
        _ => Err(RuntimeError::new(format!("Type mismatch in '{}' operation", symbol))),
    }
}

fn evaluate_divide(l: Value, r: Value) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => {
            if b == 0 {
                Err(RuntimeError::new("Division by zero error"))
            } else {
                // wrapping_div, not `a / b`: i64::MIN / -1 overflows and
                // panics in debug builds, and that pair is reachable from
                // valid input (e.g. a left shift producing i64::MIN).
                Ok(Value::Integer(a.wrapping_div(b)))
            }
        }
        (Value::Float(a), Value::Float(b)) => {
            if b == 0.0 {
                Err(RuntimeError::new("Division by zero error"))
            } else {
                Ok(Value::Float(a / b))
            }
        }
        (Value::Integer(a), Value::Float(b)) => {
            if b == 0.0 {
                Err(RuntimeError::new("Division by zero error"))
            } else {
                Ok(Value::Float(a as f64 / b))
            }
        }
        (Value::Float(a), Value::Integer(b)) => {
            if b == 0 {
                Err(RuntimeError::new("Division by zero error"))
            } else {
                Ok(Value::Float(a / b as f64))
            }
        }
        _ => Err(RuntimeError::new("Type mismatch in '/' operation")),
    }
}

fn evaluate_modulo(l: Value, r: Value) -> EvalResult {
    match (l, r) {
        (Value::Integer(_), Value::Integer(0)) => Err(RuntimeError::new("Modulo by zero error")),
        // wrapping_rem for the same i64::MIN / -1 overflow reason as division.
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_rem(b))),
        _ => Err(RuntimeError::new("Type mismatch in '%' operation")),
    }
}

fn evaluate_power(l: Value, r: Value) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => {
            Ok(Value::Integer((a as f64).powf(b as f64).trunc() as i64))
        }
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a.powf(b))),
        _ => Err(RuntimeError::new("Type mismatch in '**' operation")),
    }
}

fn int_op(l: Value, r: Value, symbol: &str, op: fn(i64, i64) -> i64) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(op(a, b))),
        _ => Err(RuntimeError::new(format!("Type mismatch in '{}' operation", symbol))),
    }
}

fn equality(l: Value, r: Value, negate: bool) -> EvalResult {
    let eq = match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => return Err(RuntimeError::new("Type mismatch in equality comparison")),
    };
    Ok(Value::Boolean(eq != negate))
}

fn compare(
    l: Value,
    r: Value,
    symbol: &str,
    int_cmp: fn(&i64, &i64) -> bool,
    float_cmp: fn(&f64, &f64) -> bool,
) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Boolean(int_cmp(&a, &b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Boolean(float_cmp(&a, &b))),
        _ => Err(RuntimeError::new(format!("Type mismatch in '{}' operation", symbol))),
    }
}

fn lvalue_ref(l: Value, r: Value) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::CellAddress(a, b)),
        _ => Err(RuntimeError::new("LValue address components must be integers")),
    }
}

fn rvalue_ref(l: Value, r: Value, rt: &mut Runtime) -> EvalResult {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => rt.get_cell_value(a, b),
        _ => Err(RuntimeError::new("RValue address components must be integers")),
    }
}

enum Aggregate {
    Max,
    Min,
    Mean,
    Sum,
}

// Values classify exhaustively here: Integer/Float contribute, everything
// else (Boolean, String — including the empty-cell sentinel, CellAddress)
// is skipped. The Value enum has no variant falling outside either case, so
// there is no separate "unsupported type" error path to trigger.
fn aggregate(l: Value, r: Value, rt: &mut Runtime, kind: Aggregate) -> EvalResult {
    let top_left = as_cell_address(l)?;
    let bottom_right = as_cell_address(r)?;
    if top_left.0 > bottom_right.0 || top_left.1 > bottom_right.1 {
        return Err(RuntimeError::new("Cells must be ordered (topLeft, bottomRight)"));
    }

    let mut values = Vec::new();
    for row in top_left.0..=bottom_right.0 {
        for col in top_left.1..=bottom_right.1 {
            match rt.get_cell_value(row, col)? {
                Value::Integer(i) => values.push(i as f64),
                Value::Float(f) => values.push(f),
                Value::Boolean(_) | Value::String(_) | Value::CellAddress(_, _) => {}
            }
        }
    }

    // Max/Min fold from +/-infinity and are returned unmodified when nothing
    // in the range beats that seed; only Mean special-cases the empty range
    // to 0 (Sum's empty-range sum is already 0 via Iterator::sum).
    let result = match kind {
        Aggregate::Sum => values.iter().sum(),
        Aggregate::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        Aggregate::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
        Aggregate::Mean if values.is_empty() => 0.0,
        Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
    };
    Ok(Value::Float(result))
}
