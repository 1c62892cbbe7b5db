use crate::tokens::{self, Operator, Token};
use log::{debug, trace};

use error_chain::bail;


pub mod errors {
    use error_chain::error_chain;
    error_chain! {
        errors {
            DivisionByZero {
                description("Division by zero"),
                display("division by zero"),
            }

            MismatchedParenthesis {
                description("Mismatched parenthesis"),
                display("mismatched parenthesis"),
            }

            StackUnderflow(op: crate::tokens::Operator) {
                description("Missing operand"),
                display("missing operand for '{}'", op),
            }

            DanglingOperand(count: usize) {
                description("Operands left without an operator"),
                display("{} operands left without an operator", count),
            }

            EmptyExpression {
                description("Empty expression"),
                display("empty expression"),
            }
        }

        foreign_links {
            Tokenizer(crate::tokens::errors::Error);
        }
    }
}
use errors::*;


/// Entry on the operator stack.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Op(Operator),
    Open,
}

/// Two-stack infix evaluator.
///
/// Same-precedence operators reduce as soon as the next one arrives, which
/// makes every operator (power included) left-associative.
#[derive(Debug, Default, Clone)]
pub struct Evaluator {
    strict: bool,
}

impl Evaluator {

    pub fn new() -> Evaluator {
        Evaluator::default()
    }

    /// In strict mode unrecognized characters fail tokenization instead of
    /// being skipped.
    pub fn strict(strict: bool) -> Evaluator {
        Evaluator { strict }
    }

    pub fn evaluate(&self, expression: &str) -> Result<f64> {
        let tokens = tokens::tokenize(expression, self.strict)?;
        let mut operands: Vec<f64> = Vec::new();
        let mut ops: Vec<Pending> = Vec::new();

        for token in tokens {
            match token {
                Token::Number(x) => operands.push(x),
                Token::LeftParen => ops.push(Pending::Open),
                Token::RightParen => loop {
                    match ops.pop() {
                        Some(Pending::Op(op)) => reduce(op, &mut operands)?,
                        Some(Pending::Open) => break,
                        None => bail!(ErrorKind::MismatchedParenthesis),
                    }
                },
                Token::Operator(op) => {
                    while let Some(&Pending::Op(top)) = ops.last() {
                        if top.precedence() < op.precedence() {
                            break;
                        }
                        let _ = ops.pop();
                        reduce(top, &mut operands)?;
                    }
                    ops.push(Pending::Op(op));
                }
            }
        }

        while let Some(pending) = ops.pop() {
            match pending {
                Pending::Op(op) => reduce(op, &mut operands)?,
                Pending::Open => bail!(ErrorKind::MismatchedParenthesis),
            }
        }

        match operands.as_slice() {
            [result] => {
                debug!("{:?} evaluated to {}", expression, result);
                Ok(*result)
            }
            [] => Err(ErrorKind::EmptyExpression.into()),
            rest => Err(ErrorKind::DanglingOperand(rest.len()).into()),
        }
    }
}

fn reduce(op: Operator, operands: &mut Vec<f64>) -> Result<()> {
    let b = operands.pop().ok_or(ErrorKind::StackUnderflow(op))?;
    let a = operands.pop().ok_or(ErrorKind::StackUnderflow(op))?;
    let res = apply(op, a, b)?;
    trace!("{} {} {} = {}", a, op, b, res);
    operands.push(res);
    Ok(())
}

/// Applies `a op b`.
pub fn apply(op: Operator, a: f64, b: f64) -> Result<f64> {
    match op {
        Operator::Add => Ok(a + b),
        Operator::Sub => Ok(a - b),
        Operator::Mul => Ok(a * b),
        Operator::Div => {
            if b == 0.0 {
                bail!(ErrorKind::DivisionByZero);
            }
            Ok(a / b)
        }
        Operator::Pow => Ok(a.powf(b)),
        Operator::Rem => Ok(a % b),
        Operator::IntDiv => {
            if b == 0.0 {
                bail!(ErrorKind::DivisionByZero);
            }
            Ok((a / b).floor())
        }
    }
}

/// Renders finite integral values without a fractional part and everything
/// else with the default float formatting.
pub fn format_result(x: f64) -> String {
    if x.is_finite() && x == x.floor() {
        if x == 0.0 {
            // -0 prints as "-0" otherwise
            return "0".to_string();
        }
        format!("{:.0}", x)
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use error_chain::ChainedError;

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn eval(s: &str) -> f64 {
        match Evaluator::new().evaluate(s) {
            Ok(x) => x,
            Err(e) => panic!("{}: {}", s, e.display_chain()),
        }
    }

    #[test]
    fn test_precedence() {
        init_log();
        assert_eq!(eval("2+3*4"), 14.0);
        assert_eq!(eval("(2+3)*4"), 20.0);
        assert_eq!(eval("2*3**2"), 18.0);
        assert_eq!(eval("2**3"), 8.0);
        assert_eq!(eval("1 + 2 ** 3 * 2"), 17.0);
        assert_eq!(eval("10 - 7 // 2"), 7.0);
    }

    #[test]
    fn test_operators() {
        init_log();
        assert_eq!(eval("7//2"), 3.0);
        assert_eq!(eval("5%3"), 2.0);
        assert_eq!(eval("5.5 % 2"), 1.5);
        assert_eq!(eval("1/4"), 0.25);
        assert_eq!(eval("0 - 7 // 2"), -3.0);
        assert_eq!(eval("(0 - 7) // 2"), -4.0);
    }

    #[test]
    fn equal_priority_chain() {
        init_log();
        assert_eq!(eval("2 + 2 + 2 + 2 + 2"), 10.0);
        assert_eq!(eval("2 * 2 * 2 + 2 * 2 * 2"), 16.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("32 / 2 /2 /2  /2"), 2.0);
        assert_eq!(eval("2 ** 3 ** 2"), 64.0);
    }

    #[test]
    fn test_nested_parens() {
        init_log();
        assert_eq!(eval("((1 + 2) * (3 + 4)) % 5"), 1.0);
        assert_eq!(eval("2 * (3 + (4 - 1) ** 2)"), 24.0);
        assert_eq!(eval(" ( 8 ) "), 8.0);
    }

    #[test]
    fn test_division_by_zero() {
        init_log();
        let calc = Evaluator::new();
        for case in &["5/0", "5//0", "1 + 5 / (2 - 2)"] {
            match calc.evaluate(case) {
                Err(Error(ErrorKind::DivisionByZero, _)) => (),
                other => panic!("{}: expected division by zero, got {:?}", case, other),
            }
        }
        assert!(eval("5 % 0").is_nan());
    }

    #[test]
    fn test_malformed() {
        init_log();
        let calc = Evaluator::new();
        match calc.evaluate("1 + 2)") {
            Err(Error(ErrorKind::MismatchedParenthesis, _)) => (),
            other => panic!("expected mismatched parenthesis, got {:?}", other),
        }
        match calc.evaluate("(1 + 2") {
            Err(Error(ErrorKind::MismatchedParenthesis, _)) => (),
            other => panic!("expected mismatched parenthesis, got {:?}", other),
        }
        match calc.evaluate("-3") {
            Err(Error(ErrorKind::StackUnderflow(Operator::Sub), _)) => (),
            other => panic!("expected stack underflow, got {:?}", other),
        }
        match calc.evaluate("2 (3)") {
            Err(Error(ErrorKind::DanglingOperand(2), _)) => (),
            other => panic!("expected dangling operand, got {:?}", other),
        }
        match calc.evaluate("   ") {
            Err(Error(ErrorKind::EmptyExpression, _)) => (),
            other => panic!("expected empty expression, got {:?}", other),
        }
        match calc.evaluate("1..2") {
            Err(Error(ErrorKind::Tokenizer(_), _)) => (),
            other => panic!("expected tokenizer error, got {:?}", other),
        }
    }

    #[test]
    fn test_strictness() {
        init_log();
        assert_eq!(Evaluator::new().evaluate("2 + abc3").unwrap(), 5.0);
        assert!(Evaluator::strict(true).evaluate("2 + abc3").is_err());
    }

    #[test]
    fn test_format_result() {
        assert_eq!(format_result(14.0), "14");
        assert_eq!(format_result(-3.0), "-3");
        assert_eq!(format_result(-0.0), "0");
        assert_eq!(format_result(0.25), "0.25");
        assert_eq!(format_result(1e20), "100000000000000000000");
        assert_eq!(format_result(f64::INFINITY), "inf");
        assert_eq!(format_result(f64::NAN), "NaN");
    }
}
