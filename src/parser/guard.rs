use std::str::FromStr;

use thiserror::Error;

use crate::expressions::GuardExpression;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardParseError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("Operator at position {position} is missing an operand")]
    MissingOperand { position: usize },

    #[error("Operand at position {position} is not preceded by an operator")]
    UnexpectedOperand { position: usize },

    #[error("Parenthesis opened at position {position} is never closed")]
    UnclosedParenthesis { position: usize },

    #[error("Parenthesis closed at position {position} was never opened")]
    UnopenedParenthesis { position: usize },

    #[error("Proposition index {0} does not fit in 32 bits")]
    IndexOverflow(String),

    #[error("Expected exactly one expression, found {0}")]
    OperandCount(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    Or,
    And,
    Not,
    Open,
}

impl Operator {
    /// Precedence of an operator sitting on the stack.
    fn in_stack(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Or => 2,
            Self::And => 4,
            Self::Not => 6,
        }
    }

    /// Precedence of an operator arriving from the input.
    fn incoming(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 3,
            Self::Not => 5,
            Self::Open => 100,
        }
    }
}

struct ShuntingYard {
    operands: Vec<GuardExpression>,
    operators: Vec<(Operator, usize)>,
}

impl ShuntingYard {
    fn reduce(&mut self, operator: Operator, position: usize) -> Result<(), GuardParseError> {
        let missing = || GuardParseError::MissingOperand { position };

        let expression = match operator {
            Operator::Not => GuardExpression::not(self.operands.pop().ok_or_else(missing)?),
            Operator::And | Operator::Or => {
                let right = self.operands.pop().ok_or_else(missing)?;
                let left = self.operands.pop().ok_or_else(missing)?;

                if operator == Operator::And {
                    GuardExpression::and(left, right)
                } else {
                    GuardExpression::or(left, right)
                }
            }
            Operator::Open => return Err(GuardParseError::UnclosedParenthesis { position }),
        };

        self.operands.push(expression);
        Ok(())
    }

    /// Reduce every stacked operator that binds at least as tightly as `incoming`.
    fn push_operator(
        &mut self,
        incoming: Operator,
        position: usize,
    ) -> Result<(), GuardParseError> {
        while let Some(&(top, top_position)) = self.operators.last() {
            if incoming.incoming() > top.in_stack() {
                break;
            }

            self.operators.pop();
            self.reduce(top, top_position)?;
        }

        self.operators.push((incoming, position));
        Ok(())
    }

    fn close(&mut self, position: usize) -> Result<(), GuardParseError> {
        loop {
            match self.operators.pop() {
                Some((Operator::Open, _)) => return Ok(()),
                Some((operator, operator_position)) => self.reduce(operator, operator_position)?,
                None => return Err(GuardParseError::UnopenedParenthesis { position }),
            }
        }
    }

    fn finish(mut self) -> Result<GuardExpression, GuardParseError> {
        while let Some((operator, position)) = self.operators.pop() {
            self.reduce(operator, position)?;
        }

        if self.operands.len() != 1 {
            return Err(GuardParseError::OperandCount(self.operands.len()));
        }

        self.operands.pop().ok_or(GuardParseError::OperandCount(0))
    }
}

/// Parse a transition guard over integer proposition indices.
///
/// The grammar is `t`, `f`, decimal indices, prefix `!`, infix `&` and `|` and parentheses, with
/// `!` binding tightest and `|` loosest. Whitespace between tokens is ignored.
///
/// ```rust
/// use tltl_reward::expressions::GuardExpression;
/// use tltl_reward::parser::parse_guard;
///
/// let guard = parse_guard("!(0 | 1) & t").unwrap();
///
/// assert_eq!(
///     guard,
///     GuardExpression::and(
///         GuardExpression::not(GuardExpression::or(
///             GuardExpression::IntRef(0),
///             GuardExpression::IntRef(1),
///         )),
///         GuardExpression::Boolean(true),
///     )
/// );
/// ```
pub fn parse_guard(input: &str) -> Result<GuardExpression, GuardParseError> {
    let mut yard = ShuntingYard {
        operands: Vec::new(),
        operators: Vec::new(),
    };

    // Alternates between expecting an operand (or prefix operator) and expecting an infix operator.
    let mut expect_operand = true;
    let mut chars = input.char_indices().peekable();

    while let Some((position, character)) = chars.next() {
        match character {
            c if c.is_whitespace() => continue,
            't' | 'f' | '0'..='9' if !expect_operand => {
                return Err(GuardParseError::UnexpectedOperand { position });
            }
            't' | 'f' => {
                yard.operands.push(GuardExpression::Boolean(character == 't'));
                expect_operand = false;
            }
            '0'..='9' => {
                let mut end = position + 1;

                while let Some(&(next, digit)) = chars.peek() {
                    if !digit.is_ascii_digit() {
                        break;
                    }

                    end = next + 1;
                    chars.next();
                }

                let digits = &input[position..end];
                let index = digits
                    .parse::<u32>()
                    .map_err(|_| GuardParseError::IndexOverflow(digits.to_string()))?;

                yard.operands.push(GuardExpression::IntRef(index));
                expect_operand = false;
            }
            '!' | '(' if !expect_operand => {
                return Err(GuardParseError::UnexpectedOperand { position });
            }
            // Prefix operators have no left operand to reduce against.
            '!' => yard.operators.push((Operator::Not, position)),
            '(' => yard.operators.push((Operator::Open, position)),
            '&' | '|' if expect_operand => return Err(GuardParseError::MissingOperand { position }),
            '&' => {
                yard.push_operator(Operator::And, position)?;
                expect_operand = true;
            }
            '|' => {
                yard.push_operator(Operator::Or, position)?;
                expect_operand = true;
            }
            ')' if expect_operand => return Err(GuardParseError::MissingOperand { position }),
            ')' => yard.close(position)?,
            character => return Err(GuardParseError::UnexpectedCharacter { character, position }),
        }
    }

    if expect_operand {
        if let Some(&(_, position)) = yard.operators.last() {
            return Err(GuardParseError::MissingOperand { position });
        }
    }

    yard.finish()
}

impl FromStr for GuardExpression {
    type Err = GuardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_guard(s)
    }
}
