//! Integer/Decimal promotion shared by every arithmetic and relational
//! operator: if either side is a Decimal both sides become Decimals,
//! otherwise both stay Integers.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    ast::BinaryOp,
    value::{Value, ValueKind},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Promoted {
    Integer(BigInt, BigInt),
    Decimal(BigDecimal, BigDecimal),
}

/// Returns `None` when either operand is not a number.
pub fn promote(left: &Value, right: &Value) -> Option<Promoted> {
    match (left.kind(), right.kind()) {
        (ValueKind::Integer(a), ValueKind::Integer(b)) => {
            Some(Promoted::Integer(a.clone(), b.clone()))
        }
        (ValueKind::Decimal(a), ValueKind::Decimal(b)) => {
            Some(Promoted::Decimal(a.clone(), b.clone()))
        }
        (ValueKind::Integer(a), ValueKind::Decimal(b)) => {
            Some(Promoted::Decimal(to_decimal(a), b.clone()))
        }
        (ValueKind::Decimal(a), ValueKind::Integer(b)) => {
            Some(Promoted::Decimal(a.clone(), to_decimal(b)))
        }
        _ => None,
    }
}

pub fn to_decimal(value: &BigInt) -> BigDecimal {
    BigDecimal::new(value.clone(), 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    DivisionByZero,
    NotArithmetic,
}

impl Promoted {
    /// Applies `+ - * /`. Relational and equality operators are rejected with
    /// [`ArithmeticError::NotArithmetic`].
    pub fn apply(self, op: BinaryOp) -> Result<Value, ArithmeticError> {
        match (op, self) {
            (BinaryOp::Add, Promoted::Integer(a, b)) => Ok(Value::integer(a + b)),
            (BinaryOp::Add, Promoted::Decimal(a, b)) => Ok(Value::decimal(a + b)),
            (BinaryOp::Sub, Promoted::Integer(a, b)) => Ok(Value::integer(a - b)),
            (BinaryOp::Sub, Promoted::Decimal(a, b)) => Ok(Value::decimal(a - b)),
            (BinaryOp::Mul, Promoted::Integer(a, b)) => Ok(Value::integer(a * b)),
            (BinaryOp::Mul, Promoted::Decimal(a, b)) => Ok(Value::decimal(a * b)),
            (BinaryOp::Div, Promoted::Integer(a, b)) => {
                if b.is_zero() {
                    Err(ArithmeticError::DivisionByZero)
                } else {
                    Ok(Value::integer(a / b))
                }
            }
            (BinaryOp::Div, Promoted::Decimal(a, b)) => {
                if b.is_zero() {
                    Err(ArithmeticError::DivisionByZero)
                } else {
                    Ok(Value::decimal(a / b))
                }
            }
            _ => Err(ArithmeticError::NotArithmetic),
        }
    }

    pub fn compare(&self) -> Ordering {
        match self {
            Promoted::Integer(a, b) => a.cmp(b),
            Promoted::Decimal(a, b) => a.cmp(b),
        }
    }
}
