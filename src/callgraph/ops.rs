//! Element-wise arithmetic between frames.

use super::CallGraphFrame;
use crate::utils::error::FrameError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary metric operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// IEEE semantics, so division by zero yields an infinity or NaN
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        f.write_str(symbol)
    }
}

impl std::str::FromStr for ArithOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" | "+" => Ok(ArithOp::Add),
            "sub" | "-" => Ok(ArithOp::Sub),
            "mul" | "*" => Ok(ArithOp::Mul),
            "div" | "/" => Ok(ArithOp::Div),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

impl CallGraphFrame {
    /// `self op other` into a new frame; neither input changes
    pub fn combine(&self, other: &CallGraphFrame, op: ArithOp) -> Result<CallGraphFrame, FrameError> {
        let mut result = self.copy();
        result.combine_assign(other, op)?;
        Ok(result)
    }

    /// `self op= other`
    ///
    /// `self` is unified with a copy of `other`, then every metric column of
    /// the union is combined row by row.
    pub fn combine_assign(&mut self, other: &CallGraphFrame, op: ArithOp) -> Result<(), FrameError> {
        let mut other = other.copy();
        self.unify(&mut other)?;

        let metrics = self.metric_columns();
        for metric in &metrics {
            let rhs = &other.table;
            self.table.update_column(metric, |key, lhs| {
                op.apply(lhs, rhs.number(key, metric).unwrap_or(0.0))
            });
        }
        debug!("Applied '{}' over {} metric columns", op, metrics.len());
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &CallGraphFrame) -> Result<CallGraphFrame, FrameError> {
        self.combine(other, ArithOp::Add)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(&self, other: &CallGraphFrame) -> Result<CallGraphFrame, FrameError> {
        self.combine(other, ArithOp::Sub)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(&self, other: &CallGraphFrame) -> Result<CallGraphFrame, FrameError> {
        self.combine(other, ArithOp::Mul)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn div(&self, other: &CallGraphFrame) -> Result<CallGraphFrame, FrameError> {
        self.combine(other, ArithOp::Div)
    }

    pub fn add_assign(&mut self, other: &CallGraphFrame) -> Result<(), FrameError> {
        self.combine_assign(other, ArithOp::Add)
    }

    pub fn sub_assign(&mut self, other: &CallGraphFrame) -> Result<(), FrameError> {
        self.combine_assign(other, ArithOp::Sub)
    }

    pub fn mul_assign(&mut self, other: &CallGraphFrame) -> Result<(), FrameError> {
        self.combine_assign(other, ArithOp::Mul)
    }

    pub fn div_assign(&mut self, other: &CallGraphFrame) -> Result<(), FrameError> {
        self.combine_assign(other, ArithOp::Div)
    }
}
