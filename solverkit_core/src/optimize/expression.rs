//! Linear expressions over model variables
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

use indexmap::IndexMap;

use crate::optimize::variable::VariableHandle;

/// A linear expression `sum(coefficient * variable) + constant`
///
/// Terms are keyed by variable name, so adding the same variable twice merges
/// the coefficients.
///
/// # Examples
/// ```rust
/// use solverkit_core::optimize::adapter::SolverAdapter;
/// use solverkit_core::optimize::expression::LinearExpression;
/// use solverkit_core::optimize::variable::VariableType;
/// let mut adapter = SolverAdapter::new("example").unwrap();
/// let x = adapter.add_variable(0., 10., VariableType::Integer, "x").unwrap();
/// let y = adapter.add_variable(0., 5., VariableType::Continuous, "y").unwrap();
/// // 3*x + 2*y + 1
/// let expr = &x * 3. + &y * 2. + 1.;
/// assert_eq!(expr.coefficient("x"), 3.);
/// // The same thing, summed from terms
/// let summed: LinearExpression = vec![&x * 3., &y * 2., LinearExpression::constant(1.)]
///     .into_iter()
///     .sum();
/// assert_eq!(expr, summed);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    terms: IndexMap<String, f64>,
    constant: f64,
}

impl LinearExpression {
    /// Create an empty expression, equal to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expression holding only a constant
    pub fn constant(value: f64) -> Self {
        Self {
            terms: IndexMap::new(),
            constant: value,
        }
    }

    /// Create an expression from `(variable name, coefficient)` pairs
    pub fn from_terms<S: AsRef<str>>(terms: &[(S, f64)]) -> Self {
        terms
            .iter()
            .map(|(name, coef)| (name.as_ref().to_string(), *coef))
            .collect()
    }

    /// Add `coefficient * variable` to the expression
    pub fn add_term(&mut self, variable: impl Into<String>, coefficient: f64) {
        *self.terms.entry(variable.into()).or_insert(0.0) += coefficient;
    }

    /// Add a constant to the expression
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Coefficient of a variable, zero if it is absent
    pub fn coefficient(&self, variable: &str) -> f64 {
        self.terms.get(variable).copied().unwrap_or(0.0)
    }

    pub fn get_constant(&self) -> f64 {
        self.constant
    }

    /// Iterate over `(variable name, coefficient)` pairs in insertion order
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.terms.iter().map(|(name, coef)| (name.as_str(), *coef))
    }

    /// Names of the variables appearing in the expression
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Does the expression mention this variable
    pub fn contains(&self, variable: &str) -> bool {
        self.terms.contains_key(variable)
    }

    /// Evaluate the expression for the given variable values
    ///
    /// Variables missing from `values` count as zero.
    pub fn evaluate(&self, values: &IndexMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(name, coef)| coef * values.get(name).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    /// Split off the constant, returning the pure linear part and the constant
    pub(crate) fn into_parts(self) -> (IndexMap<String, f64>, f64) {
        (self.terms, self.constant)
    }

    fn scale(mut self, factor: f64) -> Self {
        self.terms.values_mut().for_each(|coef| *coef *= factor);
        self.constant *= factor;
        self
    }
}

impl From<&VariableHandle> for LinearExpression {
    fn from(value: &VariableHandle) -> Self {
        let mut expr = LinearExpression::new();
        expr.add_term(value.name(), 1.0);
        expr
    }
}

impl From<VariableHandle> for LinearExpression {
    fn from(value: VariableHandle) -> Self {
        LinearExpression::from(&value)
    }
}

impl From<f64> for LinearExpression {
    fn from(value: f64) -> Self {
        LinearExpression::constant(value)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for LinearExpression {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut expr = LinearExpression::new();
        for (name, coef) in iter {
            expr.add_term(name, coef);
        }
        expr
    }
}

impl Add for LinearExpression {
    type Output = LinearExpression;

    fn add(mut self, rhs: LinearExpression) -> Self::Output {
        for (name, coef) in rhs.terms {
            self.add_term(name, coef);
        }
        self.constant += rhs.constant;
        self
    }
}

impl Add<f64> for LinearExpression {
    type Output = LinearExpression;

    fn add(mut self, rhs: f64) -> Self::Output {
        self.constant += rhs;
        self
    }
}

impl Add<&VariableHandle> for LinearExpression {
    type Output = LinearExpression;

    fn add(mut self, rhs: &VariableHandle) -> Self::Output {
        self.add_term(rhs.name(), 1.0);
        self
    }
}

impl Sub for LinearExpression {
    type Output = LinearExpression;

    fn sub(self, rhs: LinearExpression) -> Self::Output {
        self + (-rhs)
    }
}

impl Sub<f64> for LinearExpression {
    type Output = LinearExpression;

    fn sub(self, rhs: f64) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for LinearExpression {
    type Output = LinearExpression;

    fn neg(self) -> Self::Output {
        self.scale(-1.0)
    }
}

impl Mul<f64> for LinearExpression {
    type Output = LinearExpression;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl Mul<f64> for &VariableHandle {
    type Output = LinearExpression;

    fn mul(self, rhs: f64) -> Self::Output {
        let mut expr = LinearExpression::new();
        expr.add_term(self.name(), rhs);
        expr
    }
}

impl Mul<&VariableHandle> for f64 {
    type Output = LinearExpression;

    fn mul(self, rhs: &VariableHandle) -> Self::Output {
        rhs * self
    }
}

impl Sum for LinearExpression {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(LinearExpression::new(), |acc, expr| acc + expr)
    }
}

impl Display for LinearExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut parts = self
            .terms
            .iter()
            .map(|(name, coef)| format!("{}*{}", coef, name))
            .collect::<Vec<_>>();
        if self.constant != 0.0 || parts.is_empty() {
            parts.push(format!("{}", self.constant));
        }
        write!(f, "{}", parts.join(" + "))
    }
}
