//! Pattern-based axis rearrangement for n-dimensional arrays
//!
//! This library takes an einops-style pattern such as `b (h w) c -> b c h w`
//! and turns it into a checked plan of reshape and permute steps, then
//! applies that plan to an `ndarray` array.
//!
//! # Example
//!
//! ```rust
//! use ndarray::{ArrayD, IxDyn};
//! use pattern_rearrange::rearrange;
//!
//! let x = ArrayD::<f32>::zeros(IxDyn(&[12, 10]));
//! let y = rearrange(x, "(h w) c -> h w c", &[("h", 3)]).unwrap();
//! assert_eq!(y.shape(), &[3, 4, 10]);
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod planner;
pub mod resolver;

pub use ast::{AxisId, AxisSpec, AxisToken, Pattern};
pub use config::{ExecutorKind, RearrangeConfig};
pub use error::{ErrorKind, RearrangeError, RearrangeResult};
pub use executor::{Element, Executor};
pub use parser::{axes_of, tokenize, Parser};
pub use planner::{Planner, RearrangementPlan};
pub use resolver::{AxisSizeMap, Resolution, Resolver};

use ndarray::ArrayD;

/// Parses patterns, plans them and runs plans on one executor
#[derive(Debug, Clone, Default)]
pub struct Rearranger {
    config: RearrangeConfig,
    executor: Executor,
}

impl Rearranger {
    pub fn new(config: RearrangeConfig) -> Self {
        let executor = Executor::from_config(&config);
        Self { config, executor }
    }

    pub fn config(&self) -> &RearrangeConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Build the plan realizing `pattern` on an array of `shape`
    pub fn plan(
        &self,
        shape: &[usize],
        pattern: &str,
        hints: &[(&str, usize)],
    ) -> RearrangeResult<RearrangementPlan> {
        let pattern = Parser::new(pattern).parse()?;
        let resolution = Resolver::with_hints(hints.iter().copied()).resolve(shape, &pattern)?;
        Planner::new(&pattern, &resolution).plan(shape)
    }

    /// Rearrange `array` according to `pattern`
    pub fn rearrange<A: Element>(
        &self,
        array: ArrayD<A>,
        pattern: &str,
        hints: &[(&str, usize)],
    ) -> RearrangeResult<ArrayD<A>> {
        let plan = self.plan(array.shape(), pattern, hints)?;
        self.executor.execute(array, &plan)
    }
}

/// Build a plan with the default configuration
pub fn plan(
    shape: &[usize],
    pattern: &str,
    hints: &[(&str, usize)],
) -> RearrangeResult<RearrangementPlan> {
    Rearranger::default().plan(shape, pattern, hints)
}

/// Rearrange an array with the default configuration
pub fn rearrange<A: Element>(
    array: ArrayD<A>,
    pattern: &str,
    hints: &[(&str, usize)],
) -> RearrangeResult<ArrayD<A>> {
    Rearranger::default().rearrange(array, pattern, hints)
}
