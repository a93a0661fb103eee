//! Plan execution
//!
//! Every executor performs the same four steps on an `ndarray` array:
//! elide literal axes, reshape to the intermediate shape, permute, reshape
//! to the final shape. They differ only in how the permuted copy is made.

use log::debug;
#[cfg(not(feature = "parallel"))]
use log::warn;
use ndarray::{ArrayD, Axis, IxDyn, ShapeError};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::config::{ExecutorKind, RearrangeConfig};
use crate::error::{RearrangeError, RearrangeResult};
use crate::planner::RearrangementPlan;

/// Element types any executor can move
pub trait Element: Clone + Send + Sync {}

impl<T: Clone + Send + Sync> Element for T {}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Executor {
    #[default]
    Generic,
    #[cfg(feature = "parallel")]
    Parallel { min_len: usize },
    Native,
}

impl Executor {
    pub fn from_config(config: &RearrangeConfig) -> Executor {
        match config.executor {
            ExecutorKind::Generic => Executor::Generic,
            ExecutorKind::Native => Executor::Native,
            #[cfg(feature = "parallel")]
            ExecutorKind::Parallel => Executor::Parallel {
                min_len: config.parallel_min_len,
            },
            #[cfg(not(feature = "parallel"))]
            ExecutorKind::Parallel => {
                warn!("built without the `parallel` feature, using the native executor");
                Executor::Native
            }
        }
    }

    pub fn kind(&self) -> ExecutorKind {
        match self {
            Executor::Generic => ExecutorKind::Generic,
            #[cfg(feature = "parallel")]
            Executor::Parallel { .. } => ExecutorKind::Parallel,
            Executor::Native => ExecutorKind::Native,
        }
    }

    /// Apply `plan` to `array`, which must have the shape the plan was built for
    pub fn execute<A: Element>(
        &self,
        array: ArrayD<A>,
        plan: &RearrangementPlan,
    ) -> RearrangeResult<ArrayD<A>> {
        if array.shape() != plan.input_shape.as_slice() {
            return Err(RearrangeError::consumption(format!(
                "Plan was built for shape {:?}, got {:?}",
                plan.input_shape,
                array.shape()
            )));
        }

        let array = elide(array, &plan.elided_axes);
        match self {
            Executor::Generic => reshape_permute(array, plan),
            #[cfg(feature = "parallel")]
            Executor::Parallel { min_len } if array.len() >= *min_len => par_gather(array, plan),
            #[cfg(feature = "parallel")]
            Executor::Parallel { .. } => gather(array, plan),
            Executor::Native => gather(array, plan),
        }
    }
}

/// Select index 0 along each elided axis, highest position first
fn elide<A>(mut array: ArrayD<A>, elided_axes: &[usize]) -> ArrayD<A> {
    for &axis in elided_axes.iter().rev() {
        array = array.index_axis_move(Axis(axis), 0);
    }
    array
}

fn shape_error(err: ShapeError) -> RearrangeError {
    RearrangeError::conservation(err.to_string())
}

/// Reshape and permute through ndarray, copying only when the layout requires it
fn reshape_permute<A: Clone>(array: ArrayD<A>, plan: &RearrangementPlan) -> RearrangeResult<ArrayD<A>> {
    if plan.is_identity_permutation() && array.is_standard_layout() {
        debug!("generic executor: contiguous reshape to {:?}", plan.final_shape);
        return array
            .into_shape_with_order(plan.final_shape.as_slice())
            .map_err(shape_error);
    }

    debug!("generic executor: permute {:?}", plan.permutation);
    let reshaped = array
        .to_shape(plan.intermediate_shape.as_slice())
        .map_err(shape_error)?;
    let permuted = reshaped.permuted_axes(plan.permutation.as_slice());
    let output = permuted
        .to_shape(plan.final_shape.as_slice())
        .map_err(shape_error)?
        .into_owned();
    Ok(output)
}

/// Dimensions and source strides of the permuted intermediate array
fn permuted_layout(plan: &RearrangementPlan) -> (Vec<usize>, Vec<usize>) {
    let mut strides = vec![1usize; plan.intermediate_shape.len()];
    for axis in (0..strides.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * plan.intermediate_shape[axis + 1];
    }

    plan.permutation
        .iter()
        .map(|&slot| (plan.intermediate_shape[slot], strides[slot]))
        .unzip()
}

/// Contiguous source data, checked against the intermediate element count
fn source_len_check<A>(data: &[A], plan: &RearrangementPlan) -> RearrangeResult<()> {
    let expected: usize = plan.intermediate_shape.iter().product();
    if data.len() != expected {
        return Err(RearrangeError::conservation(format!(
            "total size {} != expected {}",
            data.len(),
            expected
        )));
    }
    Ok(())
}

/// Single-threaded strided gather, walking output coordinates as an odometer
fn gather<A: Clone>(array: ArrayD<A>, plan: &RearrangementPlan) -> RearrangeResult<ArrayD<A>> {
    let source = array.as_standard_layout();
    let data = source
        .as_slice()
        .ok_or_else(|| RearrangeError::conservation("source is not contiguous"))?;
    source_len_check(data, plan)?;

    let (dims, strides) = permuted_layout(plan);
    let total: usize = dims.iter().product();
    debug!("native executor: gathering {} elements", total);

    let mut output = Vec::with_capacity(total);
    if total > 0 {
        let mut index = vec![0usize; dims.len()];
        let mut offset = 0usize;
        'copy: loop {
            output.push(data[offset].clone());

            let mut axis = dims.len();
            loop {
                if axis == 0 {
                    break 'copy;
                }
                axis -= 1;
                index[axis] += 1;
                offset += strides[axis];
                if index[axis] < dims[axis] {
                    break;
                }
                offset -= strides[axis] * dims[axis];
                index[axis] = 0;
            }
        }
    }

    ArrayD::from_shape_vec(IxDyn(&plan.final_shape), output).map_err(shape_error)
}

/// Parallel gather: each output element computes its own source offset
#[cfg(feature = "parallel")]
fn par_gather<A: Element>(array: ArrayD<A>, plan: &RearrangementPlan) -> RearrangeResult<ArrayD<A>> {
    let source = array.as_standard_layout();
    let data = source
        .as_slice()
        .ok_or_else(|| RearrangeError::conservation("source is not contiguous"))?;
    source_len_check(data, plan)?;

    let (dims, strides) = permuted_layout(plan);
    let total: usize = dims.iter().product();
    debug!("parallel executor: gathering {} elements", total);

    let output: Vec<A> = (0..total)
        .into_par_iter()
        .map(|i| {
            let mut rest = i;
            let mut offset = 0;
            for axis in (0..dims.len()).rev() {
                offset += (rest % dims[axis]) * strides[axis];
                rest /= dims[axis];
            }
            data[offset].clone()
        })
        .collect();

    ArrayD::from_shape_vec(IxDyn(&plan.final_shape), output).map_err(shape_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::Parser;
    use crate::planner::Planner;
    use crate::resolver::Resolver;
    use ndarray::{s, Array};

    fn arange(shape: &[usize]) -> ArrayD<i64> {
        let n: usize = shape.iter().product();
        Array::from_iter(0..n as i64).into_shape_with_order(shape).unwrap()
    }

    fn plan_for(shape: &[usize], pattern: &str, hints: &[(&str, usize)]) -> RearrangementPlan {
        let pattern = Parser::new(pattern).parse().unwrap();
        let resolution = Resolver::with_hints(hints.iter().copied())
            .resolve(shape, &pattern)
            .unwrap();
        Planner::new(&pattern, &resolution).plan(shape).unwrap()
    }

    fn executors() -> Vec<Executor> {
        vec![
            Executor::Generic,
            Executor::Native,
            #[cfg(feature = "parallel")]
            Executor::Parallel { min_len: 0 },
        ]
    }

    #[test]
    fn test_transpose_matches_ndarray() {
        let x = arange(&[2, 3, 4, 5]);
        let plan = plan_for(x.shape(), "a b c d -> d c b a", &[]);
        let expected = x.clone().permuted_axes(IxDyn(&[3, 2, 1, 0]));
        for executor in executors() {
            assert_eq!(executor.execute(x.clone(), &plan).unwrap(), expected, "{:?}", executor);
        }
    }

    #[test]
    fn test_flatten_order() {
        let x = arange(&[2, 3]);
        let plan = plan_for(x.shape(), "h w -> (w h)", &[]);
        for executor in executors() {
            let out = executor.execute(x.clone(), &plan).unwrap();
            assert_eq!(out.as_slice().unwrap(), &[0, 3, 1, 4, 2, 5]);
        }
    }

    #[test]
    fn test_literal_elision_selects_first_index() {
        let x = arange(&[2, 3, 4]);
        let plan = plan_for(x.shape(), "2 b c -> b c", &[]);
        let expected = x.slice(s![0, .., ..]).to_owned().into_dyn();
        for executor in executors() {
            assert_eq!(executor.execute(x.clone(), &plan).unwrap(), expected);
        }
    }

    #[test]
    fn test_non_contiguous_input() {
        let full = arange(&[3, 4, 5]);
        let x = full.slice(s![.., ..;2, ..]).to_owned().into_dyn();
        let strided = full.slice_move(s![.., ..;2, ..]).into_dyn();
        assert!(!strided.is_standard_layout());

        let plan = plan_for(x.shape(), "h w c -> c (w h)", &[]);
        let expected = Executor::Native.execute(x, &plan).unwrap();
        for executor in executors() {
            assert_eq!(executor.execute(strided.clone(), &plan).unwrap(), expected);
        }
    }

    #[test]
    fn test_zero_sized_and_scalar_arrays() {
        let x = ArrayD::<f32>::zeros(IxDyn(&[0, 3, 4]));
        let plan = plan_for(x.shape(), "b h w -> w (h b)", &[]);
        for executor in executors() {
            assert_eq!(executor.execute(x.clone(), &plan).unwrap().shape(), &[4, 0]);
        }

        let x = ArrayD::from_elem(IxDyn(&[]), 7u8);
        let plan = plan_for(x.shape(), " -> 1 1", &[]);
        for executor in executors() {
            let out = executor.execute(x.clone(), &plan).unwrap();
            assert_eq!(out.shape(), &[1, 1]);
            assert_eq!(out[[0, 0]], 7);
        }
    }

    #[test]
    fn test_rejects_foreign_shape() {
        let plan = plan_for(&[2, 3], "a b -> b a", &[]);
        let err = Executor::Native.execute(arange(&[3, 2]), &plan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeConsumption);
    }

    #[test]
    fn test_from_config() {
        let config = RearrangeConfig::new(ExecutorKind::Native);
        assert_eq!(Executor::from_config(&config), Executor::Native);
        assert_eq!(Executor::from_config(&RearrangeConfig::default()).kind(), ExecutorKind::Generic);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_threshold() {
        let config = RearrangeConfig::new(ExecutorKind::Parallel).with_parallel_min_len(100);
        assert_eq!(Executor::from_config(&config), Executor::Parallel { min_len: 100 });

        let x = arange(&[4, 50]);
        let plan = plan_for(x.shape(), "a b -> b a", &[]);
        let out = Executor::from_config(&config).execute(x.clone(), &plan).unwrap();
        assert_eq!(out, x.reversed_axes());
    }
}
