//! Reshape/transpose planning
//!
//! Turns a resolved pattern into a reshape -> permute -> reshape sequence.
//!
//! For `b (h w) c -> b h w c` on a (2, 12, 10) array with h=3:
//! - intermediate shape (2, 3, 4, 10) names the slots b, h, w, c
//! - the permutation is the identity
//! - the final shape is (2, 3, 4, 10)

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ast::{AxisId, AxisToken, Pattern};
use crate::error::{RearrangeError, RearrangeResult};
use crate::resolver::Resolution;

/// A fully shape-concrete rearrangement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RearrangementPlan {
    /// Shape of the array the plan was built for
    pub input_shape: Vec<usize>,
    /// Input dimensions to index at 0 and drop before reshaping, ascending
    pub elided_axes: Vec<usize>,
    /// One slot per named axis after splitting groups and expanding `...`
    pub intermediate_shape: Vec<usize>,
    pub input_axis_order: Vec<AxisId>,
    pub output_axis_order: Vec<AxisId>,
    /// `permutation[k]` is the intermediate slot placed at position k
    pub permutation: Vec<usize>,
    pub final_shape: Vec<usize>,
}

impl RearrangementPlan {
    /// Intermediate sizes in permuted order
    pub fn permuted_shape(&self) -> Vec<usize> {
        self.permutation
            .iter()
            .map(|&slot| self.intermediate_shape[slot])
            .collect()
    }

    pub fn is_identity_permutation(&self) -> bool {
        self.permutation.iter().enumerate().all(|(i, &p)| i == p)
    }

    /// Number of elements in the output
    pub fn element_count(&self) -> usize {
        self.final_shape.iter().product()
    }

    /// Export to JSON format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for RearrangementPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |ids: &[AxisId]| {
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(f, "Input shape: {:?}", self.input_shape)?;
        if !self.elided_axes.is_empty() {
            writeln!(f, "Elided axes: {:?}", self.elided_axes)?;
        }
        writeln!(f, "Intermediate shape: {:?}", self.intermediate_shape)?;
        writeln!(f, "Input axes: [{}]", names(&self.input_axis_order))?;
        writeln!(f, "Output axes: [{}]", names(&self.output_axis_order))?;
        writeln!(f, "Permutation: {:?}", self.permutation)?;
        write!(f, "Final shape: {:?}", self.final_shape)
    }
}

/// Planner for one resolved pattern
pub struct Planner<'a> {
    pattern: &'a Pattern,
    resolution: &'a Resolution,
}

impl<'a> Planner<'a> {
    pub fn new(pattern: &'a Pattern, resolution: &'a Resolution) -> Self {
        Self { pattern, resolution }
    }

    /// Build the plan for an array of the given shape
    pub fn plan(&self, shape: &[usize]) -> RearrangeResult<RearrangementPlan> {
        let (input_axis_order, intermediate_shape) = self.input_slots()?;
        let (output_axis_order, final_shape) = self.output_slots()?;
        let permutation = permutation(&input_axis_order, &output_axis_order);

        let plan = RearrangementPlan {
            input_shape: shape.to_vec(),
            elided_axes: self.resolution.elided.clone(),
            intermediate_shape,
            input_axis_order,
            output_axis_order,
            permutation,
            final_shape,
        };
        self.check_conservation(&plan)?;

        debug!(
            "planned '{}' on {:?}: intermediate {:?}, permutation {:?}, final {:?}",
            self.pattern, shape, plan.intermediate_shape, plan.permutation, plan.final_shape
        );
        Ok(plan)
    }

    /// Slot ids and sizes of the reshaped input
    fn input_slots(&self) -> RearrangeResult<(Vec<AxisId>, Vec<usize>)> {
        let mut order = Vec::new();
        let mut shape = Vec::new();

        for (index, token) in self.pattern.input.iter().enumerate() {
            let ids = match token {
                AxisToken::Ellipsis => self.batch_ids(),
                AxisToken::Axis(name) => vec![AxisId::named(name)],
                AxisToken::Group(members) => members.iter().map(|m| AxisId::named(m)).collect(),
                AxisToken::Singleton => vec![AxisId::Squeezed(index)],
                AxisToken::Literal(v) if self.pattern.output.contains_literal(*v) => {
                    vec![AxisId::Literal(*v)]
                }
                // Elided before reshaping
                AxisToken::Literal(_) => vec![],
            };
            for id in ids {
                shape.push(self.resolution.size_of(&id)?);
                order.push(id);
            }
        }

        Ok((order, shape))
    }

    /// Slot ids of the output and the final shape
    fn output_slots(&self) -> RearrangeResult<(Vec<AxisId>, Vec<usize>)> {
        let mut order = Vec::new();
        let mut shape = Vec::new();

        for (index, token) in self.pattern.output.iter().enumerate() {
            match token {
                AxisToken::Ellipsis => {
                    for id in self.batch_ids() {
                        shape.push(self.resolution.size_of(&id)?);
                        order.push(id);
                    }
                }
                AxisToken::Axis(name) => {
                    let id = AxisId::named(name);
                    shape.push(self.resolution.size_of(&id)?);
                    order.push(id);
                }
                AxisToken::Group(members) => {
                    let mut size = 1usize;
                    for member in members {
                        let id = AxisId::named(member);
                        size = size.checked_mul(self.resolution.size_of(&id)?).ok_or_else(|| {
                            RearrangeError::conservation(format!(
                                "length of output group ({}) overflows",
                                members.join(" ")
                            ))
                        })?;
                        order.push(id);
                    }
                    shape.push(size);
                }
                AxisToken::Singleton => {
                    order.push(AxisId::Inserted(index));
                    shape.push(1);
                }
                AxisToken::Literal(v) => {
                    let id = AxisId::Literal(*v);
                    shape.push(self.resolution.size_of(&id)?);
                    order.push(id);
                }
            }
        }

        Ok((order, shape))
    }

    fn batch_ids(&self) -> Vec<AxisId> {
        (0..self.resolution.ellipsis_len).map(AxisId::Batch).collect()
    }

    /// Slots dropped from the input or created in the output must have
    /// length 1, and the element count must survive the final reshape.
    fn check_conservation(&self, plan: &RearrangementPlan) -> RearrangeResult<()> {
        let inputs: HashSet<&AxisId> = plan.input_axis_order.iter().collect();
        let outputs: HashSet<&AxisId> = plan.output_axis_order.iter().collect();

        for (id, &size) in plan.input_axis_order.iter().zip(&plan.intermediate_shape) {
            if size != 1 && !outputs.contains(id) {
                return Err(RearrangeError::conservation(format!(
                    "input axis '{}' of length {} is missing from the output",
                    id, size
                )));
            }
        }

        for id in plan.output_axis_order.iter().filter(|id| !inputs.contains(id)) {
            let size = match id {
                AxisId::Inserted(_) => 1,
                _ => self.resolution.size_of(id)?,
            };
            if size != 1 {
                return Err(RearrangeError::conservation(format!(
                    "output axis '{}' of length {} does not exist in the input",
                    id, size
                )));
            }
        }

        let retained = checked_product(&plan.intermediate_shape)?;
        let expected = checked_product(&plan.final_shape)?;
        if retained != expected {
            return Err(RearrangeError::conservation(format!(
                "total size {} != expected {}",
                retained, expected
            )));
        }
        Ok(())
    }
}

fn checked_product(shape: &[usize]) -> RearrangeResult<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| RearrangeError::conservation(format!("element count of {:?} overflows", shape)))
}

/// Input slot index for each output slot, then the input-only slots
fn permutation(input_order: &[AxisId], output_order: &[AxisId]) -> Vec<usize> {
    let positions: HashMap<&AxisId, usize> = input_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();

    let mut perm: Vec<usize> = output_order
        .iter()
        .filter_map(|id| positions.get(id).copied())
        .collect();

    let mut used = vec![false; input_order.len()];
    for &p in &perm {
        used[p] = true;
    }
    perm.extend((0..input_order.len()).filter(|&i| !used[i]));
    perm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use pretty_assertions::assert_eq;

    fn plan_of(shape: &[usize], pattern: &str, hints: &[(&str, usize)]) -> RearrangeResult<RearrangementPlan> {
        let pattern = Parser::new(pattern).parse()?;
        let resolution = Resolver::with_hints(hints.iter().copied()).resolve(shape, &pattern)?;
        Planner::new(&pattern, &resolution).plan(shape)
    }

    fn ids(names: &[&str]) -> Vec<AxisId> {
        names.iter().map(|n| AxisId::named(n)).collect()
    }

    #[test]
    fn test_group_split_plan() {
        let plan = plan_of(&[12, 10], "(h w) c -> h w c", &[("h", 3)]).unwrap();
        assert_eq!(plan.intermediate_shape, vec![3, 4, 10]);
        assert_eq!(plan.input_axis_order, ids(&["h", "w", "c"]));
        assert_eq!(plan.permutation, vec![0, 1, 2]);
        assert_eq!(plan.final_shape, vec![3, 4, 10]);
        assert!(plan.is_identity_permutation());
    }

    #[test]
    fn test_flatten_reordered() {
        let plan = plan_of(&[3, 4, 5], "a b c -> (c a b)", &[]).unwrap();
        assert_eq!(plan.output_axis_order, ids(&["c", "a", "b"]));
        assert_eq!(plan.permutation, vec![2, 0, 1]);
        assert_eq!(plan.permuted_shape(), vec![5, 3, 4]);
        assert_eq!(plan.final_shape, vec![60]);
    }

    #[test]
    fn test_ellipsis_reuses_batch_slots() {
        let plan = plan_of(&[2, 3, 4, 5, 6, 7], "a ... b -> b ... a", &[]).unwrap();
        assert_eq!(plan.input_axis_order[1..5].to_vec(), vec![
            AxisId::Batch(0),
            AxisId::Batch(1),
            AxisId::Batch(2),
            AxisId::Batch(3),
        ]);
        assert_eq!(plan.permutation, vec![5, 1, 2, 3, 4, 0]);
        assert_eq!(plan.final_shape, vec![7, 3, 4, 5, 6, 2]);
    }

    #[test]
    fn test_user_axis_named_like_batch_slot() {
        let plan = plan_of(&[2, 3], "batch_0 ... -> ... batch_0", &[]).unwrap();
        assert_eq!(plan.input_axis_order, vec![AxisId::named("batch_0"), AxisId::Batch(0)]);
        assert_eq!(plan.permutation, vec![1, 0]);
        assert_eq!(plan.final_shape, vec![3, 2]);
    }

    #[test]
    fn test_singletons_dropped_and_inserted() {
        let plan = plan_of(&[1, 5, 1], "1 h 1 -> h", &[]).unwrap();
        assert_eq!(plan.input_axis_order, vec![
            AxisId::Squeezed(0),
            AxisId::named("h"),
            AxisId::Squeezed(2),
        ]);
        assert_eq!(plan.permutation, vec![1, 0, 2]);
        assert_eq!(plan.final_shape, vec![5]);

        let plan = plan_of(&[2, 3], "h w -> h 1 w 1", &[]).unwrap();
        assert_eq!(plan.output_axis_order[1], AxisId::Inserted(1));
        assert_eq!(plan.permutation, vec![0, 1]);
        assert_eq!(plan.final_shape, vec![2, 1, 3, 1]);
    }

    #[test]
    fn test_literal_elision_and_pass_through() {
        let plan = plan_of(&[2, 3, 4], "2 b c -> b c", &[]).unwrap();
        assert_eq!(plan.elided_axes, vec![0]);
        assert_eq!(plan.intermediate_shape, vec![3, 4]);
        assert_eq!(plan.final_shape, vec![3, 4]);

        let plan = plan_of(&[2, 3, 4], "a 3 c -> c 3 a", &[]).unwrap();
        assert!(plan.elided_axes.is_empty());
        assert_eq!(plan.permutation, vec![2, 1, 0]);
        assert_eq!(plan.final_shape, vec![4, 3, 2]);
    }

    #[test]
    fn test_conservation_guard() {
        let err = plan_of(&[2, 3], "a b -> a", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeConservation);

        let err = plan_of(&[2, 3], "a b -> a b c", &[("c", 4)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeConservation);

        let plan = plan_of(&[2, 3], "a b -> a b c", &[("c", 1)]).unwrap();
        assert_eq!(plan.final_shape, vec![2, 3, 1]);
    }

    #[test]
    fn test_output_group_overflow() {
        let err = plan_of(&[2, 3], "a b -> (a b c)", &[("c", usize::MAX)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeConservation);
    }

    #[test]
    fn test_empty_dimension() {
        let plan = plan_of(&[0, 3, 4], "b h w -> w (h b)", &[]).unwrap();
        assert_eq!(plan.final_shape, vec![4, 0]);
        assert_eq!(plan.element_count(), 0);
    }

    #[test]
    fn test_json_export() {
        let plan = plan_of(&[2, 3], "h w -> w h", &[]).unwrap();
        let json = plan.to_json().unwrap();
        let back: RearrangementPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        assert!(json.contains("\"permutation\""));
    }
}
