//! Axis-size resolver
//!
//! Binds every axis of a pattern to a concrete length, given the shape of
//! the input array and user-supplied axis lengths.

use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::ast::{AxisId, AxisToken, Pattern};
use crate::error::{RearrangeError, RearrangeResult};

/// Resolved length of every axis slot
pub type AxisSizeMap = BTreeMap<AxisId, usize>;

/// Outcome of resolving a pattern against a shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub sizes: AxisSizeMap,
    /// Number of dimensions absorbed by the ellipsis
    pub ellipsis_len: usize,
    /// Input dimensions fixed by a literal that the output drops
    pub elided: Vec<usize>,
}

impl Resolution {
    pub fn size_of(&self, id: &AxisId) -> RearrangeResult<usize> {
        self.sizes
            .get(id)
            .copied()
            .ok_or_else(|| RearrangeError::missing(id.to_string()))
    }
}

/// Resolver for axis sizes
pub struct Resolver {
    /// User-supplied lengths: name -> length
    hints: HashMap<String, usize>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            hints: HashMap::new(),
        }
    }

    pub fn with_hints<'a>(hints: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        let mut resolver = Self::new();
        for (name, length) in hints {
            resolver.define_axis(name, length);
        }
        resolver
    }

    /// Define an axis with known length
    pub fn define_axis(&mut self, name: &str, length: usize) {
        self.hints.insert(name.to_string(), length);
    }

    /// Resolve every axis of `pattern` against `shape`
    pub fn resolve(&self, shape: &[usize], pattern: &Pattern) -> RearrangeResult<Resolution> {
        let ndim = shape.len();
        let fixed = pattern.input.fixed_rank();

        let ellipsis_len = if pattern.input.has_ellipsis() {
            ndim.checked_sub(fixed).ok_or_else(|| {
                RearrangeError::consumption(format!(
                    "Not enough axes for ellipsis: pattern '{}' needs at least {} dimensions, array has {}",
                    pattern.input, fixed, ndim
                ))
            })?
        } else if fixed != ndim {
            return Err(RearrangeError::consumption(format!(
                "Pattern '{}' describes {} dimensions, array has {}",
                pattern.input, fixed, ndim
            )));
        } else {
            0
        };

        let mut sizes = AxisSizeMap::new();
        let mut elided = Vec::new();
        let mut dims = shape.iter().copied().enumerate();
        let mut take = || {
            dims.next()
                .ok_or_else(|| RearrangeError::consumption("Input pattern ran past the array rank"))
        };

        for (index, token) in pattern.input.iter().enumerate() {
            match token {
                AxisToken::Ellipsis => {
                    for j in 0..ellipsis_len {
                        let (_, size) = take()?;
                        sizes.insert(AxisId::Batch(j), size);
                    }
                }

                AxisToken::Axis(name) => {
                    let (_, size) = take()?;
                    if let Some(&hint) = self.hints.get(name) {
                        if hint != size {
                            return Err(RearrangeError::AxisLengthMismatch {
                                name: name.clone(),
                                hint,
                                got: size,
                            });
                        }
                    }
                    sizes.insert(AxisId::named(name), size);
                }

                AxisToken::Group(members) => {
                    let (_, size) = take()?;
                    self.resolve_group(members, size, &mut sizes)?;
                }

                AxisToken::Singleton => {
                    let (position, size) = take()?;
                    if size != 1 {
                        return Err(RearrangeError::Singleton { position, got: size });
                    }
                    sizes.insert(AxisId::Squeezed(index), 1);
                }

                AxisToken::Literal(value) => {
                    let (position, size) = take()?;
                    if size != *value {
                        return Err(RearrangeError::LiteralMismatch {
                            position,
                            expected: *value,
                            got: size,
                        });
                    }
                    if pattern.output.contains_literal(*value) {
                        sizes.insert(AxisId::Literal(*value), size);
                    } else if size == 0 {
                        // Index 0 does not exist on a zero-length axis
                        return Err(RearrangeError::LiteralMismatch {
                            position,
                            expected: 1,
                            got: 0,
                        });
                    } else {
                        elided.push(position);
                    }
                }
            }
        }

        if dims.next().is_some() {
            return Err(RearrangeError::consumption(format!(
                "Pattern '{}' left dimensions of {:?} unconsumed",
                pattern.input, shape
            )));
        }

        self.bind_output_axes(pattern, &mut sizes)?;

        for name in self.hints.keys() {
            if !sizes.contains_key(&AxisId::named(name)) {
                debug!("ignoring length hint for axis '{}' absent from '{}'", name, pattern);
            }
        }

        trace!("resolved {:?} against {:?}: {:?}", pattern.to_string(), shape, sizes);
        Ok(Resolution {
            sizes,
            ellipsis_len,
            elided,
        })
    }

    /// Infer member lengths of a group occupying one dimension of `size`
    fn resolve_group(
        &self,
        members: &[String],
        size: usize,
        sizes: &mut AxisSizeMap,
    ) -> RearrangeResult<()> {
        let mut known_product = 1usize;
        let mut unresolved = Vec::new();

        for member in members {
            match self.hints.get(member) {
                Some(&length) => {
                    known_product = known_product.checked_mul(length).ok_or_else(|| {
                        RearrangeError::group_mismatch(members, "product of lengths overflows")
                    })?;
                    sizes.insert(AxisId::named(member), length);
                }
                None => unresolved.push(member.clone()),
            }
        }

        match unresolved.as_slice() {
            [] => {
                if known_product != size {
                    return Err(RearrangeError::group_mismatch(
                        members,
                        format!("{} != {}", known_product, size),
                    ));
                }
            }
            [member] => {
                if known_product == 0 {
                    return Err(RearrangeError::AmbiguousGroup {
                        group: members.to_vec(),
                        unresolved,
                    });
                }
                if size % known_product != 0 {
                    return Err(RearrangeError::group_mismatch(
                        members,
                        format!("{} is not divisible by {}", size, known_product),
                    ));
                }
                sizes.insert(AxisId::named(member), size / known_product);
            }
            _ => {
                return Err(RearrangeError::AmbiguousGroup {
                    group: members.to_vec(),
                    unresolved,
                });
            }
        }
        Ok(())
    }

    /// Bind output axes that the input never mentioned, from hints only
    fn bind_output_axes(&self, pattern: &Pattern, sizes: &mut AxisSizeMap) -> RearrangeResult<()> {
        let mut bind = |name: &String| -> RearrangeResult<()> {
            let id = AxisId::named(name);
            if sizes.contains_key(&id) {
                return Ok(());
            }
            let length = self
                .hints
                .get(name)
                .copied()
                .ok_or_else(|| RearrangeError::missing(name.clone()))?;
            sizes.insert(id, length);
            Ok(())
        };

        for token in pattern.output.iter() {
            match token {
                AxisToken::Axis(name) => bind(name)?,
                AxisToken::Group(members) => {
                    for name in members {
                        bind(name)?;
                    }
                }
                AxisToken::Literal(value) => {
                    if !pattern.input.contains_literal(*value) {
                        return Err(RearrangeError::missing(value.to_string()));
                    }
                }
                AxisToken::Ellipsis | AxisToken::Singleton => {}
            }
        }
        Ok(())
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
