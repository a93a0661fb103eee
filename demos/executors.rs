//! Example: Comparing executors
//!
//! Runs the same plan through each executor and checks they agree.
//!
//! Run with: cargo run --example executors

use std::time::Instant;

use ndarray::{Array, ArrayD};
use pattern_rearrange::{ExecutorKind, RearrangeConfig, Rearranger};

fn main() {
    println!("=== Executor Comparison Example ===\n");

    let shape = [8, 64, 64, 3];
    let pattern = "b h w c -> b c (h w)";
    let n: usize = shape.iter().product();
    let x: ArrayD<f32> = Array::from_iter((0..n).map(|i| i as f32))
        .into_shape_with_order(shape.to_vec())
        .unwrap();

    println!("Pattern: {}", pattern);
    println!("Input shape: {:?} ({} elements)\n", shape, n);

    let kinds = [ExecutorKind::Generic, ExecutorKind::Native, ExecutorKind::Parallel];
    let mut outputs = Vec::new();
    for kind in kinds {
        let rearranger = Rearranger::new(RearrangeConfig::new(kind).with_parallel_min_len(1024));
        let start = Instant::now();
        let y = rearranger.rearrange(x.clone(), pattern, &[]).unwrap();
        println!("{:>8}: shape {:?} in {:?}", kind.to_string(), y.shape(), start.elapsed());
        outputs.push(y);
    }

    let agree = outputs.windows(2).all(|pair| pair[0] == pair[1]);
    println!("\nAll executors agree: {}", agree);
}
