//! Example: Splitting and merging grouped axes
//!
//! Demonstrates resolving an unknown group member from a known one,
//! then running the inverse pattern to get the original array back.
//!
//! Run with: cargo run --example group_split

use ndarray::{Array, ArrayD};
use pattern_rearrange::{plan, rearrange};

fn main() {
    println!("=== Group Split Example ===\n");

    // Example 1: Split a merged axis, only h is known
    println!("Example 1: Split");
    println!("Pattern: (h w) c -> h w c");
    println!("Input shape: (12, 10), h = 3\n");

    let split = plan(&[12, 10], "(h w) c -> h w c", &[("h", 3)]).unwrap();
    println!("Intermediate shape: {:?}", split.intermediate_shape);
    println!("Permutation: {:?}", split.permutation);
    println!("Final shape: {:?}\n", split.final_shape);

    // Example 2: Merge in a different order than the input
    println!("Example 2: Merge with reorder");
    println!("Pattern: h w -> (w h)");

    let x: ArrayD<i32> = Array::from_iter(0..6).into_shape_with_order(vec![2, 3]).unwrap();
    let y = rearrange(x.clone(), "h w -> (w h)", &[]).unwrap();
    println!("Input:  {:?}", x.iter().collect::<Vec<_>>());
    println!("Output: {:?}\n", y.iter().collect::<Vec<_>>());

    // Example 3: Round trip
    println!("Example 3: Round trip");
    let x: ArrayD<f64> = Array::from_iter((0..120).map(f64::from))
        .into_shape_with_order(vec![12, 10])
        .unwrap();
    let y = rearrange(x.clone(), "(h w) c -> h w c", &[("h", 3)]).unwrap();
    let back = rearrange(y, "h w c -> (h w) c", &[]).unwrap();
    println!("Recovered original: {}", back == x);

    // Example 4: Ambiguous group
    println!("\nExample 4: Ambiguous group without hints");
    match plan(&[12, 10], "(h w) c -> h w c", &[]) {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Error: {}", e),
    }
}
