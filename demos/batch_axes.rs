//! Example: Ellipsis, singletons and literals
//!
//! Shows how the planner names the axes an ellipsis covers, drops
//! unit axes and inserts new ones.
//!
//! Run with: cargo run --example batch_axes

use pattern_rearrange::plan;

fn show(shape: &[usize], pattern: &str, hints: &[(&str, usize)]) {
    println!("Pattern: {}", pattern);
    println!("Input shape: {:?}", shape);
    match plan(shape, pattern, hints) {
        Ok(plan) => println!("{}\n", plan),
        Err(e) => println!("Error: {}\n", e),
    }
}

fn main() {
    println!("=== Batch Axes Example ===\n");

    // Move the channel axis to the front of any number of batch axes
    show(&[2, 3, 4, 5, 6], "... c -> c ...", &[]);

    // Merge the trailing axes, leaving the batch axes alone
    show(&[2, 3, 4, 5], "... h w -> ... (h w)", &[]);

    // Drop a unit axis and add one at the end
    show(&[4, 1, 5], "h 1 w -> w h 1", &[]);

    // A literal is kept when it appears on both sides
    show(&[3, 2, 5], "a 2 b -> 2 b a", &[]);

    // A literal only on the input side selects index 0 along that axis
    show(&[2, 3, 4], "2 b c -> c b", &[]);

    // An ellipsis on one side only
    show(&[2, 3], "... a -> a", &[]);
}
