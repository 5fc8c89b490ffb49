//! Simplified example demonstrating key `time_well_spent` types working together.
//!
//! This example shows how to use the main entry points of the package:
//! - `begin_section`: Opens a named section in the process-wide registry
//! - `generate_report`: Renders the indented report of everything measured
//!
//! Run with: `cargo run --example time_well_spent_basic`.
#![expect(
    clippy::arithmetic_side_effects,
    reason = "this is example code that does not need production-level safety"
)]

use std::hint::black_box;
use std::thread::sleep;
use std::time::Duration;

use time_well_spent::{begin_section, generate_report};

fn main() {
    println!("=== Section Profiling Example ===");
    println!();

    // A top-level phase containing two nested phases. The nesting of the
    // guards, not the code structure, determines the tree shape.
    {
        let _frame = begin_section("frame");

        {
            let _update = begin_section("update");
            sleep(Duration::from_millis(10));

            // A section inside a loop accumulates across iterations into one
            // row whose call count is the iteration count.
            for i in 0..4 {
                let _entity = begin_section("entity_tick");
                let mut sum = 0u64;
                for j in 0..20_000 {
                    sum = sum.wrapping_mul(1_103_515_245).wrapping_add(i + j);
                }
                black_box(sum);
            }
        }

        {
            let _render = begin_section("render");
            sleep(Duration::from_millis(5));
        }
    }

    // A second top-level call to the same section merges into the same node.
    {
        let _frame = begin_section("frame");
        sleep(Duration::from_millis(2));
    }

    print!("{}", generate_report());
    println!();
    println!("The report can be regenerated at any time; statistics keep accumulating.");
}
