//! Example demonstrating profiling across multiple threads.
//!
//! Each worker thread has its own nesting context, but all measurements land
//! in the same shared tree. Sections opened on a worker thread while the main
//! thread has a section open do not become its children.
//!
//! Run with: `cargo run --example time_well_spent_threaded`.

use std::thread;
use std::time::Duration;

use time_well_spent::Registry;

fn main() {
    println!("=== Threaded Section Profiling Example ===");
    println!();

    let registry = Registry::new();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..3 {
                    // All workers share one "job" node at the root; nested
                    // sections attach under it per thread.
                    let _job = registry.begin("job");
                    {
                        let _fetch = registry.begin("fetch");
                        thread::sleep(Duration::from_millis(2));
                    }
                    {
                        let _process = registry.begin("process");
                        thread::sleep(Duration::from_millis(5));
                    }
                }
            });
        }
    });

    registry.print_to_stdout();
    println!();
    println!("12 jobs from 4 threads accumulated into one tree.");
}
