//! Behaviour tests for rotations using Cucumber.
//!
//! ```bash
//! cargo test --test features
//! ```

mod steps;

use cucumber::World;
use steps::rotation::RotationWorld;

#[tokio::main]
async fn main() {
    RotationWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/features/rotation.feature")
        .await;
}
