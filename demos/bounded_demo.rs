//! Walks through the bounded iteration entry points.
//!
//! Run with `RUST_LOG=debug cargo run --example bounded_demo` to see the
//! admission loop's log output.

use std::time::Duration;

use kodegen_async_iter::{
    BoundedIter, CancellationSignal, SearchOutcome, find_first_match, for_each, map,
};
use log::info;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Later items finish first, output stays in input order
    let lengths = map(
        vec!["tokio", "futures", "log"],
        |word| async move {
            sleep(Duration::from_millis(30 / word.len() as u64)).await;
            word.len()
        },
        2,
    )
    .await;
    info!("lengths: {lengths:?}");

    let summary = for_each(
        1..=5u64,
        |n| async move {
            sleep(Duration::from_millis(n * 5)).await;
            info!("processed {n}");
        },
        2,
    )
    .await;
    info!("for_each: {summary:?}");

    let hit = find_first_match(
        vec![120u64, 15, 60],
        |delay| async move {
            sleep(Duration::from_millis(delay)).await;
            delay < 100
        },
        3,
    )
    .await;
    info!("first settled match: {:?}", hit.into_parts());

    // Stop admitting once a budget is spent
    let signal = CancellationSignal::new();
    let summary = BoundedIter::new(1)
        .until(&signal)
        .for_each(1..=10, |n| {
            let signal = signal.clone();
            async move {
                if n == 4 {
                    signal.cancel();
                }
            }
        })
        .await;
    info!("stopped early: {}, skipped {}", summary.stopped_early(), summary.skipped());

    let outcome = BoundedIter::new(2)
        .try_find_first_match(["a.toml", "b.toml"], |name| async move {
            Ok::<bool, std::io::Error>(name.starts_with('b'))
        })
        .await?;
    if let SearchOutcome::Found(name) = outcome {
        info!("config file: {name}");
    }

    Ok(())
}
