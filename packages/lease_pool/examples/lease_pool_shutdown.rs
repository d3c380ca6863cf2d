//! Bounded waiting and graceful shutdown.
//!
//! A single database connection is shared by several clients. One client gives up after a
//! short timeout, one waits indefinitely and is released by the pool shutting down instead of
//! staying blocked forever.

use std::thread;
use std::time::Duration;

use lease_pool::{DropPolicy, Error, LeasePool};
use new_zealand::nz;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug)]
struct Connection {
    session: u32,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lease_pool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut next_session = 0;

    let pool = LeasePool::builder()
        .capacity(nz!(1))
        .name("database")
        .drop_policy(DropPolicy::WaitForLeases)
        .build(|| {
            next_session += 1;
            Connection {
                session: next_session,
            }
        });

    let connection = pool.acquire().unwrap();
    println!("Main thread holds session {}", connection.session);

    thread::scope(|s| {
        let impatient = s.spawn(|| pool.acquire_timeout(Duration::from_millis(100)));
        let patient = s.spawn(|| pool.acquire());

        match impatient.join().unwrap() {
            Err(Error::TimedOut { timeout }) => println!("Impatient client gave up after {timeout:?}"),
            other => println!("Impatient client got an unexpected result: {other:?}"),
        }

        thread::sleep(Duration::from_millis(100));
        println!("Shutting down the pool: {}", pool.stats());
        pool.shutdown();

        match patient.join().unwrap() {
            Err(Error::ShutDown) => println!("Patient client was told the pool shut down"),
            other => println!("Patient client got an unexpected result: {other:?}"),
        }
    });

    // The connection outlived the shutdown and is destroyed when its lease ends.
    drop(connection);
    println!("Pool after the last lease ended: {}", pool.stats());
}
