//! Twenty worker threads share a pool of ten network packets.
//!
//! Each worker leases a packet, fills it, holds on to it for a while to simulate processing and
//! then returns it. Since there are twice as many workers as packets, half of the workers have to
//! wait until a packet is returned. The order of the output differs between runs because the
//! operating system decides which waiting worker gets the next packet.
//!
//! Run with `RUST_LOG=lease_pool=trace` to see every lease being issued and returned.

use std::thread;
use std::time::Duration;

use lease_pool::LeasePool;
use new_zealand::nz;
use nm::Report;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const PACKET_SIZE: usize = 1024;
const WORKER_COUNT: usize = 20;
const PROCESSING_TIME: Duration = Duration::from_millis(200);

/// A fixed-size network packet buffer.
#[derive(Debug)]
struct Packet {
    data: Box<[u8]>,
    len: usize,
}

impl Packet {
    fn new() -> Self {
        Self {
            data: vec![0; PACKET_SIZE].into_boxed_slice(),
            len: 0,
        }
    }

    fn fill(&mut self, payload: &[u8]) {
        let len = payload.len().min(self.data.len());

        if let (Some(target), Some(source)) = (self.data.get_mut(..len), payload.get(..len)) {
            target.copy_from_slice(source);
        }

        self.len = len;
    }

    fn reset(&mut self) {
        self.data.fill(0);
        self.len = 0;
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lease_pool=debug,lease_pool_packet_workers=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = LeasePool::builder()
        .capacity(nz!(10))
        .name("packets")
        .on_release(Packet::reset)
        .build(Packet::new);

    thread::scope(|s| {
        for worker in 0..WORKER_COUNT {
            let pool = &pool;

            s.spawn(move || {
                let mut packet = pool.acquire().expect("pool is not shut down while workers run");

                packet.fill(format!("payload from worker {worker}").as_bytes());
                info!(worker, packet = %packet.id(), len = packet.len, "processing packet");

                thread::sleep(PROCESSING_TIME);

                drop(packet);
                info!(worker, "returned packet");
            });
        }
    });

    println!("Pool at the end: {}", pool.stats());

    drop(pool);

    println!();
    println!("{}", Report::collect());
}
