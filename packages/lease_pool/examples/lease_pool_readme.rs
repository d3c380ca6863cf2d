//! Example that demonstrates the basic usage shown in the package documentation.

use lease_pool::LeasePool;
use new_zealand::nz;

fn main() {
    println!("=== Lease Pool README Example ===");

    // All three items are created right here, before the pool is returned.
    let pool = LeasePool::new(nz!(3), || String::from("item"));

    let first = pool.acquire().unwrap();
    let second = pool.acquire().unwrap();
    let third = pool.acquire().unwrap();

    println!("Leased {}, {} and {}", first.id(), second.id(), third.id());
    println!("Pool: {}", pool.stats());

    // A fourth lease is not possible until one of the items comes back.
    assert!(pool.try_acquire().is_err());

    // Ending a lease returns the item to the pool.
    pool.release(second).unwrap();
    println!("Pool after one release: {}", pool.stats());

    let fourth = pool.acquire().unwrap();
    println!("Leased {} again", fourth.id());
    assert_eq!(&*fourth, "item");

    drop(first);
    drop(third);
    drop(fourth);

    println!("Pool at the end: {}", pool.stats());
    println!("README example completed successfully!");
}
