//! Basic borrow/return walkthrough

use softpool::{ObjectFactory, PoolError, SoftPool};

struct Connections;

#[derive(Debug)]
struct Connection {
    id: usize,
    queries: usize,
}

impl ObjectFactory for Connections {
    type Object = Connection;
    type Error = std::convert::Infallible;

    fn make(&self) -> Result<Connection, Self::Error> {
        static NEXT: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        Ok(Connection {
            id: NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            queries: 0,
        })
    }

    fn passivate(&self, conn: &mut Connection) -> Result<(), Self::Error> {
        conn.queries = 0;
        Ok(())
    }
}

fn main() {
    println!("=== softpool - Basic Examples ===\n");

    // Example 1: borrow and automatic return
    borrow_and_return();

    // Example 2: explicit check-in and invalidation
    explicit_checkin();

    // Example 3: pre-filling and stats
    prefill_and_stats();

    // Example 4: closing the pool
    closing();
}

fn borrow_and_return() {
    println!("1. Borrow and Return:");
    let pool = SoftPool::new(Connections);

    {
        let mut conn = pool.borrow().unwrap();
        conn.queries += 1;
        println!("   Borrowed connection {} ({} query)", conn.id, conn.queries);
        // checked back in when `conn` goes out of scope
    }

    println!("   Idle after return: {}\n", pool.idle_count());
}

fn explicit_checkin() {
    println!("2. Explicit Check-in:");
    let pool = SoftPool::new(Connections);

    let good = pool.borrow().unwrap();
    good.put_back().unwrap();
    println!("   Put back cleanly, idle: {}", pool.idle_count());

    let bad = pool.borrow().unwrap();
    bad.invalidate().unwrap();
    println!("   Invalidated one, idle: {}\n", pool.idle_count());
}

fn prefill_and_stats() {
    println!("3. Prefill and Stats:");
    let pool = SoftPool::new(Connections);
    pool.prefill(4).unwrap();

    {
        let _a = pool.borrow().unwrap();
        let _b = pool.borrow().unwrap();
        println!("   Active: {}", pool.active_count());
        println!("   Idle: {}", pool.idle_count());
    }

    let stats = pool.stats();
    println!(
        "   Stats - created: {}, borrowed: {}, returned: {}\n",
        stats.created, stats.borrowed, stats.returned
    );
}

fn closing() {
    println!("4. Closing:");
    let pool = SoftPool::new(Connections);
    pool.prefill(2).unwrap();

    let held = pool.borrow().unwrap();
    pool.close();

    match pool.borrow() {
        Err(PoolError::Closed) => println!("   Borrow after close: refused"),
        _ => unreachable!(),
    }

    // returning to a closed pool destroys instead of re-admitting
    held.put_back().unwrap();
    println!("   Idle after close: {}", pool.idle_count());
}
