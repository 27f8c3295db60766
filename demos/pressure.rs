//! Memory-pressure walkthrough: a watcher thread releasing idle instances

use std::thread;
use std::time::Duration;

use softpool::{ObjectFactory, SoftPool};

struct BigBuffers;

impl ObjectFactory for BigBuffers {
    type Object = Vec<u8>;
    type Error = std::convert::Infallible;

    fn make(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(vec![0u8; 1 << 20])
    }

    fn passivate(&self, buf: &mut Vec<u8>) -> Result<(), Self::Error> {
        buf.clear();
        Ok(())
    }
}

fn main() {
    println!("=== softpool - Pressure Examples ===\n");

    let pool = SoftPool::new(BigBuffers);
    pool.prefill(8).unwrap();
    println!("Prefilled, idle: {}", pool.idle_count());

    // A memory watcher owns a valve clone and sheds idle buffers whenever it
    // decides memory is tight. Here it just fires once after a beat.
    let valve = pool.pressure_valve();
    let watcher = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let released = valve.release(6);
        println!("Watcher released {released} idle buffers");
    });

    // The pool keeps serving borrowers the whole time.
    for round in 0..4 {
        let mut buf = pool.borrow().unwrap();
        buf.extend_from_slice(b"frame");
        drop(buf);
        println!("Round {round}: idle now {}", pool.idle_count());
        thread::sleep(Duration::from_millis(25));
    }

    watcher.join().unwrap();

    let stats = pool.stats();
    println!(
        "\nFinal - idle: {}, reclaimed: {}, created: {}",
        stats.idle, stats.reclaimed, stats.created
    );
}
