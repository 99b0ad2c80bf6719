use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lazy_async_cell::LazyAsyncCell;

fn main() {
   let attempts = Arc::new(AtomicUsize::new(0));
   let counter = Arc::clone(&attempts);
   let cell: LazyAsyncCell<String, String> = LazyAsyncCell::new(move |complete| {
      let attempt = counter.fetch_add(1, Ordering::Relaxed);
      println!("Attempting load #{attempt}...");
      if attempt == 0 {
         complete(Err("server unavailable".to_string()));
      } else {
         complete(Ok("fresh data".to_string()));
      }
   });

   // First attempt fails, and the failure is memoized.
   match cell.get_blocking() {
      Err(e) => println!("Caught error: {e}"),
      Ok(_) => panic!("Should have failed"),
   }

   // A second get replays the stored failure without another load.
   assert!(cell.get_blocking().is_err());
   assert_eq!(attempts.load(Ordering::Relaxed), 1);

   // reload clears the slot and runs exactly one fresh episode.
   cell.reload();
   match cell.get_blocking() {
      Ok(data) => println!("Got data: {data}"),
      Err(_) => panic!("Should have succeeded"),
   }
   assert_eq!(attempts.load(Ordering::Relaxed), 2);
}
