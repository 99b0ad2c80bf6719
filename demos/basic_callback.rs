use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lazy_async_cell::LazyAsyncCell;

fn main() {
   let loads = Arc::new(AtomicUsize::new(0));
   let counter = Arc::clone(&loads);
   let cell: LazyAsyncCell<String, String> = LazyAsyncCell::new(move |complete| {
      // This loader runs only once, no matter how many callers race below.
      counter.fetch_add(1, Ordering::Relaxed);
      println!("Loading expensive data...");
      thread::sleep(Duration::from_millis(50));
      complete(Ok("Expensive data".to_string()));
   });

   let threads: Vec<_> = (0..5)
      .map(|_| {
         let cell = cell.clone();
         thread::spawn(move || {
            println!("Thread access: {:?}", cell.get_blocking());
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   assert_eq!(cell.peek(), Some(Ok("Expensive data".to_string())));
   assert_eq!(loads.load(Ordering::Relaxed), 1); // Loader ran only once
   println!("Final data: {:?}", cell.get_blocking());
}
