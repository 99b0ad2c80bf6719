use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lazy_async_cell::LazyAsyncCell;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() {
   let loads = Arc::new(AtomicUsize::new(0));
   let counter = Arc::clone(&loads);
   let cell = LazyAsyncCell::from_future(move || {
      let counter = Arc::clone(&counter);
      async move {
         // This future runs only once
         counter.fetch_add(1, Ordering::Relaxed);
         println!("Initializing async data...");
         sleep(Duration::from_millis(50)).await;
         Ok::<_, String>("Async expensive data".to_string())
      }
   });

   let tasks: Vec<_> = (0..5)
      .map(|_| {
         let cell = cell.clone();
         tokio::spawn(async move {
            println!("Task access: {:?}", cell.get_async().await);
         })
      })
      .collect();

   for t in tasks {
      t.await.unwrap();
   }

   assert_eq!(loads.load(Ordering::Relaxed), 1); // Loader ran only once
   println!("Final async data: {:?}", cell.get_async().await);
}
