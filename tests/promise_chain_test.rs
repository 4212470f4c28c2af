#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use promise_chain::{Error, Promise, Settlement};
    use std::sync::mpsc::channel;
    use std::{thread, time::Duration};

    #[test]
    fn test_promise_chain() {
        let (resolver, promise) = Promise::<i32, String>::pending();
        let resolver_clone = resolver.clone();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            resolver_clone.fulfill(42);
        });

        let doubled = promise.map(|n| Ok(n * 2));
        assert_eq!(block_on(doubled.waiter()), Ok(Ok(84)));
        resolver.reject("too late".into());
        assert_eq!(promise.settlement(), Settlement::Fulfilled(42));
    }

    #[test]
    fn test_attach_while_resolving_on_other_thread() {
        let (tx, rx) = channel();
        let (resolver, promise) = Promise::<usize, ()>::pending();
        let task = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            resolver.fulfill(7)
        });
        for n in 0..100 {
            let tx = tx.clone();
            promise.inspect(move |v| tx.send(n + v).unwrap());
        }
        drop(tx);
        task.join().expect("The resolver thread has panicked");
        let mut received: Vec<usize> = rx.iter().collect();
        received.sort_unstable();
        assert_eq!(received, (7..107).collect::<Vec<_>>());
    }

    #[test]
    fn test_stored_resolver_settles_later() {
        let (tx, rx) = channel();
        let promise = Promise::<String, String>::new(|fulfill, reject| {
            tx.send((fulfill, reject)).unwrap();
            Ok(())
        });
        let greeting = promise.map(|s| Ok(format!("{s}!")));
        assert!(greeting.is_pending());

        let (fulfill, reject) = rx.recv().unwrap();
        let task = thread::spawn(move || {
            fulfill.fulfill("hello".into());
            reject.reject("ignored".into());
        });
        task.join().expect("The task thread has panicked");
        assert_eq!(block_on(greeting.waiter()), Ok(Ok("hello!".to_string())));
    }

    #[test]
    fn test_forgotten_promise_reports_abandoned() {
        let promise = Promise::<i32, ()>::new(|_fulfill, _reject| Ok(()));
        assert!(promise.is_pending());
        assert_eq!(block_on(promise.waiter()), Err(Error::Abandoned));
        assert_eq!(Error::Abandoned.to_string(), "promise was abandoned before it settled");
    }
}
