use proptest::prelude::*;
use promise_chain::{Promise, Settlement};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn settlement_of(attempt: &Result<i32, i32>) -> Settlement<i32, i32> {
    attempt.clone().into()
}

fn arb_attempt() -> impl Strategy<Value = Result<i32, i32>> {
    prop_oneof![any::<i32>().prop_map(Ok), any::<i32>().prop_map(Err)]
}

/// Records which handler ran and with what, for one continuation.
fn observe(promise: &Promise<i32, i32>, log: &Arc<Mutex<Vec<String>>>, name: usize) {
    let (ok, err) = (log.clone(), log.clone());
    promise.attach(
        move |v| ok.lock().unwrap().push(format!("{name}:ok:{v}")),
        move |e| err.lock().unwrap().push(format!("{name}:err:{e}")),
    );
}

proptest! {
    #[test]
    fn test_first_settlement_wins(attempts in proptest::collection::vec(arb_attempt(), 1..8)) {
        let (resolver, promise) = Promise::<i32, i32>::pending();
        for attempt in &attempts {
            resolver.settle(settlement_of(attempt));
        }
        prop_assert_eq!(promise.settlement(), settlement_of(&attempts[0]));
    }

    #[test]
    fn test_continuations_fire_in_order(count in 1usize..20, value in any::<i32>()) {
        let log = Arc::new(Mutex::new(vec![]));
        let (resolver, promise) = Promise::<i32, i32>::pending();
        for name in 0..count {
            observe(&promise, &log, name);
        }
        resolver.fulfill(value);
        let expected: Vec<String> = (0..count).map(|name| format!("{name}:ok:{value}")).collect();
        prop_assert_eq!(log.lock().unwrap().clone(), expected);
    }

    #[test]
    fn test_late_attach_matches_early_attach(attempt in arb_attempt()) {
        let early = Arc::new(Mutex::new(vec![]));
        let (resolver, pending) = Promise::<i32, i32>::pending();
        observe(&pending, &early, 0);
        resolver.settle(settlement_of(&attempt));

        let late = Arc::new(Mutex::new(vec![]));
        observe(&Promise::from_result(attempt), &late, 0);

        prop_assert_eq!(early.lock().unwrap().clone(), late.lock().unwrap().clone());
    }

    #[test]
    fn test_then_of_settled_value(x in any::<i32>()) {
        let f = |v: i32| v.wrapping_mul(3).wrapping_add(1);
        let promise = Promise::<i32, i32>::from_value(x).then(move |v| Ok(Promise::from_value(f(v))));
        prop_assert_eq!(promise.value(), Some(f(x)));
    }

    #[test]
    fn test_each_continuation_fires_once(
        before in 0usize..6,
        after in 0usize..6,
        extra_attempts in proptest::collection::vec(arb_attempt(), 0..4),
        attempt in arb_attempt(),
    ) {
        let fired = Arc::new(AtomicUsize::new(0));
        let (resolver, promise) = Promise::<i32, i32>::pending();
        let attach = |promise: &Promise<i32, i32>| {
            let (ok, err) = (fired.clone(), fired.clone());
            promise.attach(
                move |_| { ok.fetch_add(1, Ordering::SeqCst); },
                move |_| { err.fetch_add(1, Ordering::SeqCst); },
            );
        };
        for _ in 0..before {
            attach(&promise);
        }
        resolver.settle(settlement_of(&attempt));
        for _ in 0..after {
            attach(&promise);
        }
        for extra in &extra_attempts {
            resolver.settle(settlement_of(extra));
        }
        prop_assert_eq!(fired.load(Ordering::SeqCst), before + after);
    }

    #[test]
    fn test_error_skips_every_map(error in any::<i32>(), steps in 1usize..6) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut promise = Promise::<i32, i32>::from_error(error);
        for _ in 0..steps {
            let counter = calls.clone();
            promise = promise.map(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            });
        }
        prop_assert_eq!(promise.error(), Some(error));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
