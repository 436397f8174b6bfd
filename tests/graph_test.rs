//! Integration tests for the task graph.
//!
//! Covers dependency chains, independent bursts, panicking predecessors,
//! and submitting follow-up work from inside running tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use workgraph::{TaskError, TaskGraph};

const WAIT: Duration = Duration::from_secs(10);

#[test]
fn no_deps_single_worker_burst() {
    workgraph::telemetry::init_tracing();

    let graph = TaskGraph::new(1);
    let count = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let count = Arc::clone(&count);
        let _ = graph.submit(
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            },
            &[],
        );
    }
    let last = {
        let count = Arc::clone(&count);
        graph.submit(
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            },
            &[],
        )
    };

    last.wait_timeout(WAIT).unwrap();
    // One worker drains FIFO, so the last completion implies the rest.
    assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn single_dependency_orders_execution() {
    let graph = TaskGraph::default();
    let count = Arc::new(Mutex::new(0i32));

    let a = {
        let count = Arc::clone(&count);
        graph.submit(
            move || {
                thread::sleep(Duration::from_millis(20));
                *count.lock().unwrap() += 1;
            },
            &[],
        )
    };
    let b = {
        let count = Arc::clone(&count);
        graph.submit(
            move || {
                let mut count = count.lock().unwrap();
                *count = -*count;
            },
            &[a.id()],
        )
    };

    b.wait_timeout(WAIT).unwrap();
    assert_eq!(*count.lock().unwrap(), -1);
}

#[test]
fn transient_dependency_chain() {
    let graph = TaskGraph::default();
    let count = Arc::new(Mutex::new(0i32));

    let a = {
        let count = Arc::clone(&count);
        graph.submit(
            move || {
                thread::sleep(Duration::from_millis(50));
                *count.lock().unwrap() += 1;
            },
            &[],
        )
    };
    let b = {
        let count = Arc::clone(&count);
        graph.submit(
            move || {
                thread::sleep(Duration::from_millis(30));
                let mut count = count.lock().unwrap();
                *count = -*count;
            },
            &[a.id()],
        )
    };
    let c = {
        let count = Arc::clone(&count);
        graph.submit(
            move || {
                thread::sleep(Duration::from_millis(30));
                *count.lock().unwrap() += 10;
            },
            &[b.id()],
        )
    };

    c.wait_timeout(WAIT).unwrap();
    assert_eq!(*count.lock().unwrap(), 9);
}

#[test]
fn many_predecessors_gate_a_single_dependent() {
    let graph = TaskGraph::new(4);
    let finished = Arc::new(AtomicUsize::new(0));

    let predecessors: Vec<_> = (0..6)
        .map(|i| {
            let finished = Arc::clone(&finished);
            graph.submit(
                move || {
                    thread::sleep(Duration::from_millis(5 * i as u64));
                    finished.fetch_add(1, Ordering::SeqCst);
                },
                &[],
            )
        })
        .collect();
    let ids: Vec<_> = predecessors.iter().map(|task| task.id()).collect();

    let gate = {
        let finished = Arc::clone(&finished);
        graph.submit(move || finished.load(Ordering::SeqCst), &ids)
    };

    assert_eq!(gate.wait_timeout(WAIT).unwrap(), 6);
}

#[test]
fn failed_predecessor_does_not_orphan_dependents() {
    let graph = TaskGraph::new(2);

    let failing = graph.submit(|| -> () { panic!("upstream failure") }, &[]);
    let dependent = graph.submit(|| "survived", &[failing.id()]);

    assert_eq!(dependent.wait_timeout(WAIT).unwrap(), "survived");
    assert!(matches!(
        failing.wait_timeout(WAIT),
        Err(TaskError::Panicked(_))
    ));
}

#[test]
fn tasks_submit_more_tasks() {
    let graph = Arc::new(TaskGraph::new(3));

    let outer_graph = Arc::clone(&graph);
    let total = graph.submit(
        move || {
            let nested: Vec<_> = (1..=4)
                .map(|value| outer_graph.submit(move || value, &[]))
                .collect();
            nested
                .into_iter()
                .map(|task| task.wait().unwrap())
                .sum::<i32>()
        },
        &[],
    );

    assert_eq!(total.wait_timeout(WAIT).unwrap(), 10);
}

#[test]
fn dropping_the_graph_drains_dispatched_work() {
    let ran = Arc::new(AtomicUsize::new(0));
    {
        let graph = TaskGraph::new(1);
        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            let _ = graph.submit(
                move || {
                    thread::sleep(Duration::from_millis(5));
                    ran.fetch_add(1, Ordering::SeqCst);
                },
                &[],
            );
        }
    }
    assert_eq!(ran.load(Ordering::SeqCst), 5);
}
