mod common;

use std::collections::HashMap;
use std::time::Duration;

use common::{belt_model, fast_mover, init_tracing, single_observation, site_table, slow_mover};
use crossbeam::channel::unbounded;
use rand::Rng;
use tracklet_digest::{
    constants::RADEG,
    digest_errors::Rejection,
    observations::Tracklet,
    orbit_class::OrbitClass,
    pipeline::{
        buffer_pool::{BufferPool, PooledTracklet},
        staging::Staging,
    },
    Digest, DigestError, DigestParams,
};

fn digest(workers: usize) -> Digest {
    let params = DigestParams::builder()
        .repeatable(true)
        .workers(workers)
        .build()
        .unwrap();
    Digest::new(belt_model(), site_table(), params).unwrap()
}

/// Fast movers at different positions, with an unscorable tracklet every fifth entry.
fn batch(n: usize) -> Vec<Tracklet> {
    (0..n)
        .map(|k| {
            let name = format!("T{k:04}");
            if k % 5 == 4 {
                return single_observation(&name);
            }
            let mut tracklet = fast_mover(&name);
            for obs in tracklet.observations.iter_mut() {
                obs.ra += k as f64 * 0.2 * RADEG;
            }
            tracklet
        })
        .collect()
}

#[test]
fn test_results_do_not_depend_on_worker_count() {
    let tracklets = vec![
        fast_mover("fast"),
        slow_mover("slow"),
        single_observation("lonely"),
    ];

    let one = digest(1).score_all(tracklets.clone());
    let many = digest(4).score_all(tracklets);

    assert_eq!(one.len(), 3);
    assert_eq!(one, many);
    assert!(one["fast"].is_ok());
    assert!(one["slow"].is_ok());
    assert_eq!(
        one["lonely"],
        Err(DigestError::NotScorable {
            designation: "lonely".into(),
            reason: Rejection::SingleObservation
        })
    );
}

#[test]
fn test_pipeline_matches_single_scoring() {
    let digest = digest(3);
    let single = digest.score(&slow_mover("slow")).unwrap();
    let batch = digest.score_all([slow_mover("slow")]);
    assert_eq!(batch["slow"].as_ref().unwrap(), &single);
}

#[test]
fn test_every_tracklet_yields_one_result() {
    init_tracing();
    let digest = digest(8);
    let tracklets = batch(60);
    let (tx, rx) = unbounded();

    let stats = digest.run_streaming(tracklets, &tx);
    drop(tx);
    let messages: Vec<_> = rx.into_iter().collect();

    assert_eq!(stats.submitted, 60);
    assert_eq!(stats.rejected, 12);
    assert_eq!(messages.len(), 60);

    let mut seen: HashMap<String, usize> = HashMap::new();
    for message in &messages {
        match &message.result {
            Ok(result) => {
                assert_eq!(result.designation, message.designation);
                assert_eq!(result.raw(OrbitClass::Neo), Some(100.0));
            }
            Err(DigestError::NotScorable { designation, .. }) => {
                assert_eq!(designation, &message.designation)
            }
            Err(e) => panic!("unexpected error {e}"),
        }
        *seen.entry(message.designation.clone()).or_default() += 1;
    }
    assert_eq!(seen.len(), 60);
    assert!(seen.values().all(|&n| n == 1));
}

#[test]
fn test_empty_batch() {
    let results = digest(2).score_all(Vec::<Tracklet>::new());
    assert!(results.is_empty());
}

#[test]
fn test_staging_and_pool_under_random_delays() {
    const WORKERS: usize = 6;
    const ITEMS: usize = 400;

    let staging: Staging<PooledTracklet> = Staging::new();
    let pool = BufferPool::new(WORKERS);
    let template = fast_mover("template");
    let (tx, rx) = unbounded();

    std::thread::scope(|s| {
        for _ in 0..WORKERS {
            let tx = tx.clone();
            let (staging, pool) = (&staging, &pool);
            s.spawn(move || {
                let mut rng = rand::rng();
                while let Some(buffer) = staging.take() {
                    std::thread::sleep(Duration::from_micros(rng.random_range(0..200)));
                    let designation = buffer.tracklet.designation.clone();
                    pool.release(buffer);
                    tx.send(designation).unwrap();
                }
            });
        }

        let mut rng = rand::rng();
        for k in 0..ITEMS {
            let mut buffer = pool.acquire().unwrap();
            buffer.fill(&format!("item{k}"), &template.observations);
            if rng.random_bool(0.3) {
                std::thread::sleep(Duration::from_micros(rng.random_range(0..100)));
            }
            staging.put(buffer).unwrap();
        }
        staging.close();
    });
    drop(tx);

    let mut received: Vec<String> = rx.into_iter().collect();
    received.sort();
    let mut expected: Vec<String> = (0..ITEMS).map(|k| format!("item{k}")).collect();
    expected.sort();
    assert_eq!(received, expected);
    assert_eq!(pool.available(), WORKERS);
}
