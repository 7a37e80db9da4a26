mod common;

use approx::assert_relative_eq;
use common::{belt_model, empty_model, fast_mover, site_table, slow_mover, trojan_mover};
use tracklet_digest::{
    constants::RADEG,
    digest_errors::Rejection,
    observations::{Observation, Tracklet},
    orbit_class::OrbitClass,
    Digest, DigestError, DigestParams,
};

fn repeatable_digest() -> Digest {
    let params = DigestParams::builder()
        .repeatable(true)
        .workers(2)
        .build()
        .unwrap();
    Digest::new(belt_model(), site_table(), params).unwrap()
}

#[test]
fn test_fast_mover_is_a_neo() {
    let digest = repeatable_digest();
    let result = digest.score(&fast_mover("fast")).unwrap();

    assert_eq!(result.scores.len(), OrbitClass::COUNT);
    assert_eq!(result.raw(OrbitClass::MpcInterest), Some(100.0));
    assert_eq!(result.raw(OrbitClass::Neo), Some(100.0));
    assert_eq!(result.noid(OrbitClass::Neo), Some(100.0));
    assert_eq!(result.raw(OrbitClass::OuterMainBelt), Some(0.0));
    assert_eq!(result.raw(OrbitClass::JupiterTrojan), Some(0.0));
    assert_eq!(result.raw(OrbitClass::MiddleMainBelt), Some(0.0));
    assert_eq!(result.raw(OrbitClass::Hilda), Some(0.0));
    assert_eq!(result.raw(OrbitClass::JupiterFamilyComet), Some(0.0));
}

#[test]
fn test_slow_mover_is_a_main_belt_object() {
    let digest = repeatable_digest();
    let result = digest.score(&slow_mover("slow")).unwrap();

    let neo = result.get(OrbitClass::Neo).unwrap();
    assert!(neo.raw < 10.0, "NEO raw score {}", neo.raw);
    // background is half undiscovered, the belt only one tenth
    assert!(neo.noid > neo.raw);

    assert!(result.raw(OrbitClass::InnerMainBelt).unwrap() > 25.0);
    assert!(result.raw(OrbitClass::MiddleMainBelt).unwrap() > 30.0);
    let outer = result.raw(OrbitClass::OuterMainBelt).unwrap();
    assert!(outer > 2.0 && outer < 20.0, "outer belt score {outer}");
    assert!(result.raw(OrbitClass::JupiterTrojan).unwrap() < 1.0);
    assert!(result.raw(OrbitClass::MpcInterest).unwrap() < 15.0);

    for score in &result.scores {
        assert!((0.0..=100.0).contains(&score.raw), "{score:?}");
        assert!((0.0..=100.0).contains(&score.noid), "{score:?}");
    }
}

#[test]
fn test_trojan_rate_mover_is_a_trojan() {
    let digest = repeatable_digest();
    let result = digest.score(&trojan_mover("trojan")).unwrap();

    let trojan = result.get(OrbitClass::JupiterTrojan).unwrap();
    assert!(trojan.raw > 50.0, "Trojan raw score {}", trojan.raw);
    assert!(trojan.noid > 50.0, "Trojan noid score {}", trojan.noid);

    for class in [OrbitClass::Neo, OrbitClass::NeoH22, OrbitClass::NeoH18] {
        assert!(result.raw(class).unwrap() < 10.0, "{class:?}");
    }
    assert!(result.raw(OrbitClass::MiddleMainBelt).unwrap() < 10.0);
    assert!(result.raw(OrbitClass::MpcInterest).unwrap() < 20.0);

    for score in &result.scores {
        assert!((0.0..=100.0).contains(&score.raw), "{score:?}");
        assert!((0.0..=100.0).contains(&score.noid), "{score:?}");
    }
}

#[test]
fn test_repeatable_scores_are_identical() {
    let digest = repeatable_digest();
    let first = digest.score(&slow_mover("slow")).unwrap();
    let second = digest.score(&slow_mover("slow")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_population_uses_fallback_scores() {
    let params = DigestParams::builder().repeatable(true).build().unwrap();
    let digest = Digest::new(empty_model(), site_table(), params).unwrap();
    let result = digest.score(&slow_mover("slow")).unwrap();

    for score in &result.scores {
        let expected = match score.class {
            OrbitClass::MpcInterest | OrbitClass::Neo => 100.0,
            _ => 0.0,
        };
        assert_eq!(score.raw, expected, "{:?}", score.class);
        assert_eq!(score.noid, expected, "{:?}", score.class);
    }
}

#[test]
fn test_class_selection_keeps_order() {
    let params = DigestParams::builder()
        .classes([OrbitClass::JupiterTrojan, OrbitClass::Neo])
        .repeatable(true)
        .build()
        .unwrap();
    let digest = Digest::new(belt_model(), site_table(), params).unwrap();
    let result = digest.score(&fast_mover("fast")).unwrap();

    let classes: Vec<_> = result.scores.iter().map(|s| s.class).collect();
    assert_eq!(classes, vec![OrbitClass::JupiterTrojan, OrbitClass::Neo]);
    assert_eq!(result.raw(OrbitClass::Neo), Some(100.0));
    assert_eq!(result.raw(OrbitClass::MpcInterest), None);
}

#[test]
fn test_exact_astrometry_still_scores() {
    let params = DigestParams::builder()
        .default_obs_err(0.0)
        .repeatable(true)
        .build()
        .unwrap();
    let digest = Digest::new(belt_model(), site_table(), params).unwrap();
    let result = digest.score(&fast_mover("fast")).unwrap();
    assert_eq!(result.raw(OrbitClass::Neo), Some(100.0));
}

#[test]
fn test_multi_observation_tracklet_reports_rms() {
    let digest = repeatable_digest();
    let t0 = 60200.25;
    let observations = (0..4)
        .map(|k| {
            let t = k as f64 / 72.0;
            Observation::from_obscode("G96", t0 + t, 300.0 * RADEG, (-10.0 + 12.0 * t) * RADEG)
                .unwrap()
        })
        .collect();
    let result = digest.score(&Tracklet::new("four", observations)).unwrap();

    // uniform motion along a meridian lies on a great circle
    assert_relative_eq!(result.rms, 0.0, epsilon = 1e-3);
    assert_eq!(result.raw(OrbitClass::Neo), Some(100.0));
}

#[test]
fn test_unscorable_tracklets() {
    let digest = repeatable_digest();

    let single = common::single_observation("one");
    assert_eq!(
        digest.score(&single),
        Err(DigestError::NotScorable {
            designation: "one".into(),
            reason: Rejection::SingleObservation
        })
    );

    let mut reversed = fast_mover("rev");
    reversed.observations.swap(0, 1);
    assert_eq!(
        digest.score(&reversed),
        Err(DigestError::NotScorable {
            designation: "rev".into(),
            reason: Rejection::NonMonotonicTime
        })
    );

    let mut still = fast_mover("still");
    still.observations[1].ra = still.observations[0].ra;
    still.observations[1].dec = still.observations[0].dec;
    assert_eq!(
        digest.score(&still),
        Err(DigestError::NotScorable {
            designation: "still".into(),
            reason: Rejection::NoMotion
        })
    );

    let mut instant = fast_mover("instant");
    instant.observations[1].time = instant.observations[0].time;
    assert_eq!(
        digest.score(&instant),
        Err(DigestError::NotScorable {
            designation: "instant".into(),
            reason: Rejection::NoTimeSpan
        })
    );
}
