use crate::model::{ExponentialRate, FixedInterval, RateModel, Trigger};
use crate::rng::SimRng;
use crate::sim::SimTime;

#[test]
fn exponential_rate_starts_unschedulable() {
    let rate = ExponentialRate::new(1.0);
    assert!(rate.tau().is_infinite());
    assert_eq!(rate.base_rate(), 1.0);
}

#[test]
fn exponential_rate_samples_forward_from_now() {
    let mut rate = ExponentialRate::new(2.0);
    let mut rng = SimRng::new(7);
    let now = SimTime::from_secs(3.0);
    rate.update(now, false, 1.0, &mut rng);
    assert!(!rate.tau().is_infinite());
    assert!(rate.tau() >= now);
}

#[test]
fn exponential_rate_disables_on_zero_propensity() {
    let mut rate = ExponentialRate::new(2.0);
    let mut rng = SimRng::new(7);
    rate.update(SimTime::ZERO, false, 1.0, &mut rng);
    assert!(!rate.tau().is_infinite());
    rate.update(SimTime::ZERO, false, 0.0, &mut rng);
    assert!(rate.tau().is_infinite());
}

#[test]
fn exponential_rate_rescales_residual_on_bystander_change() {
    let mut rate = ExponentialRate::new(1.0);
    let mut rng = SimRng::new(1);
    rate.update(SimTime::ZERO, false, 1.0, &mut rng);
    let tau0 = rate.tau().as_secs();

    // doubling the propensity without firing halves the residual wait
    rate.update(SimTime::ZERO, false, 2.0, &mut rng);
    let tau1 = rate.tau().as_secs();
    assert!((tau1 - tau0 / 2.0).abs() < 1e-12, "tau0={tau0} tau1={tau1}");
}

#[test]
fn exponential_rate_resamples_after_firing() {
    let mut rate = ExponentialRate::new(1.0);
    let mut rng = SimRng::new(5);
    rate.update(SimTime::ZERO, false, 1.0, &mut rng);
    let now = SimTime::from_secs(10.0);
    rate.update(now, true, 1.0, &mut rng);
    assert!(rate.tau() >= now);
}

#[test]
fn exponential_rate_revives_from_disabled_with_fresh_sample() {
    let mut rate = ExponentialRate::new(1.0);
    let mut rng = SimRng::new(5);
    rate.update(SimTime::ZERO, false, 0.0, &mut rng);
    assert!(rate.tau().is_infinite());

    let now = SimTime::from_secs(2.0);
    rate.update(now, false, 3.0, &mut rng);
    assert!(!rate.tau().is_infinite());
    assert!(rate.tau() >= now);
}

#[test]
fn fixed_interval_keeps_cadence_across_firings() {
    let mut rate = FixedInterval::new(SimTime::from_secs(2.0));
    let mut rng = SimRng::new(1);
    assert!(rate.tau().is_infinite());

    rate.update(SimTime::ZERO, false, 1.0, &mut rng);
    assert_eq!(rate.tau(), SimTime::from_secs(2.0));

    // a skipped occurrence still advances the cadence
    rate.update(SimTime::from_secs(2.0), true, 0.0, &mut rng);
    assert_eq!(rate.tau(), SimTime::from_secs(4.0));

    // bystander updates do not shift it
    rate.update(SimTime::from_secs(3.0), false, 1.0, &mut rng);
    assert_eq!(rate.tau(), SimTime::from_secs(4.0));
}

#[test]
fn trigger_fires_once_and_disables() {
    let mut rate = Trigger::new(SimTime::from_secs(1.5));
    let mut rng = SimRng::new(1);
    assert_eq!(rate.tau(), SimTime::from_secs(1.5));

    rate.update(SimTime::from_secs(1.5), true, 1.0, &mut rng);
    assert!(rate.tau().is_infinite());
    rate.update(SimTime::from_secs(9.0), false, 1.0, &mut rng);
    assert!(rate.tau().is_infinite());
}

#[test]
fn trigger_defers_stale_start_to_now() {
    let mut rate = Trigger::new(SimTime::from_secs(1.0));
    let mut rng = SimRng::new(1);
    rate.update(SimTime::from_secs(4.0), false, 1.0, &mut rng);
    assert_eq!(rate.tau(), SimTime::from_secs(4.0));
}
