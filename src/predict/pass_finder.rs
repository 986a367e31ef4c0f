use chrono::{DateTime, Duration, Utc};

use crate::abort::Cancellation;
use crate::elements::OrbitalElementSet;
use crate::predict::error::PredictError;
use crate::predict::propagation::Propagator;
use crate::predict::search::{find_crossing, find_peak};
use crate::predict::types::{CompassPoint, LookAngles, ObserverSite, PassEvent};

pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Sampling interval of the initial scan.
    pub coarse_step: Duration,
    /// Resolution of the refined rise, set and peak instants, in seconds.
    pub tolerance_seconds: f64,
    /// Passes shorter than this are treated as numerical noise.
    pub min_duration: Duration,
    /// How far past the window end a pass that rose inside it is followed.
    pub set_overrun: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            coarse_step: Duration::seconds(60),
            tolerance_seconds: 0.5,
            min_duration: Duration::seconds(10),
            set_overrun: Duration::minutes(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    t: f64,
    /// Elevation above the threshold, degrees.
    f: f64,
}

struct PassSearch<'a> {
    propagator: &'a Propagator,
    elements: &'a OrbitalElementSet,
    observer: &'a ObserverSite,
    origin: DateTime<Utc>,
    min_elevation_deg: f64,
    tolerance: f64,
    min_duration: f64,
}

impl PassSearch<'_> {
    fn at(&self, offset: f64) -> DateTime<Utc> {
        self.origin + Duration::milliseconds((offset * 1000.0).round() as i64)
    }

    fn look(&self, offset: f64) -> Result<LookAngles, PredictError> {
        self.propagator
            .look_angles(self.elements, self.observer, self.at(offset))
    }

    fn margin(&self, offset: f64) -> Result<f64, PredictError> {
        Ok(self.look(offset)?.elevation_deg - self.min_elevation_deg)
    }

    fn build_pass(&self, rise: f64, set: f64) -> Result<Option<PassEvent>, PredictError> {
        if set - rise < self.min_duration {
            log::debug!(
                "Discarding {:.1} s interval above threshold at {}",
                set - rise,
                self.at(rise)
            );
            return Ok(None);
        }

        let peak = find_peak(|t| self.margin(t), rise, set, self.tolerance)?;
        let rise_look = self.look(rise)?;
        let peak_look = self.look(peak.at)?;
        let set_look = self.look(set)?;
        let (rise_time, set_time) = (self.at(rise), self.at(set));

        Ok(Some(PassEvent {
            rise: rise_time,
            peak: self.at(peak.at),
            set: set_time,
            peak_elevation_deg: peak_look.elevation_deg,
            rise_azimuth_deg: rise_look.azimuth_deg,
            peak_azimuth_deg: peak_look.azimuth_deg,
            set_azimuth_deg: set_look.azimuth_deg,
            rise_direction: CompassPoint::from_azimuth(rise_look.azimuth_deg),
            set_direction: CompassPoint::from_azimuth(set_look.azimuth_deg),
            duration_seconds: (set_time - rise_time).num_milliseconds() as f64 / 1000.0,
        }))
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Find every pass whose rise lies in `[window_start, window_end]`, in time order.
///
/// The elevation is sampled every `coarse_step`; sign changes of
/// `elevation - min_elevation_deg` are bisected down to `tolerance_seconds`, and
/// the peak is located by golden-section search between rise and set. A
/// below-threshold local maximum among three samples (or among the first two,
/// when the window start is the higher one) is refined as well, so a pass
/// shorter than one step is still found.
///
/// A pass already above the threshold at `window_start` is excluded since its
/// rise is unknown. A pass that rises inside the window is followed past
/// `window_end` (up to `set_overrun`) so it is reported whole. This makes the
/// result for `[s, s + l]` a prefix of the result for `[s, s + 2l]`.
#[allow(clippy::too_many_arguments)]
pub fn find_passes(
    propagator: &Propagator,
    elements: &OrbitalElementSet,
    observer: &ObserverSite,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_elevation_deg: f64,
    options: &SearchOptions,
    cancel: &Cancellation,
) -> Result<Vec<PassEvent>, PredictError> {
    if window_end <= window_start {
        return Err(PredictError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }
    if !(0.0..90.0).contains(&min_elevation_deg) {
        return Err(PredictError::InvalidElevation(min_elevation_deg));
    }
    propagator.check_horizon(elements, window_start)?;
    propagator.check_horizon(elements, window_end)?;

    let search = PassSearch {
        propagator,
        elements,
        observer,
        origin: window_start,
        min_elevation_deg,
        tolerance: options.tolerance_seconds.max(1e-3),
        min_duration: options.min_duration.num_milliseconds() as f64 / 1000.0,
    };
    let margin = |t: f64| search.margin(t);

    let hard_stop = (window_end + options.set_overrun).min(propagator.valid_until(elements));
    let window = seconds_between(window_start, window_end);
    let limit = seconds_between(window_start, hard_stop);
    let step = (options.coarse_step.num_milliseconds() as f64 / 1000.0).max(1.0);
    // Two extra samples so a short pass rising just before the end is still bracketed.
    let scan_end = window + 2.0 * step;
    let tol = search.tolerance;

    let mut passes = Vec::new();
    let mut prev = Sample {
        t: 0.0,
        f: margin(0.0)?,
    };
    let mut before_prev: Option<Sample> = None;
    let mut rise: Option<f64> = None;
    let mut k: u64 = 0;

    if prev.f >= 0.0 {
        log::debug!("Pass in progress at {}, skipped", window_start);
    }

    loop {
        cancel.check()?;
        if prev.t >= limit || (rise.is_none() && prev.t >= scan_end) {
            break;
        }

        k += 1;
        let t = (k as f64 * step).min(limit);
        let cur = Sample { t, f: margin(t)? };

        if prev.f < 0.0 && cur.f >= 0.0 {
            let r = find_crossing(margin, prev.t, cur.t, false, tol)?;
            rise = (r <= window).then_some(r);
        } else if prev.f >= 0.0 && cur.f < 0.0 {
            let s = find_crossing(margin, prev.t, cur.t, true, tol)?;
            if let Some(r) = rise.take() {
                passes.extend(search.build_pass(r, s)?);
            }
        } else if cur.f < 0.0 {
            let bracket = match before_prev {
                Some(bp) if bp.f < 0.0 && prev.f > bp.f && prev.f >= cur.f => Some(bp.t),
                // The window start has no left neighbour; it may be the sample
                // closest to a peak lying inside the first step.
                None if prev.f >= cur.f => Some(prev.t),
                _ => None,
            };
            if let Some(from) = bracket {
                let peak = find_peak(margin, from, cur.t, tol)?;
                if peak.value >= 0.0 {
                    let r = find_crossing(margin, from, peak.at, false, tol)?;
                    let s = find_crossing(margin, peak.at, cur.t, true, tol)?;
                    if (0.0..=window).contains(&r) {
                        passes.extend(search.build_pass(r, s)?);
                    }
                }
            }
        }

        before_prev = Some(prev);
        prev = cur;
    }

    if rise.is_some() {
        log::debug!(
            "Pass rising before {} did not set by {}, dropped",
            window_end,
            hard_stop
        );
    }

    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::fixtures::{epoch, iss};

    fn warsaw() -> ObserverSite {
        ObserverSite::new("Warsaw", 52.23, 21.01, 100.0).unwrap()
    }

    fn passes(
        observer: &ObserverSite,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_elevation: f64,
    ) -> Result<Vec<PassEvent>, PredictError> {
        find_passes(
            &Propagator::default(),
            &iss(),
            observer,
            start,
            end,
            min_elevation,
            &SearchOptions::default(),
            &Cancellation::new(),
        )
    }

    fn warsaw_passes_with(
        propagator: &Propagator,
        options: &SearchOptions,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_elevation: f64,
    ) -> Vec<PassEvent> {
        find_passes(
            propagator,
            &iss(),
            &warsaw(),
            start,
            end,
            min_elevation,
            options,
            &Cancellation::new(),
        )
        .unwrap()
    }

    #[test]
    fn warsaw_day_has_ordered_valid_passes() {
        let start = epoch();
        let end = start + Duration::hours(24);
        let found = passes(&warsaw(), start, end, 10.0).unwrap();
        assert!(!found.is_empty());

        let propagator = Propagator::default();
        let elements = iss();
        for pass in &found {
            assert!(pass.rise < pass.peak && pass.peak < pass.set, "{:?}", pass);
            assert!(pass.rise >= start && pass.rise <= end);
            assert!(pass.set - pass.rise < Duration::minutes(10));
            assert!(pass.set - pass.rise >= Duration::seconds(10));
            assert!(pass.peak_elevation_deg >= 10.0 && pass.peak_elevation_deg <= 90.0);
            for az in [pass.rise_azimuth_deg, pass.peak_azimuth_deg, pass.set_azimuth_deg] {
                assert!((0.0..360.0).contains(&az));
            }

            let el = |t| {
                propagator
                    .look_angles(&elements, &warsaw(), t)
                    .unwrap()
                    .elevation_deg
            };
            assert!(el(pass.peak) >= el(pass.rise));
            assert!(el(pass.peak) >= el(pass.set));
            assert!((el(pass.rise) - 10.0).abs() < 0.3);
            assert!((el(pass.set) - 10.0).abs() < 0.3);
        }

        for pair in found.windows(2) {
            assert!(pair[0].set < pair[1].rise);
        }
    }

    #[test]
    fn shorter_window_is_a_prefix() {
        let start = epoch() + Duration::hours(2);
        let half = passes(&warsaw(), start, start + Duration::hours(12), 10.0).unwrap();
        let full = passes(&warsaw(), start, start + Duration::hours(24), 10.0).unwrap();

        let cutoff = start + Duration::hours(12);
        let prefix: Vec<_> = full.into_iter().filter(|p| p.rise <= cutoff).collect();
        assert_eq!(half, prefix);
    }

    #[test]
    fn pass_in_progress_at_start_is_excluded() {
        let start = epoch();
        let found = passes(&warsaw(), start, start + Duration::hours(24), 10.0).unwrap();
        let first = &found[0];

        let later = passes(&warsaw(), first.peak, first.peak + Duration::hours(6), 10.0).unwrap();
        assert!(later.iter().all(|p| p.rise > first.set));
    }

    #[test]
    fn narrow_window_finds_single_pass() {
        let start = epoch();
        let found = passes(&warsaw(), start, start + Duration::hours(24), 10.0).unwrap();
        let target = &found[0];

        let narrow = passes(
            &warsaw(),
            target.rise - Duration::minutes(3),
            target.rise + Duration::minutes(1),
            10.0,
        )
        .unwrap();
        assert_eq!(narrow.len(), 1);
        assert!((narrow[0].rise - target.rise).num_milliseconds().abs() < 2000);
        assert!((narrow[0].set - target.set).num_milliseconds().abs() < 2000);
    }

    #[test]
    fn coarse_sampling_keeps_short_passes() {
        let start = epoch();
        let end = start + Duration::hours(24);
        let fine = passes(&warsaw(), start, end, 10.0).unwrap();
        let coarse = find_passes(
            &Propagator::default(),
            &iss(),
            &warsaw(),
            start,
            end,
            10.0,
            &SearchOptions {
                coarse_step: Duration::seconds(240),
                ..SearchOptions::default()
            },
            &Cancellation::new(),
        )
        .unwrap();

        assert_eq!(fine.len(), coarse.len());
        for (a, b) in fine.iter().zip(&coarse) {
            assert!((a.rise - b.rise).num_milliseconds().abs() < 2000);
            assert!((a.peak_elevation_deg - b.peak_elevation_deg).abs() < 0.05);
        }
    }

    #[test]
    fn short_pass_inside_first_step_is_found() {
        let start = epoch();
        let end = start + Duration::hours(24);
        let found = passes(&warsaw(), start, end, 10.0).unwrap();
        assert!(!found.is_empty());

        let mut within_one_step = 0;
        for target in &found {
            // Just under the peak the pass lasts less than one coarse step.
            let threshold = target.peak_elevation_deg - 0.3;
            let short: Vec<_> = passes(&warsaw(), start, end, threshold)
                .unwrap()
                .into_iter()
                .filter(|p| p.peak > target.rise && p.peak < target.set)
                .collect();
            assert!(short.len() <= 1, "{:?}", short);
            // Steep passes stay above it for less than the minimum duration.
            let Some(short) = short.first() else { continue };
            if short.set - short.rise < Duration::seconds(58) {
                within_one_step += 1;
            }

            let narrow = passes(
                &warsaw(),
                short.rise - Duration::seconds(2),
                short.rise + Duration::minutes(20),
                threshold,
            )
            .unwrap();
            assert_eq!(narrow.len(), 1, "{:?}", short);
            assert!((narrow[0].rise - short.rise).num_milliseconds().abs() < 2000);
            assert!((narrow[0].set - short.set).num_milliseconds().abs() < 2000);
        }
        assert!(within_one_step > 0);
    }

    #[test]
    fn intervals_shorter_than_min_duration_are_discarded() {
        let start = epoch();
        let found = passes(&warsaw(), start, start + Duration::hours(24), 10.0).unwrap();
        let highest = found
            .iter()
            .max_by(|a, b| a.peak_elevation_deg.total_cmp(&b.peak_elevation_deg))
            .unwrap();
        let (from, to) = (highest.rise - Duration::minutes(1), highest.set + Duration::minutes(1));
        let propagator = Propagator::default();

        // A few seconds above a threshold just under the peak.
        let threshold = highest.peak_elevation_deg - 0.01;
        let keep_all = SearchOptions {
            min_duration: Duration::zero(),
            ..SearchOptions::default()
        };
        let sliver = warsaw_passes_with(&propagator, &keep_all, from, to, threshold);
        assert_eq!(sliver.len(), 1);
        assert!(sliver[0].set - sliver[0].rise < Duration::seconds(10));
        assert!(warsaw_passes_with(&propagator, &SearchOptions::default(), from, to, threshold)
            .is_empty());

        let long_only = SearchOptions {
            min_duration: Duration::hours(1),
            ..SearchOptions::default()
        };
        let end = start + Duration::hours(24);
        assert!(warsaw_passes_with(&propagator, &long_only, start, end, 10.0).is_empty());
    }

    #[test]
    fn pass_not_setting_before_horizon_is_dropped() {
        let start = epoch();
        let found = passes(&warsaw(), start, start + Duration::hours(24), 10.0).unwrap();
        let target = &found[1];
        let (from, to) = (target.rise - Duration::minutes(30), target.peak);

        let full = warsaw_passes_with(
            &Propagator::default(),
            &SearchOptions::default(),
            from,
            to,
            10.0,
        );
        assert_eq!(full.len(), 1);
        assert!((full[0].rise - target.rise).num_milliseconds().abs() < 2000);

        // Elements stop being trusted at the peak, so the set is never seen.
        let short_lived = Propagator::new(target.peak - epoch());
        assert_eq!(short_lived.valid_until(&iss()), to);
        let cut = warsaw_passes_with(&short_lived, &SearchOptions::default(), from, to, 10.0);
        assert!(cut.is_empty());
    }

    #[test]
    fn polar_observer_sees_nothing() {
        let pole = ObserverSite::new("pole", 89.9, 0.0, 0.0).unwrap();
        let start = epoch();
        let found = passes(&pole, start, start + Duration::hours(24), 45.0).unwrap();
        assert!(found.is_empty());
        let found = passes(&pole, start, start + Duration::hours(24), 0.0).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn rejects_empty_window() {
        let err = passes(&warsaw(), epoch(), epoch(), 10.0).unwrap_err();
        assert!(matches!(err, PredictError::InvalidWindow { .. }));
        let err = passes(&warsaw(), epoch(), epoch() - Duration::hours(1), 10.0).unwrap_err();
        assert!(matches!(err, PredictError::InvalidWindow { .. }));
    }

    #[test]
    fn rejects_bad_elevation() {
        let end = epoch() + Duration::hours(1);
        for min_el in [-1.0, 90.0, f64::NAN] {
            let err = passes(&warsaw(), epoch(), end, min_el).unwrap_err();
            assert!(matches!(err, PredictError::InvalidElevation(_)));
        }
    }

    #[test]
    fn window_beyond_horizon_is_stale() {
        let start = epoch() + Duration::days(10);
        let err = passes(&warsaw(), start, start + Duration::hours(24), 10.0).unwrap_err();
        assert!(matches!(err, PredictError::StaleElements { .. }));
    }

    #[test]
    fn cancelled_search_stops() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let err = find_passes(
            &Propagator::default(),
            &iss(),
            &warsaw(),
            epoch(),
            epoch() + Duration::hours(48),
            10.0,
            &SearchOptions::default(),
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::Cancelled));
    }
}
