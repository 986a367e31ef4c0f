//! Root and peak finding over a scalar function of time.
//!
//! Time is a plain `f64` (seconds from an arbitrary origin) so these can be
//! exercised with analytic functions. The function may fail; the first error
//! aborts the search.

const INV_PHI: f64 = 0.618_033_988_749_894_9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub at: f64,
    pub value: f64,
}

/// Bisect `[lo, hi]` on the sign of `f` until the bracket is narrower than
/// `tolerance`. `lo_inside` says whether `f(lo) >= 0`; `f(hi)` must be on the
/// other side. Returns the bracket end where `f >= 0`.
pub fn find_crossing<F, E>(
    mut f: F,
    mut lo: f64,
    mut hi: f64,
    lo_inside: bool,
    tolerance: f64,
) -> Result<f64, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    while hi - lo > tolerance {
        let mid = lo + (hi - lo) / 2.0;
        let inside = f(mid)? >= 0.0;
        if inside == lo_inside {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(if lo_inside { lo } else { hi })
}

/// Golden-section search for the maximum of a unimodal `f` on `[a, b]`.
/// The returned point is always strictly inside the bracket.
pub fn find_peak<F, E>(mut f: F, mut a: f64, mut b: f64, tolerance: f64) -> Result<Peak, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = f(c)?;
    let mut fd = f(d)?;

    while b - a > tolerance {
        if fc >= fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d)?;
        }
    }

    Ok(if fc >= fd {
        Peak { at: c, value: fc }
    } else {
        Peak { at: d, value: fd }
    })
}
