//! Threshold cells, the `A[ri, rf, k]` array and per-period boundaries.
//!
//! A cell is either a latent-variable level or one of two markers: the
//! unused same-state cell and the unreachable cells of the absorbing row.
//! Persisted files encode the markers as the strings `"nan"` and `"-inf"`.

use pa_core::{ensure, Error, Real, Result, Size};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};

const SAME_STATE_TAG: &str = "nan";
const UNREACHABLE_TAG: &str = "-inf";

/// One cell of the threshold array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// A finite latent-variable level.
    Value(Real),
    /// `A[ri, ri, k]`: the same-state boundary is never used.
    SameState,
    /// `A[Default, rf, k]` for `rf ≠ Default`: the absorbing state never leaves.
    Unreachable,
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Value(0.0)
    }
}

impl Threshold {
    /// The latent level, if this cell holds one.
    pub fn value(self) -> Option<Real> {
        match self {
            Threshold::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Legacy floating-point encoding: NaN for same-state, −∞ for
    /// unreachable.
    pub fn as_f64(self) -> Real {
        match self {
            Threshold::Value(v) => v,
            Threshold::SameState => Real::NAN,
            Threshold::Unreachable => Real::NEG_INFINITY,
        }
    }

    /// Inverse of [`Threshold::as_f64`].
    pub fn from_f64(v: Real) -> Self {
        if v.is_nan() {
            Threshold::SameState
        } else if v == Real::NEG_INFINITY {
            Threshold::Unreachable
        } else {
            Threshold::Value(v)
        }
    }

    /// Map the level through `f`, leaving markers untouched.
    pub fn map(self, f: impl FnOnce(Real) -> Real) -> Self {
        match self {
            Threshold::Value(v) => Threshold::Value(f(v)),
            other => other,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Value(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Threshold::SameState => f.pad("NaN"),
            Threshold::Unreachable => f.pad("-Inf"),
        }
    }
}

// ── Serde ─────────────────────────────────────────────────────────────────────

impl Serialize for Threshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Threshold::Value(v) if v.is_finite() => serializer.serialize_f64(v),
            Threshold::Value(v) => Err(serde::ser::Error::custom(format!(
                "non-finite threshold value {v}"
            ))),
            Threshold::SameState => serializer.serialize_str(SAME_STATE_TAG),
            Threshold::Unreachable => serializer.serialize_str(UNREACHABLE_TAG),
        }
    }
}

struct ThresholdVisitor;

impl<'de> Visitor<'de> for ThresholdVisitor {
    type Value = Threshold;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number, \"{SAME_STATE_TAG}\" or \"{UNREACHABLE_TAG}\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Threshold, E> {
        Ok(Threshold::Value(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Threshold, E> {
        Ok(Threshold::Value(v as Real))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Threshold, E> {
        Ok(Threshold::Value(v as Real))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Threshold, E> {
        if v.eq_ignore_ascii_case(SAME_STATE_TAG) {
            Ok(Threshold::SameState)
        } else if v.eq_ignore_ascii_case(UNREACHABLE_TAG) {
            Ok(Threshold::Unreachable)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ThresholdVisitor)
    }
}

// ── ThresholdArray ────────────────────────────────────────────────────────────

/// The `R × R × P` array `A[ri, rf, k]`.
///
/// Stored rating-major so that every initial rating owns one contiguous
/// block of `R · P` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdArray {
    ratings: Size,
    periods: Size,
    cells: Vec<Threshold>,
}

impl ThresholdArray {
    /// An array of zero levels.
    pub fn new(ratings: Size, periods: Size) -> Self {
        Self {
            ratings,
            periods,
            cells: vec![Threshold::default(); ratings * ratings * periods],
        }
    }

    /// Build from `[period][ri][rf]` nested cells. Fails on an empty or
    /// ragged document.
    pub fn from_periods(periods: Vec<Vec<Vec<Threshold>>>) -> Result<Self> {
        let n_periods = periods.len();
        if n_periods == 0 {
            return Err(Error::Configuration("threshold document has no periods".into()));
        }
        let ratings = periods[0].len();
        if ratings < 2 {
            return Err(Error::Configuration(format!(
                "threshold document needs at least two ratings, got {ratings}"
            )));
        }
        let mut array = Self::new(ratings, n_periods);
        for (k, matrix) in periods.iter().enumerate() {
            if matrix.len() != ratings || matrix.iter().any(|row| row.len() != ratings) {
                return Err(Error::Configuration(format!(
                    "period {k} is not a {ratings}x{ratings} matrix"
                )));
            }
            for (ri, row) in matrix.iter().enumerate() {
                for (rf, &cell) in row.iter().enumerate() {
                    array[(ri, rf, k)] = cell;
                }
            }
        }
        Ok(array)
    }

    /// Nested `[period][ri][rf]` copy, the persisted layout.
    pub fn to_periods(&self) -> Vec<Vec<Vec<Threshold>>> {
        (0..self.periods)
            .map(|k| {
                (0..self.ratings)
                    .map(|ri| (0..self.ratings).map(|rf| self[(ri, rf, k)]).collect())
                    .collect()
            })
            .collect()
    }

    /// Number of rating states.
    pub fn ratings(&self) -> Size {
        self.ratings
    }

    /// Number of periods.
    pub fn periods(&self) -> Size {
        self.periods
    }

    /// Checked access.
    pub fn get(&self, ri: Size, rf: Size, k: Size) -> Result<Threshold> {
        self.check_rating(ri)?;
        self.check_rating(rf)?;
        if k >= self.periods {
            return Err(Error::IndexOutOfRange {
                index: k,
                size: self.periods,
            });
        }
        Ok(self[(ri, rf, k)])
    }

    pub(crate) fn check_rating(&self, ri: Size) -> Result<()> {
        if ri >= self.ratings {
            return Err(Error::IndexOutOfRange {
                index: ri,
                size: self.ratings,
            });
        }
        Ok(())
    }

    /// Overwrite the block of initial rating `ri` with `block`, laid out
    /// `[rf][k]`.
    pub(crate) fn set_rating(&mut self, ri: Size, block: &[Threshold]) {
        let len = self.ratings * self.periods;
        debug_assert_eq!(block.len(), len);
        self.cells[ri * len..(ri + 1) * len].copy_from_slice(block);
    }

    /// Boundaries `b_1 … b_D` of initial rating `ri` at period `k`.
    ///
    /// Fails when a cell the boundaries need is a marker, which is always
    /// the case for the absorbing state.
    pub fn boundaries(&self, ri: Size, k: Size) -> Result<Boundaries> {
        self.check_rating(ri)?;
        let d = self.ratings - 1;
        ensure!(ri < d, "the absorbing state has no boundaries");
        (1..=d)
            .map(|j| {
                let rf = if j > ri { j } else { j - 1 };
                match self[(ri, rf, k)] {
                    Threshold::Value(v) if v.is_finite() => Ok(v),
                    other => Err(Error::Precondition(format!(
                        "threshold ({ri}, {rf}, {k}) is {other}, expected a finite level"
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Boundaries)
    }
}

impl Index<(Size, Size, Size)> for ThresholdArray {
    type Output = Threshold;
    fn index(&self, (ri, rf, k): (Size, Size, Size)) -> &Threshold {
        &self.cells[(ri * self.ratings + rf) * self.periods + k]
    }
}

impl IndexMut<(Size, Size, Size)> for ThresholdArray {
    fn index_mut(&mut self, (ri, rf, k): (Size, Size, Size)) -> &mut Threshold {
        &mut self.cells[(ri * self.ratings + rf) * self.periods + k]
    }
}

/// Cells of one initial rating, laid out `[rf][k]`, following the
/// same-state and absorbing conventions and holding zero elsewhere.
pub(crate) fn rating_block(ratings: Size, periods: Size, ri: Size) -> Vec<Threshold> {
    let d = ratings - 1;
    let mut block = vec![Threshold::default(); ratings * periods];
    for rf in 0..ratings {
        let cell = if rf == ri {
            Threshold::SameState
        } else if ri == d {
            Threshold::Unreachable
        } else {
            continue;
        };
        block[rf * periods..(rf + 1) * periods].fill(cell);
    }
    block
}

// ── Boundaries ────────────────────────────────────────────────────────────────

/// Latent boundaries `b_1 > b_2 > … > b_D` for one `(ri, k)`.
///
/// A latent value below `b_j` means a final rating of `j` or worse; `b_D` is
/// the default threshold and `b_0` is taken as `+∞`.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundaries(Vec<Real>);

impl Boundaries {
    /// Wrap `b_1 … b_D`.
    pub fn new(levels: Vec<Real>) -> Self {
        Self(levels)
    }

    /// Number of live ratings `D`.
    pub fn len(&self) -> Size {
        self.0.len()
    }

    /// Whether there are no live ratings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `b_j`, with `b_0 = +∞`.
    pub fn level(&self, j: Size) -> Real {
        if j == 0 {
            Real::INFINITY
        } else {
            self.0[j - 1]
        }
    }

    /// The default threshold `b_D`.
    pub fn default_threshold(&self) -> Real {
        self.0[self.0.len() - 1]
    }

    /// Latent band `[b_{rf+1}, b_rf]` of live rating `rf`.
    pub fn band(&self, rf: Size) -> (Real, Real) {
        (self.level(rf + 1), self.level(rf))
    }

    /// Whether `b_1 > b_2 > … > b_D`.
    pub fn is_strictly_decreasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] > w[1])
    }

    /// Borrow `b_1 … b_D`.
    pub fn as_slice(&self) -> &[Real] {
        &self.0
    }
}
