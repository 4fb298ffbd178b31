use crate::indicators::moving_average::{rolling_std, sma};
use crate::indicators::IndicatorSeries;
use serde::{Deserialize, Serialize};

//one bollinger band reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Band {
    //degenerate band where all three lines sit on one level (used for sma rules)
    pub fn flat(level: f64) -> Self {
        Band {
            mid: level,
            upper: level,
            lower: level,
        }
    }
}

//mid = sma, upper/lower = sma +/- devfactor * sample std
pub fn bollinger_bands(closes: &[f64], period: usize, devfactor: f64) -> IndicatorSeries<Band> {
    let mids = sma(closes, period);
    let stds = rolling_std(closes, period);

    mids.into_iter()
        .zip(stds)
        .map(|(mid, std)| {
            let (mid, std) = (mid?, std?);
            Some(Band {
                mid,
                upper: mid + devfactor * std,
                lower: mid - devfactor * std,
            })
        })
        .collect()
}

//inner band drives signals, outer band is only drawn
#[derive(Debug, Clone, PartialEq)]
pub struct BandPair {
    pub inner: IndicatorSeries<Band>,
    pub outer: IndicatorSeries<Band>,
}

impl BandPair {
    pub fn new(closes: &[f64], period: usize, inner_devfactor: f64, outer_devfactor: f64) -> Self {
        BandPair {
            inner: bollinger_bands(closes, period, inner_devfactor),
            outer: bollinger_bands(closes, period, outer_devfactor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_symmetric_around_mid() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let bands = bollinger_bands(&closes, 3, 2.0);

        assert!(bands[1].is_none());
        let band = bands[4].unwrap();
        assert_eq!(band.mid, 4.0);
        //sample std of [3, 4, 5] is 1
        assert!((band.upper - 6.0).abs() < 1e-12);
        assert!((band.lower - 2.0).abs() < 1e-12);
    }

    #[test]
    fn outer_band_is_wider() {
        let closes = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let pair = BandPair::new(&closes, 4, 0.5, 2.0);

        for (inner, outer) in pair.inner.iter().zip(&pair.outer) {
            match (inner, outer) {
                (Some(i), Some(o)) => {
                    assert_eq!(i.mid, o.mid);
                    assert!(o.upper >= i.upper && o.lower <= i.lower);
                }
                (None, None) => {}
                _ => panic!("inner and outer warm up together"),
            }
        }
    }
}
