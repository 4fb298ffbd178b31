use crate::indicators::IndicatorSeries;
use statrs::statistics::Statistics;

//simple moving average of the last `period` values, aligned to the input
pub fn sma(values: &[f64], period: usize) -> IndicatorSeries<f64> {
    rolling(values, period, |window| window.iter().sum::<f64>() / window.len() as f64)
}

//rolling sample standard deviation (ddof = 1) over the same window as sma
pub fn rolling_std(values: &[f64], period: usize) -> IndicatorSeries<f64> {
    rolling(values, period, |window| window.std_dev())
}

fn rolling<F>(values: &[f64], period: usize, f: F) -> IndicatorSeries<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let value = f(&values[i + 1 - period..=i]);
            value.is_finite().then_some(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_is_undefined_during_warmup() {
        let closes = [10.0, 10.0, 10.0, 5.0, 5.0, 5.0, 15.0, 15.0, 15.0];
        let values = sma(&closes, 3);

        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert_eq!(values[2], Some(10.0));
        assert_eq!(values[5], Some(5.0));
        assert!((values[6].unwrap() - 25.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn std_uses_sample_formula() {
        let values = rolling_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        //population std of this set is 2.0, sample std is sqrt(32 / 7)
        assert!((values[7].unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn short_input_yields_nothing() {
        assert!(sma(&[1.0, 2.0], 5).iter().all(Option::is_none));
        assert!(rolling_std(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn single_bar_std_is_undefined() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 1).iter().all(Option::is_none));
    }
}
