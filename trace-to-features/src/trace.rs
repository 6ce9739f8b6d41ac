use crate::error::{FeatureError, FeatureResult, InputContext};
use nanopore_common::Real;

/// A raw nanopore trace, and optionally an idealised fit of the same length.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Trace {
    samples: Vec<Real>,
    fit: Option<Vec<Real>>,
}

impl Trace {
    /// Fails if the trace is empty or contains a non-finite sample.
    pub fn new(samples: Vec<Real>) -> FeatureResult<Self> {
        check_samples(&samples, InputContext::Trace)?;
        Ok(Self { samples, fit: None })
    }

    /// Attaches a fit, which must match the trace sample for sample.
    pub fn with_fit(self, fit: Vec<Real>) -> FeatureResult<Self> {
        if fit.len() != self.samples.len() {
            return Err(FeatureError::invalid(
                InputContext::Fit,
                format!(
                    "fit has {} samples but the trace has {}",
                    fit.len(),
                    self.samples.len()
                ),
            ));
        }
        check_samples(&fit, InputContext::Fit)?;
        Ok(Self {
            fit: Some(fit),
            ..self
        })
    }

    pub fn samples(&self) -> &[Real] {
        &self.samples
    }

    pub fn fit(&self) -> Option<&[Real]> {
        self.fit.as_deref()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn check_samples(samples: &[Real], context: InputContext) -> FeatureResult<()> {
    if samples.is_empty() {
        return Err(FeatureError::invalid(context, "no samples"));
    }
    if let Some((index, value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(FeatureError::invalid(
            context,
            format!("sample {index} is not a finite number ({value})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trace_is_invalid() {
        assert!(matches!(
            Trace::new(vec![]),
            Err(FeatureError::InvalidInput {
                context: InputContext::Trace,
                ..
            })
        ));
    }

    #[test]
    fn nan_sample_is_invalid() {
        let error = Trace::new(vec![1.0, Real::NAN]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid trace: sample 1 is not a finite number (NaN)"
        );
    }

    #[test]
    fn fit_must_match_trace_length() {
        let trace = Trace::new(vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            trace.clone().with_fit(vec![1.0]),
            Err(FeatureError::InvalidInput {
                context: InputContext::Fit,
                ..
            })
        ));
        let trace = trace.with_fit(vec![1.5, 1.5]).unwrap();
        assert_eq!(trace.fit(), Some([1.5, 1.5].as_slice()));
    }
}
