use crate::category::{ClassLabel, Codebook, Stratum};
use crate::error::{CytofError, Result};
use ndarray::Array2;
use std::collections::HashSet;

/// A biological sample (donor x stimulation condition) and its cells.
/// `cells` holds one row per cell and one column per retained marker.
#[derive(Clone, Debug)]
pub struct Sample {
    pub id: String,
    pub label: ClassLabel,
    pub stratum: Stratum,
    pub cells: Array2<f64>,
}

impl Sample {
    pub fn new(id: impl Into<String>, label: ClassLabel, stratum: Stratum, cells: Array2<f64>) -> Sample {
        Sample {
            id: id.into(),
            label,
            stratum,
            cells,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.cells.nrows()
    }

    pub fn num_markers(&self) -> usize {
        self.cells.ncols()
    }
}

/// The set of samples entering one analysis run, with the codebooks that name their
/// class labels and strata.
#[derive(Clone, Debug)]
pub struct Experiment {
    markers: Vec<String>,
    classes: Codebook<ClassLabel>,
    strata: Codebook<Stratum>,
    samples: Vec<Sample>,
}

impl Experiment {
    /// Validate and assemble an experiment. Every sample must have one column per marker,
    /// a unique id, finite values only, and label/stratum codes present in the codebooks.
    pub fn new(
        markers: Vec<String>,
        classes: Codebook<ClassLabel>,
        strata: Codebook<Stratum>,
        samples: Vec<Sample>,
    ) -> Result<Experiment> {
        let mut seen = HashSet::new();
        for s in &samples {
            if !seen.insert(s.id.as_str()) {
                return Err(CytofError::DuplicateSample {
                    sample_id: s.id.clone(),
                });
            }
            if s.num_markers() != markers.len() {
                return Err(CytofError::dimension_mismatch(
                    format!("markers of sample '{}'", s.id),
                    markers.len(),
                    s.num_markers(),
                ));
            }
            if let Some(row) = s.cells.rows().into_iter().position(|r| r.iter().any(|v| !v.is_finite())) {
                return Err(CytofError::invalid_parameter(format!(
                    "sample '{}' has a non-finite value in cell {}",
                    s.id, row
                )));
            }
            if !classes.contains(s.label) {
                return Err(CytofError::invalid_parameter(format!(
                    "sample '{}' has class code {} outside the class codebook",
                    s.id, s.label.0
                )));
            }
            if !strata.contains(s.stratum) {
                return Err(CytofError::invalid_parameter(format!(
                    "sample '{}' has stratum code {} outside the stratum codebook",
                    s.id, s.stratum.0
                )));
            }
        }

        Ok(Experiment {
            markers,
            classes,
            strata,
            samples,
        })
    }

    /// Start an experiment whose samples are added by class and stratum name.
    pub fn builder(markers: Vec<String>) -> ExperimentBuilder {
        ExperimentBuilder {
            markers,
            classes: Codebook::new(),
            strata: Codebook::new(),
            samples: Vec::new(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn classes(&self) -> &Codebook<ClassLabel> {
        &self.classes
    }

    pub fn strata(&self) -> &Codebook<Stratum> {
        &self.strata
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn num_cells(&self) -> usize {
        self.samples.iter().map(Sample::num_cells).sum()
    }

    /// Positions of the samples whose label is one of `labels`, in input order.
    pub fn sample_indices_with_labels(&self, labels: &[ClassLabel]) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| labels.contains(&s.label))
            .map(|(i, _)| i)
            .collect()
    }
}

pub struct ExperimentBuilder {
    markers: Vec<String>,
    classes: Codebook<ClassLabel>,
    strata: Codebook<Stratum>,
    samples: Vec<Sample>,
}

impl ExperimentBuilder {
    pub fn add_sample(
        &mut self,
        id: impl Into<String>,
        class: &str,
        stratum: &str,
        cells: Array2<f64>,
    ) -> &mut ExperimentBuilder {
        let label = self.classes.encode(class);
        let stratum = self.strata.encode(stratum);
        self.samples.push(Sample::new(id, label, stratum, cells));
        self
    }

    pub fn build(self) -> Result<Experiment> {
        Experiment::new(self.markers, self.classes, self.strata, self.samples)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    fn markers() -> Vec<String> {
        vec!["CD3".to_string(), "CD19".to_string()]
    }

    #[test]
    fn test_builder() {
        let mut b = Experiment::builder(markers());
        b.add_sample("d1_unstim", "Unstim", "d1", array![[1.0, 2.0], [3.0, 4.0]])
            .add_sample("d1_ifng", "IFNg", "d1", array![[0.5, 0.5]])
            .add_sample("d2_unstim", "Unstim", "d2", array![[1.0, 1.0]]);
        let exp = b.build().unwrap();

        assert_eq!(exp.samples().len(), 3);
        assert_eq!(exp.num_cells(), 4);
        assert_eq!(exp.classes().len(), 2);
        assert_eq!(exp.strata().len(), 2);
        assert_eq!(exp.samples()[2].label, ClassLabel(0));
        assert_eq!(exp.samples()[2].stratum, Stratum(1));
        assert_eq!(exp.sample_indices_with_labels(&[ClassLabel(0)]), vec![0, 2]);
    }

    #[test]
    fn test_rejects_bad_samples() {
        let mut b = Experiment::builder(markers());
        b.add_sample("a", "Unstim", "d1", array![[1.0, 2.0, 3.0]]);
        assert!(matches!(
            b.build(),
            Err(CytofError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));

        let mut b = Experiment::builder(markers());
        b.add_sample("a", "Unstim", "d1", array![[1.0, 2.0]])
            .add_sample("a", "IFNg", "d1", array![[1.0, 2.0]]);
        assert_eq!(
            b.build().unwrap_err(),
            CytofError::DuplicateSample {
                sample_id: "a".to_string()
            }
        );

        let err = Experiment::new(
            markers(),
            Codebook::new(),
            Codebook::from_names(["d1"]),
            vec![Sample::new("a", ClassLabel(0), Stratum(0), array![[1.0, 2.0]])],
        );
        assert!(matches!(err, Err(CytofError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_non_finite_cells() {
        let mut b = Experiment::builder(markers());
        b.add_sample("d1_unstim", "Unstim", "d1", array![[1.0, 2.0]])
            .add_sample("d1_ifng", "IFNg", "d1", array![[1.0, 2.0], [f64::NAN, 0.0]]);
        assert_eq!(
            b.build().unwrap_err(),
            CytofError::invalid_parameter("sample 'd1_ifng' has a non-finite value in cell 1")
        );

        let mut b = Experiment::builder(markers());
        b.add_sample("a", "Unstim", "d1", array![[f64::NEG_INFINITY, 2.0]]);
        assert!(matches!(b.build(), Err(CytofError::InvalidParameter(_))));
    }
}
