use super::BALANCED_STD_DEV_THRESHOLD;
use crate::domain::taste::{TasteType, TasteVector};

/// Maps a taste vector to one of the taste archetypes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TasteTypeClassifier;

impl TasteTypeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns [`TasteType::Balanced`] when no flavor dimension stands out,
    /// otherwise the strongest dimension (first in declared order on ties).
    ///
    /// Never returns [`TasteType::Explorer`].
    pub fn classify(&self, vector: &TasteVector) -> TasteType {
        let dimensions = vector.flavor_dimensions();
        let values = dimensions.map(|(_, value)| value);

        if population_std_dev(&values) < BALANCED_STD_DEV_THRESHOLD {
            return TasteType::Balanced;
        }

        let mut strongest = dimensions[0];
        for candidate in dimensions.iter().skip(1) {
            if candidate.1 > strongest.1 {
                strongest = *candidate;
            }
        }

        TasteType::from(strongest.0)
    }
}

pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flavors(floral: f64, mellow: f64, heavy: f64, mild: f64, dry: f64, light: f64) -> TasteVector {
        TasteVector::new(0.0, 0.0, floral, mellow, heavy, mild, dry, light)
    }

    #[test]
    fn neutral_vector_is_balanced() {
        assert_eq!(TasteTypeClassifier::new().classify(&TasteVector::NEUTRAL), TasteType::Balanced);
    }

    #[test]
    fn small_spread_is_balanced() {
        let vector = flavors(0.6, 0.5, 0.45, 0.55, 0.5, 0.4);
        assert_eq!(TasteTypeClassifier::new().classify(&vector), TasteType::Balanced);
    }

    #[test]
    fn dominant_dimension_wins() {
        let classifier = TasteTypeClassifier::new();
        assert_eq!(classifier.classify(&flavors(0.9, 0.2, 0.1, 0.2, 0.1, 0.3)), TasteType::Floral);
        assert_eq!(classifier.classify(&flavors(0.1, 0.2, 0.1, 0.2, 0.95, 0.3)), TasteType::Dry);
        assert_eq!(classifier.classify(&flavors(0.1, 0.2, 0.1, 0.2, 0.1, 0.8)), TasteType::Light);
    }

    #[test]
    fn ties_resolve_to_first_declared_dimension() {
        let vector = flavors(0.1, 0.9, 0.9, 0.1, 0.1, 0.1);
        assert_eq!(TasteTypeClassifier::new().classify(&vector), TasteType::Mellow);
    }

    #[test]
    fn std_dev_of_constant_values_is_zero() {
        assert_eq!(population_std_dev(&[0.3, 0.3, 0.3]), 0.0);
        assert!((population_std_dev(&[0.0, 1.0]) - 0.5).abs() < 1e-12);
    }
}
