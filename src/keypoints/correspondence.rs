use super::keypoint::{Keypoint, KeypointSet};
use crate::geometry::Point;
use std::collections::HashMap;

/// Index-aligned point pairs built from two keypoint sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondence {
    pub labels: Vec<Option<String>>,
    pub source: Vec<Point>,
    pub target: Vec<Point>,
}

impl Correspondence {
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    fn push(&mut self, label: Option<String>, source: Point, target: Point) {
        self.labels.push(label);
        self.source.push(source);
        self.target.push(target);
    }
}

fn index_by_label<'a>(
    set: &'a KeypointSet,
    which: &str,
) -> crate::Result<HashMap<&'a str, &'a Keypoint>> {
    let mut by_label = HashMap::with_capacity(set.len());
    for kp in set {
        let label = kp.label.as_deref().unwrap_or_default();
        if by_label.insert(label, kp).is_some() {
            anyhow::bail!("duplicate keypoint label '{}' in {} set", label, which);
        }
    }
    Ok(by_label)
}

fn accepted(kp: &Keypoint, min_confidence: f64) -> bool {
    kp.confidence.map_or(true, |c| c >= min_confidence)
}

/// Pair the keypoints of `source` with those of `target`.
///
/// Fully labelled sets are paired by label, in the order of `source`; labels
/// present on only one side are skipped. Otherwise the sets are paired by
/// index and must have the same length. Pairs where either side falls below
/// `min_confidence` or has non-finite coordinates are dropped.
pub fn correspond(
    source: &KeypointSet,
    target: &KeypointSet,
    min_confidence: f64,
) -> crate::Result<Correspondence> {
    let pairs: Vec<(&Keypoint, &Keypoint)> = if source.is_labelled() && target.is_labelled() {
        index_by_label(source, "source")?;
        let target_by_label = index_by_label(target, "target")?;
        source
            .iter()
            .filter_map(|kp| {
                let label = kp.label.as_deref()?;
                target_by_label.get(label).map(|t| (kp, *t))
            })
            .collect()
    } else {
        if source.len() != target.len() {
            anyhow::bail!(
                "unlabelled keypoint sets must have equal length, got {} and {}",
                source.len(),
                target.len()
            );
        }
        source.iter().zip(target.iter()).collect()
    };

    let mut out = Correspondence::default();
    for (s, t) in pairs {
        if !accepted(s, min_confidence) || !accepted(t, min_confidence) {
            continue;
        }
        let (sp, tp) = (s.point(), t.point());
        if !sp.is_finite() || !tp.is_finite() {
            tracing::warn!(label = ?s.label, "dropping keypoint pair with non-finite coordinates");
            continue;
        }
        out.push(s.label.clone().or_else(|| t.label.clone()), sp, tp);
    }

    tracing::debug!(
        source = source.len(),
        target = target.len(),
        paired = out.len(),
        "built keypoint correspondence"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_by_label_in_source_order() {
        let source: KeypointSet = vec![
            Keypoint::labelled("nose", 1.0, 1.0),
            Keypoint::labelled("neck", 2.0, 2.0),
            Keypoint::labelled("hip", 3.0, 3.0),
        ]
        .into_iter()
        .collect();
        let target: KeypointSet = vec![
            Keypoint::labelled("hip", 30.0, 30.0),
            Keypoint::labelled("nose", 10.0, 10.0),
        ]
        .into_iter()
        .collect();

        let c = correspond(&source, &target, 0.0).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.labels, vec![Some("nose".to_string()), Some("hip".to_string())]);
        assert_eq!(c.source, vec![Point::new(1.0, 1.0), Point::new(3.0, 3.0)]);
        assert_eq!(c.target, vec![Point::new(10.0, 10.0), Point::new(30.0, 30.0)]);
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let source: KeypointSet = vec![
            Keypoint::labelled("nose", 1.0, 1.0),
            Keypoint::labelled("nose", 2.0, 2.0),
        ]
        .into_iter()
        .collect();
        let target = source.clone();
        assert!(correspond(&source, &target, 0.0).is_err());
    }

    #[test]
    fn test_unlabelled_pairs_by_index() {
        let source: KeypointSet = vec![Keypoint::new(0.0, 0.0), Keypoint::new(1.0, 0.0)]
            .into_iter()
            .collect();
        let target: KeypointSet = vec![Keypoint::new(5.0, 5.0), Keypoint::labelled("x", 6.0, 5.0)]
            .into_iter()
            .collect();

        let c = correspond(&source, &target, 0.0).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.labels[1].as_deref(), Some("x"));

        let short: KeypointSet = vec![Keypoint::new(5.0, 5.0)].into_iter().collect();
        assert!(correspond(&source, &short, 0.0).is_err());
    }

    #[test]
    fn test_low_confidence_and_missing_parts_dropped() {
        let source: KeypointSet = vec![
            Keypoint::new(0.0, 0.0).with_confidence(0.9),
            Keypoint::new(1.0, 0.0).with_confidence(0.05),
            Keypoint::new(f64::NAN, 0.0),
            Keypoint::new(2.0, 2.0),
        ]
        .into_iter()
        .collect();
        let target: KeypointSet = vec![
            Keypoint::new(0.0, 0.0),
            Keypoint::new(1.0, 0.0),
            Keypoint::new(3.0, 3.0),
            Keypoint::new(2.0, 2.0).with_confidence(0.5),
        ]
        .into_iter()
        .collect();

        let c = correspond(&source, &target, 0.1).unwrap();
        assert_eq!(c.source, vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)]);
    }
}
