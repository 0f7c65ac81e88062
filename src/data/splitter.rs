// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Splits the labelled images into two sets:
//   - Training set:   used to update the head's weights
//   - Validation set: used to measure accuracy on unseen images
//
// The split is stratified and deterministic:
//   for every class, the first floor(n × fraction) images
//   (in the loader's sorted order) go to validation and the
//   rest go to training.
//
// Stratifying keeps every season represented in validation even
// when classes have very different sizes. Being deterministic
// means two training runs on the same folder evaluate on the
// same validation images.
//
// Split ratio: 80% training, 20% validation (configurable)
//
// Reference: Rust Book §8 (Vectors)

/// Anything that carries a class label
pub trait Labeled {
    fn label(&self) -> usize;
}

impl Labeled for crate::data::loader::LabeledImage {
    fn label(&self) -> usize {
        self.label
    }
}

/// Split `samples` into (train, validation), class by class.
///
/// # Arguments
/// * `samples`             - All samples, grouped or not (consumed)
/// * `validation_fraction` - Share reserved for validation, e.g. 0.2
///
/// # Returns
/// A tuple (train_samples, val_samples). Relative order inside each
/// class is preserved.
pub fn split_by_class<T: Labeled>(samples: Vec<T>, validation_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total = samples.len();

    // Count images per class first so we know each class's quota
    let num_classes = samples.iter().map(|s| s.label() + 1).max().unwrap_or(0);
    let mut per_class = vec![0usize; num_classes];
    for s in &samples {
        per_class[s.label()] += 1;
    }
    let quota: Vec<usize> = per_class
        .iter()
        .map(|&n| ((n as f64) * validation_fraction).floor() as usize)
        .map(|q| q.min(total))
        .collect();

    let mut taken = vec![0usize; num_classes];
    let mut train = Vec::with_capacity(total);
    let mut val   = Vec::new();

    for s in samples {
        let label = s.label();
        if taken[label] < quota[label] {
            taken[label] += 1;
            val.push(s);
        } else {
            train.push(s);
        }
    }

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        train.len(),
        val.len(),
        (train.len() * 100) / total.max(1),
        (val.len()   * 100) / total.max(1),
    );

    (train, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id:    usize,
        label: usize,
    }

    impl Labeled for Item {
        fn label(&self) -> usize {
            self.label
        }
    }

    /// `counts[c]` items of class c, grouped by class
    fn items(counts: &[usize]) -> Vec<Item> {
        let mut id  = 0;
        let mut out = Vec::new();
        for (label, &n) in counts.iter().enumerate() {
            for _ in 0..n {
                out.push(Item { id, label });
                id += 1;
            }
        }
        out
    }

    #[test]
    fn test_correct_split_sizes() {
        let (train, val) = split_by_class(items(&[25, 25, 25, 25]), 0.2);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_split_is_stratified() {
        let (_, val) = split_by_class(items(&[10, 20, 5]), 0.2);
        let per_class: Vec<usize> = (0..3)
            .map(|c| val.iter().filter(|i| i.label == c).count())
            .collect();
        // floor(10*0.2)=2, floor(20*0.2)=4, floor(5*0.2)=1
        assert_eq!(per_class, vec![2, 4, 1]);
    }

    #[test]
    fn test_first_images_of_each_class_go_to_validation() {
        let (_, val) = split_by_class(items(&[5, 5]), 0.4);
        let ids: Vec<usize> = val.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 1, 5, 6]);
    }

    #[test]
    fn test_all_items_preserved() {
        let (train, val) = split_by_class(items(&[7, 3, 11]), 0.3);
        assert_eq!(train.len() + val.len(), 21);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, val) = split_by_class(Vec::<Item>::new(), 0.2);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, val) = split_by_class(items(&[4, 4]), 0.0);
        assert_eq!(train.len(), 8);
        assert!(val.is_empty());
    }

    #[test]
    fn test_tiny_class_gets_no_validation() {
        // floor(3 * 0.2) = 0
        let (train, val) = split_by_class(items(&[3]), 0.2);
        assert_eq!(train.len(), 3);
        assert!(val.is_empty());
    }
}
