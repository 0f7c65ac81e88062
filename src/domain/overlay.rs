// ============================================================
// Layer 3 — Overlay Domain Type
// ============================================================
// Describes the caption drawn on each live frame. This is pure
// data: the display adapter decides how to rasterise it.

use crate::domain::prediction::Prediction;

/// Text caption placed on a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub text: String,

    /// Baseline-left corner of the text, in pixels from the top-left
    pub origin: (i32, i32),

    pub font_scale: f64,

    /// RGB
    pub color: [u8; 3],

    pub thickness: i32,
}

impl Overlay {
    /// Caption for a live prediction: green "Season: <label>" near
    /// the top-left corner.
    pub fn for_prediction(prediction: &Prediction) -> Self {
        Self {
            text:       format!("Season: {}", prediction.label),
            origin:     (10, 30),
            font_scale: 1.0,
            color:      [0, 255, 0],
            thickness:  2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_uses_label() {
        let prediction = Prediction {
            index:         3,
            label:         "Verano".into(),
            probabilities: vec![0.0, 0.0, 0.1, 0.9],
        };
        let overlay = Overlay::for_prediction(&prediction);
        assert_eq!(overlay.text, "Season: Verano");
        assert_eq!(overlay.origin, (10, 30));
        assert_eq!(overlay.color, [0, 255, 0]);
    }
}
