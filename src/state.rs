use crate::color::{ColorScale, Rgb8};
use crate::data::model::Dataset;
use crate::notify::{select_point, PublishSink, SelectionEvent};

pub const MARKER_SIZE: f32 = 10.0;
pub const BASE_OPACITY: f32 = 0.5;
pub const SELECTED_OPACITY: f32 = 1.0;

// ---------------------------------------------------------------------------
// Presentation – per-point marker styling
// ---------------------------------------------------------------------------

/// Marker styling of every record, in dataset order.
///
/// Owned by the view; the dataset itself is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub selected: Option<usize>,
    pub opacity: Vec<f32>,
    pub size: Vec<f32>,
    pub color: Vec<Rgb8>,
}

impl Presentation {
    /// Nothing selected, every point at base opacity.
    pub fn initial(dataset: &Dataset, scale: &ColorScale) -> Self {
        let n = dataset.len();
        Self {
            selected: None,
            opacity: vec![BASE_OPACITY; n],
            size: vec![MARKER_SIZE; n],
            color: scale.colors(dataset),
        }
    }

    /// Same styling with `index` emphasized and every other point dimmed.
    pub fn with_selection(&self, index: usize) -> Self {
        let opacity = (0..self.opacity.len())
            .map(|i| if i == index { SELECTED_OPACITY } else { BASE_OPACITY })
            .collect();
        Self {
            selected: Some(index),
            opacity,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// What the hosting view holds for the lifetime of the process.
pub struct ViewState {
    /// Assembled once at startup, read-only afterwards.
    pub dataset: Dataset,

    /// Current marker styling.
    pub presentation: Presentation,

    /// Channel selections are announced on.
    pub topic: String,
}

impl ViewState {
    pub fn new(dataset: Dataset, topic: impl Into<String>) -> Self {
        let presentation = Presentation::initial(&dataset, &ColorScale::for_dataset(&dataset));
        Self {
            dataset,
            presentation,
            topic: topic.into(),
        }
    }

    /// Feed one click through the selection handler and keep the result.
    ///
    /// Returns `true` when the presentation changed.
    pub fn handle_click<S>(&mut self, event: Option<SelectionEvent>, sink: &mut S) -> bool
    where
        S: PublishSink + ?Sized,
    {
        match select_point(&self.dataset, &self.presentation, event, &self.topic, sink) {
            Some(next) => {
                self.presentation = next;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SampleRecord;

    fn view() -> ViewState {
        let rec = |name: &str, c: f64| SampleRecord {
            filename: name.to_string(),
            concentration: c,
            date: None,
            lat: Some(10.0),
            lon: Some(20.0),
        };
        ViewState::new(
            Dataset::from_records(vec![rec("a.tsv", 0.1), rec("b.tsv", 0.9)]),
            "visualization/dataset",
        )
    }

    #[test]
    fn test_initial_presentation() {
        let v = view();
        assert_eq!(v.presentation.selected, None);
        assert_eq!(v.presentation.opacity, vec![BASE_OPACITY; 2]);
        assert_eq!(v.presentation.size, vec![MARKER_SIZE; 2]);
        assert_eq!(v.presentation.color, vec![[0, 0, 255], [255, 0, 0]]);
    }

    #[test]
    fn test_consecutive_clicks_move_emphasis() {
        let mut v = view();
        let mut published = Vec::new();
        let mut sink = |topic: &str, payload: &str| published.push(format!("{topic}={payload}"));

        assert!(v.handle_click(Some(SelectionEvent { point_index: 0 }), &mut sink));
        assert!(v.handle_click(Some(SelectionEvent { point_index: 1 }), &mut sink));
        assert!(!v.handle_click(None, &mut sink));

        assert_eq!(v.presentation.selected, Some(1));
        assert_eq!(v.presentation.opacity, vec![BASE_OPACITY, SELECTED_OPACITY]);
        assert_eq!(
            published,
            vec![
                "visualization/dataset=a.tsv".to_string(),
                "visualization/dataset=b.tsv".to_string()
            ]
        );
    }
}
