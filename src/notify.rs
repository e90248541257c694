use crate::data::model::Dataset;
use crate::state::Presentation;

// ---------------------------------------------------------------------------
// Publish sink
// ---------------------------------------------------------------------------

/// Outbound side of the publish-subscribe channel.
///
/// Transport concerns (connection, QoS, reconnects) live behind this trait.
pub trait PublishSink {
    fn publish(&mut self, topic: &str, payload: &str);
}

impl<F> PublishSink for F
where
    F: FnMut(&str, &str),
{
    fn publish(&mut self, topic: &str, payload: &str) {
        self(topic, payload)
    }
}

/// Sink that only records publications in the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl PublishSink for LogSink {
    fn publish(&mut self, topic: &str, payload: &str) {
        log::info!("publish {topic}: {payload}");
    }
}

// ---------------------------------------------------------------------------
// Selection handling
// ---------------------------------------------------------------------------

/// A click on one rendered point, identified by its dataset index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEvent {
    pub point_index: usize,
}

/// Announce the filename of `dataset[selected]` on `topic`.
///
/// # Panics
///
/// If `selected` is not a valid index into `dataset`.
pub fn notify<S>(dataset: &Dataset, selected: usize, topic: &str, sink: &mut S)
where
    S: PublishSink + ?Sized,
{
    assert!(
        selected < dataset.len(),
        "selected index {selected} out of range for dataset of {} records",
        dataset.len()
    );
    sink.publish(topic, &dataset[selected].filename);
}

/// Handle one selection event.
///
/// A cleared selection (`None`) leaves the view as it is and publishes
/// nothing. Otherwise the sample is announced and the presentation with the
/// clicked point emphasized is returned.
pub fn select_point<S>(
    dataset: &Dataset,
    prior: &Presentation,
    event: Option<SelectionEvent>,
    topic: &str,
    sink: &mut S,
) -> Option<Presentation>
where
    S: PublishSink + ?Sized,
{
    let event = event?;
    let next = prior.with_selection(event.point_index);
    notify(dataset, event.point_index, topic, sink);
    Some(next)
}
