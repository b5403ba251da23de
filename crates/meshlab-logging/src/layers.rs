//! Layer construction shared by console and file output

use tracing::Subscriber;
use tracing_subscriber::fmt::{
    self, MakeWriter,
    format::{Format, Json, JsonFields},
};
use tracing_subscriber::registry::LookupSpan;

use crate::config::JsonlConfig;

/// Create a JSONL formatting layer writing to `writer`
///
/// Used for the JSONL console (with `std::io::stdout`) and for file output.
pub fn jsonl_layer<S, W>(
    writer: W,
    config: &JsonlConfig,
) -> fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(config.span_list)
        .flatten_event(true)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_ids)
        .with_writer(writer)
}

/// Create the human-readable console layer
pub fn pretty_layer<S>(ansi: bool) -> fmt::Layer<S>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fmt::layer().with_ansi(ansi).with_target(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_jsonl_layer_composes() {
        let config = JsonlConfig::default();
        let subscriber = Registry::default().with(jsonl_layer(std::io::sink, &config));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(node_id = 1, "composed");
        });
    }

    #[test]
    fn test_pretty_layer_composes() {
        let subscriber = Registry::default().with(pretty_layer(false));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("composed");
        });
    }
}
