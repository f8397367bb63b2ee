use indicatif::{ProgressBar, ProgressStyle};

pub(crate) const SHARD_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>12}/{len:12} {msg}";

pub(crate) struct ProgressBarBuilder {
    style_template: &'static str,
    message: String,
    length: Option<u64>,
    hidden: bool,
}

impl ProgressBarBuilder {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            style_template: "{spinner:.green} {msg}",
            message: message.into(),
            length: None,
            hidden: false,
        }
    }

    pub(crate) fn with_template(mut self, template: &'static str) -> Self {
        self.style_template = template;
        self
    }

    /// Turns the spinner into a bar of `length` steps.
    pub(crate) fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub(crate) fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub(crate) fn build(self) -> ProgressBar {
        if self.hidden {
            return ProgressBar::hidden();
        }
        let pb = match self.length {
            Some(length) => ProgressBar::new(length),
            None => ProgressBar::new_spinner(),
        };

        let style = ProgressStyle::with_template(self.style_template)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(self.message);
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_still_counts() {
        let pb = ProgressBarBuilder::new("shard 0")
            .with_template(SHARD_TEMPLATE)
            .with_length(100)
            .hidden(true)
            .build();
        pb.inc(40);
        assert_eq!(pb.position(), 40);
        assert!(pb.is_hidden());
    }

    #[test]
    fn bar_takes_its_length() {
        let pb = ProgressBarBuilder::new("scan").with_length(7).build();
        assert_eq!(pb.length(), Some(7));
    }
}
