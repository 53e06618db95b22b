use std::sync::Arc;

use crate::{
    BoundsValidator, DateConverter, EffectiveConfig, FieldConfig, RawDateValue, RequestContext, STYLE_CLASS_NAME,
    UserMessage, converter_for,
};

/// What a date field needs from the component holding its submitted state.
pub trait FieldState {
    /// Identifier messages are attached to
    fn client_id(&self) -> &str;

    fn is_valid(&self) -> bool;

    fn set_valid(&mut self, valid: bool);

    fn enqueue_message(&mut self, client_id: &str, message: UserMessage);
}

/// In-memory `FieldState` collecting the messages of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionState {
    client_id: String,
    valid:     bool,
    messages:  Vec<(String, UserMessage)>,
}

impl SubmissionState {
    /// A valid state with no messages
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            valid:     true,
            messages:  Vec::new(),
        }
    }

    /// Messages in the order they were enqueued, with the client id each was attached to
    pub fn messages(&self) -> &[(String, UserMessage)] {
        &self.messages
    }

    /// Messages attached to one client id
    pub fn messages_for<'a>(&'a self, client_id: &'a str) -> impl Iterator<Item = &'a UserMessage> + 'a {
        self.messages
            .iter()
            .filter(move |(id, _)| id == client_id)
            .map(|(_, message)| message)
    }
}

impl FieldState for SubmissionState {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    fn enqueue_message(&mut self, client_id: &str, message: UserMessage) {
        self.messages.push((client_id.to_owned(), message));
    }
}

/// A date-input field: its settings plus an optional caller-supplied converter.
#[derive(Debug, Clone, Default)]
pub struct InputDate {
    config:    FieldConfig,
    converter: Option<Arc<dyn DateConverter>>,
}

impl InputDate {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            converter: None,
        }
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn DateConverter>) -> Self {
        self.set_converter(Some(converter));
        self
    }

    pub const fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub const fn config_mut(&mut self) -> &mut FieldConfig {
        &mut self.config
    }

    pub fn set_converter(&mut self, converter: Option<Arc<dyn DateConverter>>) {
        self.converter = converter;
    }

    /// Pattern, locale and zone for this request
    pub fn effective_config(&self, ctx: &RequestContext<'_>) -> EffectiveConfig {
        self.config.resolve(ctx)
    }

    /// The configured converter, or a default one for this request's settings
    pub fn converter(&self, ctx: &RequestContext<'_>) -> Arc<dyn DateConverter> {
        converter_for(self.converter.as_ref(), &self.effective_config(ctx))
    }

    /// Configured classes followed by the field's own class, without duplicates
    pub fn style_class(&self) -> String {
        let mut classes: Vec<&str> = self
            .config
            .style_class()
            .map(str::split_whitespace)
            .into_iter()
            .flatten()
            .collect();
        classes.push(STYLE_CLASS_NAME);

        let mut seen = Vec::with_capacity(classes.len());
        classes.retain(|class| {
            let first = !seen.contains(class);
            seen.push(*class);
            first
        });
        classes.join(" ")
    }

    /// Checks a submitted value against the field's bounds and records the outcome in `state`.
    ///
    /// Does nothing when `state` is already invalid or no value was submitted:
    /// earlier validation has either rejected the value or there is nothing to check.
    pub fn validate_submitted_value<S>(&self, ctx: &RequestContext<'_>, new_value: Option<&RawDateValue>, state: &mut S)
    where
        S: FieldState + ?Sized,
    {
        if !state.is_valid() {
            return;
        }
        let Some(new_value) = new_value.filter(|v| !v.is_blank()) else {
            return;
        };

        let effective = self.effective_config(ctx);
        let converter = converter_for(self.converter.as_ref(), &effective);
        let verdict = BoundsValidator::new(&effective, converter.as_ref(), ctx.messages())
            .with_validator_message(self.config.validator_message())
            .validate(self.config.minimum_date(), self.config.maximum_date(), new_value);

        state.set_valid(verdict.is_valid());
        if let Some(message) = verdict.into_message() {
            let client_id = state.client_id().to_owned();
            tracing::debug!("Attaching message to {}: {}", client_id, message);
            state.enqueue_message(&client_id, message);
        }
    }
}
