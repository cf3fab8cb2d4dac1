//! Per-field io attributes
//!
//! Attributes are attached to a field when a record describes itself and
//! control how that field crosses the wire:
//! - `storage_key`: wire name when it differs from the field name
//! - `store_default`: when false, values equal to the default are pruned
//! - `soft_default` / `soft_default_factory`: backfill for absent keys
//! - `whole_days` / `whole_hours` / `whole_minutes` and `datetime_validator`:
//!   checks applied to datetime values in both directions

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};

use crate::value::{IoType, Value};

/// Produces a fresh soft-default value.
pub type SoftDefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Custom datetime check; the error string becomes the failure message.
pub type DateTimeValidator = fn(&DateTime<Utc>) -> Result<(), String>;

/// Io attributes for a single field.
#[derive(Clone)]
pub struct IoAttrs {
    /// Wire key for the field (defaults to the field name)
    pub storage_key: Option<String>,
    /// Whether values equal to the default are written out
    pub store_default: bool,
    /// Static soft default
    pub soft_default: Option<Value>,
    /// Soft default factory, for defaults that must be built fresh
    pub soft_default_factory: Option<SoftDefaultFactory>,
    /// Datetime values must fall on a whole day
    pub whole_days: bool,
    /// Datetime values must fall on a whole hour
    pub whole_hours: bool,
    /// Datetime values must fall on a whole minute
    pub whole_minutes: bool,
    /// Extra datetime check
    pub datetime_validator: Option<DateTimeValidator>,
}

impl Default for IoAttrs {
    fn default() -> Self {
        Self {
            storage_key: None,
            store_default: true,
            soft_default: None,
            soft_default_factory: None,
            whole_days: false,
            whole_hours: false,
            whole_minutes: false,
            datetime_validator: None,
        }
    }
}

impl IoAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn store_default(mut self, store: bool) -> Self {
        self.store_default = store;
        self
    }

    pub fn soft_default<T: IoType>(mut self, value: T) -> Self {
        self.soft_default = Some(value.to_value());
        self
    }

    pub fn soft_default_factory<T: IoType + 'static>(mut self, factory: fn() -> T) -> Self {
        self.soft_default_factory = Some(Arc::new(move || factory().to_value()));
        self
    }

    pub fn whole_days(mut self) -> Self {
        self.whole_days = true;
        self
    }

    pub fn whole_hours(mut self) -> Self {
        self.whole_hours = true;
        self
    }

    pub fn whole_minutes(mut self) -> Self {
        self.whole_minutes = true;
        self
    }

    pub fn datetime_validator(mut self, validator: DateTimeValidator) -> Self {
        self.datetime_validator = Some(validator);
        self
    }

    /// Whether a soft default (static or factory) is declared.
    pub fn has_soft_default(&self) -> bool {
        self.soft_default.is_some() || self.soft_default_factory.is_some()
    }

    /// Produces the soft default value, if one is declared.
    pub fn default_value(&self) -> Option<Value> {
        match (&self.soft_default, &self.soft_default_factory) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(factory)) => Some(factory()),
            (None, None) => None,
        }
    }

    /// Whether any datetime-only attribute is set.
    pub(crate) fn has_datetime_checks(&self) -> bool {
        self.whole_days || self.whole_hours || self.whole_minutes || self.datetime_validator.is_some()
    }

    /// Runs the granularity checks and the custom validator.
    pub fn validate_datetime(&self, dt: &DateTime<Utc>) -> Result<(), String> {
        let sub_second = dt.nanosecond() != 0;
        if self.whole_days && (sub_second || dt.num_seconds_from_midnight() != 0) {
            return Err(format!("{} is not a whole day", dt));
        }
        if self.whole_hours && (sub_second || dt.minute() != 0 || dt.second() != 0) {
            return Err(format!("{} is not a whole hour", dt));
        }
        if self.whole_minutes && (sub_second || dt.second() != 0) {
            return Err(format!("{} is not a whole minute", dt));
        }
        match self.datetime_validator {
            Some(validator) => validator(dt),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for IoAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoAttrs")
            .field("storage_key", &self.storage_key)
            .field("store_default", &self.store_default)
            .field("soft_default", &self.soft_default)
            .field("soft_default_factory", &self.soft_default_factory.as_ref().map(|_| "<factory>"))
            .field("whole_days", &self.whole_days)
            .field("whole_hours", &self.whole_hours)
            .field("whole_minutes", &self.whole_minutes)
            .field("datetime_validator", &self.datetime_validator.map(|_| "<validator>"))
            .finish()
    }
}

impl PartialEq for IoAttrs {
    fn eq(&self, other: &Self) -> bool {
        // Factories are compared by the default they produce
        let same_factory = match (&self.soft_default_factory, &other.soft_default_factory) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a() == b(),
            (None, None) => true,
            _ => false,
        };
        let same_validator = match (self.datetime_validator, other.datetime_validator) {
            (Some(a), Some(b)) => a as usize == b as usize,
            (None, None) => true,
            _ => false,
        };
        self.storage_key == other.storage_key
            && self.store_default == other.store_default
            && self.soft_default == other.soft_default
            && self.whole_days == other.whole_days
            && self.whole_hours == other.whole_hours
            && self.whole_minutes == other.whole_minutes
            && same_factory
            && same_validator
    }
}
