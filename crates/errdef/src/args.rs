use smallvec::SmallVec;
use strum::{Display, IntoStaticStr};

use crate::object::{Object, Record};

/// Record key that carries the message inside an options record.
pub(crate) const MESSAGE_KEY: &str = "message";
/// Record key that carries the stack-start function inside an options record.
pub(crate) const STACK_START_KEY: &str = "stackStartFunction";

/// Coarse classification of a supplied argument.
///
/// Call-shape predicates only ever look at these kinds (plus the keys of
/// record arguments), never at concrete values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ArgKind {
    String,
    Record,
    /// A function handle or a manufactured exception type.
    Callable,
    Other,
}

/// The arguments of one constructor invocation together with their kinds.
///
/// Most constructor calls carry at most four arguments, so the kind list is
/// kept inline and never allocates for the common cases.
#[derive(Debug)]
pub(crate) struct ArgValues {
    values: Vec<Object>,
    kinds: SmallVec<[ArgKind; 4]>,
}

impl ArgValues {
    pub fn new(values: Vec<Object>) -> Self {
        let kinds = values.iter().map(Object::kind).collect();
        Self { values, kinds }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the kind of the argument at `index`, if there is one.
    pub fn kind(&self, index: usize) -> Option<ArgKind> {
        self.kinds.get(index).copied()
    }

    pub fn first_kind(&self) -> Option<ArgKind> {
        self.kinds.first().copied()
    }

    pub fn last_kind(&self) -> Option<ArgKind> {
        self.kinds.last().copied()
    }

    /// Checks the argument kinds against an exact pattern.
    #[cfg(test)]
    pub fn kinds_are(&self, pattern: &[ArgKind]) -> bool {
        self.kinds.as_slice() == pattern
    }

    /// Returns true if the argument at `index` is an options record for `props`.
    pub fn is_options_record_at(&self, index: usize, props: &[String]) -> bool {
        self.values.get(index).is_some_and(|value| is_options_record(value, props))
    }

    /// Removes and returns the first argument.
    pub fn take_first(&mut self) -> Option<Object> {
        if self.values.is_empty() {
            return None;
        }
        self.kinds.remove(0);
        Some(self.values.remove(0))
    }

    /// Removes and returns the last argument.
    pub fn take_last(&mut self) -> Option<Object> {
        self.kinds.pop();
        self.values.pop()
    }

    pub fn into_vec(self) -> Vec<Object> {
        self.values
    }
}

/// Decides whether `value` is an options record for the declared `props`.
///
/// Every declared name must be present, and the keys other than `message` and
/// `stackStartFunction` must number exactly as many as the declared names, so a
/// record carrying an undeclared key is treated as a plain payload value.
pub(crate) fn is_options_record(value: &Object, props: &[String]) -> bool {
    let Object::Record(record) = value else {
        return false;
    };
    if !props.iter().all(|prop| record.contains_key(prop)) {
        return false;
    }
    payload_key_count(record) == props.len()
}

fn payload_key_count(record: &Record) -> usize {
    record
        .keys()
        .filter(|key| key.as_str() != MESSAGE_KEY && key.as_str() != STACK_START_KEY)
        .count()
}
