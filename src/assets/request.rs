//! Load requests and their completions
//!
//! Every request carries a [`RequestToken`]. Tokens come from one counter and
//! only ever increase, so a completion can tell whether a newer request of the
//! same kind has been issued since it was dispatched.

use std::fmt;

use crate::assets::environment::EnvironmentMap;
use crate::error::LoadError;
use crate::gfx::scene::model::ModelNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing tokens
#[derive(Debug, Default)]
pub struct TokenCounter {
    last: u64,
}

impl TokenCounter {
    pub fn next(&mut self) -> RequestToken {
        self.last += 1;
        RequestToken(self.last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Model,
    Environment,
}

/// What the loader should fetch
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub token: RequestToken,
    /// Catalog entry the request was issued for
    pub entry_index: usize,
    pub locator: String,
    pub kind: LoadKind,
}

pub enum LoadPayload {
    Model(Result<ModelNode, LoadError>),
    Environment(Result<EnvironmentMap, LoadError>),
}

/// Result of a load, handed back to the thread that owns the scene
pub struct LoadCompletion {
    pub token: RequestToken,
    pub entry_index: usize,
    pub payload: LoadPayload,
}

impl LoadCompletion {
    pub fn kind(&self) -> LoadKind {
        match self.payload {
            LoadPayload::Model(_) => LoadKind::Model,
            LoadPayload::Environment(_) => LoadKind::Environment,
        }
    }

    pub fn is_success(&self) -> bool {
        match &self.payload {
            LoadPayload::Model(result) => result.is_ok(),
            LoadPayload::Environment(result) => result.is_ok(),
        }
    }
}

impl fmt::Debug for LoadCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("token", &self.token)
            .field("entry_index", &self.entry_index)
            .field("kind", &self.kind())
            .field("success", &self.is_success())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_strictly_increase() {
        let mut counter = TokenCounter::default();
        let first = counter.next();
        let second = counter.next();
        assert!(second > first);
        assert_eq!(second.value(), first.value() + 1);
        assert_eq!(first.to_string(), "#1");
    }
}
