// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// An entity identifier, stable for the entity's lifetime.
pub type EntityId = String;

/// A layer identifier.
pub type LayerId = String;

/// A group identifier.
pub type GroupId = String;

/// Monotonic identifier generator.
///
/// Ids are never reused within one generator, even across
/// delete/undo cycles.
#[derive(Clone, Default, Debug)]
pub struct IdGen {
    counter: u64,
}

impl IdGen {
    /// Creates a new generator.
    pub fn new() -> Self {
        IdGen::default()
    }

    /// Returns the next entity id.
    pub fn next_entity(&mut self) -> EntityId {
        self.counter += 1;
        format!("e{}", self.counter)
    }

    /// Returns the next layer id.
    pub fn next_layer(&mut self) -> LayerId {
        self.counter += 1;
        format!("l{}", self.counter)
    }

    /// Returns the next group id.
    pub fn next_group(&mut self) -> GroupId {
        self.counter += 1;
        format!("g{}", self.counter)
    }

    /// Advances the counter past the numeric suffix of a deserialized id,
    /// so that freshly generated ids cannot collide with loaded ones.
    pub fn bump_past(&mut self, id: &str) {
        let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse::<u64>() {
            if n > self.counter {
                self.counter = n;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic() {
        let mut gen = IdGen::new();
        assert_eq!(gen.next_entity(), "e1");
        assert_eq!(gen.next_layer(), "l2");
        assert_eq!(gen.next_entity(), "e3");
    }

    #[test]
    fn bump() {
        let mut gen = IdGen::new();
        gen.bump_past("e17");
        assert_eq!(gen.next_entity(), "e18");
        gen.bump_past("e5");
        assert_eq!(gen.next_entity(), "e19");
    }
}
