//! Bounded selection over the catalog

/// Navigation input, from the overlay buttons or the arrow keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCommand {
    Advance,
    Retreat,
}

/// Emitted when the selected index actually moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChanged {
    pub previous: usize,
    pub current: usize,
}

/// Current index into a catalog of fixed length
///
/// The index never leaves `0..len`. Moving past either end is a no-op and
/// there is no wraparound.
#[derive(Debug, Clone)]
pub struct CatalogNavigator {
    len: usize,
    current: usize,
}

impl CatalogNavigator {
    /// Starts at index 0. A zero `len` is treated as one entry.
    pub fn new(len: usize) -> Self {
        Self {
            len: len.max(1),
            current: 0,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.len
    }

    pub fn next(&mut self) -> Option<SelectionChanged> {
        if self.is_last() {
            return None;
        }
        Some(self.move_to(self.current + 1))
    }

    pub fn previous(&mut self) -> Option<SelectionChanged> {
        if self.is_first() {
            return None;
        }
        Some(self.move_to(self.current - 1))
    }

    pub fn apply(&mut self, command: NavigationCommand) -> Option<SelectionChanged> {
        match command {
            NavigationCommand::Advance => self.next(),
            NavigationCommand::Retreat => self.previous(),
        }
    }

    fn move_to(&mut self, index: usize) -> SelectionChanged {
        let change = SelectionChanged {
            previous: self.current,
            current: index,
        };
        self.current = index;
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn ends_are_no_ops() {
        let mut nav = CatalogNavigator::new(3);
        assert_eq!(nav.previous(), None);
        assert_eq!(nav.current_index(), 0);

        assert_eq!(
            nav.next(),
            Some(SelectionChanged {
                previous: 0,
                current: 1
            })
        );
        nav.next();
        assert!(nav.is_last());
        assert_eq!(nav.next(), None);
        assert_eq!(nav.current_index(), 2);
    }

    #[test]
    fn single_entry_never_moves() {
        let mut nav = CatalogNavigator::new(1);
        assert_eq!(nav.apply(NavigationCommand::Advance), None);
        assert_eq!(nav.apply(NavigationCommand::Retreat), None);
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for len in 1..6 {
            let mut nav = CatalogNavigator::new(len);
            for _ in 0..500 {
                let before = nav.current_index();
                let command = if rng.random_bool(0.5) {
                    NavigationCommand::Advance
                } else {
                    NavigationCommand::Retreat
                };

                match nav.apply(command) {
                    Some(change) => {
                        assert_eq!(change.previous, before);
                        assert_eq!(change.current, nav.current_index());
                        assert_eq!(change.previous.abs_diff(change.current), 1);
                    }
                    None => assert_eq!(nav.current_index(), before),
                }
                assert!(nav.current_index() < len);
            }
        }
    }
}
