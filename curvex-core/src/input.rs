/// Logical buttons of the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Confirm,
    ChoiceX,
    ChoiceY,
    /// Operator escape hatch; never read by the trial logic.
    Abort,
}

impl Button {
    pub const ALL: [Button; 4] = [
        Button::Confirm,
        Button::ChoiceX,
        Button::ChoiceY,
        Button::Abort,
    ];

    fn bit(self) -> u8 {
        match self {
            Button::Confirm => 1,
            Button::ChoiceX => 1 << 1,
            Button::ChoiceY => 1 << 2,
            Button::Abort => 1 << 3,
        }
    }
}

/// A small set of buttons, used both for held state and for per-tick edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, button: Button) -> Self {
        self.insert(button);
        self
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.bit();
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.bit();
    }

    pub fn contains(&self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    /// Removes `button` and reports whether it was present, so one press
    /// satisfies at most one wait.
    pub fn take(&mut self, button: Button) -> bool {
        let present = self.contains(button);
        self.remove(button);
        present
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        let mut set = ButtonSet::empty();
        for b in iter {
            set.insert(b);
        }
        set
    }
}

/// Turns level-triggered held state into "just pressed" edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    held: ButtonSet,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds this tick's held buttons and returns the ones that went down since the last call.
    pub fn update(&mut self, held: ButtonSet) -> ButtonSet {
        let pressed = ButtonSet(held.0 & !self.held.0);
        self.held = held;
        pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_button_fires_once() {
        let mut edges = EdgeDetector::new();
        let held = ButtonSet::empty().with(Button::Confirm);
        assert!(edges.update(held).contains(Button::Confirm));
        assert!(edges.update(held).is_empty());
        assert!(edges.update(held).is_empty());
        assert!(edges.update(ButtonSet::empty()).is_empty());
        assert!(edges.update(held).contains(Button::Confirm));
    }

    #[test]
    fn independent_buttons() {
        let mut edges = EdgeDetector::new();
        edges.update(ButtonSet::empty().with(Button::ChoiceX));
        let pressed = edges.update([Button::ChoiceX, Button::ChoiceY].into_iter().collect());
        assert!(!pressed.contains(Button::ChoiceX));
        assert!(pressed.contains(Button::ChoiceY));
    }

    #[test]
    fn take_consumes() {
        let mut set = ButtonSet::empty().with(Button::Confirm);
        assert!(set.take(Button::Confirm));
        assert!(!set.take(Button::Confirm));
        assert!(set.is_empty());
    }
}
